use tt_domain::config::{Config, ConfigSeverity};

#[test]
fn default_host_is_localhost() {
    let config = Config::default();
    assert_eq!(config.server.host, "127.0.0.1");
    assert_eq!(config.server.port, 8000);
}

#[test]
fn empty_file_yields_defaults() {
    let config: Config = toml::from_str("").unwrap();
    assert_eq!(config.decision_loop.max_rounds, 4);
    assert!(config.decision_loop.enforce_incident_report);
    assert_eq!(config.knowledge.max_results, 3);
    assert_eq!(config.llm.model, "gpt-4o-mini");
    assert!(config.customers.directory_path.is_none());
    assert_eq!(
        config.audit.incident_log_path.to_string_lossy(),
        "./data_logs/critical_incidents.jsonl"
    );
}

#[test]
fn default_cors_allows_only_localhost() {
    let config = Config::default();
    assert!(config.server.cors.allowed_origins.contains(&"http://localhost:*".to_string()));
    assert!(config.server.cors.allowed_origins.contains(&"http://127.0.0.1:*".to_string()));
}

#[test]
fn decision_loop_section_parses() {
    let toml_str = r#"
[decision_loop]
max_rounds = 6
capability_timeout_ms = 2500
enforce_incident_report = false
"#;
    let config: Config = toml::from_str(toml_str).unwrap();
    assert_eq!(config.decision_loop.max_rounds, 6);
    assert_eq!(config.decision_loop.capability_timeout_ms, 2500);
    assert!(!config.decision_loop.enforce_incident_report);
}

#[test]
fn default_config_validates_clean() {
    let issues = Config::default().validate();
    assert!(issues.is_empty(), "unexpected issues: {issues:?}");
}

#[test]
fn zero_rounds_is_an_error() {
    let config: Config = toml::from_str("[decision_loop]\nmax_rounds = 0\n").unwrap();
    let issues = config.validate();
    assert!(issues
        .iter()
        .any(|e| e.field == "decision_loop.max_rounds" && e.severity == ConfigSeverity::Error));
}

#[test]
fn plaintext_key_is_a_warning() {
    let config: Config = toml::from_str("[llm.auth]\nkey = \"sk-test\"\n").unwrap();
    let issues = config.validate();
    let issue = issues.iter().find(|e| e.field == "llm.auth.key").unwrap();
    assert_eq!(issue.severity, ConfigSeverity::Warning);
    assert!(issue.to_string().starts_with("[WARN] llm.auth.key:"));
}

#[test]
fn wildcard_cors_is_a_warning() {
    let config: Config =
        toml::from_str("[server.cors]\nallowed_origins = [\"*\"]\n").unwrap();
    let issues = config.validate();
    assert!(issues
        .iter()
        .any(|e| e.field == "server.cors.allowed_origins" && e.severity == ConfigSeverity::Warning));
}
