//! End-to-end decision loop tests against a scripted decision-maker.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use parking_lot::Mutex;
use tt_domain::config::Config;
use tt_domain::error::{Error, Result};
use tt_domain::ticket::{Category, SuggestedAction, Ticket, TriageResult, Urgency};
use tt_domain::tool::{ContentPart, Role, ToolCall};
use tt_domain::usage::Usage;
use tt_gateway::bootstrap;
use tt_gateway::capabilities::build_default_registry;
use tt_gateway::runtime::{LoopSettings, Orchestrator, Termination};
use tt_providers::{ChatRequest, ChatResponse, LlmProvider};
use tt_tools::{CustomerDirectory, IncidentLog, KnowledgeBase};

// ── Scripted provider ────────────────────────────────────────────────

struct ScriptedProvider {
    script: Mutex<VecDeque<ChatResponse>>,
    requests: Mutex<Vec<ChatRequest>>,
    delay: Option<Duration>,
}

impl ScriptedProvider {
    fn new(script: Vec<ChatResponse>) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(script.into()),
            requests: Mutex::new(Vec::new()),
            delay: None,
        })
    }

    fn slow(delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(VecDeque::new()),
            requests: Mutex::new(Vec::new()),
            delay: Some(delay),
        })
    }

    fn requests(&self) -> Vec<ChatRequest> {
        self.requests.lock().clone()
    }
}

#[async_trait::async_trait]
impl LlmProvider for ScriptedProvider {
    async fn chat(&self, req: &ChatRequest) -> Result<ChatResponse> {
        self.requests.lock().push(req.clone());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.script.lock().pop_front().ok_or_else(|| Error::Provider {
            provider: "scripted".into(),
            message: "script exhausted".into(),
        })
    }

    fn provider_id(&self) -> &str {
        "scripted"
    }

    fn default_model(&self) -> &str {
        "scripted-model"
    }
}

// ── Helpers ──────────────────────────────────────────────────────────

fn text(content: &str) -> ChatResponse {
    ChatResponse {
        content: content.into(),
        usage: Some(Usage { prompt_tokens: 10, completion_tokens: 5, total_tokens: 15 }),
        ..Default::default()
    }
}

fn calls(calls: &[(&str, &str, &str)]) -> ChatResponse {
    ChatResponse {
        tool_calls: calls
            .iter()
            .map(|(id, name, args)| ToolCall {
                call_id: (*id).into(),
                tool_name: (*name).into(),
                arguments: (*args).into(),
            })
            .collect(),
        ..Default::default()
    }
}

fn answer(urgency: &str) -> String {
    serde_json::json!({
        "urgency": urgency,
        "sentiment": "Frustrated",
        "category": "Technical",
        "summary": "Dashboard returns error 500 for the whole team.",
        "suggested_action": "Escalate to Human",
        "draft_response": "We are looking into this right away."
    })
    .to_string()
}

fn ticket() -> Ticket {
    Ticket {
        ticket_id: "T-100".into(),
        customer_id: "CUST_001".into(),
        messages: vec!["Error 500 everywhere since this morning".into()],
    }
}

struct Harness {
    _dir: tempfile::TempDir,
    incidents: Arc<IncidentLog>,
    orchestrator: Orchestrator,
}

fn harness(provider: Arc<ScriptedProvider>, settings: LoopSettings) -> Harness {
    let dir = tempfile::tempdir().unwrap();
    let incidents = Arc::new(IncidentLog::new(dir.path().join("incidents.jsonl")));
    let registry = build_default_registry(
        Arc::new(CustomerDirectory::builtin()),
        Arc::new(KnowledgeBase::builtin()),
        incidents.clone(),
        3,
    );
    let orchestrator = Orchestrator::new(provider, Arc::new(registry), settings);
    Harness { _dir: dir, incidents, orchestrator }
}

/// Tool results carried by the last request, in conversation order.
fn tool_results(req: &ChatRequest) -> Vec<(String, String, bool)> {
    req.messages
        .iter()
        .filter(|m| m.role == Role::Tool)
        .flat_map(|m| m.content.parts())
        .filter_map(|p| match p {
            ContentPart::ToolResult { tool_use_id, content, is_error } => {
                Some((tool_use_id.clone(), content.clone(), *is_error))
            }
            _ => None,
        })
        .collect()
}

// ── Loop behaviour ───────────────────────────────────────────────────

#[tokio::test]
async fn budget_exhaustion_returns_degraded_result_after_max_rounds() {
    let script = (0..10)
        .map(|i| calls(&[(&format!("c{i}"), "search_knowledge_base", r#"{"query":"login"}"#)]))
        .collect();
    let provider = ScriptedProvider::new(script);
    let h = harness(provider.clone(), LoopSettings::default());

    let outcome = h.orchestrator.triage(&ticket()).await.unwrap();

    assert_eq!(outcome.termination, Termination::BudgetExhausted);
    assert_eq!(outcome.rounds, 4);
    assert_eq!(outcome.result, TriageResult::loop_limit_reached());
    assert_eq!(outcome.result.urgency, Urgency::High);
    assert_eq!(outcome.result.suggested_action, SuggestedAction::EscalateToHuman);
    assert_eq!(provider.requests().len(), 4);
}

#[tokio::test]
async fn one_result_per_request_in_request_order() {
    let provider = ScriptedProvider::new(vec![
        calls(&[
            ("a", "get_customer_profile", r#"{"customer_id":"CUST_001"}"#),
            ("b", "lookup_weather", "{}"),
            ("c", "search_knowledge_base", "{not json"),
            ("d", "get_customer_profile", r#"{"customer_id":"CUST_404"}"#),
        ]),
        text(&answer("High")),
    ]);
    let h = harness(provider.clone(), LoopSettings::default());

    let outcome = h.orchestrator.triage(&ticket()).await.unwrap();
    assert_eq!(outcome.termination, Termination::FinalAnswer);
    assert_eq!(outcome.rounds, 2);

    let requests = provider.requests();
    let results = tool_results(&requests[1]);
    let ids: Vec<&str> = results.iter().map(|(id, _, _)| id.as_str()).collect();
    assert_eq!(ids, vec!["a", "b", "c", "d"]);

    assert!(!results[0].2);
    assert!(results[0].1.contains("CUST_001"));

    assert!(results[1].2);
    assert!(results[1].1.contains("capability not found: lookup_weather"));

    // Malformed arguments decode to an empty query and still run.
    assert!(!results[2].2);

    assert!(results[3].2);
    assert!(results[3].1.contains("customer not found"));
}

#[tokio::test]
async fn empty_turn_yields_no_content_result() {
    let provider = ScriptedProvider::new(vec![ChatResponse::default()]);
    let h = harness(provider.clone(), LoopSettings::default());

    let outcome = h.orchestrator.triage(&ticket()).await.unwrap();
    assert_eq!(outcome.termination, Termination::ForcedJsonRepair);
    assert_eq!(outcome.result, TriageResult::no_content());
    assert_eq!(outcome.result.category, Category::General);
    assert_eq!(provider.requests().len(), 1);
}

#[tokio::test]
async fn whitespace_turn_goes_through_repair() {
    let provider = ScriptedProvider::new(vec![text("  \n "), text(&answer("Low"))]);
    let h = harness(provider.clone(), LoopSettings::default());

    let outcome = h.orchestrator.triage(&ticket()).await.unwrap();
    assert_eq!(outcome.termination, Termination::Repaired);
    assert_eq!(outcome.result.urgency, Urgency::Low);

    let requests = provider.requests();
    assert_eq!(requests.len(), 2);
    assert!(requests[1].json_mode);
}

#[tokio::test]
async fn valid_answer_needs_no_repair() {
    let provider = ScriptedProvider::new(vec![text(&format!("```json\n{}\n```", answer("Medium")))]);
    let h = harness(provider.clone(), LoopSettings::default());

    let outcome = h.orchestrator.triage(&ticket()).await.unwrap();
    assert_eq!(outcome.termination, Termination::FinalAnswer);
    assert_eq!(outcome.rounds, 1);
    assert_eq!(outcome.result.urgency, Urgency::Medium);
    assert_eq!(outcome.usage.total_tokens, 15);

    let requests = provider.requests();
    assert_eq!(requests.len(), 1);
    assert!(!requests[0].json_mode);
    assert_eq!(requests[0].tools.len(), 3);
}

#[tokio::test]
async fn malformed_answer_is_repaired_with_strict_json_call() {
    let provider = ScriptedProvider::new(vec![
        text("Sure! The ticket looks urgent."),
        text(&answer("High")),
    ]);
    let settings = LoopSettings {
        model: Some("main-model".into()),
        repair_model: Some("repair-model".into()),
        ..Default::default()
    };
    let h = harness(provider.clone(), settings);

    let outcome = h.orchestrator.triage(&ticket()).await.unwrap();
    assert_eq!(outcome.termination, Termination::Repaired);
    assert_eq!(outcome.result.urgency, Urgency::High);

    let requests = provider.requests();
    assert_eq!(requests.len(), 2);
    let repair = &requests[1];
    assert!(repair.json_mode);
    assert!(repair.tools.is_empty());
    assert_eq!(repair.model.as_deref(), Some("repair-model"));
    assert_eq!(requests[0].model.as_deref(), Some("main-model"));

    // The malformed reply stays in the conversation the repair call sees.
    let replayed = repair
        .messages
        .iter()
        .filter(|m| m.role == Role::Assistant)
        .filter_map(|m| m.content.text())
        .any(|t| t.contains("looks urgent"));
    assert!(replayed);
}

#[tokio::test]
async fn malformed_twice_is_fatal() {
    let provider = ScriptedProvider::new(vec![text("not json"), text("still not json")]);
    let h = harness(provider, LoopSettings::default());

    let err = h.orchestrator.triage(&ticket()).await.unwrap_err();
    assert!(matches!(err, Error::MalformedAnswer(_)));
}

#[tokio::test]
async fn provider_failure_is_fatal() {
    let provider = ScriptedProvider::new(Vec::new());
    let h = harness(provider, LoopSettings::default());

    let err = h.orchestrator.triage(&ticket()).await.unwrap_err();
    assert!(matches!(err, Error::Provider { .. }));
}

#[tokio::test]
async fn slow_decision_maker_times_out() {
    let provider = ScriptedProvider::slow(Duration::from_secs(5));
    let settings = LoopSettings {
        request_timeout: Duration::from_millis(50),
        ..Default::default()
    };
    let h = harness(provider, settings);

    let err = h.orchestrator.triage(&ticket()).await.unwrap_err();
    assert!(matches!(err, Error::Timeout(_)));
}

// ── Critical incidents ───────────────────────────────────────────────

#[tokio::test]
async fn incident_report_without_risk_level_defaults_to_critical() {
    let provider = ScriptedProvider::new(vec![
        calls(&[(
            "r1",
            "report_critical_incident",
            r#"{"customer_id":"CUST_001","category":"Technical","issue_summary":"region-wide outage","kb_found":"true"}"#,
        )]),
        text(&answer("Critical")),
    ]);
    let h = harness(provider.clone(), LoopSettings::default());

    let outcome = h.orchestrator.triage(&ticket()).await.unwrap();
    assert_eq!(outcome.termination, Termination::FinalAnswer);
    assert_eq!(outcome.result.urgency, Urgency::Critical);

    let records = h.incidents.read_all().await.unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].risk_level, "Critical");
    assert_eq!(records[0].customer_id, "CUST_001");
    assert!(records[0].kb_found);

    let results = tool_results(&provider.requests()[1]);
    assert!(results[0].1.starts_with("Critical incident logged successfully"));
}

#[tokio::test]
async fn critical_answer_without_report_gets_another_round() {
    let provider = ScriptedProvider::new(vec![
        text(&answer("Critical")),
        calls(&[(
            "r1",
            "report_critical_incident",
            r#"{"customer_id":"CUST_001","risk_level":"Critical","issue_summary":"outage"}"#,
        )]),
        text(&answer("Critical")),
    ]);
    let h = harness(provider.clone(), LoopSettings::default());

    let outcome = h.orchestrator.triage(&ticket()).await.unwrap();
    assert_eq!(outcome.termination, Termination::FinalAnswer);
    assert_eq!(outcome.rounds, 3);
    assert_eq!(provider.requests().len(), 3);
    assert_eq!(h.incidents.read_all().await.unwrap().len(), 1);
}

#[tokio::test]
async fn report_on_last_round_keeps_critical_answer() {
    let provider = ScriptedProvider::new(vec![
        calls(&[("p1", "get_customer_profile", r#"{"customer_id":"CUST_002"}"#)]),
        calls(&[("k1", "search_knowledge_base", r#"{"query":"error 500 outage"}"#)]),
        text(&answer("Critical")),
        calls(&[(
            "r1",
            "report_critical_incident",
            r#"{"customer_id":"CUST_002","category":"Technical","issue_summary":"outage","kb_found":true}"#,
        )]),
        text(&answer("Critical")),
    ]);
    let h = harness(provider.clone(), LoopSettings::default());

    let outcome = h.orchestrator.triage(&ticket()).await.unwrap();
    assert_eq!(outcome.result.urgency, Urgency::Critical);
    assert_eq!(outcome.termination, Termination::FinalAnswer);
    assert_ne!(outcome.result, TriageResult::loop_limit_reached());
    assert_eq!(outcome.rounds, 4);
    assert_eq!(provider.requests().len(), 4);
    assert_eq!(h.incidents.read_all().await.unwrap().len(), 1);
}

#[tokio::test]
async fn failed_report_triggers_enforcement_again() {
    let provider = ScriptedProvider::new(vec![
        text(&answer("Critical")),
        calls(&[("r1", "report_critical_incident", r#"{"customer_id":"CUST_001"}"#)]),
        text(&answer("Critical")),
        calls(&[("r2", "report_critical_incident", r#"{"customer_id":"CUST_001"}"#)]),
    ]);
    let dir = tempfile::tempdir().unwrap();
    // A directory in place of the log file makes every append fail.
    let blocked = dir.path().join("incidents.jsonl");
    std::fs::create_dir_all(&blocked).unwrap();
    let incidents = Arc::new(IncidentLog::new(blocked));
    let registry = build_default_registry(
        Arc::new(CustomerDirectory::builtin()),
        Arc::new(KnowledgeBase::builtin()),
        incidents,
        3,
    );
    let orchestrator =
        Orchestrator::new(provider.clone(), Arc::new(registry), LoopSettings::default());

    let outcome = orchestrator.triage(&ticket()).await.unwrap();

    let requests = provider.requests();
    assert_eq!(requests.len(), 4);
    let results = tool_results(&requests[2]);
    assert!(results[0].2, "the failed report is an error result");
    // The second Critical answer was sent back with another reminder.
    let reminders = requests[3]
        .messages
        .iter()
        .filter(|m| m.role == Role::User)
        .filter_map(|m| m.content.text())
        .filter(|t| t.contains("no incident has been recorded"))
        .count();
    assert_eq!(reminders, 2);
    // Budget ran out on the retried report: the held Critical answer stands.
    assert_eq!(outcome.result.urgency, Urgency::Critical);
    assert_eq!(outcome.rounds, 4);
}

#[tokio::test]
async fn enforcement_can_be_disabled() {
    let provider = ScriptedProvider::new(vec![text(&answer("Critical"))]);
    let settings = LoopSettings { enforce_incident_report: false, ..Default::default() };
    let h = harness(provider.clone(), settings);

    let outcome = h.orchestrator.triage(&ticket()).await.unwrap();
    assert_eq!(outcome.rounds, 1);
    assert!(h.incidents.read_all().await.unwrap().is_empty());
}

#[tokio::test]
async fn enforcement_never_exceeds_round_budget() {
    let provider = ScriptedProvider::new(vec![text(&answer("Critical"))]);
    let settings = LoopSettings { max_rounds: 1, ..Default::default() };
    let h = harness(provider.clone(), settings);

    let outcome = h.orchestrator.triage(&ticket()).await.unwrap();
    assert_eq!(outcome.result.urgency, Urgency::Critical);
    assert_eq!(provider.requests().len(), 1);
}

// ── HTTP handler ─────────────────────────────────────────────────────

fn app_state(provider: Arc<ScriptedProvider>, dir: &tempfile::TempDir) -> tt_gateway::state::AppState {
    let mut config = Config::default();
    config.audit.incident_log_path = dir.path().join("incidents.jsonl");
    bootstrap::build_app_state_with_provider(Arc::new(config), provider).unwrap()
}

async fn body_json(resp: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn handler_returns_triage_result() {
    let dir = tempfile::tempdir().unwrap();
    let state = app_state(ScriptedProvider::new(vec![text(&answer("Low"))]), &dir);

    let resp = tt_gateway::api::triage::triage(State(state), Json(ticket())).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_json(resp).await;
    assert_eq!(body["urgency"], "Low");
    assert_eq!(body["suggested_action"], "Escalate to Human");
}

#[tokio::test]
async fn handler_rejects_blank_ids() {
    let dir = tempfile::tempdir().unwrap();
    let provider = ScriptedProvider::new(Vec::new());
    let state = app_state(provider.clone(), &dir);

    let mut t = ticket();
    t.customer_id = "  ".into();
    let resp = tt_gateway::api::triage::triage(State(state), Json(t)).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert!(provider.requests().is_empty());
}

#[tokio::test]
async fn handler_hides_internal_failures() {
    let dir = tempfile::tempdir().unwrap();
    let state = app_state(ScriptedProvider::new(vec![text("nope"), text("nope")]), &dir);

    let resp = tt_gateway::api::triage::triage(State(state), Json(ticket())).await;
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = body_json(resp).await;
    assert_eq!(body["error"], "internal error while triaging ticket");
}
