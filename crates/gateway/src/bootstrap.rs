//! AppState construction shared by `serve` and the one-shot `run` command.

use std::sync::Arc;

use anyhow::Context;

use tt_domain::config::{Config, ConfigSeverity};
use tt_providers::{LlmProvider, OpenAiCompatProvider};
use tt_tools::{CustomerDirectory, IncidentLog, KnowledgeBase};

use crate::capabilities::{build_default_registry, CapabilityRegistry};
use crate::runtime::{LoopSettings, Orchestrator};
use crate::state::AppState;

/// Validate config, initialize every collaborator and return a fully-wired
/// [`AppState`].
pub fn build_app_state(config: Arc<Config>) -> anyhow::Result<AppState> {
    check_config(&config)?;

    let provider: Arc<dyn LlmProvider> = Arc::new(
        OpenAiCompatProvider::from_config(&config.llm)
            .context("initializing decision-maker provider")?,
    );
    tracing::info!(
        base_url = %config.llm.base_url,
        model = %config.llm.model,
        "decision-maker provider ready"
    );

    build_app_state_with_provider(config, provider)
}

/// Same as [`build_app_state`] but with a caller-supplied provider.
pub fn build_app_state_with_provider(
    config: Arc<Config>,
    provider: Arc<dyn LlmProvider>,
) -> anyhow::Result<AppState> {
    let capabilities = Arc::new(build_registry(&config)?);
    let orchestrator = Arc::new(Orchestrator::new(
        provider,
        capabilities.clone(),
        LoopSettings::from_config(&config),
    ));

    Ok(AppState { config, capabilities, orchestrator })
}

/// Wire the capability collaborators described by config.
pub fn build_registry(config: &Config) -> anyhow::Result<CapabilityRegistry> {
    let directory = match &config.customers.directory_path {
        Some(path) => CustomerDirectory::from_json_file(path)
            .with_context(|| format!("loading customer directory {}", path.display()))?,
        None => CustomerDirectory::builtin(),
    };
    tracing::info!(customers = directory.len(), "customer directory ready");

    let knowledge = KnowledgeBase::builtin();
    tracing::info!(documents = knowledge.len(), "knowledge base ready");

    let incidents = IncidentLog::new(config.audit.incident_log_path.clone());
    tracing::info!(path = %incidents.path().display(), "incident log ready");

    Ok(build_default_registry(
        Arc::new(directory),
        Arc::new(knowledge),
        Arc::new(incidents),
        config.knowledge.max_results,
    ))
}

fn check_config(config: &Config) -> anyhow::Result<()> {
    let issues = config.validate();
    for issue in &issues {
        match issue.severity {
            ConfigSeverity::Warning => tracing::warn!("config: {issue}"),
            ConfigSeverity::Error => tracing::error!("config: {issue}"),
        }
    }
    let errors = issues
        .iter()
        .filter(|i| i.severity == ConfigSeverity::Error)
        .count();
    if errors > 0 {
        anyhow::bail!("config validation failed with {errors} error(s)");
    }
    Ok(())
}
