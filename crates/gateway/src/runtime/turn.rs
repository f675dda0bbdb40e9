//! The decision loop.
//!
//! Each round asks the decision-maker for one turn over the conversation.
//! A turn with capability requests is dispatched and its results appended;
//! a turn without them is the final answer attempt. Termination is one of:
//!
//! - `FinalAnswer`: the answer decoded as a triage result.
//! - `Repaired`: the answer was malformed and one strict-JSON call fixed it.
//! - `ForcedJsonRepair`: an empty turn; a fixed degraded result is returned.
//! - `BudgetExhausted`: no answer within `max_rounds`; a fixed degraded
//!   result biased toward human escalation is returned.
//!
//! A Critical answer sent back for a missing incident report is held. If
//! the budget runs out before the decision-maker answers again, the held
//! answer is returned rather than a degraded result.
//!
//! A malformed answer that survives the repair call, a provider failure, or
//! a decision-maker call exceeding its timeout fails the request.

use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::Serialize;
use tracing::Instrument;
use tt_domain::config::Config;
use tt_domain::error::{Error, Result};
use tt_domain::ticket::{Ticket, TriageResult, Urgency};
use tt_domain::tool::ToolDefinition;
use tt_domain::trace::TraceEvent;
use tt_domain::usage::Usage;
use tt_providers::{ChatRequest, ChatResponse, LlmProvider};

use super::conversation::Conversation;
use super::dispatch::dispatch_all;
use super::prompt;
use crate::capabilities::CapabilityRegistry;

const INCIDENT_CAPABILITY: &str = "report_critical_incident";

/// Knobs for one orchestrator, resolved once from config.
#[derive(Debug, Clone)]
pub struct LoopSettings {
    pub max_rounds: usize,
    /// `None` uses the provider's default model.
    pub model: Option<String>,
    /// Model for the strict-JSON repair call. Falls back to `model`.
    pub repair_model: Option<String>,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
    pub request_timeout: Duration,
    pub capability_timeout: Duration,
    pub enforce_incident_report: bool,
}

impl Default for LoopSettings {
    fn default() -> Self {
        Self {
            max_rounds: 4,
            model: None,
            repair_model: None,
            temperature: None,
            max_tokens: None,
            request_timeout: Duration::from_secs(60),
            capability_timeout: Duration::from_secs(10),
            enforce_incident_report: true,
        }
    }
}

impl LoopSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            max_rounds: config.decision_loop.max_rounds,
            model: Some(config.llm.model.clone()),
            repair_model: Some(config.llm.effective_repair_model().to_owned()),
            temperature: config.llm.temperature,
            max_tokens: config.llm.max_tokens,
            request_timeout: Duration::from_millis(config.llm.request_timeout_ms),
            capability_timeout: Duration::from_millis(config.decision_loop.capability_timeout_ms),
            enforce_incident_report: config.decision_loop.enforce_incident_report,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Termination {
    FinalAnswer,
    Repaired,
    ForcedJsonRepair,
    BudgetExhausted,
}

impl Termination {
    pub fn as_str(&self) -> &'static str {
        match self {
            Termination::FinalAnswer => "final_answer",
            Termination::Repaired => "repaired",
            Termination::ForcedJsonRepair => "forced_json_repair",
            Termination::BudgetExhausted => "budget_exhausted",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct TriageOutcome {
    pub result: TriageResult,
    pub termination: Termination,
    /// Decision-maker rounds used, not counting the repair call.
    pub rounds: usize,
    pub usage: Usage,
}

/// Drives the decision loop for independent tickets. Holds no per-ticket
/// state, so one instance serves concurrent requests.
pub struct Orchestrator {
    provider: Arc<dyn LlmProvider>,
    capabilities: Arc<CapabilityRegistry>,
    tool_defs: Vec<ToolDefinition>,
    settings: LoopSettings,
}

impl Orchestrator {
    pub fn new(
        provider: Arc<dyn LlmProvider>,
        capabilities: Arc<CapabilityRegistry>,
        settings: LoopSettings,
    ) -> Self {
        let tool_defs = capabilities.definitions();
        Self { provider, capabilities, tool_defs, settings }
    }

    pub fn settings(&self) -> &LoopSettings {
        &self.settings
    }

    pub async fn triage(&self, ticket: &Ticket) -> Result<TriageOutcome> {
        let span = tracing::info_span!(
            "triage",
            ticket_id = %ticket.ticket_id,
            customer_id = %ticket.customer_id,
        );
        self.run(ticket).instrument(span).await
    }

    async fn run(&self, ticket: &Ticket) -> Result<TriageOutcome> {
        let max_rounds = self.settings.max_rounds;
        let mut conversation =
            Conversation::new(prompt::SYSTEM_PROMPT, prompt::ticket_prompt(ticket));
        let mut usage = Usage::default();
        // A Critical answer held back while the incident report is requested.
        let mut pending: Option<(TriageResult, Termination)> = None;

        for round in 1..=max_rounds {
            tracing::debug!(round, max_rounds, "decision round");

            let resp = self.call_llm(&conversation, round, false, &mut usage).await?;

            // ── Capability requests: dispatch and go round again ──────
            if !resp.tool_calls.is_empty() {
                conversation.push_capability_requests(&resp.content, &resp.tool_calls);
                let results = dispatch_all(
                    &self.capabilities,
                    &resp.tool_calls,
                    self.settings.capability_timeout,
                )
                .await;
                conversation.push_capability_results(&results);
                continue;
            }

            // ── Empty turn: fixed degraded result, no retry ───────────
            // Whitespace-only text is still an answer attempt and goes to repair.
            if resp.content.is_empty() {
                tracing::warn!(round, "decision-maker returned an empty turn");
                if let Some((result, termination)) = pending.take() {
                    return Ok(self.finish(ticket, result, termination, round, usage));
                }
                return Ok(self.finish(
                    ticket,
                    TriageResult::no_content(),
                    Termination::ForcedJsonRepair,
                    round,
                    usage,
                ));
            }

            // ── Final answer attempt ──────────────────────────────────
            let (result, termination) = match TriageResult::from_model_output(&resp.content) {
                Ok(result) => (result, Termination::FinalAnswer),
                Err(e) => {
                    tracing::warn!(round, error = %e, "malformed final answer, issuing repair call");
                    let repaired = self
                        .repair(&mut conversation, &resp.content, round, &mut usage)
                        .await?;
                    (repaired, Termination::Repaired)
                }
            };

            if self.missing_incident_report(&result, &conversation) {
                if round < max_rounds {
                    tracing::info!(
                        round,
                        "critical answer without a recorded incident, requesting report"
                    );
                    conversation.push_assistant(serde_json::to_string(&result)?);
                    conversation.push_user(prompt::INCIDENT_REMINDER);
                    pending = Some((result, termination));
                    continue;
                }
                tracing::warn!(
                    round,
                    "critical answer accepted without a recorded incident: no rounds left"
                );
            }

            return Ok(self.finish(ticket, result, termination, round, usage));
        }

        // The report round used up the budget: the held answer still stands.
        if let Some((result, termination)) = pending {
            if !conversation.has_successful_result(INCIDENT_CAPABILITY) {
                tracing::warn!(
                    max_rounds,
                    "critical answer accepted without a recorded incident: no rounds left"
                );
            }
            return Ok(self.finish(ticket, result, termination, max_rounds, usage));
        }

        tracing::warn!(max_rounds, "round budget exhausted without a final answer");
        Ok(self.finish(
            ticket,
            TriageResult::loop_limit_reached(),
            Termination::BudgetExhausted,
            max_rounds,
            usage,
        ))
    }

    fn missing_incident_report(&self, result: &TriageResult, conversation: &Conversation) -> bool {
        self.settings.enforce_incident_report
            && result.urgency == Urgency::Critical
            && self.capabilities.get(INCIDENT_CAPABILITY).is_some()
            && !conversation.has_successful_result(INCIDENT_CAPABILITY)
    }

    /// One strict-JSON call over the full conversation. A second malformed
    /// answer is fatal.
    async fn repair(
        &self,
        conversation: &mut Conversation,
        malformed: &str,
        round: usize,
        usage: &mut Usage,
    ) -> Result<TriageResult> {
        conversation.push_assistant(malformed);
        conversation.push_user(prompt::REPAIR_INSTRUCTION);

        let resp = self.call_llm(conversation, round, true, usage).await?;
        TriageResult::from_model_output(&resp.content).map_err(|e| {
            tracing::error!(round, error = %e, "repair call returned a malformed answer");
            e
        })
    }

    async fn call_llm(
        &self,
        conversation: &Conversation,
        round: usize,
        json_mode: bool,
        usage: &mut Usage,
    ) -> Result<ChatResponse> {
        let model = if json_mode {
            self.settings.repair_model.clone().or_else(|| self.settings.model.clone())
        } else {
            self.settings.model.clone()
        };

        let req = ChatRequest {
            messages: conversation.messages().to_vec(),
            tools: if json_mode { Vec::new() } else { self.tool_defs.clone() },
            temperature: self.settings.temperature,
            max_tokens: self.settings.max_tokens,
            json_mode,
            model,
        };
        let model_name = req
            .model
            .clone()
            .unwrap_or_else(|| self.provider.default_model().to_owned());

        let llm_call_span = tracing::info_span!(
            "llm.call",
            "otel.kind" = "CLIENT",
            model = %model_name,
            round,
            json_mode,
            input_tokens = tracing::field::Empty,
            output_tokens = tracing::field::Empty,
        );

        let start = Instant::now();
        let resp = tokio::time::timeout(self.settings.request_timeout, self.provider.chat(&req))
            .instrument(llm_call_span.clone())
            .await
            .map_err(|_| {
                Error::Timeout(format!(
                    "decision-maker call exceeded {}ms",
                    self.settings.request_timeout.as_millis()
                ))
            })??;

        if let Some(u) = &resp.usage {
            llm_call_span.record("input_tokens", u.prompt_tokens);
            llm_call_span.record("output_tokens", u.completion_tokens);
            usage.accumulate(u);
        }

        TraceEvent::LlmRequest {
            provider: self.provider.provider_id().to_owned(),
            model: model_name,
            round,
            json_mode,
            duration_ms: start.elapsed().as_millis() as u64,
            prompt_tokens: resp.usage.map(|u| u.prompt_tokens),
            completion_tokens: resp.usage.map(|u| u.completion_tokens),
        }
        .emit();

        Ok(resp)
    }

    fn finish(
        &self,
        ticket: &Ticket,
        result: TriageResult,
        termination: Termination,
        rounds: usize,
        usage: Usage,
    ) -> TriageOutcome {
        TraceEvent::LoopTerminated {
            ticket_id: ticket.ticket_id.clone(),
            termination: termination.as_str().to_owned(),
            rounds,
        }
        .emit();

        tracing::info!(
            termination = termination.as_str(),
            rounds,
            urgency = %result.urgency,
            category = %result.category,
            total_tokens = usage.total_tokens,
            "ticket triaged"
        );

        TriageOutcome { result, termination, rounds, usage }
    }
}
