use serde::Serialize;

/// Structured trace events emitted across the triage crates.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event")]
pub enum TraceEvent {
    LlmRequest {
        provider: String,
        model: String,
        round: usize,
        json_mode: bool,
        duration_ms: u64,
        prompt_tokens: Option<u32>,
        completion_tokens: Option<u32>,
    },
    CapabilityDispatched {
        call_id: String,
        capability: String,
        is_error: bool,
        duration_ms: u64,
    },
    LoopTerminated {
        ticket_id: String,
        termination: String,
        rounds: usize,
    },
    IncidentRecorded {
        customer_id: String,
        risk_level: String,
        kb_found: bool,
    },
}

impl TraceEvent {
    pub fn emit(&self) {
        let json = serde_json::to_string(self).unwrap_or_default();
        tracing::info!(trace_event = %json, "tt_event");
    }
}
