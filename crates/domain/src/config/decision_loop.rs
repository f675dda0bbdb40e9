use serde::{Deserialize, Serialize};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Decision loop
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionLoopConfig {
    /// Decision-maker rounds allowed per ticket before the loop gives up.
    #[serde(default = "d_4")]
    pub max_rounds: usize,
    /// Upper bound for a single capability invocation.
    #[serde(default = "d_10000")]
    pub capability_timeout_ms: u64,
    /// Require a successful incident report before accepting a Critical
    /// answer, spending one more round on it when the budget allows.
    #[serde(default = "d_true")]
    pub enforce_incident_report: bool,
}

impl Default for DecisionLoopConfig {
    fn default() -> Self {
        Self {
            max_rounds: 4,
            capability_timeout_ms: 10_000,
            enforce_incident_report: true,
        }
    }
}

fn d_4() -> usize {
    4
}
fn d_10000() -> u64 {
    10_000
}
fn d_true() -> bool {
    true
}
