use serde::{Deserialize, Serialize};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Decision-maker endpoint
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// OpenAI-compatible chat completions endpoint consulted every round.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Base URL; `/chat/completions` is appended.
    #[serde(default = "d_base_url")]
    pub base_url: String,
    #[serde(default = "d_model")]
    pub model: String,
    /// Model used for the single strict-JSON repair call.
    /// Falls back to `model` when unset.
    #[serde(default)]
    pub repair_model: Option<String>,
    #[serde(default)]
    pub temperature: Option<f32>,
    #[serde(default)]
    pub max_tokens: Option<u32>,
    /// Upper bound for one decision-maker call.
    #[serde(default = "d_60000")]
    pub request_timeout_ms: u64,
    #[serde(default)]
    pub auth: AuthConfig,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: d_base_url(),
            model: d_model(),
            repair_model: None,
            temperature: None,
            max_tokens: None,
            request_timeout_ms: 60_000,
            auth: AuthConfig::default(),
        }
    }
}

impl LlmConfig {
    pub fn effective_repair_model(&self) -> &str {
        self.repair_model.as_deref().unwrap_or(&self.model)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Header name (e.g. "Authorization", "api-key").
    #[serde(default = "d_header")]
    pub header: String,
    /// Header value prefix (e.g. "Bearer ").
    #[serde(default = "d_prefix")]
    pub prefix: String,
    /// Env var containing the key.
    #[serde(default = "d_env")]
    pub env: Option<String>,
    /// Direct key (for config-only setups; prefer env).
    #[serde(default)]
    pub key: Option<String>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            header: d_header(),
            prefix: d_prefix(),
            env: d_env(),
            key: None,
        }
    }
}

// ── serde default helpers ───────────────────────────────────────────

fn d_base_url() -> String {
    "https://api.openai.com/v1".into()
}
fn d_model() -> String {
    "gpt-4o-mini".into()
}
fn d_60000() -> u64 {
    60_000
}
fn d_header() -> String {
    "Authorization".into()
}
fn d_prefix() -> String {
    "Bearer ".into()
}
fn d_env() -> Option<String> {
    Some("OPENAI_API_KEY".into())
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Tests
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
