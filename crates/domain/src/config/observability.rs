use serde::{Deserialize, Serialize};

use super::ConfigError;

/// Span export for the triage service.
///
/// Structured JSON logs are always written. Setting `otlp_endpoint` also
/// ships the `triage`, `llm.call` and `capability.call` spans to an
/// OTLP/gRPC collector.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    /// e.g. `http://localhost:4317`. Unset disables export.
    #[serde(default)]
    pub otlp_endpoint: Option<String>,

    #[serde(default = "d_service_name")]
    pub service_name: String,

    /// Fraction of tickets whose trace is exported, `0.0..=1.0`. Sampling is
    /// decided per trace, so one ticket's spans are kept or dropped together.
    #[serde(default = "d_sample_rate")]
    pub sample_rate: f64,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            otlp_endpoint: None,
            service_name: d_service_name(),
            sample_rate: d_sample_rate(),
        }
    }
}

impl ObservabilityConfig {
    pub(super) fn validate(&self, errors: &mut Vec<ConfigError>) {
        if !(0.0..=1.0).contains(&self.sample_rate) {
            errors.push(ConfigError::error(
                "observability.sample_rate",
                "sample_rate must be between 0.0 and 1.0",
            ));
        }

        let Some(endpoint) = &self.otlp_endpoint else {
            return;
        };
        if !(endpoint.starts_with("http://") || endpoint.starts_with("https://")) {
            errors.push(ConfigError::error(
                "observability.otlp_endpoint",
                "endpoint must be an http:// or https:// URL",
            ));
        }
        if self.service_name.trim().is_empty() {
            errors.push(ConfigError::error(
                "observability.service_name",
                "service_name must not be empty when exporting spans",
            ));
        }
        if self.sample_rate == 0.0 {
            errors.push(ConfigError::warning(
                "observability.sample_rate",
                "otlp_endpoint is set but no ticket traces will be sampled",
            ));
        }
    }
}

fn d_service_name() -> String {
    "triage-agent".into()
}

fn d_sample_rate() -> f64 {
    1.0
}
