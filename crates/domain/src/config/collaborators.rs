use std::path::PathBuf;

use serde::{Deserialize, Serialize};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Audit log
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditConfig {
    /// Append-only JSONL file receiving one record per critical incident.
    #[serde(default = "d_incident_log")]
    pub incident_log_path: PathBuf,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            incident_log_path: d_incident_log(),
        }
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Knowledge base
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KnowledgeConfig {
    #[serde(default = "d_3")]
    pub max_results: usize,
}

impl Default for KnowledgeConfig {
    fn default() -> Self {
        Self { max_results: 3 }
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Customer directory
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CustomersConfig {
    /// JSON array of profiles replacing the built-in directory.
    #[serde(default)]
    pub directory_path: Option<PathBuf>,
}

fn d_incident_log() -> PathBuf {
    PathBuf::from("./data_logs/critical_incidents.jsonl")
}
fn d_3() -> usize {
    3
}
