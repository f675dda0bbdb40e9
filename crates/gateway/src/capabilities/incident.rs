use std::sync::Arc;

use anyhow::Context;
use serde::Deserialize;
use tt_domain::incident::IncidentRecord;
use tt_domain::tool::ToolDefinition;
use tt_tools::IncidentLog;

use super::{lenient_bool, Capability};

const DEFAULT_RISK_LEVEL: &str = "Critical";
const UNKNOWN_CUSTOMER: &str = "unknown";
const UNSPECIFIED_CATEGORY: &str = "unspecified";

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct IncidentArgs {
    #[serde(alias = "member_no")]
    pub customer_id: Option<String>,
    pub category: Option<String>,
    #[serde(alias = "summary")]
    pub issue_summary: Option<String>,
    pub risk_level: Option<String>,
    #[serde(deserialize_with = "lenient_bool")]
    pub kb_found: Option<bool>,
}

impl IncidentArgs {
    /// Fill conservative defaults for anything the decision-maker left out.
    pub fn into_record(self) -> IncidentRecord {
        IncidentRecord::new(
            non_blank(self.customer_id).unwrap_or_else(|| UNKNOWN_CUSTOMER.into()),
            non_blank(self.risk_level).unwrap_or_else(|| DEFAULT_RISK_LEVEL.into()),
            non_blank(self.category).unwrap_or_else(|| UNSPECIFIED_CATEGORY.into()),
            self.kb_found.unwrap_or(false),
            self.issue_summary.unwrap_or_default(),
        )
    }
}

fn non_blank(v: Option<String>) -> Option<String> {
    v.map(|s| s.trim().to_owned()).filter(|s| !s.is_empty())
}

/// `report_critical_incident`: the only capability with a durable side effect.
pub struct IncidentReportCapability {
    log: Arc<IncidentLog>,
}

impl IncidentReportCapability {
    pub fn new(log: Arc<IncidentLog>) -> Self {
        Self { log }
    }
}

#[async_trait::async_trait]
impl Capability for IncidentReportCapability {
    type Args = IncidentArgs;

    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: "report_critical_incident".into(),
            description: "Record a critical incident in the audit trail. MUST be called before answering when urgency is Critical.".into(),
            parameters: serde_json::json!({
                "type": "object",
                "properties": {
                    "customer_id": {
                        "type": "string",
                        "description": "The customer identifier"
                    },
                    "category": {
                        "type": "string",
                        "description": "Issue category (Billing, Technical, Feature Request, General)"
                    },
                    "issue_summary": {
                        "type": "string",
                        "description": "Brief description of the critical issue"
                    },
                    "risk_level": {
                        "type": "string",
                        "enum": ["Critical", "High"],
                        "description": "The assessed risk level"
                    },
                    "kb_found": {
                        "type": "boolean",
                        "description": "Whether relevant knowledge base guidance was found"
                    }
                },
                "required": ["customer_id", "category", "issue_summary"]
            }),
        }
    }

    async fn invoke(&self, args: IncidentArgs) -> anyhow::Result<String> {
        let record = args.into_record();
        self.log
            .append(&record)
            .await
            .context("failed to log incident")?;

        tracing::info!(
            customer_id = %record.customer_id,
            risk_level = %record.risk_level,
            path = %self.log.path().display(),
            "critical incident recorded"
        );

        Ok(format!(
            "Critical incident logged successfully. Risk Level: {}, KB Found: {}",
            record.risk_level, record.kb_found
        ))
    }
}
