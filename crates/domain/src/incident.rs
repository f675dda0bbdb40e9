use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// One line of the critical-incident audit log.
///
/// Field order is the on-disk schema consumed by operators. New fields go
/// at the end.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncidentRecord {
    pub timestamp: String,
    pub customer_id: String,
    pub risk_level: String,
    pub category: String,
    pub kb_found: bool,
    pub summary: String,
}

impl IncidentRecord {
    pub fn new(
        customer_id: impl Into<String>,
        risk_level: impl Into<String>,
        category: impl Into<String>,
        kb_found: bool,
        summary: impl Into<String>,
    ) -> Self {
        Self::at(Utc::now(), customer_id, risk_level, category, kb_found, summary)
    }

    pub fn at(
        when: DateTime<Utc>,
        customer_id: impl Into<String>,
        risk_level: impl Into<String>,
        category: impl Into<String>,
        kb_found: bool,
        summary: impl Into<String>,
    ) -> Self {
        Self {
            timestamp: when.to_rfc3339_opts(SecondsFormat::Secs, true),
            customer_id: customer_id.into(),
            risk_level: risk_level.into(),
            category: category.into(),
            kb_found,
            summary: summary.into(),
        }
    }
}
