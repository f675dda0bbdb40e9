use std::fmt;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// An incoming support ticket. Immutable once received.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ticket {
    pub ticket_id: String,
    #[serde(alias = "member_no")]
    pub customer_id: String,
    #[serde(default)]
    pub messages: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Urgency {
    Critical,
    High,
    Medium,
    Low,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    Billing,
    Technical,
    #[serde(rename = "Feature Request")]
    FeatureRequest,
    General,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SuggestedAction {
    #[serde(rename = "Auto-respond")]
    AutoRespond,
    #[serde(rename = "Route to Specialist")]
    RouteToSpecialist,
    #[serde(rename = "Escalate to Human")]
    EscalateToHuman,
}

impl fmt::Display for Urgency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Urgency::Critical => "Critical",
            Urgency::High => "High",
            Urgency::Medium => "Medium",
            Urgency::Low => "Low",
        })
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Category::Billing => "Billing",
            Category::Technical => "Technical",
            Category::FeatureRequest => "Feature Request",
            Category::General => "General",
        })
    }
}

/// The structured disposition returned for every ticket.
///
/// Every field is required on decode; there is no partially filled value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TriageResult {
    pub urgency: Urgency,
    pub sentiment: String,
    pub category: Category,
    pub summary: String,
    pub suggested_action: SuggestedAction,
    pub draft_response: String,
}

impl TriageResult {
    /// Degraded result for a final turn with neither text nor capability calls.
    pub fn no_content() -> Self {
        Self {
            urgency: Urgency::Low,
            sentiment: "Neutral".into(),
            category: Category::General,
            summary: "No content generated".into(),
            suggested_action: SuggestedAction::EscalateToHuman,
            draft_response: "Error in AI generation".into(),
        }
    }

    /// Degraded result when the round budget runs out without a final answer.
    pub fn loop_limit_reached() -> Self {
        Self {
            urgency: Urgency::High,
            sentiment: "Unknown".into(),
            category: Category::General,
            summary: "Process timed out or loop limit reached".into(),
            suggested_action: SuggestedAction::EscalateToHuman,
            draft_response: "Error: Processing Limit Reached".into(),
        }
    }

    /// Strictly decode a final answer. Surrounding whitespace and a single
    /// enclosing Markdown code fence are tolerated; anything else is not.
    pub fn from_model_output(text: &str) -> Result<Self> {
        let body = strip_code_fence(text.trim());
        if body.is_empty() {
            return Err(Error::MalformedAnswer("empty answer".into()));
        }
        serde_json::from_str(body).map_err(|e| Error::MalformedAnswer(e.to_string()))
    }
}

fn strip_code_fence(text: &str) -> &str {
    static FENCE: OnceLock<Option<Regex>> = OnceLock::new();
    let re = FENCE.get_or_init(|| Regex::new(r"(?s)^```[A-Za-z0-9_-]*\s*\n(.*?)\n?\s*```$").ok());
    match re.as_ref().and_then(|re| re.captures(text)).and_then(|c| c.get(1)) {
        Some(inner) => inner.as_str().trim(),
        None => text,
    }
}
