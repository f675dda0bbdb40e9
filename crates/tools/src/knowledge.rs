//! Keyword-scored knowledge base.
//!
//! A document scores one point for every keyword that occurs in the
//! lower-cased query. Zero-score documents are dropped and ties keep
//! catalogue order, so identical queries always yield identical output.

use serde::{Deserialize, Serialize};

/// Returned by the search capability when nothing matches. Distinct from
/// any error payload.
pub const NO_RESULTS: &str = "No relevant documentation found in Knowledge Base.";

/// Separator between hits in the rendered search output.
pub const HIT_SEPARATOR: &str = "\n---\n";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KnowledgeDoc {
    pub id: u32,
    pub content: String,
    pub keywords: Vec<String>,
}

#[derive(Debug, Clone, Default)]
pub struct KnowledgeBase {
    docs: Vec<KnowledgeDoc>,
}

impl KnowledgeBase {
    pub fn new(docs: Vec<KnowledgeDoc>) -> Self {
        Self { docs }
    }

    /// The built-in support articles.
    pub fn builtin() -> Self {
        Self::new(
            BUILTIN_DOCS
                .iter()
                .map(|(id, content, keywords)| KnowledgeDoc {
                    id: *id,
                    content: (*content).to_owned(),
                    keywords: keywords.iter().map(|k| (*k).to_owned()).collect(),
                })
                .collect(),
        )
    }

    /// Ranked matches for `query`, at most `limit` of them.
    pub fn search(&self, query: &str, limit: usize) -> Vec<&KnowledgeDoc> {
        let query = query.to_lowercase();

        let mut scored: Vec<(usize, &KnowledgeDoc)> = self
            .docs
            .iter()
            .map(|doc| {
                let score = doc
                    .keywords
                    .iter()
                    .filter(|k| query.contains(k.to_lowercase().as_str()))
                    .count();
                (score, doc)
            })
            .filter(|(score, _)| *score > 0)
            .collect();

        // Stable sort: equal scores keep catalogue order.
        scored.sort_by(|a, b| b.0.cmp(&a.0));
        scored.into_iter().take(limit).map(|(_, doc)| doc).collect()
    }

    /// Search and render the hits the way the decision-maker reads them.
    pub fn search_text(&self, query: &str, limit: usize) -> String {
        let hits = self.search(query, limit);
        if hits.is_empty() {
            return NO_RESULTS.to_owned();
        }
        hits.iter()
            .map(|d| d.content.as_str())
            .collect::<Vec<_>>()
            .join(HIT_SEPARATOR)
    }

    pub fn len(&self) -> usize {
        self.docs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.docs.is_empty()
    }
}

type SeedDoc = (u32, &'static str, &'static [&'static str]);

const BUILTIN_DOCS: &[SeedDoc] = &[
    // Payments
    (
        101,
        "Refund Policy: Refunds are processed within 5-7 business days after approval. If a customer reports duplicate charges or failed upgrades (Free to Pro), escalate to Billing Team if there are more than 2 failed attempts or financial impact.",
        &["refund", "money back", "duplicate charge", "payment failed", "upgrade error", "billing"],
    ),
    (
        102,
        "Subscription Renewal & Cancellation: Subscription renewal occurs automatically. To avoid being charged, users must cancel at least 24 hours before the billing date.",
        &["cancel", "renewal", "subscription", "stop payment", "charge", "auto-renew"],
    ),
    // Authentication
    (
        201,
        "Login Issues & Password Reset: Password reset emails may take up to 5 minutes to arrive. Error 401 or 403 indicates authentication failure. If multiple login attempts fail across devices, check account lock status.",
        &["login", "password reset", "email", "cant log in", "error 401", "error 403", "locked"],
    ),
    (
        202,
        "Enterprise SSO Failure: If an Enterprise user cannot log in via SSO, this is a High priority issue. Escalate immediately.",
        &["sso", "enterprise login", "company login", "sign in"],
    ),
    // Outages
    (
        301,
        "System Error 500 & Outages: Error 500 indicates an internal server error. Check the status page first. If multiple users from the same region (e.g., Asia, Thailand) report an outage, classify as Critical. Enterprise customers receive SLA priority handling.",
        &["error 500", "server error", "system down", "outage", "crash", "white screen"],
    ),
    (
        302,
        "Troubleshooting Steps for Outages: Before escalating, collect the following: Screenshot of the error, Timestamp of occurrence, and User Region.",
        &["troubleshoot", "debug", "screenshot", "info needed", "check"],
    ),
    // Video sessions
    (
        401,
        "Video Call Troubleshooting: Ensure Microphone and Camera permissions are enabled. Latest Chrome or Safari browsers are recommended. If session fails due to unstable internet, suggest switching networks.",
        &["video", "camera", "mic", "sound", "image", "browser", "chrome", "safari"],
    ),
    (
        402,
        "Therapist Unavailability: If a therapist is unavailable for a booked session, offer rebooking or credit compensation. Escalate if the session fails after 2 retry attempts.",
        &["therapist", "doctor", "missing", "late", "rebook", "compensation", "credit"],
    ),
    // Settings
    (
        501,
        "Dark Mode Settings: Dark mode is available in Settings > Appearance (Pro plan and above only). Auto-scheduling for Dark Mode is not currently supported.",
        &["dark mode", "theme", "appearance", "black screen", "schedule"],
    ),
    (
        502,
        "Notifications: Push notification preferences are configurable in Settings > Notifications.",
        &["notification", "alert", "push", "settings"],
    ),
    // Privacy
    (
        601,
        "Data Privacy & Deletion: Users can request data export (GDPR compliance). Account deletion requests are processed within 7 days. Therapy notes are encrypted and NOT accessible by support agents.",
        &["privacy", "gdpr", "delete account", "export data", "therapy notes", "confidential"],
    ),
    (
        602,
        "Data Breach Protocol: Escalate IMMEDIATELY if a user reports a suspected data breach.",
        &["breach", "hacked", "leak", "security", "stolen data"],
    ),
    // SLA
    (
        701,
        "SLA Response Times: Free plan: 24-48 hours. Pro plan: 12-24 hours. Enterprise plan: 1-4 hours. Critical incidents require immediate engineering notification.",
        &["sla", "response time", "wait time", "how long", "urgent"],
    ),
    // FAQ
    (
        901,
        "FAQ: Why was I charged multiple times? Answer: This often happens during failed upgrades. Duplicate charges are usually pending pre-authorizations and will be reversed. If not, we can process a refund within 5-7 business days.",
        &["charged twice", "double charge", "triple charge", "why charged"],
    ),
    (
        902,
        "FAQ: Can I schedule Dark Mode to turn on automatically? Answer: No, auto-scheduling is not currently supported. You can manually toggle it in Settings > Appearance if you are on a Pro plan.",
        &["auto dark mode", "schedule theme", "night mode"],
    ),
    (
        903,
        "FAQ: My video session keeps disconnecting. Answer: Please check your internet connection and try using Chrome or Safari. Ensure camera/mic permissions are allowed.",
        &["disconnect", "video lag", "cant see", "cant hear"],
    ),
];
