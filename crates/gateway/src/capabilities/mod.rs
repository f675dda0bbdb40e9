//! Capability registry: typed handlers keyed by name.
//!
//! Each capability declares its own argument struct. The raw payload the
//! decision-maker emitted is decoded into that struct at call time; an
//! empty or undecodable payload becomes `Args::default()` so handlers see
//! "all parameters missing" rather than a failed round.

pub mod customer;
pub mod incident;
pub mod knowledge;

use std::collections::HashMap;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use tt_domain::tool::ToolDefinition;
use tt_tools::{CustomerDirectory, IncidentLog, KnowledgeBase};

pub use customer::CustomerProfileCapability;
pub use incident::IncidentReportCapability;
pub use knowledge::KnowledgeSearchCapability;

/// A capability with a typed argument contract.
#[async_trait::async_trait]
pub trait Capability: Send + Sync + 'static {
    type Args: DeserializeOwned + Default + Send;

    fn definition(&self) -> ToolDefinition;

    async fn invoke(&self, args: Self::Args) -> anyhow::Result<String>;
}

/// Type-erased view used by the registry and dispatcher.
#[async_trait::async_trait]
pub trait DynCapability: Send + Sync {
    fn definition(&self) -> ToolDefinition;

    async fn call(&self, raw_arguments: &str) -> anyhow::Result<String>;
}

#[async_trait::async_trait]
impl<C: Capability> DynCapability for C {
    fn definition(&self) -> ToolDefinition {
        Capability::definition(self)
    }

    async fn call(&self, raw_arguments: &str) -> anyhow::Result<String> {
        let name = Capability::definition(self).name;
        let args = decode_arguments::<C::Args>(&name, raw_arguments);
        self.invoke(args).await
    }
}

/// Decode a raw argument payload, substituting the empty parameter set
/// when it is blank or does not match the expected shape.
pub fn decode_arguments<A: DeserializeOwned + Default>(capability: &str, raw: &str) -> A {
    if raw.trim().is_empty() {
        return A::default();
    }
    match serde_json::from_str::<A>(raw) {
        Ok(args) => args,
        Err(e) => {
            tracing::warn!(
                capability = %capability,
                error = %e,
                "undecodable capability arguments, using empty parameter set"
            );
            A::default()
        }
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Registry
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Default)]
pub struct CapabilityRegistry {
    handlers: HashMap<String, Arc<dyn DynCapability>>,
}

impl CapabilityRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a capability under its definition name. A later
    /// registration with the same name replaces the earlier one.
    pub fn register<C: Capability>(mut self, capability: C) -> Self {
        let name = Capability::definition(&capability).name;
        self.handlers.insert(name, Arc::new(capability));
        self
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn DynCapability>> {
        self.handlers.get(name).cloned()
    }

    /// Definitions offered to the decision-maker, sorted by name.
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        let mut defs: Vec<ToolDefinition> =
            self.handlers.values().map(|h| h.definition()).collect();
        defs.sort_by(|a, b| a.name.cmp(&b.name));
        defs
    }

    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.handlers.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

/// The three triage capabilities wired to their collaborators.
pub fn build_default_registry(
    directory: Arc<CustomerDirectory>,
    knowledge: Arc<KnowledgeBase>,
    incidents: Arc<IncidentLog>,
    max_results: usize,
) -> CapabilityRegistry {
    CapabilityRegistry::new()
        .register(CustomerProfileCapability::new(directory))
        .register(KnowledgeSearchCapability::new(knowledge, max_results))
        .register(IncidentReportCapability::new(incidents))
}

/// Accepts `true`/`false` as booleans or strings; anything else is absent.
pub(crate) fn lenient_bool<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::Deserialize;

    Ok(match Option::<serde_json::Value>::deserialize(deserializer)? {
        Some(serde_json::Value::Bool(b)) => Some(b),
        Some(serde_json::Value::String(s)) => s.trim().to_ascii_lowercase().parse().ok(),
        _ => None,
    })
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Tests
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Default, Deserialize, PartialEq)]
    #[serde(default)]
    struct Args {
        query: Option<String>,
        limit: Option<u32>,
    }

    #[test]
    fn decode_valid_payload() {
        let a: Args = decode_arguments("t", r#"{"query":"refund","limit":2}"#);
        assert_eq!(a, Args { query: Some("refund".into()), limit: Some(2) });
    }

    #[test]
    fn decode_blank_payload_is_default() {
        let a: Args = decode_arguments("t", "   ");
        assert_eq!(a, Args::default());
    }

    #[test]
    fn decode_malformed_payload_is_default() {
        assert_eq!(decode_arguments::<Args>("t", "{query: refund"), Args::default());
        assert_eq!(decode_arguments::<Args>("t", "[1, 2]"), Args::default());
        assert_eq!(decode_arguments::<Args>("t", r#"{"limit":"two"}"#), Args::default());
    }

    #[test]
    fn decode_partial_payload_keeps_present_fields() {
        let a: Args = decode_arguments("t", r#"{"query":"sso"}"#);
        assert_eq!(a.query.as_deref(), Some("sso"));
        assert!(a.limit.is_none());
    }

    #[test]
    fn default_registry_lists_sorted_definitions() {
        let tmp = tempfile::tempdir().unwrap();
        let registry = build_default_registry(
            Arc::new(CustomerDirectory::builtin()),
            Arc::new(KnowledgeBase::builtin()),
            Arc::new(IncidentLog::new(tmp.path().join("incidents.jsonl"))),
            3,
        );
        assert_eq!(registry.len(), 3);
        let names: Vec<String> = registry.definitions().into_iter().map(|d| d.name).collect();
        assert_eq!(
            names,
            vec!["get_customer_profile", "report_critical_incident", "search_knowledge_base"]
        );
        assert!(registry.get("search_knowledge_base").is_some());
        assert!(registry.get("delete_everything").is_none());
    }

    #[derive(Debug, Default, Deserialize)]
    #[serde(default)]
    struct Flag {
        #[serde(deserialize_with = "lenient_bool")]
        on: Option<bool>,
    }

    #[test]
    fn lenient_bool_accepts_strings() {
        let f: Flag = serde_json::from_str(r#"{"on":"True"}"#).unwrap();
        assert_eq!(f.on, Some(true));
        let f: Flag = serde_json::from_str(r#"{"on":false}"#).unwrap();
        assert_eq!(f.on, Some(false));
        let f: Flag = serde_json::from_str(r#"{"on":"maybe"}"#).unwrap();
        assert_eq!(f.on, None);
        let f: Flag = serde_json::from_str(r#"{}"#).unwrap();
        assert_eq!(f.on, None);
    }
}
