use std::sync::Arc;

use serde::Deserialize;
use tt_domain::tool::ToolDefinition;
use tt_tools::CustomerDirectory;

use super::Capability;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ProfileArgs {
    #[serde(alias = "member_no")]
    pub customer_id: Option<String>,
}

/// `get_customer_profile`: read-only directory lookup.
pub struct CustomerProfileCapability {
    directory: Arc<CustomerDirectory>,
}

impl CustomerProfileCapability {
    pub fn new(directory: Arc<CustomerDirectory>) -> Self {
        Self { directory }
    }
}

#[async_trait::async_trait]
impl Capability for CustomerProfileCapability {
    type Args = ProfileArgs;

    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: "get_customer_profile".into(),
            description: "Get customer subscription details, plan type, and incident history.".into(),
            parameters: serde_json::json!({
                "type": "object",
                "properties": {
                    "customer_id": {
                        "type": "string",
                        "description": "The customer identifier (e.g. CUST_001)"
                    }
                },
                "required": ["customer_id"]
            }),
        }
    }

    async fn invoke(&self, args: ProfileArgs) -> anyhow::Result<String> {
        let customer_id = args
            .customer_id
            .filter(|id| !id.trim().is_empty())
            .ok_or_else(|| anyhow::anyhow!("customer_id is required"))?;

        let profile = self
            .directory
            .lookup(&customer_id)
            .ok_or_else(|| anyhow::anyhow!("customer not found: {customer_id}"))?;

        Ok(serde_json::to_string(profile)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capabilities::DynCapability;

    fn capability() -> CustomerProfileCapability {
        CustomerProfileCapability::new(Arc::new(CustomerDirectory::builtin()))
    }

    #[tokio::test]
    async fn returns_profile_json() {
        let out = capability().call(r#"{"customer_id":"CUST_002"}"#).await.unwrap();
        let v: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(v["plan"], "Enterprise");
        assert_eq!(v["region"], "Thailand");
    }

    #[tokio::test]
    async fn accepts_member_no_alias() {
        let out = capability().call(r#"{"member_no":"CUST_003"}"#).await.unwrap();
        assert!(out.contains("Sweden"));
    }

    #[tokio::test]
    async fn unknown_customer_is_an_error() {
        let err = capability().call(r#"{"customer_id":"NOPE"}"#).await.unwrap_err();
        assert!(err.to_string().contains("customer not found"));
    }

    #[tokio::test]
    async fn malformed_arguments_fail_as_missing_id() {
        let err = capability().call("{{{").await.unwrap_err();
        assert!(err.to_string().contains("required"));
    }
}
