use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tt_domain::error::{Error, Result};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerProfile {
    pub customer_id: String,
    pub plan: String,
    pub region: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seats: Option<u32>,
    pub months_active: u32,
    pub previous_critical_incidents: u32,
}

/// Read-only lookup of customer subscription details.
#[derive(Debug, Clone, Default)]
pub struct CustomerDirectory {
    profiles: HashMap<String, CustomerProfile>,
}

impl CustomerDirectory {
    pub fn new(profiles: impl IntoIterator<Item = CustomerProfile>) -> Self {
        Self {
            profiles: profiles
                .into_iter()
                .map(|p| (p.customer_id.clone(), p))
                .collect(),
        }
    }

    /// The three demo accounts shipped with the service.
    pub fn builtin() -> Self {
        Self::new([
            CustomerProfile {
                customer_id: "CUST_001".into(),
                plan: "Free".into(),
                region: "US".into(),
                seats: None,
                months_active: 4,
                previous_critical_incidents: 1,
            },
            CustomerProfile {
                customer_id: "CUST_002".into(),
                plan: "Enterprise".into(),
                region: "Thailand".into(),
                seats: Some(45),
                months_active: 8,
                previous_critical_incidents: 0,
            },
            CustomerProfile {
                customer_id: "CUST_003".into(),
                plan: "Pro".into(),
                region: "Sweden".into(),
                seats: None,
                months_active: 5,
                previous_critical_incidents: 2,
            },
        ])
    }

    /// Load profiles from a JSON array file.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        let profiles: Vec<CustomerProfile> = serde_json::from_str(&raw)
            .map_err(|e| Error::Config(format!("customer directory {}: {e}", path.display())))?;
        Ok(Self::new(profiles))
    }

    pub fn lookup(&self, customer_id: &str) -> Option<&CustomerProfile> {
        self.profiles.get(customer_id.trim())
    }

    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }
}
