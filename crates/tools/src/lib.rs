//! Collaborators behind the triage capabilities.
//!
//! - `customer`: read-only customer directory (built-in mock data or a JSON file)
//! - `knowledge`: keyword-scored knowledge base search
//! - `audit`: append-only, fsynced JSONL incident log

pub mod audit;
pub mod customer;
pub mod knowledge;

pub use audit::IncidentLog;
pub use customer::{CustomerDirectory, CustomerProfile};
pub use knowledge::{KnowledgeBase, KnowledgeDoc, NO_RESULTS};
