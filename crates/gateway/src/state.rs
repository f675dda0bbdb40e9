use std::sync::Arc;

use tt_domain::config::Config;

use crate::capabilities::CapabilityRegistry;
use crate::runtime::Orchestrator;

/// Shared application state passed to all API handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub capabilities: Arc<CapabilityRegistry>,
    pub orchestrator: Arc<Orchestrator>,
}
