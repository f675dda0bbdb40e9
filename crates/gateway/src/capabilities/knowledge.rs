use std::sync::Arc;

use serde::Deserialize;
use tt_domain::tool::ToolDefinition;
use tt_tools::KnowledgeBase;

use super::Capability;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct SearchArgs {
    pub query: Option<String>,
}

/// `search_knowledge_base`: ranked snippets or the no-results sentinel.
pub struct KnowledgeSearchCapability {
    knowledge: Arc<KnowledgeBase>,
    max_results: usize,
}

impl KnowledgeSearchCapability {
    pub fn new(knowledge: Arc<KnowledgeBase>, max_results: usize) -> Self {
        Self { knowledge, max_results: max_results.max(1) }
    }
}

#[async_trait::async_trait]
impl Capability for KnowledgeSearchCapability {
    type Args = SearchArgs;

    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: "search_knowledge_base".into(),
            description: "Search internal documentation for troubleshooting steps, refund policies, SLAs and escalation rules.".into(),
            parameters: serde_json::json!({
                "type": "object",
                "properties": {
                    "query": {
                        "type": "string",
                        "description": "Search query describing the issue (e.g. 'refund policy', 'error 500')"
                    }
                },
                "required": ["query"]
            }),
        }
    }

    async fn invoke(&self, args: SearchArgs) -> anyhow::Result<String> {
        let query = args.query.unwrap_or_default();
        tracing::debug!(query = %query, "knowledge base search");
        Ok(self.knowledge.search_text(&query, self.max_results))
    }
}
