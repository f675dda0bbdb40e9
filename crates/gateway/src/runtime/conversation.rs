//! Append-only transcript for one decision loop invocation.

use std::collections::HashMap;

use tt_domain::tool::{ContentPart, Message, Role, ToolCall};

use super::dispatch::CapabilityResult;

/// Ordered log of every turn exchanged with the decision-maker.
///
/// Owned by a single loop invocation and dropped when it ends. Turns can
/// only be appended.
#[derive(Debug, Clone)]
pub struct Conversation {
    messages: Vec<Message>,
}

impl Conversation {
    pub fn new(system: impl Into<String>, user: impl Into<String>) -> Self {
        Self {
            messages: vec![Message::system(system), Message::user(user)],
        }
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub(crate) fn push_user(&mut self, text: impl Into<String>) {
        self.messages.push(Message::user(text));
    }

    pub(crate) fn push_assistant(&mut self, text: impl Into<String>) {
        self.messages.push(Message::assistant(text));
    }

    /// The decision-maker's turn exactly as requested, before any result.
    pub(crate) fn push_capability_requests(&mut self, text: &str, calls: &[ToolCall]) {
        self.messages.push(Message::assistant_tool_calls(text, calls));
    }

    pub(crate) fn push_capability_results(&mut self, results: &[CapabilityResult]) {
        self.messages.extend(
            results
                .iter()
                .map(|r| Message::tool_result(&r.call_id, &r.content, r.is_error)),
        );
    }

    /// True when some request for `capability` got a non-error result.
    ///
    /// Results are matched against the requests of the assistant turn just
    /// before them, since some backends reuse call ids across turns.
    pub fn has_successful_result(&self, capability: &str) -> bool {
        let mut requested: HashMap<&str, &str> = HashMap::new();

        for message in &self.messages {
            if message.role == Role::Assistant {
                requested.clear();
            }
            for part in message.content.parts() {
                match part {
                    ContentPart::ToolUse { id, name, .. } => {
                        requested.insert(id.as_str(), name.as_str());
                    }
                    ContentPart::ToolResult { tool_use_id, is_error, .. } => {
                        if !*is_error && requested.get(tool_use_id.as_str()) == Some(&capability) {
                            return true;
                        }
                    }
                    ContentPart::Text { .. } => {}
                }
            }
        }
        false
    }
}
