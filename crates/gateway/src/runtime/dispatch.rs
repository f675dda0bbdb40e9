//! Capability dispatch.
//!
//! Every requested call runs as its own task with a timeout. Results are
//! joined back in request order and there is exactly one result per
//! request: unknown names, handler errors, timeouts and panics all become
//! error payloads the decision-maker reads as data.

use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::Serialize;
use tracing::Instrument;
use tt_domain::tool::ToolCall;
use tt_domain::trace::TraceEvent;

use crate::capabilities::CapabilityRegistry;

/// Outcome of one capability call, correlated to its request id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CapabilityResult {
    pub call_id: String,
    pub name: String,
    pub content: String,
    pub is_error: bool,
}

/// Dispatch all calls from one turn concurrently. The returned vector has
/// the same length and order as `calls`.
pub async fn dispatch_all(
    registry: &Arc<CapabilityRegistry>,
    calls: &[ToolCall],
    timeout: Duration,
) -> Vec<CapabilityResult> {
    let futures = calls.iter().map(|tc| {
        let span = tracing::info_span!(
            "capability.call",
            capability = %tc.tool_name,
            call_id = %tc.call_id,
        );
        dispatch_one(Arc::clone(registry), tc.clone(), timeout).instrument(span)
    });
    futures_util::future::join_all(futures).await
}

async fn dispatch_one(
    registry: Arc<CapabilityRegistry>,
    call: ToolCall,
    timeout: Duration,
) -> CapabilityResult {
    let start = Instant::now();

    let (content, is_error) = match registry.get(&call.tool_name) {
        None => {
            tracing::warn!(capability = %call.tool_name, "unknown capability requested");
            let payload = serde_json::json!({
                "error": format!("capability not found: {}", call.tool_name),
                "available": registry.names(),
            });
            (payload.to_string(), true)
        }
        Some(handler) => {
            let raw = call.arguments.clone();
            let mut task = tokio::spawn(
                async move { handler.call(&raw).await }.in_current_span(),
            );

            match tokio::time::timeout(timeout, &mut task).await {
                Ok(Ok(Ok(text))) => (text, false),
                Ok(Ok(Err(e))) => {
                    tracing::warn!(error = %format!("{e:#}"), "capability failed");
                    (error_payload(format!("{e:#}")), true)
                }
                Ok(Err(join_err)) => {
                    tracing::error!(error = %join_err, "capability task aborted");
                    let msg = if join_err.is_panic() {
                        format!("capability {} panicked", call.tool_name)
                    } else {
                        format!("capability {} was cancelled", call.tool_name)
                    };
                    (error_payload(msg), true)
                }
                Err(_) => {
                    task.abort();
                    tracing::warn!(timeout_ms = timeout.as_millis() as u64, "capability timed out");
                    (
                        error_payload(format!(
                            "capability {} timed out after {}ms",
                            call.tool_name,
                            timeout.as_millis()
                        )),
                        true,
                    )
                }
            }
        }
    };

    TraceEvent::CapabilityDispatched {
        call_id: call.call_id.clone(),
        capability: call.tool_name.clone(),
        is_error,
        duration_ms: start.elapsed().as_millis() as u64,
    }
    .emit();

    CapabilityResult {
        call_id: call.call_id,
        name: call.tool_name,
        content,
        is_error,
    }
}

fn error_payload(message: String) -> String {
    serde_json::json!({ "error": message }).to_string()
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Tests
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
