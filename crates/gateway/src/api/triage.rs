use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};

use tt_domain::ticket::Ticket;

use crate::state::AppState;

/// Shown to callers on any internal failure. Details stay in the logs.
const INTERNAL_ERROR: &str = "internal error while triaging ticket";

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// POST /v1/triage
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

pub async fn triage(State(state): State<AppState>, Json(ticket): Json<Ticket>) -> Response {
    if ticket.ticket_id.trim().is_empty() || ticket.customer_id.trim().is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({
                "error": "ticket_id and customer_id are required"
            })),
        )
            .into_response();
    }

    match state.orchestrator.triage(&ticket).await {
        Ok(outcome) => Json(outcome.result).into_response(),
        Err(e) => {
            tracing::error!(ticket_id = %ticket.ticket_id, error = %e, "triage failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({ "error": INTERNAL_ERROR })),
            )
                .into_response()
        }
    }
}
