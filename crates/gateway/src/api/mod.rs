pub mod health;
pub mod triage;

use axum::routing::{get, post};
use axum::Router;

use crate::state::AppState;

/// Build the API router.
///
/// `POST /triage` is kept next to the versioned route for existing callers.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(health::root))
        .route("/v1/health", get(health::health))
        .route("/v1/capabilities", get(health::capabilities))
        .route("/v1/triage", post(triage::triage))
        .route("/triage", post(triage::triage))
}
