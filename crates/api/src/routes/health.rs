use axum::{routing::get, Router};

use crate::state::AppState;

/// GET /status/check -- plaintext liveness probe.
///
/// Touches no shared state, so it answers regardless of in-flight pulls.
async fn status_check() -> &'static str {
    "OK"
}

/// Mount the liveness route.
pub fn router() -> Router<AppState> {
    Router::new().route("/status/check", get(status_check))
}
