pub mod health;
pub mod images;
pub mod root;

use axum::Router;

use crate::state::AppState;

/// Build the gateway route tree.
///
/// ```text
/// POST /{version}/images/create    pull an image (streaming JSON)
/// GET  /status/check               liveness probe
/// GET  /                           "nothing to see here"
/// ```
pub fn gateway_routes() -> Router<AppState> {
    Router::new()
        .merge(images::router())
        .merge(health::router())
        .merge(root::router())
}
