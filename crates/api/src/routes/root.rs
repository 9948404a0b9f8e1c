use axum::extract::State;
use axum::http::header::CONTENT_TYPE;
use axum::response::IntoResponse;
use axum::{routing::get, Router};
use blobgate_core::envelope::encode_error;

use crate::state::AppState;

/// GET / -- fixed error envelope, there is no resource here.
async fn root(State(state): State<AppState>) -> impl IntoResponse {
    let message = format!("{} API, nothing to see here...", state.config.product_name);
    ([(CONTENT_TYPE, "application/json")], encode_error(&message))
}

pub fn router() -> Router<AppState> {
    Router::new().route("/", get(root))
}
