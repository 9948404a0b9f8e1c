use axum::body::Body;
use axum::extract::{Path, Query, State};
use axum::http::header::CONTENT_TYPE;
use axum::http::HeaderMap;
use axum::response::{IntoResponse, Response};
use axum::{routing::post, Router};
use blobgate_core::pull::REGISTRY_AUTH_HEADER;
use serde::Deserialize;
use tracing::Instrument;

use crate::pull::{orchestrator, PullRequest, ResponseWriter};
use crate::state::AppState;

/// Query string of `POST /{version}/images/create`.
#[derive(Debug, Deserialize)]
pub struct CreateImageQuery {
    #[serde(rename = "fromImage")]
    pub from_image: Option<String>,
    pub tag: Option<String>,
}

/// POST /{version}/images/create -- pull an image from the store.
///
/// Responds immediately with a streaming JSON body; the pull itself runs on
/// its own task and writes envelopes into the body as it progresses.
async fn create_image(
    State(state): State<AppState>,
    Path(version): Path<String>,
    Query(query): Query<CreateImageQuery>,
    headers: HeaderMap,
) -> Response {
    let request = PullRequest {
        from_image: query.from_image,
        tag: query.tag,
        // Non-UTF-8 bytes are kept (lossily) so they fail credential
        // decoding instead of silently reading as anonymous.
        registry_auth: headers
            .get(REGISTRY_AUTH_HEADER)
            .map(|v| String::from_utf8_lossy(v.as_bytes()).into_owned()),
    };
    tracing::debug!(api_version = %version, from_image = ?request.from_image, "Pull requested");

    let (sink, body) = ResponseWriter::body();
    tokio::spawn(orchestrator::run(state, request, sink).instrument(tracing::Span::current()));

    streaming_json(body)
}

fn streaming_json(body: Body) -> Response {
    ([(CONTENT_TYPE, "application/json")], body).into_response()
}

pub fn router() -> Router<AppState> {
    Router::new().route("/{version}/images/create", post(create_image))
}
