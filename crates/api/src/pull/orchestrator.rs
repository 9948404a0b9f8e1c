//! Pull orchestrator: drives one pull request from parameters to the
//! terminal envelope.
//!
//! ```text
//! Received -> Starting -> Streaming -> Completing -> Done | Failed
//!                 \__________________________________/
//!                        (parameter error)
//! ```

use std::sync::Arc;

use blobgate_core::engine::progress_channel;
use blobgate_core::envelope::{encode_error, encode_status, STATUS_DONE};
use blobgate_core::error::EngineError;
use blobgate_core::pull::PullParams;
use tokio::sync::oneshot;

use super::relay;
use super::writer::ResponseWriter;
use crate::state::AppState;

/// Lifecycle of a single pull request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PullState {
    Received,
    Starting,
    Streaming,
    Completing,
    Done,
    Failed,
}

/// Raw inputs of a pull request, as extracted from HTTP.
#[derive(Debug, Clone, Default)]
pub struct PullRequest {
    /// `fromImage` query parameter.
    pub from_image: Option<String>,
    /// `tag` query parameter.
    pub tag: Option<String>,
    /// `X-Registry-Auth` header value.
    pub registry_auth: Option<String>,
}

/// Run one pull, writing every envelope to `sink`, and return the terminal
/// state.
///
/// Exactly one terminal envelope is written and it is always the last write.
/// The relay is stopped and joined before that write so no progress frame can
/// land after it.
pub async fn run(state: AppState, request: PullRequest, sink: ResponseWriter) -> PullState {
    let mut current = PullState::Received;
    transition(&mut current, PullState::Starting);

    let params = match PullParams::new(
        request.from_image.as_deref(),
        request.tag.as_deref(),
        request.registry_auth.as_deref(),
        &state.config.store_url,
        state.config.temp_dir.clone(),
    ) {
        Ok(params) => params,
        Err(e) => {
            tracing::warn!(error = %e, "Rejected pull request");
            sink.write(encode_error(&e.to_string())).await;
            transition(&mut current, PullState::Failed);
            return current;
        }
    };

    transition(&mut current, PullState::Streaming);
    let image = params.image.clone();
    tracing::info!(
        image = %image,
        store = %params.store_url,
        anonymous = params.auth.is_anonymous(),
        "Starting pull",
    );

    sink.write(encode_status(&format!(
        "Pulling {} from {}...",
        params.image, params.store_url
    )))
    .await;

    let (progress_tx, progress_rx) = progress_channel();
    let (stop_tx, stop_rx) = oneshot::channel();
    let relay = tokio::spawn(relay::run(progress_rx, sink.clone(), stop_rx));

    let engine = Arc::clone(&state.engine);
    // The progress sender moves into the worker and is dropped when the
    // engine returns.
    let result = tokio::task::spawn_blocking(move || engine.pull(&params, &progress_tx))
        .await
        .unwrap_or_else(|e| Err(EngineError::Aborted(e.to_string())));

    transition(&mut current, PullState::Completing);
    // Rendezvous: the terminal write waits until the relay has exited.
    let _ = stop_tx.send(());
    if let Err(e) = relay.await {
        tracing::error!(image = %image, error = %e, "Progress relay did not exit cleanly");
    }

    match result {
        Ok(()) => {
            tracing::info!(image = %image, "Pull completed");
            sink.write(encode_status(STATUS_DONE)).await;
            transition(&mut current, PullState::Done);
        }
        Err(e) => {
            tracing::error!(image = %image, error = %e, "Pull failed");
            let message = format!("{} server error: {e}", state.config.product_name);
            sink.write(encode_error(&message)).await;
            transition(&mut current, PullState::Failed);
        }
    }

    current
}

fn transition(current: &mut PullState, next: PullState) {
    tracing::trace!(from = ?current, to = ?next, "Pull state transition");
    *current = next;
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
