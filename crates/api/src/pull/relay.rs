//! Progress relay: copies engine progress onto the response while a pull runs.

use std::time::Duration;

use blobgate_core::engine::ProgressReceiver;
use blobgate_core::envelope::encode_status;
use tokio::sync::oneshot;

use super::writer::ResponseWriter;

/// Longest the relay waits before re-checking the stop signal.
pub const IDLE_INTERVAL: Duration = Duration::from_millis(500);

/// Drain `source` into `sink` as status envelopes until `stop` fires.
///
/// Messages are written one at a time in the order they were produced.
/// Buffered progress is written before the stop signal is honoured, so every
/// message the engine emitted ahead of its return precedes the terminal
/// envelope. A dropped stop sender counts as a stop.
///
/// Neither `sink` nor `source` is closed here; the source is handed back to
/// the caller.
pub async fn run(
    mut source: ProgressReceiver,
    sink: ResponseWriter,
    mut stop: oneshot::Receiver<()>,
) -> ProgressReceiver {
    let mut source_open = true;
    let mut relayed = 0usize;

    loop {
        tokio::select! {
            biased;

            msg = source.recv(), if source_open => match msg {
                Some(msg) => {
                    tracing::trace!(message = %msg, "Relaying progress");
                    sink.write(encode_status(&msg)).await;
                    relayed += 1;
                }
                None => source_open = false,
            },
            _ = &mut stop => {
                tracing::debug!(relayed, "Progress relay stopped");
                return source;
            }
            () = tokio::time::sleep(IDLE_INTERVAL) => {}
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
