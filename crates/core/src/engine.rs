//! Contract between the gateway and the engine that performs a pull.
//!
//! An engine is synchronous and blocking. While it runs it reports
//! human-readable progress through a [`ProgressSender`]; its return value is
//! the outcome of the whole pull.

use tokio::sync::mpsc;

use crate::error::EngineError;
use crate::pull::PullParams;

/// Progress messages buffered between the engine and the relay.
///
/// When the buffer is full the engine blocks until the relay catches up.
pub const PROGRESS_CAPACITY: usize = 64;

/// Receiving half of a progress channel.
pub type ProgressReceiver = mpsc::Receiver<String>;

/// Sending half of a progress channel, used from blocking engine code.
#[derive(Debug, Clone)]
pub struct ProgressSender {
    tx: mpsc::Sender<String>,
}

impl ProgressSender {
    /// Queue one progress message, blocking while the buffer is full.
    ///
    /// Returns `false` once the receiving side is gone. Must not be called
    /// from inside an async task.
    pub fn send(&self, message: impl Into<String>) -> bool {
        self.tx.blocking_send(message.into()).is_ok()
    }
}

/// Create a bounded progress channel for one pull.
pub fn progress_channel() -> (ProgressSender, ProgressReceiver) {
    let (tx, rx) = mpsc::channel(PROGRESS_CAPACITY);
    (ProgressSender { tx }, rx)
}

/// An engine able to fetch an image from a remote store.
pub trait PullEngine: Send + Sync + 'static {
    /// Pull `params.image` from `params.store_url`, reporting progress on
    /// `progress` until it returns.
    fn pull(&self, params: &PullParams, progress: &ProgressSender) -> Result<(), EngineError>;
}

impl<F> PullEngine for F
where
    F: Fn(&PullParams, &ProgressSender) -> Result<(), EngineError> + Send + Sync + 'static,
{
    fn pull(&self, params: &PullParams, progress: &ProgressSender) -> Result<(), EngineError> {
        self(params, progress)
    }
}
