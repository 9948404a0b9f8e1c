//! Incrementally flushed response body for pull streams.
//!
//! Each [`ResponseWriter::write`] becomes one body frame, which hyper sends to
//! the client as soon as it is produced. The body ends once every writer
//! clone has been dropped.

use std::convert::Infallible;

use axum::body::{Body, Bytes};
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tokio_stream::StreamExt;

/// Frames buffered between the writers and hyper.
const FRAME_BUFFER: usize = 16;

/// Receiving end of a writer channel; becomes the HTTP body.
pub type FrameReceiver = mpsc::Receiver<Bytes>;

#[derive(Debug, Clone)]
pub struct ResponseWriter {
    tx: mpsc::Sender<Bytes>,
}

impl ResponseWriter {
    /// Create a writer and the receiver its frames arrive on.
    pub fn channel() -> (Self, FrameReceiver) {
        let (tx, rx) = mpsc::channel(FRAME_BUFFER);
        (Self { tx }, rx)
    }

    /// Create a writer together with the streaming [`Body`] it feeds.
    pub fn body() -> (Self, Body) {
        let (writer, rx) = Self::channel();
        (writer, into_body(rx))
    }

    /// Write one frame.
    ///
    /// A disconnected client is not an error for the caller: the frame is
    /// dropped and `false` is returned.
    pub async fn write(&self, frame: impl Into<Bytes>) -> bool {
        self.tx.send(frame.into()).await.is_ok()
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Turn a frame receiver into a streaming response body.
pub fn into_body(rx: FrameReceiver) -> Body {
    Body::from_stream(ReceiverStream::new(rx).map(Ok::<_, Infallible>))
}
