//! Pull pipeline.
//!
//! The [`orchestrator`] owns one pull request end to end: it writes the
//! acknowledgement, runs the engine on a blocking worker while the
//! [`relay`] streams its progress, and writes the terminal envelope. Every
//! write goes through a [`writer::ResponseWriter`].

pub mod orchestrator;
pub mod relay;
pub mod writer;

pub use orchestrator::{PullRequest, PullState};
pub use writer::ResponseWriter;
