//! Blobgate domain logic.
//!
//! Pure building blocks with no HTTP dependency: the wire envelopes, pull
//! parameters, and the engine contract plus its command-backed binding.

pub mod command;
pub mod engine;
pub mod envelope;
pub mod error;
pub mod pull;
