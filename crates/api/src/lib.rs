//! Blobgate API server library.
//!
//! Exposes configuration, state, the pull pipeline and the router so
//! integration tests and the binary entrypoint can both access them.

pub mod config;
pub mod pull;
pub mod router;
pub mod routes;
pub mod state;
