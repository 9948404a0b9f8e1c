/// Domain-level errors raised while preparing a pull.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),
}

/// Failures reported by a [`PullEngine`](crate::engine::PullEngine).
///
/// The `Display` text is what the client sees after the gateway prefix, so
/// variants carry the engine's own wording verbatim.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// The engine process could not be started.
    #[error("failed to start engine: {0}")]
    Spawn(#[source] std::io::Error),

    /// The engine ran and exited unsuccessfully.
    #[error("engine exited with code {exit_code}: {stderr}")]
    ExitStatus { exit_code: i32, stderr: String },

    /// The blocking worker running the engine panicked or was cancelled.
    #[error("engine worker aborted: {0}")]
    Aborted(String),

    /// Any other failure described by the engine itself.
    #[error("{0}")]
    Failed(String),
}
