//! Error types for the scene crate.

/// Errors raised while starting scene threads.
#[derive(Debug, thiserror::Error)]
pub enum SceneError {
    /// The OS refused to spawn a worker or scan thread.
    #[error("failed to spawn thread: {0}")]
    Spawn(#[source] std::io::Error),

    /// `start` was called on a controller that is already running.
    #[error("scan controller already running")]
    AlreadyRunning,
}

/// Convenience result type for scene operations.
pub type Result<T> = std::result::Result<T, SceneError>;
