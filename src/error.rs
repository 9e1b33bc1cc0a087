//! Error types for the voxlink session engine

use thiserror::Error;

/// Result type alias for session operations
pub type SessionResult<T> = Result<T, SessionError>;

/// Errors that can occur across a duplex voice session.
///
/// Fatal variants (`PermissionDenied`, `UnsupportedEnvironment`, `Connection`)
/// drive the session to its terminal `Error` state after a full teardown.
/// `Protocol` and `Format` are absorbed where they occur: the offending
/// message is dropped and the conversation continues. `Cleanup` failures are
/// logged during teardown and never surfaced to the caller.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("microphone access denied: {0}")]
    PermissionDenied(String),

    #[error("no audio capture capability in this environment: {0}")]
    UnsupportedEnvironment(String),

    #[error("connection to agent failed: {0}")]
    Connection(String),

    #[error("malformed server message: {0}")]
    Protocol(String),

    #[error("malformed audio payload: {0}")]
    Format(String),

    #[error("resource release failed: {0}")]
    Cleanup(String),

    #[error("session already started")]
    AlreadyStarted,
}

impl SessionError {
    /// Whether this error tears the session down (as opposed to being
    /// absorbed at a component boundary).
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            SessionError::PermissionDenied(_)
                | SessionError::UnsupportedEnvironment(_)
                | SessionError::Connection(_)
        )
    }
}
