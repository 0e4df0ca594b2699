//! Error types for the appointment watcher
//!
//! This module defines all error types using anyhow for consistent error handling
//! throughout the application.

/// Result type alias for convenience
pub type Result<T> = anyhow::Result<T>;

/// Custom error types for specific watcher scenarios
#[derive(Debug, thiserror::Error)]
pub enum WatchError {
    #[error("login failed: {reason}")]
    LoginFailed { reason: String },

    #[error("session expired or not authenticated")]
    SessionExpired,

    #[error("unexpected response from {endpoint}: {message}")]
    UnexpectedResponse { endpoint: String, message: String },

    #[error("configuration error: {message}")]
    ConfigurationError { message: String },
}

impl WatchError {
    /// Whether an error chain bottoms out in an expired session.
    ///
    /// The polling loop uses this to decide between a one-shot re-login
    /// and the generic exception-recovery path.
    pub fn is_session_expired(err: &anyhow::Error) -> bool {
        matches!(
            err.downcast_ref::<WatchError>(),
            Some(WatchError::SessionExpired)
        )
    }
}
