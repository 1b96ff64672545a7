//! Error types for the gallery core
//!
//! Every failure the core can observe maps onto one of three user-facing
//! consequences: an inline login message, a redirect to the login view, or a
//! transient notification. The infrastructure variants describe what went
//! wrong underneath and are folded into one of those three by the component
//! that owns the operation.

use std::fmt;
use thiserror::Error;

/// Message shown for every login failure, whatever the cause
pub const INVALID_CREDENTIALS_MESSAGE: &str = "Invalid username or password";

/// Remote write performed by the gallery
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteAction {
    /// `POST /api/memories/reaction`
    Reaction,
    /// `POST /api/memories/comment`
    Comment,
}

impl fmt::Display for WriteAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WriteAction::Reaction => write!(f, "reaction"),
            WriteAction::Comment => write!(f, "comment"),
        }
    }
}

/// Main error type for the gallery core
#[derive(Error, Debug)]
pub enum GalleryError {
    /// Login was rejected or could not reach the gateway
    #[error("Invalid username or password")]
    AuthFailure {
        /// Underlying cause, kept for logs only
        reason: String,
    },

    /// The session can no longer be used; the token has been cleared
    #[error("Session is no longer valid: {reason}")]
    SessionInvalid {
        /// Underlying cause
        reason: String,
    },

    /// A reaction or comment write was not confirmed
    #[error("Failed to post {action}: {reason}")]
    ActionFailure {
        /// Which write failed
        action: WriteAction,
        /// Underlying cause
        reason: String,
    },

    /// Request never produced an HTTP response
    #[error("Network error: {0}")]
    Network(String),

    /// Remote store answered with a non-success status
    #[error("Remote store returned status {status}: {body}")]
    Status {
        /// HTTP status code
        status: u16,
        /// Response body, possibly empty
        body: String,
    },

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Token store I/O errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    Config(String),
}

/// Result type alias for gallery operations
pub type Result<T> = std::result::Result<T, GalleryError>;

/// Coarse classification used to pick the user-visible consequence
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Inline message on the login form
    Auth,
    /// Token cleared and navigation redirected to login
    Session,
    /// Transient notification, state untouched
    Action,
    /// Transport or local I/O problem not yet attributed to an operation
    Infrastructure,
}

impl GalleryError {
    /// Create a new AuthFailure error
    pub fn auth_failure(reason: impl Into<String>) -> Self {
        Self::AuthFailure {
            reason: reason.into(),
        }
    }

    /// Create a new SessionInvalid error
    pub fn session_invalid(reason: impl Into<String>) -> Self {
        Self::SessionInvalid {
            reason: reason.into(),
        }
    }

    /// Create a new ActionFailure error
    pub fn action_failure(action: WriteAction, reason: impl Into<String>) -> Self {
        Self::ActionFailure {
            action,
            reason: reason.into(),
        }
    }

    /// Classify the error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::AuthFailure { .. } => ErrorKind::Auth,
            Self::SessionInvalid { .. } => ErrorKind::Session,
            Self::ActionFailure { .. } => ErrorKind::Action,
            _ => ErrorKind::Infrastructure,
        }
    }

    /// Check if the error ends the current view
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::SessionInvalid { .. })
    }

    /// Check if the remote store rejected the credentials
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Status { status: 401 | 403, .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auth_failure_hides_reason() {
        let err = GalleryError::auth_failure("connection refused");
        assert_eq!(err.to_string(), INVALID_CREDENTIALS_MESSAGE);
        assert_eq!(err.kind(), ErrorKind::Auth);
    }

    #[test]
    fn test_only_session_invalid_is_fatal() {
        assert!(GalleryError::session_invalid("expired").is_fatal());
        assert!(!GalleryError::auth_failure("bad").is_fatal());
        assert!(!GalleryError::action_failure(WriteAction::Comment, "500").is_fatal());
        assert!(!GalleryError::Network("reset".into()).is_fatal());
    }

    #[test]
    fn test_action_failure_display() {
        let err = GalleryError::action_failure(WriteAction::Reaction, "status 500");
        assert_eq!(err.to_string(), "Failed to post reaction: status 500");
        assert_eq!(err.kind(), ErrorKind::Action);
    }

    #[test]
    fn test_is_unauthorized() {
        let err = GalleryError::Status {
            status: 401,
            body: String::new(),
        };
        assert!(err.is_unauthorized());
        assert_eq!(err.kind(), ErrorKind::Infrastructure);

        let err = GalleryError::Status {
            status: 500,
            body: String::new(),
        };
        assert!(!err.is_unauthorized());
    }
}
