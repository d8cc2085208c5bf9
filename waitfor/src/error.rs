//! Error types for the waitfor crate.

use std::time::Duration;

/// Errors that can occur while configuring or running a poller.
#[derive(Debug, thiserror::Error)]
pub enum WaitForError {
    /// The resolver never passed before the configured timeout elapsed
    #[error("waitFor timeout")]
    Timeout {
        /// Time spent polling when the cycle gave up
        elapsed: Duration,
    },

    /// Invalid options provided
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The resolver did not pass immediately and there is no tokio runtime to poll on
    #[error("No tokio runtime available to schedule polling")]
    NoRuntime,
}

impl WaitForError {
    /// Returns `true` if this error is a timeout.
    pub fn is_timeout(&self) -> bool {
        matches!(self, WaitForError::Timeout { .. })
    }
}

/// Convenience type alias for Results using WaitForError.
pub type Result<T> = std::result::Result<T, WaitForError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeout_display_matches_legacy_message() {
        let error = WaitForError::Timeout {
            elapsed: Duration::from_millis(1000),
        };
        assert_eq!(error.to_string(), "waitFor timeout");
        assert!(error.is_timeout());
    }

    #[test]
    fn test_error_display() {
        let error = WaitForError::Configuration("frequency must be greater than 0".to_string());
        assert_eq!(
            error.to_string(),
            "Configuration error: frequency must be greater than 0"
        );
        assert!(!error.is_timeout());

        let error = WaitForError::NoRuntime;
        assert!(error.to_string().contains("tokio runtime"));
    }
}
