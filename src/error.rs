//! Error types for feedwatch.

use thiserror::Error;

/// Common error type for feedwatch.
#[derive(Error, Debug)]
pub enum WatchError {
    /// Feed could not be retrieved.
    ///
    /// Covers network failures, non-success HTTP status and oversized bodies.
    #[error("fetch error: {0}")]
    Fetch(String),

    /// Feed body was retrieved but is not a valid RSS/Atom document.
    #[error("parse error: {0}")]
    Parse(String),

    /// Notification could not be delivered to the receiver.
    #[error("delivery error: {0}")]
    Delivery(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// Validation error for configuration values.
    #[error("validation error: {0}")]
    Validation(String),

    /// Unexpected internal error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl WatchError {
    /// Short label for the error kind, used in log lines.
    pub fn kind(&self) -> &'static str {
        match self {
            WatchError::Fetch(_) => "fetch",
            WatchError::Parse(_) => "parse",
            WatchError::Delivery(_) => "delivery",
            WatchError::Io(_) => "io",
            WatchError::Config(_) => "config",
            WatchError::Validation(_) => "validation",
            WatchError::Internal(_) => "internal",
        }
    }

    /// Whether the error comes from reading the feed (network or body).
    pub fn is_feed_error(&self) -> bool {
        matches!(self, WatchError::Fetch(_) | WatchError::Parse(_))
    }
}

/// Result type alias for feedwatch operations.
pub type Result<T> = std::result::Result<T, WatchError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fetch_error_display() {
        let err = WatchError::Fetch("HTTP error: 503".to_string());
        assert_eq!(err.to_string(), "fetch error: HTTP error: 503");
    }

    #[test]
    fn test_parse_error_display() {
        let err = WatchError::Parse("unexpected end of document".to_string());
        assert_eq!(err.to_string(), "parse error: unexpected end of document");
    }

    #[test]
    fn test_delivery_error_display() {
        let err = WatchError::Delivery("connection refused".to_string());
        assert_eq!(err.to_string(), "delivery error: connection refused");
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: WatchError = io_err.into();
        assert!(matches!(err, WatchError::Io(_)));
        assert!(err.to_string().contains("file not found"));
    }

    #[test]
    fn test_kind_labels() {
        assert_eq!(WatchError::Fetch(String::new()).kind(), "fetch");
        assert_eq!(WatchError::Parse(String::new()).kind(), "parse");
        assert_eq!(WatchError::Delivery(String::new()).kind(), "delivery");
        assert_eq!(WatchError::Internal(String::new()).kind(), "internal");
    }

    #[test]
    fn test_is_feed_error() {
        assert!(WatchError::Fetch("x".into()).is_feed_error());
        assert!(WatchError::Parse("x".into()).is_feed_error());
        assert!(!WatchError::Delivery("x".into()).is_feed_error());
        assert!(!WatchError::Internal("x".into()).is_feed_error());
    }

    #[test]
    fn test_result_alias() {
        fn sample_ok() -> Result<u64> {
            Ok(42)
        }

        fn sample_err() -> Result<u64> {
            Err(WatchError::Config("test".to_string()))
        }

        assert_eq!(sample_ok().unwrap(), 42);
        assert!(sample_err().is_err());
    }
}
