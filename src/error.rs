//! Error types for the boot dashboard client

use thiserror::Error;

/// Result type alias for dashboard operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while querying the dashboard backend
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// A dispatch was issued with no descriptors
    #[error("dispatch requires at least one query descriptor")]
    EmptyDispatch,

    /// Two descriptors in one dispatch share an operation id
    #[error("duplicate operation id in dispatch: {0}")]
    DuplicateOperation(String),

    /// HTTP transport error
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// Backend answered with a non-success status
    #[error("backend returned {status}: {body}")]
    Status {
        /// HTTP status code
        status: u16,
        /// Response body, possibly empty
        body: String,
    },

    /// Backend payload did not have the expected shape
    #[error("malformed response: {0}")]
    MalformedResponse(String),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// TOML parsing error
    #[error("toml error: {0}")]
    Toml(#[from] toml::de::Error),
}

impl Error {
    /// Whether this error came from the network round-trip rather than
    /// from the caller
    ///
    /// Transport failures, bad statuses and malformed payloads all collapse
    /// into the same degraded display; caller errors do not reach the wire.
    #[must_use]
    pub const fn is_transport(&self) -> bool {
        matches!(
            self,
            Self::Http(_) | Self::Status { .. } | Self::MalformedResponse(_) | Self::Serialization(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_is_transport() {
        let err = Error::Status {
            status: 500,
            body: "boom".to_string(),
        };
        assert!(err.is_transport());
        assert_eq!(err.to_string(), "backend returned 500: boom");
    }

    #[test]
    fn test_caller_errors_are_not_transport() {
        assert!(!Error::EmptyDispatch.is_transport());
        assert!(!Error::DuplicateOperation("#a".to_string()).is_transport());
        assert!(!Error::Config("missing".to_string()).is_transport());
    }
}
