//! Storage client errors.

/// Error returned by a [`StorageClient`](super::StorageClient) call.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StorageError {
    /// The bucket, object or configuration does not exist (HTTP 404).
    #[error("{operation}: not found: {message}")]
    NotFound {
        /// Operation that was attempted, e.g. `read bucket policy`.
        operation: &'static str,
        /// Message reported by the service.
        message: String,
    },

    /// The service rejected the request.
    #[error("{operation}: {message}{}", code.as_deref().map(|c| format!(" ({c})")).unwrap_or_default())]
    Service {
        /// Operation that was attempted.
        operation: &'static str,
        /// HTTP status code, when a response was received.
        status: Option<u16>,
        /// Service error code, e.g. `BucketAlreadyExists`.
        code: Option<String>,
        /// Message reported by the service, or the transport error.
        message: String,
    },

    /// The request could not be built from the given input.
    #[error("{operation}: invalid request: {message}")]
    InvalidRequest {
        /// Operation that was attempted.
        operation: &'static str,
        /// What was wrong with the input.
        message: String,
    },
}

impl StorageError {
    /// Create a [`StorageError::NotFound`].
    pub fn not_found(operation: &'static str, message: impl Into<String>) -> Self {
        Self::NotFound {
            operation,
            message: message.into(),
        }
    }

    /// Create a [`StorageError::Service`] without a response.
    pub fn service(operation: &'static str, message: impl Into<String>) -> Self {
        Self::Service {
            operation,
            status: None,
            code: None,
            message: message.into(),
        }
    }

    /// Create a [`StorageError::InvalidRequest`].
    pub fn invalid_request(operation: &'static str, message: impl Into<String>) -> Self {
        Self::InvalidRequest {
            operation,
            message: message.into(),
        }
    }

    /// Whether the target no longer exists remotely.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// The operation that failed.
    #[must_use]
    pub fn operation(&self) -> &'static str {
        match self {
            Self::NotFound { operation, .. }
            | Self::Service { operation, .. }
            | Self::InvalidRequest { operation, .. } => operation,
        }
    }
}

/// Convenience result type for storage calls.
pub type StorageResult<T> = Result<T, StorageError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_should_classify_not_found() {
        let err = StorageError::not_found("read bucket", "NoSuchBucket");
        assert!(err.is_not_found());
        assert_eq!(err.operation(), "read bucket");
        assert!(!StorageError::service("read bucket", "boom").is_not_found());
    }

    #[test]
    fn test_should_include_code_in_service_message() {
        let err = StorageError::Service {
            operation: "create bucket",
            status: Some(409),
            code: Some("BucketAlreadyOwnedByYou".to_owned()),
            message: "already owned".to_owned(),
        };
        assert_eq!(
            err.to_string(),
            "create bucket: already owned (BucketAlreadyOwnedByYou)"
        );
        assert_eq!(
            StorageError::service("create bucket", "timeout").to_string(),
            "create bucket: timeout"
        );
    }
}
