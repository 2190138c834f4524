//! Policy normalization and comparison errors.

/// Errors produced while normalizing or comparing policy documents.
#[derive(Debug, thiserror::Error)]
pub enum PolicyError {
    /// The input is not a valid JSON object.
    #[error("{0}")]
    Decode(#[source] serde_json::Error),

    /// The normalized document could not be serialized.
    #[error("{0}")]
    Encode(#[source] serde_json::Error),

    /// The configured and observed documents normalize differently.
    #[error("Configured:   {configured}\nAPI response: {observed}")]
    Mismatch {
        /// Canonical form of the configured document.
        configured: String,
        /// Canonical form of the document reported by the storage service.
        observed: String,
    },
}

impl PolicyError {
    /// Short summary line, used as the headline of a diagnostic.
    #[must_use]
    pub fn summary(&self) -> &'static str {
        match self {
            Self::Decode(_) | Self::Encode(_) => {
                "Unable to normalize object storage policy document"
            }
            Self::Mismatch { .. } => {
                "Configured policy document does not match the policy document in the API response"
            }
        }
    }

    /// Whether this is a normalization failure rather than a mismatch.
    #[must_use]
    pub fn is_normalization_failure(&self) -> bool {
        matches!(self, Self::Decode(_) | Self::Encode(_))
    }
}

/// Convenience result type for policy operations.
pub type PolicyResult<T> = Result<T, PolicyError>;
