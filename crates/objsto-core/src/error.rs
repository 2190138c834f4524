//! Error types for the objsto core.

/// Core error type for provider configuration and identifiers.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ObjstoError {
    /// A provider setting was neither configured nor found in the environment.
    #[error(
        "No value found for {attribute}: value must be defined either in the configuration or with the {env} environment variable"
    )]
    MissingSetting {
        /// Provider attribute name (e.g. `endpoint`).
        attribute: &'static str,
        /// Environment variable consulted as fallback.
        env: &'static str,
    },

    /// An object identifier is not in `{bucket}/{key}` format.
    #[error("invalid id format: {0}")]
    InvalidObjectId(String),
}

impl ObjstoError {
    /// Short summary line, used as the headline of a diagnostic.
    #[must_use]
    pub fn summary(&self) -> String {
        match self {
            Self::MissingSetting { attribute, .. } => format!("No value found for {attribute}"),
            Self::InvalidObjectId(_) => "Unable to parse object id".to_owned(),
        }
    }
}

/// Convenience result type for objsto core operations.
pub type ObjstoResult<T> = Result<T, ObjstoError>;
