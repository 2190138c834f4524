//! Diagnostics returned by provider and resource operations.
//!
//! A lifecycle operation can hit several independent problems (two missing
//! provider settings, an invalid filter and a malformed date, ...). Instead of
//! returning the first error, operations push every problem into a
//! [`Diagnostics`] collection and the caller decides what to do with it.

use std::fmt;

use objsto_core::ObjstoError;
use objsto_policy::PolicyError;
use serde::{Deserialize, Serialize};

use crate::storage::StorageError;

/// Severity of a [`Diagnostic`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// The operation failed.
    Error,
    /// The operation succeeded but something deserves attention.
    Warning,
}

/// A single problem report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    /// Error or warning.
    pub severity: Severity,
    /// One-line headline.
    pub summary: String,
    /// Longer explanation.
    pub detail: String,
    /// Attribute path the problem relates to, if any (e.g. `rule[0].filter`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attribute: Option<String>,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self.severity {
            Severity::Error => "error",
            Severity::Warning => "warning",
        };
        match &self.attribute {
            Some(attr) => write!(f, "{label}: {} ({attr})", self.summary)?,
            None => write!(f, "{label}: {}", self.summary)?,
        }
        if !self.detail.is_empty() {
            write!(f, "\n{}", self.detail)?;
        }
        Ok(())
    }
}

/// An ordered collection of diagnostics.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Diagnostics(Vec<Diagnostic>);

impl Diagnostics {
    /// Create an empty collection.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an error not tied to an attribute.
    pub fn add_error(&mut self, summary: impl Into<String>, detail: impl Into<String>) {
        self.push(Severity::Error, summary, detail, None);
    }

    /// Add an error tied to `attribute`.
    pub fn add_attribute_error(
        &mut self,
        attribute: impl Into<String>,
        summary: impl Into<String>,
        detail: impl Into<String>,
    ) {
        self.push(Severity::Error, summary, detail, Some(attribute.into()));
    }

    /// Add a warning.
    pub fn add_warning(&mut self, summary: impl Into<String>, detail: impl Into<String>) {
        self.push(Severity::Warning, summary, detail, None);
    }

    fn push(
        &mut self,
        severity: Severity,
        summary: impl Into<String>,
        detail: impl Into<String>,
        attribute: Option<String>,
    ) {
        self.0.push(Diagnostic {
            severity,
            summary: summary.into(),
            detail: detail.into(),
            attribute,
        });
    }

    /// Append another collection.
    pub fn append(&mut self, other: Diagnostics) {
        self.0.extend(other.0);
    }

    /// Whether any diagnostic is an error.
    #[must_use]
    pub fn has_error(&self) -> bool {
        self.0.iter().any(|d| d.severity == Severity::Error)
    }

    /// Whether the collection is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of diagnostics.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Iterate in insertion order.
    pub fn iter(&self) -> std::slice::Iter<'_, Diagnostic> {
        self.0.iter()
    }
}

impl<'a> IntoIterator for &'a Diagnostics {
    type Item = &'a Diagnostic;
    type IntoIter = std::slice::Iter<'a, Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl IntoIterator for Diagnostics {
    type Item = Diagnostic;
    type IntoIter = std::vec::IntoIter<Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl fmt::Display for Diagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, diagnostic) in self.0.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{diagnostic}")?;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Conversions
// ---------------------------------------------------------------------------

impl From<PolicyError> for Diagnostic {
    fn from(err: PolicyError) -> Self {
        Self {
            severity: Severity::Error,
            summary: err.summary().to_owned(),
            detail: err.to_string(),
            attribute: Some("policy".to_owned()),
        }
    }
}

impl From<ObjstoError> for Diagnostic {
    fn from(err: ObjstoError) -> Self {
        let attribute = match &err {
            ObjstoError::MissingSetting { attribute, .. } => Some((*attribute).to_owned()),
            ObjstoError::InvalidObjectId(_) => Some("id".to_owned()),
        };
        Self {
            severity: Severity::Error,
            summary: err.summary(),
            detail: err.to_string(),
            attribute,
        }
    }
}

impl From<StorageError> for Diagnostic {
    fn from(err: StorageError) -> Self {
        Self {
            severity: Severity::Error,
            summary: format!("Unable to {}", err.operation()),
            detail: err.to_string(),
            attribute: None,
        }
    }
}

impl<E: Into<Diagnostic>> FromIterator<E> for Diagnostics {
    fn from_iter<I: IntoIterator<Item = E>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

impl<E: Into<Diagnostic>> Extend<E> for Diagnostics {
    fn extend<I: IntoIterator<Item = E>>(&mut self, iter: I) {
        self.0.extend(iter.into_iter().map(Into::into));
    }
}

impl From<Diagnostic> for Diagnostics {
    fn from(diagnostic: Diagnostic) -> Self {
        Self(vec![diagnostic])
    }
}

impl From<StorageError> for Diagnostics {
    fn from(err: StorageError) -> Self {
        Diagnostic::from(err).into()
    }
}

impl From<PolicyError> for Diagnostics {
    fn from(err: PolicyError) -> Self {
        Diagnostic::from(err).into()
    }
}

impl From<ObjstoError> for Diagnostics {
    fn from(err: ObjstoError) -> Self {
        Diagnostic::from(err).into()
    }
}

impl From<Vec<PolicyError>> for Diagnostics {
    fn from(errors: Vec<PolicyError>) -> Self {
        errors.into_iter().collect()
    }
}

impl From<Vec<ObjstoError>> for Diagnostics {
    fn from(errors: Vec<ObjstoError>) -> Self {
        errors.into_iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_should_track_errors_and_warnings() {
        let mut diags = Diagnostics::new();
        assert!(!diags.has_error());
        diags.add_warning("careful", "");
        assert!(!diags.has_error());
        diags.add_attribute_error("rule[0].filter", "Invalid filter", "pick one");
        assert!(diags.has_error());
        assert_eq!(diags.len(), 2);
        assert_eq!(
            diags.iter().nth(1).and_then(|d| d.attribute.as_deref()),
            Some("rule[0].filter")
        );
    }

    #[test]
    fn test_should_convert_missing_setting() {
        let diag: Diagnostic = ObjstoError::MissingSetting {
            attribute: "endpoint",
            env: "OBJSTO_ENDPOINT",
        }
        .into();
        assert_eq!(diag.summary, "No value found for endpoint");
        assert!(diag.detail.contains("OBJSTO_ENDPOINT"));
        assert_eq!(diag.attribute.as_deref(), Some("endpoint"));
    }

    #[test]
    fn test_should_convert_policy_mismatch() {
        let diag: Diagnostic = PolicyError::Mismatch {
            configured: "{}".to_owned(),
            observed: r#"{"Id":"x"}"#.to_owned(),
        }
        .into();
        assert_eq!(
            diag.summary,
            "Configured policy document does not match the policy document in the API response"
        );
        assert_eq!(diag.detail, "Configured:   {}\nAPI response: {\"Id\":\"x\"}");
    }

    #[test]
    fn test_should_collect_from_error_vec() {
        let diags: Diagnostics = vec![
            ObjstoError::InvalidObjectId("a".to_owned()),
            ObjstoError::InvalidObjectId("b".to_owned()),
        ]
        .into_iter()
        .collect();
        assert_eq!(diags.len(), 2);
        assert!(diags.has_error());
    }

    #[test]
    fn test_should_render_attribute_and_detail() {
        let mut diags = Diagnostics::new();
        diags.add_attribute_error("bucket", "Missing bucket", "bucket is required");
        assert_eq!(
            diags.to_string(),
            "error: Missing bucket (bucket)\nbucket is required"
        );
    }
}
