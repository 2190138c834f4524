//! Comparison of configured and observed policy documents.

use tracing::debug;

use crate::error::PolicyError;
use crate::normalize::normalize_policy_document;

/// Normalize both documents.
///
/// Both sides are always attempted, so a caller sees every normalization
/// failure at once rather than only the first.
///
/// # Errors
///
/// Returns the failures of either or both sides.
pub fn normalize_pair(a: &str, b: &str) -> Result<(String, String), Vec<PolicyError>> {
    match (normalize_policy_document(a), normalize_policy_document(b)) {
        (Ok(a), Ok(b)) => Ok((a, b)),
        (a, b) => Err([a.err(), b.err()].into_iter().flatten().collect()),
    }
}

/// Whether two documents have the same canonical form.
///
/// # Errors
///
/// Returns the normalization failures of either side.
pub fn equivalent(a: &str, b: &str) -> Result<bool, Vec<PolicyError>> {
    let (a, b) = normalize_pair(a, b)?;
    Ok(a == b)
}

/// Check that the document reported by the storage service matches the
/// configured one.
///
/// # Errors
///
/// Returns normalization failures of either side, or a single
/// [`PolicyError::Mismatch`] carrying both canonical forms.
pub fn ensure_consistent(configured: &str, observed: &str) -> Result<(), Vec<PolicyError>> {
    let (configured, observed) = normalize_pair(configured, observed)?;
    if configured == observed {
        return Ok(());
    }
    debug!(%configured, %observed, "policy document drifted");
    Err(vec![PolicyError::Mismatch {
        configured,
        observed,
    }])
}
