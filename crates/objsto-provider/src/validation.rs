//! Attribute validators.
//!
//! Validators never stop at the first problem: each one reports into a
//! [`Diagnostics`] collection so that a single `validate` call can surface
//! every issue in a configuration.

use chrono::{DateTime, Utc};

use crate::diagnostics::Diagnostics;

/// Summary used for every invalid attribute value.
const INVALID_VALUE: &str = "Invalid Attribute Value";

/// Parse an RFC 3339 timestamp, reporting a diagnostic on failure.
///
/// # Examples
///
/// ```
/// use objsto_provider::Diagnostics;
/// use objsto_provider::validation::rfc3339;
///
/// let mut diags = Diagnostics::new();
/// assert!(rfc3339(&mut diags, "date", "2030-01-01T00:00:00Z").is_some());
/// assert!(rfc3339(&mut diags, "date", "next tuesday").is_none());
/// assert!(diags.has_error());
/// ```
pub fn rfc3339(diags: &mut Diagnostics, attribute: &str, value: &str) -> Option<DateTime<Utc>> {
    match DateTime::parse_from_rfc3339(value) {
        Ok(date) => Some(date.with_timezone(&Utc)),
        Err(e) => {
            diags.add_attribute_error(
                attribute,
                INVALID_VALUE,
                format!("Attribute {attribute} must be a valid RFC3339 timestamp, got: {value} ({e})"),
            );
            None
        }
    }
}

/// Require exactly one of `names` to be set.
///
/// `present` yields `(name, is_set)` pairs in declaration order.
pub fn exactly_one_of<'a, I>(diags: &mut Diagnostics, attribute: &str, present: I) -> bool
where
    I: IntoIterator<Item = (&'a str, bool)>,
{
    let mut names = Vec::new();
    let mut set = Vec::new();
    for (name, is_set) in present {
        names.push(name);
        if is_set {
            set.push(name);
        }
    }
    if set.len() == 1 {
        return true;
    }
    let detail = if set.is_empty() {
        format!(
            "No attribute specified when one (and only one) of [{}] is required",
            names.join(", ")
        )
    } else {
        format!(
            "{} specified when one (and only one) of [{}] is required",
            set.len(),
            names.join(", ")
        )
    };
    diags.add_attribute_error(attribute, "Invalid Attribute Combination", detail);
    false
}

/// Reject `attribute` being set together with `other`.
pub fn conflicts_with(
    diags: &mut Diagnostics,
    attribute: &str,
    is_set: bool,
    other: &str,
    other_set: bool,
) -> bool {
    if is_set && other_set {
        diags.add_attribute_error(
            attribute,
            "Invalid Attribute Combination",
            format!("Attribute {other} cannot be specified when {attribute} is specified"),
        );
        return false;
    }
    true
}

/// Require a list to contain at least `min` items.
pub fn size_at_least(diags: &mut Diagnostics, attribute: &str, len: usize, min: usize) -> bool {
    if len >= min {
        return true;
    }
    diags.add_attribute_error(
        attribute,
        INVALID_VALUE,
        format!("Attribute {attribute} list must contain at least {min} elements, got: {len}"),
    );
    false
}

/// Require a string to be one of `allowed`.
pub fn one_of(diags: &mut Diagnostics, attribute: &str, value: &str, allowed: &[&str]) -> bool {
    if allowed.contains(&value) {
        return true;
    }
    let quoted: Vec<String> = allowed.iter().map(|v| format!("{v:?}")).collect();
    diags.add_attribute_error(
        attribute,
        INVALID_VALUE,
        format!(
            "Attribute {attribute} value must be one of: [{}], got: {value:?}",
            quoted.join(" ")
        ),
    );
    false
}

/// Require a string to be non-empty.
pub fn not_empty(diags: &mut Diagnostics, attribute: &str, value: &str) -> bool {
    if !value.is_empty() {
        return true;
    }
    diags.add_attribute_error(
        attribute,
        INVALID_VALUE,
        format!("Attribute {attribute} must not be empty"),
    );
    false
}
