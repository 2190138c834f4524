//! Policy document canonicalization.

use serde_json::{Map, Value};
use tracing::trace;

use crate::document::{Action, ActionItem, PolicyDocument, Principal, StatementEntry, Statements};
use crate::error::{PolicyError, PolicyResult};

/// Value some producers write for an absent `Id`.
const NULL_ID: &str = "null";

/// Reduce a JSON policy document to its canonical string form.
///
/// Two documents that differ only in `ID`/`Id` casing, scalar versus array
/// actions, action order, the `"*"` principal shorthand, a `"null"` id, key
/// order or whitespace produce byte-identical output.
///
/// # Errors
///
/// Returns [`PolicyError::Decode`] if `text` is not a JSON object and
/// [`PolicyError::Encode`] if the result cannot be serialized.
pub fn normalize_policy_document(text: &str) -> PolicyResult<String> {
    let mut doc = PolicyDocument::parse(text)?;
    doc.normalize();
    let canonical = sort_keys(doc.to_value());
    let out = serde_json::to_string(&canonical).map_err(PolicyError::Encode)?;
    trace!(input_len = text.len(), output_len = out.len(), "policy normalized");
    Ok(out)
}

impl PolicyDocument {
    /// Apply the canonicalization rules in place.
    ///
    /// Key order is not part of the typed model; it is fixed when encoding
    /// through [`normalize_policy_document`].
    pub fn normalize(&mut self) {
        // `ID` replaces any `Id` already present.
        if let Some(legacy) = self.legacy_id.take() {
            self.id = Some(legacy);
        }

        if let Some(Statements::List(entries)) = &mut self.statement {
            for entry in entries {
                if let StatementEntry::Statement(statement) = entry {
                    if let Some(action) = statement.action.take() {
                        statement.action = Some(action.normalized());
                    }
                    if matches!(statement.principal, Some(Principal::Wildcard)) {
                        statement.principal =
                            Some(Principal::Structured(Principal::wildcard_longhand()));
                    }
                }
            }
        }

        if matches!(&self.id, Some(Value::String(s)) if s == NULL_ID) {
            self.id = None;
        }
    }
}

impl Action {
    fn normalized(self) -> Self {
        match self {
            Self::Single(name) => Self::Many(vec![ActionItem::Name(name)]),
            Self::Many(items) => Self::Many(sort_names(items)),
            other @ Self::Other(_) => other,
        }
    }
}

/// Sort the string elements ascending while every non-string element stays
/// at its original index.
fn sort_names(mut items: Vec<ActionItem>) -> Vec<ActionItem> {
    let mut names: Vec<String> = items
        .iter_mut()
        .filter_map(|item| match item {
            ActionItem::Name(name) => Some(std::mem::take(name)),
            ActionItem::Other(_) => None,
        })
        .collect();
    names.sort_unstable();

    let mut sorted = names.into_iter();
    for item in &mut items {
        if let ActionItem::Name(slot) = item {
            if let Some(name) = sorted.next() {
                *slot = name;
            }
        }
    }
    items
}

/// Rebuild every object with its keys in ascending order.
fn sort_keys(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(String, Value)> = map.into_iter().collect();
            entries.sort_by(|(a, _), (b, _)| a.cmp(b));
            let mut sorted = Map::with_capacity(entries.len());
            for (key, value) in entries {
                sorted.insert(key, sort_keys(value));
            }
            Value::Object(sorted)
        }
        Value::Array(items) => Value::Array(items.into_iter().map(sort_keys).collect()),
        other => other,
    }
}
