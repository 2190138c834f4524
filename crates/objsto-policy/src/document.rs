//! Typed view of a policy document.
//!
//! Policy documents are free-form JSON; only a handful of fields matter for
//! canonicalization. [`PolicyDocument`] decodes those fields into tagged
//! variants and keeps every other key verbatim, so that encoding a document
//! that was never normalized reproduces the original structure.

use serde_json::{Map, Value};

use crate::error::PolicyError;

const KEY_ID: &str = "Id";
const KEY_LEGACY_ID: &str = "ID";
const KEY_STATEMENT: &str = "Statement";
const KEY_ACTION: &str = "Action";
const KEY_PRINCIPAL: &str = "Principal";
const WILDCARD: &str = "*";

/// A decoded bucket policy document.
#[derive(Debug, Clone, PartialEq)]
pub struct PolicyDocument {
    pub(crate) id: Option<Value>,
    pub(crate) legacy_id: Option<Value>,
    pub(crate) statement: Option<Statements>,
    pub(crate) fields: Map<String, Value>,
}

/// The top-level `Statement` value.
#[derive(Debug, Clone, PartialEq)]
pub enum Statements {
    /// The usual array of statements.
    List(Vec<StatementEntry>),
    /// Any other shape, kept untouched.
    Other(Value),
}

/// One element of the `Statement` array.
#[derive(Debug, Clone, PartialEq)]
pub enum StatementEntry {
    /// A JSON object.
    Statement(Statement),
    /// A non-object element, kept untouched.
    Other(Value),
}

/// A single policy statement.
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub(crate) action: Option<Action>,
    pub(crate) principal: Option<Principal>,
    pub(crate) fields: Map<String, Value>,
}

/// The `Action` field of a statement.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// `"Action": "s3:GetObject"`
    Single(String),
    /// `"Action": ["s3:GetObject", ...]`
    Many(Vec<ActionItem>),
    /// Any other JSON value.
    Other(Value),
}

/// An element of an `Action` array.
#[derive(Debug, Clone, PartialEq)]
pub enum ActionItem {
    /// An action name.
    Name(String),
    /// A non-string element.
    Other(Value),
}

/// The `Principal` field of a statement.
#[derive(Debug, Clone, PartialEq)]
pub enum Principal {
    /// The `"*"` shorthand for any principal.
    Wildcard,
    /// A principal map such as `{"AWS": ["arn:..."]}`.
    Structured(Map<String, Value>),
    /// Any other JSON value.
    Other(Value),
}

impl PolicyDocument {
    /// Decode a document from JSON text.
    ///
    /// # Errors
    ///
    /// Returns [`PolicyError::Decode`] if `text` is not a JSON object.
    pub fn parse(text: &str) -> Result<Self, PolicyError> {
        let map: Map<String, Value> = serde_json::from_str(text).map_err(PolicyError::Decode)?;
        Ok(Self::from_map(map))
    }

    /// Decode a document from an already-parsed JSON object.
    #[must_use]
    pub fn from_map(mut map: Map<String, Value>) -> Self {
        let id = map.remove(KEY_ID);
        let legacy_id = map.remove(KEY_LEGACY_ID);
        let statement = map.remove(KEY_STATEMENT).map(Statements::from_value);
        Self {
            id,
            legacy_id,
            statement,
            fields: map,
        }
    }

    /// The `Id` value, if any.
    #[must_use]
    pub fn id(&self) -> Option<&Value> {
        self.id.as_ref()
    }

    /// The statements, if the document has a `Statement` array.
    #[must_use]
    pub fn statements(&self) -> Option<&[StatementEntry]> {
        match &self.statement {
            Some(Statements::List(entries)) => Some(entries),
            _ => None,
        }
    }

    /// Encode back into a JSON value.
    #[must_use]
    pub fn to_value(&self) -> Value {
        let mut map = self.fields.clone();
        if let Some(id) = &self.id {
            map.insert(KEY_ID.to_owned(), id.clone());
        }
        if let Some(id) = &self.legacy_id {
            map.insert(KEY_LEGACY_ID.to_owned(), id.clone());
        }
        if let Some(statement) = &self.statement {
            map.insert(KEY_STATEMENT.to_owned(), statement.to_value());
        }
        Value::Object(map)
    }
}

impl Statements {
    fn from_value(value: Value) -> Self {
        match value {
            Value::Array(items) => Self::List(
                items
                    .into_iter()
                    .map(|item| match item {
                        Value::Object(map) => StatementEntry::Statement(Statement::from_map(map)),
                        other => StatementEntry::Other(other),
                    })
                    .collect(),
            ),
            other => Self::Other(other),
        }
    }

    fn to_value(&self) -> Value {
        match self {
            Self::List(entries) => Value::Array(
                entries
                    .iter()
                    .map(|entry| match entry {
                        StatementEntry::Statement(statement) => statement.to_value(),
                        StatementEntry::Other(value) => value.clone(),
                    })
                    .collect(),
            ),
            Self::Other(value) => value.clone(),
        }
    }
}

impl Statement {
    fn from_map(mut map: Map<String, Value>) -> Self {
        let action = map.remove(KEY_ACTION).map(Action::from_value);
        let principal = map.remove(KEY_PRINCIPAL).map(Principal::from_value);
        Self {
            action,
            principal,
            fields: map,
        }
    }

    /// The `Action` field, if present.
    #[must_use]
    pub fn action(&self) -> Option<&Action> {
        self.action.as_ref()
    }

    /// The `Principal` field, if present.
    #[must_use]
    pub fn principal(&self) -> Option<&Principal> {
        self.principal.as_ref()
    }

    fn to_value(&self) -> Value {
        let mut map = self.fields.clone();
        if let Some(action) = &self.action {
            map.insert(KEY_ACTION.to_owned(), action.to_value());
        }
        if let Some(principal) = &self.principal {
            map.insert(KEY_PRINCIPAL.to_owned(), principal.to_value());
        }
        Value::Object(map)
    }
}

impl Action {
    fn from_value(value: Value) -> Self {
        match value {
            Value::String(name) => Self::Single(name),
            Value::Array(items) => Self::Many(
                items
                    .into_iter()
                    .map(|item| match item {
                        Value::String(name) => ActionItem::Name(name),
                        other => ActionItem::Other(other),
                    })
                    .collect(),
            ),
            other => Self::Other(other),
        }
    }

    fn to_value(&self) -> Value {
        match self {
            Self::Single(name) => Value::String(name.clone()),
            Self::Many(items) => Value::Array(
                items
                    .iter()
                    .map(|item| match item {
                        ActionItem::Name(name) => Value::String(name.clone()),
                        ActionItem::Other(value) => value.clone(),
                    })
                    .collect(),
            ),
            Self::Other(value) => value.clone(),
        }
    }
}

impl Principal {
    fn from_value(value: Value) -> Self {
        match value {
            Value::String(s) if s == WILDCARD => Self::Wildcard,
            Value::Object(map) => Self::Structured(map),
            other => Self::Other(other),
        }
    }

    /// The longhand form of the wildcard principal: `{"AWS": ["*"]}`.
    #[must_use]
    pub fn wildcard_longhand() -> Map<String, Value> {
        let mut map = Map::new();
        map.insert(
            "AWS".to_owned(),
            Value::Array(vec![Value::String(WILDCARD.to_owned())]),
        );
        map
    }

    fn to_value(&self) -> Value {
        match self {
            Self::Wildcard => Value::String(WILDCARD.to_owned()),
            Self::Structured(map) => Value::Object(map.clone()),
            Self::Other(value) => value.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_should_decode_action_shapes() {
        let doc = PolicyDocument::parse(
            r#"{"Statement":[{"Action":"s3:GetObject"},{"Action":["a",1]},{"Action":true}]}"#,
        )
        .unwrap();
        let statements = doc.statements().unwrap();
        let actions: Vec<_> = statements
            .iter()
            .map(|s| match s {
                StatementEntry::Statement(s) => s.action().cloned(),
                StatementEntry::Other(_) => None,
            })
            .collect();
        assert_eq!(
            actions,
            vec![
                Some(Action::Single("s3:GetObject".to_owned())),
                Some(Action::Many(vec![
                    ActionItem::Name("a".to_owned()),
                    ActionItem::Other(json!(1)),
                ])),
                Some(Action::Other(json!(true))),
            ]
        );
    }

    #[test]
    fn test_should_decode_principal_shapes() {
        let doc = PolicyDocument::parse(
            r#"{"Statement":[{"Principal":"*"},{"Principal":{"AWS":["arn"]}},{"Principal":"arn"}]}"#,
        )
        .unwrap();
        let principals: Vec<_> = doc
            .statements()
            .unwrap()
            .iter()
            .filter_map(|s| match s {
                StatementEntry::Statement(s) => s.principal().cloned(),
                StatementEntry::Other(_) => None,
            })
            .collect();
        assert_eq!(principals[0], Principal::Wildcard);
        assert!(matches!(principals[1], Principal::Structured(_)));
        assert_eq!(principals[2], Principal::Other(json!("arn")));
    }

    #[test]
    fn test_should_reproduce_structure_without_normalization() {
        let input = json!({
            "Version": "2012-10-17",
            "ID": "legacy",
            "Statement": [
                {"Effect": "Allow", "Action": "s3:GetObject", "Principal": "*", "Resource": "arn:aws:s3:::b/*"},
                "not-an-object"
            ],
            "Extra": {"nested": [1, 2]}
        });
        let doc = PolicyDocument::parse(&input.to_string()).unwrap();
        assert_eq!(doc.to_value(), input);
    }

    #[test]
    fn test_should_keep_non_array_statement() {
        let input = json!({"Statement": {"Effect": "Allow"}});
        let doc = PolicyDocument::parse(&input.to_string()).unwrap();
        assert!(doc.statements().is_none());
        assert_eq!(doc.to_value(), input);
    }

    #[test]
    fn test_should_reject_non_object_document() {
        assert!(matches!(
            PolicyDocument::parse("[1,2]"),
            Err(PolicyError::Decode(_))
        ));
        assert!(matches!(
            PolicyDocument::parse("null"),
            Err(PolicyError::Decode(_))
        ));
    }
}
