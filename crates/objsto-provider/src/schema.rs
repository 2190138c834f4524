//! Declarative attribute schemas.
//!
//! Each resource describes its configuration surface with a [`Schema`]. The
//! schema is documentation for users (`objsto schema`) and tells the caller
//! which attributes are required, computed, sensitive, or force replacement.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::Value;

/// Value type of an attribute.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AttributeType {
    /// UTF-8 string.
    String,
    /// 64-bit integer.
    Int64,
    /// 32-bit integer.
    Int32,
    /// Unordered set of strings.
    StringSet,
    /// String-to-string map.
    StringMap,
    /// Nested object with its own attributes.
    Object(BTreeMap<String, Attribute>),
}

/// A single attribute.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Attribute {
    /// Value type.
    #[serde(rename = "type")]
    pub kind: AttributeType,
    /// User-facing description (Markdown).
    pub description: String,
    /// Must be set in configuration.
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub required: bool,
    /// Set by the provider.
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub computed: bool,
    /// Hidden from logs and plan output.
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub sensitive: bool,
    /// Changing the value destroys and recreates the resource.
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub requires_replace: bool,
    /// Value used when the attribute is omitted.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    /// Allowed values, for enumerations.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub one_of: Vec<String>,
}

impl Attribute {
    fn new(kind: AttributeType, description: impl Into<String>) -> Self {
        Self {
            kind,
            description: description.into(),
            required: false,
            computed: false,
            sensitive: false,
            requires_replace: false,
            default: None,
            one_of: Vec::new(),
        }
    }

    /// A string attribute.
    pub fn string(description: impl Into<String>) -> Self {
        Self::new(AttributeType::String, description)
    }

    /// A 64-bit integer attribute.
    pub fn int64(description: impl Into<String>) -> Self {
        Self::new(AttributeType::Int64, description)
    }

    /// A 32-bit integer attribute.
    pub fn int32(description: impl Into<String>) -> Self {
        Self::new(AttributeType::Int32, description)
    }

    /// A set of strings.
    pub fn string_set(description: impl Into<String>) -> Self {
        Self::new(AttributeType::StringSet, description)
    }

    /// A string map.
    pub fn string_map(description: impl Into<String>) -> Self {
        Self::new(AttributeType::StringMap, description)
    }

    /// A nested object.
    pub fn object<I, K>(description: impl Into<String>, attributes: I) -> Self
    where
        I: IntoIterator<Item = (K, Attribute)>,
        K: Into<String>,
    {
        let attributes = attributes.into_iter().map(|(k, v)| (k.into(), v)).collect();
        Self::new(AttributeType::Object(attributes), description)
    }

    /// Mark as required.
    #[must_use]
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Mark as computed by the provider.
    #[must_use]
    pub fn computed(mut self) -> Self {
        self.computed = true;
        self
    }

    /// Mark as sensitive.
    #[must_use]
    pub fn sensitive(mut self) -> Self {
        self.sensitive = true;
        self
    }

    /// Changing this attribute replaces the resource.
    #[must_use]
    pub fn requires_replace(mut self) -> Self {
        self.requires_replace = true;
        self
    }

    /// Default value when omitted; implies computed.
    #[must_use]
    pub fn default_value(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self.computed = true;
        self
    }

    /// Restrict to an enumeration.
    #[must_use]
    pub fn one_of(mut self, values: &[&str]) -> Self {
        self.one_of = values.iter().map(|v| (*v).to_owned()).collect();
        self
    }
}

/// How a nested block repeats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Nesting {
    /// At most one instance.
    Single,
    /// An ordered list of instances.
    List,
}

/// A nested configuration block.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Block {
    /// Repetition.
    pub nesting: Nesting,
    /// User-facing description.
    pub description: String,
    /// Block attributes.
    pub attributes: BTreeMap<String, Attribute>,
    /// Nested blocks.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub blocks: BTreeMap<String, Block>,
    /// The block must be present.
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub required: bool,
    /// Minimum number of instances of a list block.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_items: Option<usize>,
}

impl Block {
    fn new(nesting: Nesting, description: impl Into<String>) -> Self {
        Self {
            nesting,
            description: description.into(),
            attributes: BTreeMap::new(),
            blocks: BTreeMap::new(),
            required: false,
            min_items: None,
        }
    }

    /// A single nested block.
    pub fn single(description: impl Into<String>) -> Self {
        Self::new(Nesting::Single, description)
    }

    /// A list of nested blocks.
    pub fn list(description: impl Into<String>) -> Self {
        Self::new(Nesting::List, description)
    }

    /// Add an attribute.
    #[must_use]
    pub fn attribute(mut self, name: impl Into<String>, attribute: Attribute) -> Self {
        self.attributes.insert(name.into(), attribute);
        self
    }

    /// Add a nested block.
    #[must_use]
    pub fn block(mut self, name: impl Into<String>, block: Block) -> Self {
        self.blocks.insert(name.into(), block);
        self
    }

    /// Mark as required.
    #[must_use]
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Require at least `n` list items.
    #[must_use]
    pub fn min_items(mut self, n: usize) -> Self {
        self.min_items = Some(n);
        self
    }
}

/// Schema of a provider or resource.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Schema {
    /// User-facing description.
    pub description: String,
    /// Top-level attributes.
    pub attributes: BTreeMap<String, Attribute>,
    /// Top-level blocks.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub blocks: BTreeMap<String, Block>,
}

impl Schema {
    /// Start a schema.
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            attributes: BTreeMap::new(),
            blocks: BTreeMap::new(),
        }
    }

    /// Add an attribute.
    #[must_use]
    pub fn attribute(mut self, name: impl Into<String>, attribute: Attribute) -> Self {
        self.attributes.insert(name.into(), attribute);
        self
    }

    /// Add a block.
    #[must_use]
    pub fn block(mut self, name: impl Into<String>, block: Block) -> Self {
        self.blocks.insert(name.into(), block);
        self
    }

    /// Names of the top-level attributes that force replacement.
    pub fn replacing_attributes(&self) -> impl Iterator<Item = &str> {
        self.attributes
            .iter()
            .filter(|(_, a)| a.requires_replace)
            .map(|(name, _)| name.as_str())
    }
}
