//! Attribute values attached to signals, messages and nodes
//!
//! Attribute *definitions* live with whoever parses the schema. Here we only
//! keep the resolved name/value pairs and look them up.

use std::fmt;

/// Typed attribute payload
#[derive(Debug, Clone, PartialEq)]
pub enum AttributeData {
    Integer(i64),
    Float(f64),
    Text(String),
}

impl fmt::Display for AttributeData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttributeData::Integer(v) => write!(f, "{}", v),
            AttributeData::Float(v) => write!(f, "{}", v),
            AttributeData::Text(v) => write!(f, "{}", v),
        }
    }
}

impl From<i64> for AttributeData {
    fn from(v: i64) -> Self {
        AttributeData::Integer(v)
    }
}

impl From<f64> for AttributeData {
    fn from(v: f64) -> Self {
        AttributeData::Float(v)
    }
}

impl From<&str> for AttributeData {
    fn from(v: &str) -> Self {
        AttributeData::Text(v.to_string())
    }
}

impl From<String> for AttributeData {
    fn from(v: String) -> Self {
        AttributeData::Text(v)
    }
}

/// A single attribute name/value pair
#[derive(Debug, Clone, PartialEq)]
pub struct AttributeValue {
    /// Attribute name as written by the schema author
    pub name: String,
    /// Attribute value
    pub value: AttributeData,
}

impl AttributeValue {
    pub fn new(name: impl Into<String>, value: impl Into<AttributeData>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// Ordered attribute list of one schema entity
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Attributes {
    values: Vec<AttributeValue>,
}

impl Attributes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an attribute; order of insertion is the index order
    pub fn push(&mut self, value: AttributeValue) {
        self.values.push(value);
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &AttributeValue> {
        self.values.iter()
    }

    /// Find an attribute by name, ignoring ASCII case
    pub fn find_by_name(&self, name: &str) -> Option<&AttributeValue> {
        self.values
            .iter()
            .find(|attr| attr.name.eq_ignore_ascii_case(name))
    }

    /// Find an attribute by its position in the list
    pub fn find_by_index(&self, index: usize) -> Option<&AttributeValue> {
        self.values.get(index)
    }
}

impl FromIterator<AttributeValue> for Attributes {
    fn from_iter<I: IntoIterator<Item = AttributeValue>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().collect(),
        }
    }
}

/// Uniform attribute lookup for every schema entity kind
pub trait HasAttributes {
    fn attributes(&self) -> &Attributes;

    fn find_attr_by_name(&self, name: &str) -> Option<&AttributeValue> {
        self.attributes().find_by_name(name)
    }

    fn find_attr_by_index(&self, index: usize) -> Option<&AttributeValue> {
        self.attributes().find_by_index(index)
    }
}
