//! Remote schema and typed property payloads
//!
//! The remote workspace database defines its own typed fields. refsync
//! introspects them at runtime into a [`RemoteSchema`] and only ever sends a
//! [`PropertyPayload`] whose entries match that schema by name and kind.

use std::collections::{BTreeMap, HashMap};
use std::fmt::{self, Display, Formatter};

use serde::{Deserialize, Serialize};

/// Type of a field in the remote database schema
///
/// Kinds refsync never writes deserialize as [`PropertyKind::Unsupported`];
/// such fields can never match a field rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PropertyKind {
    Title,
    RichText,
    Number,
    Url,
    MultiSelect,
    #[serde(other)]
    Unsupported,
}

impl Display for PropertyKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let s = match self {
            PropertyKind::Title => "title",
            PropertyKind::RichText => "rich_text",
            PropertyKind::Number => "number",
            PropertyKind::Url => "url",
            PropertyKind::MultiSelect => "multi_select",
            PropertyKind::Unsupported => "unsupported",
        };
        write!(f, "{}", s)
    }
}

/// A typed value for one remote field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum PropertyValue {
    Title(String),
    RichText(String),
    Number(Option<f64>),
    Url(Option<String>),
    MultiSelect(Vec<String>),
}

impl PropertyValue {
    /// The schema kind this value must be written to
    pub fn kind(&self) -> PropertyKind {
        match self {
            PropertyValue::Title(_) => PropertyKind::Title,
            PropertyValue::RichText(_) => PropertyKind::RichText,
            PropertyValue::Number(_) => PropertyKind::Number,
            PropertyValue::Url(_) => PropertyKind::Url,
            PropertyValue::MultiSelect(_) => PropertyKind::MultiSelect,
        }
    }

    /// Returns true if the value carries no content
    pub fn is_empty(&self) -> bool {
        match self {
            PropertyValue::Title(s) | PropertyValue::RichText(s) => s.is_empty(),
            PropertyValue::Number(n) => n.is_none(),
            PropertyValue::Url(u) => u.as_deref().map_or(true, str::is_empty),
            PropertyValue::MultiSelect(v) => v.is_empty(),
        }
    }
}

/// Field name → value mapping sent to the remote store for one record
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PropertyPayload(BTreeMap<String, PropertyValue>);

impl PropertyPayload {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a value, replacing any previous value for the same field
    pub fn insert(&mut self, name: impl Into<String>, value: PropertyValue) {
        self.0.insert(name.into(), value);
    }

    pub fn get(&self, name: &str) -> Option<&PropertyValue> {
        self.0.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates over `(field name, value)` pairs in name order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &PropertyValue)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl FromIterator<(String, PropertyValue)> for PropertyPayload {
    fn from_iter<I: IntoIterator<Item = (String, PropertyValue)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Field definitions of the remote database, keyed by field name
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RemoteSchema {
    fields: HashMap<String, PropertyKind>,
}

impl RemoteSchema {
    pub fn new(fields: HashMap<String, PropertyKind>) -> Self {
        Self { fields }
    }

    /// Kind of the named field, if the schema defines it
    pub fn kind_of(&self, name: &str) -> Option<PropertyKind> {
        self.fields.get(name).copied()
    }

    /// Exact name + kind match
    pub fn has_field(&self, name: &str, kind: PropertyKind) -> bool {
        kind != PropertyKind::Unsupported && self.kind_of(name) == Some(kind)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Iterates over `(field name, kind)` pairs sorted by name
    pub fn fields(&self) -> Vec<(&str, PropertyKind)> {
        let mut fields: Vec<_> = self
            .fields
            .iter()
            .map(|(name, kind)| (name.as_str(), *kind))
            .collect();
        fields.sort_by(|a, b| a.0.cmp(b.0));
        fields
    }
}

impl<S: Into<String>> FromIterator<(S, PropertyKind)> for RemoteSchema {
    fn from_iter<I: IntoIterator<Item = (S, PropertyKind)>>(iter: I) -> Self {
        Self {
            fields: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}
