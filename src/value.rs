//! Values exchanged with the host data pipeline.
//!
//! A [`FieldValue`] is either a scalar, a sequence, a plain ordered mapping,
//! or a structured [`Record`] handed out by an external service. Records
//! carry the same data as a mapping but are a distinct type so they can be
//! mutated through accessors before being handed back; [`flatten`] turns
//! every record into a plain mapping.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// A leaf value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    /// Absent value
    Null,
    /// Boolean
    Bool(bool),
    /// Integer or floating-point number
    Number(serde_json::Number),
    /// Text
    String(String),
}

impl Scalar {
    /// Renders the scalar as an identifier.
    ///
    /// Strings are returned as-is and numbers in their decimal form;
    /// null and booleans are not identifiers.
    pub fn as_identifier(&self) -> Option<String> {
        match self {
            Scalar::String(s) => Some(s.clone()),
            Scalar::Number(n) => Some(n.to_string()),
            Scalar::Null | Scalar::Bool(_) => None,
        }
    }

    /// Returns true for [`Scalar::Null`].
    pub fn is_null(&self) -> bool {
        matches!(self, Scalar::Null)
    }
}

/// Ordered key/value data.
pub type Mapping = IndexMap<String, FieldValue>;

/// A structured object owned by an external service.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Record {
    data: Mapping,
}

impl Record {
    /// Creates an empty record.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a field, if present.
    pub fn get(&self, key: &str) -> Option<&FieldValue> {
        self.data.get(key)
    }

    /// Sets a field, keeping its position if it already exists.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<FieldValue>) {
        self.data.insert(key.into(), value.into());
    }

    /// Returns the record's data.
    pub fn data(&self) -> &Mapping {
        &self.data
    }

    /// Consumes the record, returning its data.
    pub fn into_data(self) -> Mapping {
        self.data
    }
}

impl<K: Into<String>, V: Into<FieldValue>> FromIterator<(K, V)> for Record {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            data: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

/// Any value found in a response envelope or certificate record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    /// Leaf value
    Scalar(Scalar),
    /// Ordered list
    Sequence(Vec<FieldValue>),
    /// Plain mapping
    Mapping(Mapping),
    /// Structured record; serialized as a mapping, never produced by
    /// deserialization
    #[serde(skip_deserializing)]
    Record(Record),
}

impl FieldValue {
    /// Null scalar.
    pub const NULL: FieldValue = FieldValue::Scalar(Scalar::Null);

    /// Builds a plain mapping from key/value pairs.
    pub fn mapping<K, V>(entries: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<FieldValue>,
    {
        FieldValue::Mapping(
            entries
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    /// Looks up a key in a mapping or record.
    pub fn get(&self, key: &str) -> Option<&FieldValue> {
        match self {
            FieldValue::Mapping(map) => map.get(key),
            FieldValue::Record(record) => record.get(key),
            FieldValue::Scalar(_) | FieldValue::Sequence(_) => None,
        }
    }

    /// Returns the underlying mapping of a mapping or record.
    pub fn as_mapping_mut(&mut self) -> Option<&mut Mapping> {
        match self {
            FieldValue::Mapping(map) => Some(map),
            FieldValue::Record(record) => Some(&mut record.data),
            FieldValue::Scalar(_) | FieldValue::Sequence(_) => None,
        }
    }

    /// Returns the scalar, if this is one.
    pub fn as_scalar(&self) -> Option<&Scalar> {
        match self {
            FieldValue::Scalar(scalar) => Some(scalar),
            _ => None,
        }
    }
}

impl From<Scalar> for FieldValue {
    fn from(value: Scalar) -> Self {
        FieldValue::Scalar(value)
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Scalar(Scalar::String(value.to_string()))
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Scalar(Scalar::String(value))
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        FieldValue::Scalar(Scalar::Number(value.into()))
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        FieldValue::Scalar(Scalar::Bool(value))
    }
}

impl From<Record> for FieldValue {
    fn from(value: Record) -> Self {
        FieldValue::Record(value)
    }
}

impl From<Vec<FieldValue>> for FieldValue {
    fn from(value: Vec<FieldValue>) -> Self {
        FieldValue::Sequence(value)
    }
}

impl From<Mapping> for FieldValue {
    fn from(value: Mapping) -> Self {
        FieldValue::Mapping(value)
    }
}

/// Recursively converts records into plain mappings.
///
/// Scalars pass through unchanged, sequences and mappings keep their order,
/// and flattening an already flat value returns it unchanged.
///
/// ```
/// use certificate_links::{flatten, FieldValue, Record};
///
/// let record: Record = [("id", FieldValue::from("42"))].into_iter().collect();
/// let flat = flatten(FieldValue::Sequence(vec![record.into()]));
///
/// assert_eq!(
///     flat,
///     FieldValue::Sequence(vec![FieldValue::mapping([("id", "42")])])
/// );
/// ```
pub fn flatten(value: FieldValue) -> FieldValue {
    match value {
        FieldValue::Scalar(scalar) => FieldValue::Scalar(scalar),
        FieldValue::Sequence(items) => {
            FieldValue::Sequence(items.into_iter().map(flatten).collect())
        }
        FieldValue::Mapping(map) => FieldValue::Mapping(flatten_mapping(map)),
        FieldValue::Record(record) => FieldValue::Mapping(flatten_mapping(record.into_data())),
    }
}

fn flatten_mapping(map: Mapping) -> Mapping {
    map.into_iter().map(|(k, v)| (k, flatten(v))).collect()
}
