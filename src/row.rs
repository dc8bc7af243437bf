use std::collections::BTreeMap;

use serde::ser::{Serialize, SerializeMap, Serializer};

/// A single value flowing through the pipeline.
///
/// Values carry runtime type tags; steps branch on the tag and reject
/// variants they cannot handle. DSL-produced scalars default to
/// [`Value::String`]. The JSON and XML variants are opaque handles
/// produced by the parsing steps — `parse-as-json` yields object and
/// array handles, `parse-as-xml` yields a validated document handle.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    Bytes(Vec<u8>),
    List(Vec<Value>),
    Map(BTreeMap<String, Value>),
    JsonArray(Vec<serde_json::Value>),
    JsonObject(serde_json::Map<String, serde_json::Value>),
    Xml(String),
}

impl Value {
    /// Tag name used in type-mismatch diagnostics.
    pub const fn type_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "a boolean",
            Self::Int(_) => "an integer",
            Self::Float(_) => "a float",
            Self::String(_) => "a string",
            Self::Bytes(_) => "bytes",
            Self::List(_) => "a list",
            Self::Map(_) => "a map",
            Self::JsonArray(_) => "a JSON array",
            Self::JsonObject(_) => "a JSON object",
            Self::Xml(_) => "an XML document",
        }
    }

    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Borrow the string content when this value is a string.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s.as_str()),
            _ => None,
        }
    }

    /// Numeric view used by quantize and the date steps. Integers,
    /// floats, and numeric strings qualify; everything else is `None`.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Int(i) => Some(*i as f64),
            Self::Float(f) => Some(*f),
            Self::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// Integer view; floats are accepted when they are whole.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int(i) => Some(*i),
            Self::Float(f) if f.fract() == 0.0 => Some(*f as i64),
            Self::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// Stringified form used by concatenating and string-op steps.
    ///
    /// Null renders as the empty string; structured values render as
    /// their JSON text, XML handles as their source text.
    pub fn to_text(&self) -> String {
        match self {
            Self::Null => String::new(),
            Self::Bool(b) => b.to_string(),
            Self::Int(i) => i.to_string(),
            Self::Float(f) => f.to_string(),
            Self::String(s) => s.clone(),
            Self::Bytes(b) => String::from_utf8_lossy(b).into_owned(),
            Self::Xml(x) => x.clone(),
            Self::List(_) | Self::Map(_) | Self::JsonArray(_) | Self::JsonObject(_) => {
                serde_json::to_string(&self.to_json()).unwrap_or_default()
            }
        }
    }

    /// Convert a parsed JSON value into a row value. Objects and arrays
    /// become opaque handles; scalars become native variants.
    pub fn from_json(json: serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Self::Null,
            serde_json::Value::Bool(b) => Self::Bool(b),
            serde_json::Value::Number(n) => n
                .as_i64()
                .map_or_else(|| Self::Float(n.as_f64().unwrap_or(f64::NAN)), Self::Int),
            serde_json::Value::String(s) => Self::String(s),
            serde_json::Value::Array(items) => Self::JsonArray(items),
            serde_json::Value::Object(map) => Self::JsonObject(map),
        }
    }

    /// JSON view of this value, used by `json-path` and stringification.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Self::Null => serde_json::Value::Null,
            Self::Bool(b) => serde_json::Value::Bool(*b),
            Self::Int(i) => serde_json::Value::from(*i),
            Self::Float(f) => serde_json::Value::from(*f),
            Self::String(s) | Self::Xml(s) => serde_json::Value::String(s.clone()),
            Self::Bytes(b) => serde_json::Value::from(b.clone()),
            Self::List(items) => {
                serde_json::Value::Array(items.iter().map(Self::to_json).collect())
            }
            Self::Map(map) => serde_json::Value::Object(
                map.iter().map(|(k, v)| (k.clone(), v.to_json())).collect(),
            ),
            Self::JsonArray(items) => serde_json::Value::Array(items.clone()),
            Self::JsonObject(map) => serde_json::Value::Object(map.clone()),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Self::Int(i)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Self::Float(f)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

/// One named column inside a row.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub value: Value,
}

/// An ordered sequence of (column-name, value) pairs.
///
/// Positional identity is authoritative: duplicate names are permitted
/// and by-name operations resolve to the first match. Insertion always
/// appends; replacing a value in place never changes width or order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row {
    columns: Vec<Column>,
}

impl Row {
    pub const fn new() -> Self {
        Self {
            columns: Vec::new(),
        }
    }

    /// Build a row from (name, value) pairs, preserving their order.
    pub fn from_pairs<N, V>(pairs: impl IntoIterator<Item = (N, V)>) -> Self
    where
        N: Into<String>,
        V: Into<Value>,
    {
        let mut row = Self::new();
        for (name, value) in pairs {
            row.add(name, value);
        }
        row
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Append a column. Duplicate names are allowed.
    pub fn add(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.columns.push(Column {
            name: name.into(),
            value: value.into(),
        });
    }

    /// Index of the first column with this name, if any.
    pub fn find(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    /// Value of the first column with this name.
    pub fn value_of(&self, name: &str) -> Option<&Value> {
        self.find(name).map(|pos| &self.columns[pos].value)
    }

    /// Value at a position. Out-of-range positions are a caller bug.
    pub fn value(&self, pos: usize) -> &Value {
        &self.columns[pos].value
    }

    pub fn name(&self, pos: usize) -> &str {
        &self.columns[pos].name
    }

    /// Replace the value at a position in place; width and order are
    /// unchanged. Out-of-range positions are a caller bug.
    pub fn set_value(&mut self, pos: usize, value: Value) {
        self.columns[pos].value = value;
    }

    /// Rename the column at a position in place.
    pub fn set_name(&mut self, pos: usize, name: impl Into<String>) {
        self.columns[pos].name = name.into();
    }

    /// Remove the column at a position. Out-of-range positions are a
    /// caller bug.
    pub fn remove(&mut self, pos: usize) -> Column {
        self.columns.remove(pos)
    }

    /// Exchange the values at two positions, leaving names in place.
    pub fn swap_values(&mut self, a: usize, b: usize) {
        if a != b {
            let tmp = std::mem::replace(&mut self.columns[a].value, Value::Null);
            self.columns[a].value = std::mem::replace(&mut self.columns[b].value, tmp);
        }
    }

    /// Replace the value of the first column with this name, or append
    /// a new column when absent. Used by steps with a `dest` argument.
    pub fn set_or_add(&mut self, name: &str, value: Value) {
        match self.find(name) {
            Some(pos) => self.set_value(pos, value),
            None => self.add(name, value),
        }
    }

    pub fn columns(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.columns.iter().map(|c| (c.name.as_str(), &c.value))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.name.as_str())
    }
}

impl Serialize for Row {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.columns.len()))?;
        for column in &self.columns {
            map.serialize_entry(&column.name, &column.value)?;
        }
        map.end()
    }
}
