//! Tagged values for template variables, configuration, and model metadata.
//!
//! Variables and configuration come from YAML or JSON and can nest
//! arbitrarily. [`Value`] keeps them typed so dot-path traversal and
//! conversions into the template layer never need reflection.

use crate::error::{CoreError, CoreResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// A loosely-shaped value: scalar, sequence, or string-keyed mapping.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(untagged)]
pub enum Value {
    /// Explicit null / missing scalar
    #[default]
    Null,
    /// Boolean
    Bool(bool),
    /// Whole number
    Integer(i64),
    /// Floating-point number
    Float(f64),
    /// Text
    String(String),
    /// Ordered list of values
    Sequence(Vec<Value>),
    /// Nested mapping, keys sorted
    Mapping(BTreeMap<String, Value>),
}

impl Value {
    /// Build an empty mapping.
    pub fn mapping() -> Self {
        Value::Mapping(BTreeMap::new())
    }

    /// Return the string content if this is a `String`.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Return the nested mapping if this is a `Mapping`.
    pub fn as_mapping(&self) -> Option<&BTreeMap<String, Value>> {
        match self {
            Value::Mapping(map) => Some(map),
            _ => None,
        }
    }

    /// Whether the value counts as true in a boolean context.
    ///
    /// Null, `false`, zero, and empty strings/collections are falsy.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Null => false,
            Value::Bool(b) => *b,
            Value::Integer(i) => *i != 0,
            Value::Float(f) => *f != 0.0,
            Value::String(s) => !s.is_empty(),
            Value::Sequence(seq) => !seq.is_empty(),
            Value::Mapping(map) => !map.is_empty(),
        }
    }

    /// Insert `value` under `key` when this is a mapping.
    ///
    /// Returns the previous value stored under the key. Non-mapping values
    /// are left untouched and `None` is returned.
    pub fn insert(&mut self, key: impl Into<String>, value: Value) -> Option<Value> {
        match self {
            Value::Mapping(map) => map.insert(key.into(), value),
            _ => None,
        }
    }

    /// Resolve a dot-separated path (`a.b.c`) by descending through mappings.
    ///
    /// The first segment is looked up in `self`, so `self` must be a mapping.
    /// Fails on the first segment that is missing or whose parent is not a
    /// mapping.
    pub fn lookup_path(&self, path: &str) -> CoreResult<&Value> {
        let mut current = self;
        for segment in path.split('.') {
            let map = current.as_mapping().ok_or_else(|| CoreError::NotAMapping {
                path: path.to_string(),
                segment: segment.to_string(),
            })?;
            current = map.get(segment).ok_or_else(|| CoreError::KeyNotFound {
                path: path.to_string(),
                segment: segment.to_string(),
            })?;
        }
        Ok(current)
    }

    /// Recursively merge `other` into `self`.
    ///
    /// Mappings are merged key by key; any other combination replaces the
    /// existing value with `other`.
    pub fn merge(&mut self, other: Value) {
        match (self, other) {
            (Value::Mapping(base), Value::Mapping(overlay)) => {
                for (key, value) in overlay {
                    match base.get_mut(&key) {
                        Some(existing) => existing.merge(value),
                        None => {
                            base.insert(key, value);
                        }
                    }
                }
            }
            (slot, other) => *slot = other,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => Ok(()),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Integer(i) => write!(f, "{}", i),
            Value::Float(x) => write!(f, "{}", x),
            Value::String(s) => f.write_str(s),
            Value::Sequence(_) | Value::Mapping(_) => {
                let json = serde_json::to_string(self).map_err(|_| fmt::Error)?;
                f.write_str(&json)
            }
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Integer(i)
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Value::Float(x)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<Vec<Value>> for Value {
    fn from(seq: Vec<Value>) -> Self {
        Value::Sequence(seq)
    }
}

impl From<BTreeMap<String, Value>> for Value {
    fn from(map: BTreeMap<String, Value>) -> Self {
        Value::Mapping(map)
    }
}

impl FromIterator<(String, Value)> for Value {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Value::Mapping(iter.into_iter().collect())
    }
}

#[cfg(test)]
#[path = "value_test.rs"]
mod tests;
