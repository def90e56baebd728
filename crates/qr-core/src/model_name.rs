//! Strongly-typed model identifier.

use serde::{Deserialize, Deserializer, Serialize};
use std::borrow::Borrow;
use std::fmt;
use std::ops::Deref;

/// Non-empty identifier of a model.
///
/// Keeps model identifiers from being mixed up with table names, column
/// names or template source text. Ordering is lexical, which is what the
/// dependency sets on [`Model`](crate::Model) rely on for determinism.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct ModelName(String);

impl ModelName {
    /// Try to create a new `ModelName`, returning `None` if the name is empty
    /// or whitespace-only.
    pub fn try_new(name: impl Into<String>) -> Option<Self> {
        let s = name.into();
        if s.trim().is_empty() {
            None
        } else {
            Some(Self(s))
        }
    }

    /// Return the underlying name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consume the wrapper and return the inner `String`.
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl<'de> Deserialize<'de> for ModelName {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        ModelName::try_new(s).ok_or_else(|| serde::de::Error::custom("model name must not be empty"))
    }
}

impl fmt::Display for ModelName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ModelName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Deref for ModelName {
    type Target = str;
    fn deref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for ModelName {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl PartialEq<str> for ModelName {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for ModelName {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_try_new_rejects_blank() {
        assert!(ModelName::try_new("").is_none());
        assert!(ModelName::try_new("   ").is_none());
        assert_eq!(ModelName::try_new("stg_orders").unwrap(), "stg_orders");
    }

    #[test]
    fn test_borrow_lookup() {
        use std::collections::BTreeMap;
        let mut map: BTreeMap<ModelName, i32> = BTreeMap::new();
        map.insert(ModelName::try_new("orders").unwrap(), 1);
        assert_eq!(map.get("orders"), Some(&1));
    }

    #[test]
    fn test_deserialize_rejects_empty() {
        let ok: ModelName = serde_json::from_str(r#""orders""#).unwrap();
        assert_eq!(ok.as_str(), "orders");
        assert!(serde_json::from_str::<ModelName>(r#""""#).is_err());
    }
}
