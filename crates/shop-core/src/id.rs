//! # Record Identifiers
//!
//! Opaque ids as handed out by the record store. Stores may use
//! integer or uuid primary keys; both are carried as strings.

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Opaque record identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct RecordId(String);

impl RecordId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// True when the id is empty or whitespace only
    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RecordId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for RecordId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl<'de> Deserialize<'de> for RecordId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Text(String),
            Int(i64),
        }

        Ok(match Raw::deserialize(deserializer)? {
            Raw::Text(s) => RecordId(s),
            Raw::Int(n) => RecordId(n.to_string()),
        })
    }
}

/// Check that a required id is present and non-blank
pub fn require_id(id: Option<&RecordId>, field: &str) -> crate::ShopResult<RecordId> {
    match id {
        Some(id) if !id.is_blank() => Ok(id.clone()),
        _ => Err(crate::ShopError::validation(format!(
            "Missing required field: {}.",
            field
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_numeric_and_text_ids() {
        let n: RecordId = serde_json::from_str("42").unwrap();
        assert_eq!(n.as_str(), "42");

        let s: RecordId = serde_json::from_str("\"a1b2\"").unwrap();
        assert_eq!(s.as_str(), "a1b2");
    }

    #[test]
    fn test_require_id() {
        assert!(require_id(None, "user_id").is_err());
        assert!(require_id(Some(&RecordId::new("  ")), "user_id").is_err());
        assert_eq!(
            require_id(Some(&RecordId::new("u1")), "user_id").unwrap(),
            RecordId::new("u1")
        );
    }
}
