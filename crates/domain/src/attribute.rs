//! Typed attribute values reported in snapshots and change events.

use serde::{Deserialize, Serialize};

/// A single typed attribute value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttributeValue {
    Bool(bool),
    Int(i64),
    String(String),
}

impl From<bool> for AttributeValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for AttributeValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<&str> for AttributeValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_serialize_bool_variant_as_plain_bool() {
        let json = serde_json::to_string(&AttributeValue::Bool(true)).unwrap();
        assert_eq!(json, "true");
    }

    #[test]
    fn should_serialize_int_variant_as_number() {
        let json = serde_json::to_string(&AttributeValue::Int(70)).unwrap();
        assert_eq!(json, "70");
    }

    #[test]
    fn should_serialize_string_variant_as_plain_string() {
        let json = serde_json::to_string(&AttributeValue::from("white")).unwrap();
        assert_eq!(json, "\"white\"");
    }
}
