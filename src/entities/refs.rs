//! Serde helpers for reference fields
//!
//! Stored references are strings, but documents produced by other tools
//! frequently carry bare numeric ids. Both forms are accepted and numbers
//! are normalized to their decimal text.

use serde::de::{Deserializer, Error};
use serde::Deserialize;
use serde_json::Value;

/// Text form of a scalar reference, `None` for anything that is not a
/// string or a number
pub(crate) fn scalar_key(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Deserialize an optional reference from a string, a number or null
pub fn optional_ref<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(value) => scalar_key(&value)
            .map(Some)
            .ok_or_else(|| D::Error::custom("expected a string or numeric reference")),
    }
}

/// Deserialize a list of references; null is an empty list
pub fn ref_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let values = Option::<Vec<Value>>::deserialize(deserializer)?.unwrap_or_default();
    values
        .iter()
        .map(|value| {
            scalar_key(value)
                .ok_or_else(|| D::Error::custom("expected string or numeric references"))
        })
        .collect()
}
