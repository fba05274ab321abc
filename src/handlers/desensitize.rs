//! Removal of authentication material from exported source records

use crate::core::entity::Record;
use crate::core::error::ConfigError;
use regex::Regex;
use serde_json::Value;
use std::sync::OnceLock;

/// Top-level source fields that carry credentials
pub const DEFAULT_STRIPPED_FIELDS: &[&str] = &[
    "auth",
    "authorizationHeader",
    "authorizationPassthrough",
    "authenticationConfig",
    "authorizationKeys",
    "jwt",
    "jwtId",
    "secret",
    "username",
    "password",
    "apikey",
    "headers",
];

/// Configuration keys matching this pattern are removed
pub const DEFAULT_SENSITIVE_KEY_PATTERN: &str = "(?i)authorization|token|key|secret";

/// Strips credentials from source records
#[derive(Debug, Clone)]
pub struct Desensitizer {
    stripped_fields: Vec<String>,
    sensitive_keys: Regex,
}

impl Default for Desensitizer {
    fn default() -> Self {
        static SENSITIVE_KEYS: OnceLock<Regex> = OnceLock::new();
        let sensitive_keys = SENSITIVE_KEYS.get_or_init(|| {
            Regex::new(DEFAULT_SENSITIVE_KEY_PATTERN).expect("static pattern")
        });

        Self {
            stripped_fields: DEFAULT_STRIPPED_FIELDS.iter().map(|f| f.to_string()).collect(),
            sensitive_keys: sensitive_keys.clone(),
        }
    }
}

impl Desensitizer {
    /// Create a desensitizer with custom fields and key pattern
    pub fn new(stripped_fields: Vec<String>, sensitive_key_pattern: &str) -> Result<Self, ConfigError> {
        let sensitive_keys =
            Regex::new(sensitive_key_pattern).map_err(|e| ConfigError::InvalidValue {
                field: "sensitive_key_pattern".to_string(),
                value: sensitive_key_pattern.to_string(),
                message: e.to_string(),
            })?;

        Ok(Self {
            stripped_fields,
            sensitive_keys,
        })
    }

    /// Check whether a configuration key names secret material
    pub fn is_sensitive_key(&self, key: &str) -> bool {
        self.sensitive_keys.is_match(key)
    }

    /// Remove credential fields and sensitive configuration entries
    pub fn apply(&self, record: &mut Record) {
        for field in &self.stripped_fields {
            record.remove(field);
        }

        if let Some(Value::Object(configuration)) = record.get_mut("configuration") {
            self.scrub(configuration);
        }
    }

    fn scrub(&self, map: &mut Record) {
        map.retain(|key, _| {
            let keep = !self.is_sensitive_key(key);
            if !keep {
                tracing::debug!(key = %key, "Removed sensitive configuration entry");
            }
            keep
        });

        for value in map.values_mut() {
            self.scrub_value(value);
        }
    }

    fn scrub_value(&self, value: &mut Value) {
        match value {
            Value::Object(inner) => self.scrub(inner),
            Value::Array(items) => {
                for item in items {
                    self.scrub_value(item);
                }
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: Value) -> Record {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_flat_authorization_header_is_removed() {
        let mut rec = record(json!({
            "name": "Petstore",
            "configuration": {
                "headers.Authorization": "Bearer abc",
                "headers.Accept": "application/json",
                "query.page": 1
            }
        }));

        Desensitizer::default().apply(&mut rec);

        assert_eq!(
            rec["configuration"],
            json!({"headers.Accept": "application/json", "query.page": 1})
        );
    }

    #[test]
    fn test_nested_entries_are_scrubbed_case_insensitively() {
        let mut rec = record(json!({
            "configuration": {
                "headers": {"AUTHORIZATION": "x", "Accept": "y"},
                "oauth": {"client": {"clientSecret": "z", "scope": "read"}},
                "apiKey": "k",
                "accessToken": "t"
            }
        }));

        Desensitizer::default().apply(&mut rec);

        assert_eq!(
            rec["configuration"],
            json!({
                "headers": {"Accept": "y"},
                "oauth": {"client": {"scope": "read"}}
            })
        );
    }

    #[test]
    fn test_entries_inside_arrays_are_scrubbed() {
        let mut rec = record(json!({
            "configuration": {
                "auth_methods": [
                    {"type": "bearer", "token": "t"},
                    [{"clientSecret": "s", "scope": "read"}],
                    "plain"
                ]
            }
        }));

        Desensitizer::default().apply(&mut rec);

        assert_eq!(
            rec["configuration"],
            json!({
                "auth_methods": [
                    {"type": "bearer"},
                    [{"scope": "read"}],
                    "plain"
                ]
            })
        );
    }

    #[test]
    fn test_credential_fields_are_removed() {
        let mut rec = record(json!({
            "name": "Petstore",
            "location": "https://petstore.example",
            "auth": "basic",
            "username": "u",
            "password": "p",
            "apikey": "k",
            "jwt": "j",
            "headers": {"X-Api": "1"}
        }));

        Desensitizer::default().apply(&mut rec);

        assert_eq!(
            rec,
            record(json!({"name": "Petstore", "location": "https://petstore.example"}))
        );
    }

    #[test]
    fn test_invalid_pattern_is_a_config_error() {
        let err = Desensitizer::new(vec![], "(unclosed").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));
    }
}
