//! Discovery of mapping calls inside mapping templates
//!
//! Mapping bodies are template strings that may call other mappings, e.g.
//! `{{ executeMapping('zaak-to-case', object) }}`. The scanner only
//! pattern-matches that call shape; it never parses or runs the template.
//!
//! Grammar, per match:
//!
//! ```text
//! call   := NAME ws* "(" ws* quoted ws* ("," | ")")
//! quoted := "'" (escape | [^'\\])* "'" | '"' (escape | [^"\\])* '"'
//! escape := "\" any          (yields `any`)
//! ```
//!
//! `NAME` is one of the configured function names at a word boundary.
//! Every call in every string is reported, in order of appearance.

use crate::core::entity::EntityType;
use crate::core::error::ConfigError;
use crate::core::table::MappingTable;
use indexmap::IndexSet;
use regex::Regex;
use serde_json::Value;
use std::sync::OnceLock;

/// Function name used by the template runtime to invoke a mapping
pub const DEFAULT_MAPPING_FUNCTION: &str = "executeMapping";

/// Finds the first argument of every mapping call in template strings
#[derive(Debug, Clone)]
pub struct MappingCallScanner {
    pattern: Regex,
}

impl Default for MappingCallScanner {
    fn default() -> Self {
        static DEFAULT: OnceLock<MappingCallScanner> = OnceLock::new();
        DEFAULT
            .get_or_init(|| {
                MappingCallScanner::new(&[DEFAULT_MAPPING_FUNCTION]).expect("static pattern")
            })
            .clone()
    }
}

impl MappingCallScanner {
    /// Create a scanner for the given call names
    pub fn new<S: AsRef<str>>(function_names: &[S]) -> Result<Self, ConfigError> {
        let names: Vec<String> = function_names
            .iter()
            .map(|name| name.as_ref().trim())
            .filter(|name| !name.is_empty())
            .map(regex::escape)
            .collect();

        if names.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "mapping_call_functions".to_string(),
                value: String::new(),
                message: "at least one function name is required".to_string(),
            });
        }

        let pattern = format!(
            r#"\b(?:{})\s*\(\s*(?:'((?:[^'\\]|\\.)*)'|"((?:[^"\\]|\\.)*)")\s*[,)]"#,
            names.join("|")
        );
        let pattern = Regex::new(&pattern).map_err(|e| ConfigError::InvalidValue {
            field: "mapping_call_functions".to_string(),
            value: names.join(","),
            message: e.to_string(),
        })?;

        Ok(Self { pattern })
    }

    /// First arguments of every call in one string, unescaped
    pub fn scan_str(&self, text: &str) -> Vec<String> {
        self.pattern
            .captures_iter(text)
            .filter_map(|caps| caps.get(1).or_else(|| caps.get(2)))
            .map(|m| unescape(m.as_str()))
            .filter(|arg| !arg.is_empty())
            .collect()
    }

    /// First arguments of every call in every string of a JSON value
    pub fn scan_value(&self, value: &Value) -> Vec<String> {
        let mut found = Vec::new();
        self.collect(value, &mut found);
        found
    }

    fn collect(&self, value: &Value, found: &mut Vec<String>) {
        match value {
            Value::String(text) => found.extend(self.scan_str(text)),
            Value::Array(items) => items.iter().for_each(|item| self.collect(item, found)),
            Value::Object(map) => map.values().for_each(|item| self.collect(item, found)),
            _ => {}
        }
    }

    /// Mapping ids called from a template body
    ///
    /// Arguments known to the mapping table (as id, UUID or slug) are
    /// normalized to numeric ids; unknown ones are reported verbatim.
    pub fn discover(&self, body: &Value, table: &MappingTable) -> IndexSet<String> {
        self.scan_value(body)
            .into_iter()
            .map(|candidate| {
                table
                    .canonical_id(EntityType::Mapping, &candidate)
                    .map(str::to_string)
                    .unwrap_or(candidate)
            })
            .collect()
    }
}

fn unescape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            if let Some(escaped) = chars.next() {
                out.push(escaped);
            }
        } else {
            out.push(c);
        }
    }
    out
}
