//! Configuration loading and management

use crate::core::error::{ConfigError, PortResult};
use crate::handlers::desensitize::{DEFAULT_SENSITIVE_KEY_PATTERN, DEFAULT_STRIPPED_FIELDS};
use crate::handlers::scanner::DEFAULT_MAPPING_FUNCTION;
use crate::handlers::{Desensitizer, MappingCallScanner};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Version written into export documents
pub const FORMAT_VERSION: &str = "1.0.0";

/// What an import does after one entity fails
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OnImportError {
    /// Record the failure and import the remaining entities
    #[default]
    Continue,
    /// Stop at the first failure; entities already written stay written
    Abort,
}

/// Options for exporting and importing configurations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PortConfig {
    /// `formatVersion` of produced documents; imports require the same major
    pub format_version: String,

    /// Append mappings that are only called from templates or rule
    /// configurations to the export
    pub include_transitive_mappings: bool,

    pub on_import_error: OnImportError,

    /// Template functions whose first argument names a mapping
    pub mapping_call_functions: Vec<String>,

    /// Regex for configuration keys removed from exported sources
    pub sensitive_key_pattern: String,

    /// Top-level source fields removed on export
    pub stripped_source_fields: Vec<String>,
}

impl Default for PortConfig {
    fn default() -> Self {
        Self {
            format_version: FORMAT_VERSION.to_string(),
            include_transitive_mappings: true,
            on_import_error: OnImportError::Continue,
            mapping_call_functions: vec![DEFAULT_MAPPING_FUNCTION.to_string()],
            sensitive_key_pattern: DEFAULT_SENSITIVE_KEY_PATTERN.to_string(),
            stripped_source_fields: DEFAULT_STRIPPED_FIELDS.iter().map(|f| f.to_string()).collect(),
        }
    }
}

impl PortConfig {
    /// Load configuration from a YAML file
    pub fn from_yaml_file(path: impl AsRef<Path>) -> PortResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::IoError {
            message: format!("{}: {}", path.display(), e),
        })?;
        let config: Self = serde_yaml::from_str(&content).map_err(|e| ConfigError::ParseError {
            file: Some(path.display().to_string()),
            message: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a YAML string
    pub fn from_yaml_str(yaml: &str) -> PortResult<Self> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Check values that serde cannot
    pub fn validate(&self) -> Result<(), ConfigError> {
        major_version(&self.format_version).ok_or_else(|| ConfigError::InvalidValue {
            field: "format_version".to_string(),
            value: self.format_version.clone(),
            message: "expected a dotted version such as 1.0.0".to_string(),
        })?;
        self.desensitizer()?;
        self.scanner()?;
        Ok(())
    }

    /// Build the source desensitizer these options describe
    pub fn desensitizer(&self) -> Result<Desensitizer, ConfigError> {
        Desensitizer::new(self.stripped_source_fields.clone(), &self.sensitive_key_pattern)
    }

    /// Build the mapping-call scanner these options describe
    pub fn scanner(&self) -> Result<MappingCallScanner, ConfigError> {
        MappingCallScanner::new(self.mapping_call_functions.as_slice())
    }
}

/// Leading numeric component of a dotted version
pub fn major_version(version: &str) -> Option<u64> {
    version.split('.').next()?.trim().parse().ok()
}
