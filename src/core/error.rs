//! Typed error handling for confport
//!
//! Errors are grouped by category so the orchestrator can decide, per
//! entity, whether a failure is fatal for the batch.
//!
//! # Error Categories
//!
//! - [`EntityError`]: wrong handler, unknown type tag, (de)serialization
//! - [`StorageError`]: failures reported by the entity store adapter
//! - [`ConfigError`]: loading and validating [`PortConfig`](crate::config::PortConfig)
//! - [`DocumentError`]: malformed or incompatible export documents
//!
//! Unresolved references and malformed composite values are *not* errors:
//! they degrade to the original value.
//!
//! # Example
//!
//! ```rust,ignore
//! match handler.export(&entity, &table) {
//!     Ok(exported) => records.push(exported.record),
//!     Err(PortError::Entity(EntityError::TypeMismatch { expected, found })) => {
//!         tracing::warn!(%expected, %found, "skipping entity");
//!     }
//!     Err(e) => return Err(e),
//! }
//! ```

use crate::core::entity::EntityType;
use thiserror::Error;

/// The main error type for confport
#[derive(Debug, Error)]
pub enum PortError {
    /// Entity-related errors
    #[error(transparent)]
    Entity(#[from] EntityError),

    /// Entity store errors
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// Configuration errors
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Export document errors
    #[error(transparent)]
    Document(#[from] DocumentError),

    /// Internal errors (should not happen in normal operation)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl PortError {
    /// Get the error code for this error
    pub fn error_code(&self) -> &'static str {
        match self {
            PortError::Entity(e) => e.error_code(),
            PortError::Storage(e) => e.error_code(),
            PortError::Config(_) => "CONFIG_ERROR",
            PortError::Document(e) => e.error_code(),
            PortError::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

// =============================================================================
// Entity Errors
// =============================================================================

/// Errors related to entities and their handlers
#[derive(Debug, Error)]
pub enum EntityError {
    /// An entity was passed to the handler of another type
    #[error("Handler for {expected} cannot process a {found} entity")]
    TypeMismatch {
        expected: EntityType,
        found: EntityType,
    },

    /// Type tag is not one of the known entity types
    #[error("Unknown entity type: {entity_type}")]
    UnknownType { entity_type: String },

    /// Type is known but nothing exports or imports it
    #[error("No handler registered for entity type {entity_type}")]
    NoHandler { entity_type: EntityType },

    /// Failed to serialize/deserialize an entity
    #[error("Failed to serialize/deserialize {entity_type}: {message}")]
    SerializationError {
        entity_type: EntityType,
        message: String,
    },
}

impl EntityError {
    pub fn error_code(&self) -> &'static str {
        match self {
            EntityError::TypeMismatch { .. } => "ENTITY_TYPE_MISMATCH",
            EntityError::UnknownType { .. } => "UNKNOWN_ENTITY_TYPE",
            EntityError::NoHandler { .. } => "NO_ENTITY_HANDLER",
            EntityError::SerializationError { .. } => "ENTITY_SERIALIZATION_ERROR",
        }
    }
}

// =============================================================================
// Storage Errors
// =============================================================================

/// Errors raised at the entity store boundary
#[derive(Debug, Error)]
pub enum StorageError {
    /// Entity was not found
    #[error("{entity_type} with id '{id}' not found")]
    NotFound { entity_type: EntityType, id: i64 },

    /// A record lacks a field the store requires
    #[error("Missing required field '{field}' for {entity_type}")]
    MissingField {
        entity_type: EntityType,
        field: String,
    },

    /// Store operation failed
    #[error("Failed to {operation} {entity_type}: {message}")]
    OperationFailed {
        entity_type: EntityType,
        operation: String,
        message: String,
    },
}

impl StorageError {
    pub fn error_code(&self) -> &'static str {
        match self {
            StorageError::NotFound { .. } => "ENTITY_NOT_FOUND",
            StorageError::MissingField { .. } => "MISSING_FIELD",
            StorageError::OperationFailed { .. } => "STORAGE_OPERATION_FAILED",
        }
    }

    /// Wrap an adapter error raised while performing `operation`
    pub fn operation(entity_type: EntityType, operation: &str, err: anyhow::Error) -> Self {
        // Typed store errors survive the trip through anyhow
        match err.downcast::<StorageError>() {
            Ok(storage) => storage,
            Err(other) => StorageError::OperationFailed {
                entity_type,
                operation: operation.to_string(),
                message: other.to_string(),
            },
        }
    }
}

// =============================================================================
// Config Errors
// =============================================================================

/// Errors related to configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to parse configuration
    #[error("Failed to parse config{}: {message}", file_suffix(.file))]
    ParseError {
        file: Option<String>,
        message: String,
    },

    /// Invalid value in configuration
    #[error("Invalid value '{value}' for field '{field}': {message}")]
    InvalidValue {
        field: String,
        value: String,
        message: String,
    },

    /// IO error while reading configuration
    #[error("IO error: {message}")]
    IoError { message: String },
}

fn file_suffix(file: &Option<String>) -> String {
    file.as_deref()
        .map(|f| format!(" file '{}'", f))
        .unwrap_or_default()
}

// =============================================================================
// Document Errors
// =============================================================================

/// Errors related to export documents
#[derive(Debug, Error)]
pub enum DocumentError {
    /// Document is not valid JSON or does not have the expected shape
    #[error("Invalid export document: {message}")]
    InvalidJson { message: String },

    /// Document was produced by an incompatible format version
    #[error("Unsupported format version '{found}' (expected {expected}.x)")]
    UnsupportedVersion { expected: String, found: String },
}

impl DocumentError {
    pub fn error_code(&self) -> &'static str {
        match self {
            DocumentError::InvalidJson { .. } => "INVALID_DOCUMENT",
            DocumentError::UnsupportedVersion { .. } => "UNSUPPORTED_FORMAT_VERSION",
        }
    }
}

// =============================================================================
// Conversions from external errors
// =============================================================================

impl From<serde_json::Error> for PortError {
    fn from(err: serde_json::Error) -> Self {
        PortError::Document(DocumentError::InvalidJson {
            message: err.to_string(),
        })
    }
}

impl From<serde_yaml::Error> for PortError {
    fn from(err: serde_yaml::Error) -> Self {
        PortError::Config(ConfigError::ParseError {
            file: None,
            message: err.to_string(),
        })
    }
}

impl From<std::io::Error> for PortError {
    fn from(err: std::io::Error) -> Self {
        PortError::Config(ConfigError::IoError {
            message: err.to_string(),
        })
    }
}

impl From<anyhow::Error> for PortError {
    fn from(err: anyhow::Error) -> Self {
        match err.downcast::<PortError>() {
            Ok(port) => port,
            Err(other) => PortError::Internal(other.to_string()),
        }
    }
}

// =============================================================================
// Result type alias
// =============================================================================

/// A specialized Result type for confport operations
pub type PortResult<T> = Result<T, PortError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_mismatch_display() {
        let err = EntityError::TypeMismatch {
            expected: EntityType::Source,
            found: EntityType::Job,
        };
        assert_eq!(err.to_string(), "Handler for source cannot process a job entity");
        assert_eq!(err.error_code(), "ENTITY_TYPE_MISMATCH");
    }

    #[test]
    fn test_port_error_conversion() {
        let err: PortError = StorageError::NotFound {
            entity_type: EntityType::Mapping,
            id: 7,
        }
        .into();
        assert_eq!(err.error_code(), "ENTITY_NOT_FOUND");
        assert!(err.to_string().contains("mapping with id '7' not found"));
    }

    #[test]
    fn test_operation_keeps_typed_storage_errors() {
        let inner = anyhow::Error::new(StorageError::MissingField {
            entity_type: EntityType::Rule,
            field: "name".to_string(),
        });
        let err = StorageError::operation(EntityType::Rule, "create", inner);
        assert!(matches!(err, StorageError::MissingField { .. }));

        let err = StorageError::operation(EntityType::Rule, "create", anyhow::anyhow!("disk full"));
        assert_eq!(err.to_string(), "Failed to create rule: disk full");
    }

    #[test]
    fn test_config_parse_error_mentions_file() {
        let err = ConfigError::ParseError {
            file: Some("confport.yaml".to_string()),
            message: "bad indent".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Failed to parse config file 'confport.yaml': bad indent"
        );

        let err = ConfigError::ParseError {
            file: None,
            message: "bad indent".to_string(),
        };
        assert_eq!(err.to_string(), "Failed to parse config: bad indent");
    }

    #[test]
    fn test_from_serde_json_error() {
        let json_err = serde_json::from_str::<serde_json::Value>("invalid json").unwrap_err();
        let err: PortError = json_err.into();
        assert!(matches!(
            err,
            PortError::Document(DocumentError::InvalidJson { .. })
        ));
    }
}
