//! Export document and import report types

use crate::config::major_version;
use crate::core::entity::{EntityType, Record};
use crate::core::error::{DocumentError, PortError, PortResult};
use crate::entities::Entity;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// A portable configuration bundle
///
/// ```json
/// {
///   "formatVersion": "1.0.0",
///   "configurationId": "pets",
///   "exportDate": "2026-01-01T00:00:00Z",
///   "entities": { "source": [ { "slug": "petstore", ... } ] }
/// }
/// ```
///
/// Entity groups are keyed by type tag. Keys are kept as plain strings so
/// a document with an unknown type still parses and the import can report
/// the offending records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportDocument {
    pub format_version: String,
    pub configuration_id: String,
    pub export_date: DateTime<Utc>,
    #[serde(default)]
    pub entities: BTreeMap<String, Vec<Record>>,
}

impl ExportDocument {
    /// Create an empty document stamped with the current time
    pub fn new(format_version: impl Into<String>, configuration_id: impl Into<String>) -> Self {
        Self {
            format_version: format_version.into(),
            configuration_id: configuration_id.into(),
            export_date: Utc::now(),
            entities: BTreeMap::new(),
        }
    }

    /// Append a record to its type group
    pub fn push(&mut self, entity_type: EntityType, record: Record) {
        self.entities
            .entry(entity_type.as_str().to_string())
            .or_default()
            .push(record);
    }

    /// Records of one type, in document order
    pub fn records(&self, entity_type: EntityType) -> &[Record] {
        self.entities
            .get(entity_type.as_str())
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Find a record by type and slug
    pub fn find(&self, entity_type: EntityType, slug: &str) -> Option<&Record> {
        self.records(entity_type)
            .iter()
            .find(|record| record.get("slug").and_then(Value::as_str) == Some(slug))
    }

    /// Total number of records
    pub fn entity_count(&self) -> usize {
        self.entities.values().map(Vec::len).sum()
    }

    /// Reject documents written by another major format version
    pub fn check_version(&self, expected: &str) -> Result<(), DocumentError> {
        let wanted = major_version(expected);
        if wanted.is_some() && major_version(&self.format_version) == wanted {
            return Ok(());
        }
        Err(DocumentError::UnsupportedVersion {
            expected: wanted.map(|major| major.to_string()).unwrap_or_else(|| expected.to_string()),
            found: self.format_version.clone(),
        })
    }

    pub fn to_json_pretty(&self) -> PortResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> PortResult<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

/// One record that could not be imported
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportFailure {
    /// Type tag as written in the document (may be unknown)
    pub entity_type: String,
    pub slug: Option<String>,
    pub error_code: String,
    pub error: String,
}

impl ImportFailure {
    pub fn new(entity_type: impl Into<String>, record: &Record, error: &PortError) -> Self {
        Self {
            entity_type: entity_type.into(),
            slug: record
                .get("slug")
                .and_then(Value::as_str)
                .map(str::to_string),
            error_code: error.error_code().to_string(),
            error: error.to_string(),
        }
    }
}

/// Outcome of importing a document
#[derive(Debug, Clone, Default)]
pub struct ImportReport {
    /// Entities written to the store, per type, in import order
    pub imported: BTreeMap<EntityType, Vec<Entity>>,
    pub failures: Vec<ImportFailure>,
    /// True when the import stopped at a failure
    pub aborted: bool,
}

impl ImportReport {
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn imported_count(&self) -> usize {
        self.imported.values().map(Vec::len).sum()
    }

    /// Imported entities of one type
    pub fn entities(&self, entity_type: EntityType) -> &[Entity] {
        self.imported
            .get(&entity_type)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Imported entity of a type by slug
    pub fn find(&self, entity_type: EntityType, slug: &str) -> Option<&Entity> {
        self.entities(entity_type).iter().find(|e| e.slug() == slug)
    }
}
