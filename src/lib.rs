//! # confport
//!
//! Portable export and import of integration configurations.
//!
//! A configuration is a bundle of sources, endpoints, mappings, rules,
//! jobs and synchronizations that point at each other by numeric id. Ids
//! are local to one deployment, so an export replaces every reference with
//! the slug of the referenced entity and an import turns slugs back into
//! the ids of the target deployment.
//!
//! ## Features
//!
//! - **Slug Mapping Table**: per-type id ↔ slug lookup built once per operation
//! - **Declarative References**: one resolver driven by per-type field layouts
//! - **Composite Targets**: `register/schema` pairs resolved half by half
//! - **Transitive Mappings**: mappings called from templates are bundled too
//! - **Desensitization**: credentials never leave the exporting deployment
//! - **Upsert Import**: existing slugs are updated in place, never duplicated
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use confport::prelude::*;
//! use std::sync::Arc;
//!
//! let source_store = Arc::new(InMemoryEntityStore::new());
//! // ... seed entities with `configurations = ["pets"]`
//!
//! let exporter = ConfigurationService::new(source_store, PortConfig::default())?;
//! let document = exporter.export_configuration("pets").await?;
//! let json = document.to_json_pretty()?;
//!
//! let target_store = Arc::new(InMemoryEntityStore::new());
//! let importer = ConfigurationService::new(target_store, PortConfig::default())?;
//! let report = importer
//!     .import_configuration(&ExportDocument::from_json(&json)?, &ImportOptions::default())
//!     .await?;
//! assert!(report.is_success());
//! ```

pub mod config;
pub mod configuration;
pub mod core;
pub mod entities;
pub mod handlers;
pub mod storage;

/// Re-exports of commonly used types and traits
pub mod prelude {
    // === Core ===
    pub use crate::core::{
        entity::{ConfigEntity, EntityType, Record},
        error::{
            ConfigError, DocumentError, EntityError, PortError, PortResult, StorageError,
        },
        slug::Slugifier,
        store::EntityStore,
        table::{MappingTable, SlugIndex},
    };

    // === Entities ===
    pub use crate::entities::{
        Endpoint, Entity, Job, Mapping, Register, Rule, Schema, Source, Synchronization,
    };

    // === Handlers ===
    pub use crate::handlers::{
        Desensitizer, Direction, EntityHandler, Exported, FieldRule, HandlerRegistry, ImportPlan,
        MappingCallScanner, Unresolved,
    };

    // === Orchestration ===
    pub use crate::configuration::{
        ConfigurationService, ExportDocument, ImportFailure, ImportOptions, ImportReport,
    };

    // === Storage ===
    pub use crate::storage::InMemoryEntityStore;

    // === Config ===
    pub use crate::config::{OnImportError, PortConfig};

    // === External dependencies ===
    pub use anyhow::Result;
    pub use async_trait::async_trait;
    pub use serde_json::Value;
}
