//! Entity store adapter boundary
//!
//! The export/import engine never persists anything itself; it reads and
//! writes through this trait. Implementations decide how records become
//! rows (see [`InMemoryEntityStore`](crate::storage::InMemoryEntityStore)
//! for a reference implementation).

use crate::core::entity::{EntityType, Record};
use crate::entities::Entity;
use anyhow::Result;
use async_trait::async_trait;

/// Storage operations the engine consumes, for every entity type
#[async_trait]
pub trait EntityStore: Send + Sync {
    /// All entities of a type that belong to a configuration
    async fn find_by_configuration(
        &self,
        entity_type: EntityType,
        configuration_id: &str,
    ) -> Result<Vec<Entity>>;

    /// Get an entity by numeric id
    ///
    /// Fails with [`StorageError::NotFound`](crate::core::error::StorageError::NotFound)
    /// when no such entity exists.
    async fn find(&self, entity_type: EntityType, id: i64) -> Result<Entity>;

    /// All persisted entities of a type
    async fn list(&self, entity_type: EntityType) -> Result<Vec<Entity>>;

    /// Create an entity from a record
    ///
    /// Fails when required fields are absent.
    async fn create_from_record(&self, entity_type: EntityType, record: Record) -> Result<Entity>;

    /// Update an existing entity from a record
    ///
    /// Fails when `id` does not exist.
    async fn update_from_record(
        &self,
        entity_type: EntityType,
        id: i64,
        record: Record,
    ) -> Result<Entity>;
}
