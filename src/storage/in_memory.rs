//! In-memory implementation of EntityStore for testing and development

use crate::core::entity::{EntityType, Record};
use crate::core::error::StorageError;
use crate::core::store::EntityStore;
use crate::entities::Entity;
use anyhow::{Result, anyhow};
use async_trait::async_trait;
use chrono::Utc;
use serde_json::{Value, json};
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, RwLock};
use uuid::Uuid;

/// Fields the store owns; records cannot overwrite them on update
const STORE_OWNED: &[&str] = &["id", "uuid", "created"];

#[derive(Default)]
struct StoreState {
    entities: HashMap<EntityType, BTreeMap<i64, Entity>>,
    next_ids: HashMap<EntityType, i64>,
}

impl StoreState {
    fn allocate_id(&mut self, entity_type: EntityType) -> i64 {
        let next = self.next_ids.entry(entity_type).or_insert(1);
        let id = *next;
        *next += 1;
        id
    }

    fn slug_taken(&self, entity_type: EntityType, slug: &str, except: Option<i64>) -> bool {
        self.entities
            .get(&entity_type)
            .is_some_and(|by_id| {
                by_id
                    .iter()
                    .any(|(id, e)| Some(*id) != except && e.slug() == slug)
            })
    }

    /// Give the entity a slug that no other entity of its type uses
    fn assign_unique_slug(&self, entity: &mut Entity) {
        entity.ensure_slug();
        let entity_type = entity.entity_type();
        if self.slug_taken(entity_type, entity.slug(), entity.id()) {
            let suffix = entity
                .id()
                .map(|id| id.to_string())
                .unwrap_or_else(|| Uuid::new_v4().simple().to_string());
            let slug = format!("{}-{}", entity.slug(), suffix);
            entity.set_slug(slug);
        }
    }
}

/// In-memory entity store
///
/// Useful for testing and development. Uses RwLock for thread-safe access.
/// Ids are assigned per type, starting at 1.
#[derive(Clone, Default)]
pub struct InMemoryEntityStore {
    state: Arc<RwLock<StoreState>>,
}

impl InMemoryEntityStore {
    /// Create a new empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an entity as it is, e.g. a test fixture
    ///
    /// Keeps a given id (and moves the id counter past it) or assigns the
    /// next one; assigns a slug when the entity has none.
    pub fn seed(&self, entity: impl Into<Entity>) -> Result<Entity> {
        let entity = entity.into();
        let entity_type = entity.entity_type();
        let mut state = self
            .state
            .write()
            .map_err(|e| anyhow!("Failed to acquire write lock: {}", e))?;

        let mut entity = match entity.id() {
            Some(id) => {
                let next = state.next_ids.entry(entity_type).or_insert(1);
                *next = (*next).max(id + 1);
                entity
            }
            None => {
                let id = state.allocate_id(entity_type);
                let mut record = entity.to_record()?;
                record.insert("id".to_string(), json!(id));
                Entity::from_record(entity_type, record)?
            }
        };
        state.assign_unique_slug(&mut entity);

        let id = entity.id().unwrap_or_default();
        state
            .entities
            .entry(entity_type)
            .or_default()
            .insert(id, entity.clone());
        Ok(entity)
    }

    /// Number of stored entities of a type
    pub fn count(&self, entity_type: EntityType) -> Result<usize> {
        let state = self
            .state
            .read()
            .map_err(|e| anyhow!("Failed to acquire read lock: {}", e))?;
        Ok(state.entities.get(&entity_type).map_or(0, BTreeMap::len))
    }
}

fn require_name(entity_type: EntityType, record: &Record) -> Result<()> {
    match record.get("name").and_then(Value::as_str) {
        Some(name) if !name.trim().is_empty() => Ok(()),
        _ => Err(StorageError::MissingField {
            entity_type,
            field: "name".to_string(),
        }
        .into()),
    }
}

#[async_trait]
impl EntityStore for InMemoryEntityStore {
    async fn find_by_configuration(
        &self,
        entity_type: EntityType,
        configuration_id: &str,
    ) -> Result<Vec<Entity>> {
        let state = self
            .state
            .read()
            .map_err(|e| anyhow!("Failed to acquire read lock: {}", e))?;

        Ok(state
            .entities
            .get(&entity_type)
            .map(|by_id| {
                by_id
                    .values()
                    .filter(|e| e.belongs_to(configuration_id))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn find(&self, entity_type: EntityType, id: i64) -> Result<Entity> {
        let state = self
            .state
            .read()
            .map_err(|e| anyhow!("Failed to acquire read lock: {}", e))?;

        state
            .entities
            .get(&entity_type)
            .and_then(|by_id| by_id.get(&id))
            .cloned()
            .ok_or_else(|| StorageError::NotFound { entity_type, id }.into())
    }

    async fn list(&self, entity_type: EntityType) -> Result<Vec<Entity>> {
        let state = self
            .state
            .read()
            .map_err(|e| anyhow!("Failed to acquire read lock: {}", e))?;

        Ok(state
            .entities
            .get(&entity_type)
            .map(|by_id| by_id.values().cloned().collect())
            .unwrap_or_default())
    }

    async fn create_from_record(&self, entity_type: EntityType, mut record: Record) -> Result<Entity> {
        require_name(entity_type, &record)?;

        let mut state = self
            .state
            .write()
            .map_err(|e| anyhow!("Failed to acquire write lock: {}", e))?;

        let id = state.allocate_id(entity_type);
        let now = Utc::now().to_rfc3339();
        record.insert("id".to_string(), json!(id));
        record.insert("uuid".to_string(), json!(Uuid::new_v4().to_string()));
        record.insert("created".to_string(), json!(now));
        record.insert("updated".to_string(), json!(now));

        let mut entity = Entity::from_record(entity_type, record)?;
        state.assign_unique_slug(&mut entity);

        state
            .entities
            .entry(entity_type)
            .or_default()
            .insert(id, entity.clone());
        Ok(entity)
    }

    async fn update_from_record(
        &self,
        entity_type: EntityType,
        id: i64,
        record: Record,
    ) -> Result<Entity> {
        let mut state = self
            .state
            .write()
            .map_err(|e| anyhow!("Failed to acquire write lock: {}", e))?;

        let existing = state
            .entities
            .get(&entity_type)
            .and_then(|by_id| by_id.get(&id))
            .ok_or(StorageError::NotFound { entity_type, id })?;

        let mut merged = existing.to_record()?;
        for (key, value) in record {
            if !STORE_OWNED.contains(&key.as_str()) {
                merged.insert(key, value);
            }
        }
        require_name(entity_type, &merged)?;
        merged.insert("updated".to_string(), json!(Utc::now().to_rfc3339()));

        let mut entity = Entity::from_record(entity_type, merged)?;
        state.assign_unique_slug(&mut entity);

        state
            .entities
            .entry(entity_type)
            .or_default()
            .insert(id, entity.clone());
        Ok(entity)
    }
}
