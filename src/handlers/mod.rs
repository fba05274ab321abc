//! Per-type export and import handlers
//!
//! A handler turns a live [`Entity`] into a portable record (ids replaced
//! by slugs, secrets removed) and back. The shared work lives in the
//! default methods of [`EntityHandler`]; a concrete handler only names its
//! type and, where needed, adds desensitization or mapping discovery.
//!
//! ```rust,ignore
//! let registry = HandlerRegistry::with_defaults(&PortConfig::default())?;
//! let table = MappingTable::build(&entities);
//!
//! let exported = registry.dispatch(EntityType::Endpoint)?.export(&endpoint, &table)?;
//! assert!(exported.record.contains_key("slug"));
//! ```

pub mod desensitize;
pub mod endpoint;
pub mod job;
pub mod layout;
pub mod mapping;
pub mod resolver;
pub mod rule;
pub mod scanner;
pub mod source;
pub mod synchronization;

pub use desensitize::Desensitizer;
pub use endpoint::EndpointHandler;
pub use job::JobHandler;
pub use mapping::MappingHandler;
pub use resolver::{Direction, FieldRule, Unresolved};
pub use rule::RuleHandler;
pub use scanner::MappingCallScanner;
pub use source::SourceHandler;
pub use synchronization::SynchronizationHandler;

use crate::config::PortConfig;
use crate::core::entity::{EntityType, Record};
use crate::core::error::{EntityError, PortResult, StorageError};
use crate::core::slug::Slugifier;
use crate::core::store::EntityStore;
use crate::core::table::MappingTable;
use crate::entities::Entity;
use async_trait::async_trait;
use indexmap::IndexSet;
use serde_json::Value;
use std::collections::HashMap;

/// Fields that never leave the exporting environment
pub const EXPORT_STRIPPED: &[&str] = &["id", "uuid", "created", "updated", "configurations"];

/// Fields ignored when importing; the target store assigns its own
pub const IMPORT_STRIPPED: &[&str] = &["id", "uuid", "created", "updated"];

/// Result of exporting one entity
#[derive(Debug, Clone, PartialEq)]
pub struct Exported {
    /// Portable record: slug present, id and uuid absent
    pub record: Record,

    /// Numeric ids (or raw arguments, when unknown) of mappings this
    /// entity uses without them being part of its own reference fields
    pub discovered_mapping_ids: IndexSet<String>,
}

/// A record ready to be written, and whether it updates an existing entity
#[derive(Debug, Clone, PartialEq)]
pub struct ImportPlan {
    pub entity_type: EntityType,
    pub slug: String,
    pub existing_id: Option<i64>,
    pub record: Record,
}

/// Export and import of one entity type
#[async_trait]
pub trait EntityHandler: Send + Sync {
    /// The type tag this handler is responsible for
    fn entity_type(&self) -> EntityType;

    /// Where references live in this type's records
    fn layout(&self) -> &'static [FieldRule] {
        layout::for_type(self.entity_type())
    }

    /// Remove secrets from an exported record
    fn desensitize(&self, _record: &mut Record) {}

    /// Mapping ids referenced from places the layout does not cover
    fn discover(&self, _record: &Record, _table: &MappingTable) -> IndexSet<String> {
        IndexSet::new()
    }

    /// Convert an entity into a portable record
    ///
    /// Fails with [`EntityError::TypeMismatch`] when `entity` is of another
    /// type. Unresolvable references are left as they are.
    fn export(&self, entity: &Entity, table: &MappingTable) -> PortResult<Exported> {
        let entity_type = self.entity_type();
        if entity.entity_type() != entity_type {
            return Err(EntityError::TypeMismatch {
                expected: entity_type,
                found: entity.entity_type(),
            }
            .into());
        }

        let slug = entity.effective_slug();
        let mut record = entity.to_record()?;
        for field in EXPORT_STRIPPED {
            record.remove(*field);
        }
        record.insert("slug".to_string(), Value::String(slug.clone()));

        self.desensitize(&mut record);

        let mut discovered =
            resolver::resolve(&mut record, self.layout(), table, Direction::Export);
        discovered.extend(self.discover(&record, table));

        tracing::debug!(
            %entity_type,
            slug = %slug,
            discovered = discovered.len(),
            "Exported entity"
        );

        Ok(Exported {
            record,
            discovered_mapping_ids: discovered,
        })
    }

    /// Translate a portable record back into store terms
    ///
    /// Slugs become ids where the table knows them, a missing slug is
    /// derived from the name, and the record is matched against existing
    /// entities by slug.
    fn prepare_import(&self, mut record: Record, table: &MappingTable) -> PortResult<ImportPlan> {
        let entity_type = self.entity_type();
        for field in IMPORT_STRIPPED {
            record.remove(*field);
        }

        let slug = match record.get("slug").and_then(Value::as_str) {
            Some(slug) if !slug.is_empty() => slug.to_string(),
            _ => {
                let name = record.get("name").and_then(Value::as_str).unwrap_or_default();
                let slug = Slugifier::for_entity(entity_type, name, None);
                record.insert("slug".to_string(), Value::String(slug.clone()));
                slug
            }
        };

        resolver::resolve(&mut record, self.layout(), table, Direction::Import);

        let existing_id = table
            .id_for(entity_type, &slug)
            .and_then(|id| id.parse::<i64>().ok());

        Ok(ImportPlan {
            entity_type,
            slug,
            existing_id,
            record,
        })
    }

    /// Create or update the entity a portable record describes
    async fn import(
        &self,
        record: Record,
        table: &MappingTable,
        store: &dyn EntityStore,
    ) -> PortResult<Entity> {
        let plan = self.prepare_import(record, table)?;
        let entity_type = plan.entity_type;

        let entity = match plan.existing_id {
            Some(id) => {
                tracing::debug!(%entity_type, slug = %plan.slug, id, "Updating existing entity");
                store
                    .update_from_record(entity_type, id, plan.record)
                    .await
                    .map_err(|e| StorageError::operation(entity_type, "update", e))?
            }
            None => {
                tracing::debug!(%entity_type, slug = %plan.slug, "Creating entity");
                store
                    .create_from_record(entity_type, plan.record)
                    .await
                    .map_err(|e| StorageError::operation(entity_type, "create", e))?
            }
        };

        if entity.entity_type() != entity_type {
            return Err(EntityError::TypeMismatch {
                expected: entity_type,
                found: entity.entity_type(),
            }
            .into());
        }

        Ok(entity)
    }
}

/// Registry of handlers, keyed by the type they serve
#[derive(Default)]
pub struct HandlerRegistry {
    handlers: HashMap<EntityType, Box<dyn EntityHandler>>,
}

impl HandlerRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self {
            handlers: HashMap::new(),
        }
    }

    /// A registry with the six built-in handlers, configured from `config`
    pub fn with_defaults(config: &PortConfig) -> PortResult<Self> {
        let mut registry = Self::new();
        registry.register(Box::new(SourceHandler::new(config.desensitizer()?)));
        registry.register(Box::new(EndpointHandler));
        registry.register(Box::new(MappingHandler::new(config.scanner()?)));
        registry.register(Box::new(RuleHandler));
        registry.register(Box::new(JobHandler));
        registry.register(Box::new(SynchronizationHandler));
        Ok(registry)
    }

    /// Register a handler, replacing any previous one for the same type
    pub fn register(&mut self, handler: Box<dyn EntityHandler>) {
        self.handlers.insert(handler.entity_type(), handler);
    }

    /// The handler for a type
    pub fn dispatch(&self, entity_type: EntityType) -> PortResult<&dyn EntityHandler> {
        self.handlers
            .get(&entity_type)
            .map(|handler| handler.as_ref())
            .ok_or_else(|| EntityError::NoHandler { entity_type }.into())
    }

    /// Get all registered entity types, in import order first
    pub fn entity_types(&self) -> Vec<EntityType> {
        let mut types: Vec<EntityType> = self.handlers.keys().copied().collect();
        types.sort_by_key(|t| {
            EntityType::HANDLED
                .iter()
                .position(|handled| handled == t)
                .unwrap_or(EntityType::HANDLED.len())
        });
        types
    }
}
