//! Configuration export and import orchestration

use super::document::{ExportDocument, ImportFailure, ImportReport};
use crate::config::{OnImportError, PortConfig};
use crate::core::entity::{EntityType, Record};
use crate::core::error::{EntityError, PortError, PortResult, StorageError};
use crate::core::store::EntityStore;
use crate::core::table::MappingTable;
use crate::entities::Entity;
use crate::handlers::{EntityHandler, Exported, HandlerRegistry};
use indexmap::IndexSet;
use serde_json::Value;
use std::collections::{BTreeMap, HashSet, VecDeque};
use std::sync::Arc;

/// Per-call import options
#[derive(Debug, Clone, Default)]
pub struct ImportOptions {
    /// Configuration id added to every imported entity
    pub configuration_id: Option<String>,

    /// Overrides [`PortConfig::on_import_error`] for this call
    pub on_import_error: Option<OnImportError>,
}

impl ImportOptions {
    /// Import into the given configuration
    pub fn into_configuration(configuration_id: impl Into<String>) -> Self {
        Self {
            configuration_id: Some(configuration_id.into()),
            ..Default::default()
        }
    }
}

/// Exports configurations from a store and imports them into one
pub struct ConfigurationService {
    store: Arc<dyn EntityStore>,
    handlers: HandlerRegistry,
    config: PortConfig,
}

impl ConfigurationService {
    /// Create a service with the built-in handlers
    pub fn new(store: Arc<dyn EntityStore>, config: PortConfig) -> PortResult<Self> {
        let handlers = HandlerRegistry::with_defaults(&config)?;
        Ok(Self::with_handlers(store, config, handlers))
    }

    /// Create a service with a custom handler registry
    pub fn with_handlers(
        store: Arc<dyn EntityStore>,
        config: PortConfig,
        handlers: HandlerRegistry,
    ) -> Self {
        Self {
            store,
            handlers,
            config,
        }
    }

    pub fn config(&self) -> &PortConfig {
        &self.config
    }

    pub fn handlers(&self) -> &HandlerRegistry {
        &self.handlers
    }

    /// Build the lookup table for a complete entity set
    pub fn build_mapping_table<'a>(
        &self,
        entities: impl IntoIterator<Item = &'a Entity>,
    ) -> MappingTable {
        MappingTable::build(entities)
    }

    /// The handler responsible for an entity
    pub fn dispatch(&self, entity: &Entity) -> PortResult<&dyn EntityHandler> {
        self.handlers.dispatch(entity.entity_type())
    }

    /// Entities of every handled type that belong to a configuration
    pub async fn load_entities(
        &self,
        configuration_id: &str,
    ) -> PortResult<BTreeMap<EntityType, Vec<Entity>>> {
        let mut loaded = BTreeMap::new();
        for entity_type in self.handlers.entity_types() {
            let mut entities = self
                .store
                .find_by_configuration(entity_type, configuration_id)
                .await
                .map_err(|e| StorageError::operation(entity_type, "load", e))?;
            entities.iter_mut().for_each(|e| {
                e.ensure_slug();
            });
            loaded.insert(entity_type, entities);
        }
        Ok(loaded)
    }

    /// Every persisted entity, slugs assigned, for table building
    async fn load_known(&self) -> PortResult<Vec<Entity>> {
        let mut known = Vec::new();
        for entity_type in EntityType::ALL {
            let entities = self
                .store
                .list(entity_type)
                .await
                .map_err(|e| StorageError::operation(entity_type, "list", e))?;
            known.extend(entities);
        }
        known.iter_mut().for_each(|e| {
            e.ensure_slug();
        });
        Ok(known)
    }

    /// Export every entity of a configuration as a portable document
    ///
    /// The lookup table covers every persisted entity, so references that
    /// leave the configuration still travel as slugs. A failure to export
    /// one entity is logged and the entity is left out.
    pub async fn export_configuration(&self, configuration_id: &str) -> PortResult<ExportDocument> {
        let known = self.load_known().await?;
        let table = self.build_mapping_table(&known);
        let loaded = self.load_entities(configuration_id).await?;

        let mut document = ExportDocument::new(&self.config.format_version, configuration_id);
        let mut included_mappings: HashSet<i64> = HashSet::new();
        let mut discovered: IndexSet<String> = IndexSet::new();

        for (entity_type, entities) in &loaded {
            for entity in entities {
                let Some(exported) = self.export_one(entity, &table) else {
                    continue;
                };
                if *entity_type == EntityType::Mapping
                    && let Some(id) = entity.id()
                {
                    included_mappings.insert(id);
                }
                discovered.extend(exported.discovered_mapping_ids);
                document.push(*entity_type, exported.record);
            }
        }

        if self.config.include_transitive_mappings {
            self.append_transitive_mappings(
                &mut document,
                &table,
                discovered,
                &mut included_mappings,
            )
            .await?;
        }

        tracing::info!(
            configuration_id,
            entities = document.entity_count(),
            "Exported configuration"
        );
        Ok(document)
    }

    fn export_one(&self, entity: &Entity, table: &MappingTable) -> Option<Exported> {
        let result = self
            .dispatch(entity)
            .and_then(|handler| handler.export(entity, table));
        match result {
            Ok(exported) => Some(exported),
            Err(e) => {
                tracing::warn!(
                    entity_type = %entity.entity_type(),
                    id = ?entity.id(),
                    error = %e,
                    "Skipping entity that failed to export"
                );
                None
            }
        }
    }

    /// Follow discovered mapping ids until no new mapping turns up
    async fn append_transitive_mappings(
        &self,
        document: &mut ExportDocument,
        table: &MappingTable,
        discovered: IndexSet<String>,
        included: &mut HashSet<i64>,
    ) -> PortResult<()> {
        let mut queue: VecDeque<String> = discovered.into_iter().collect();
        let mut seen: HashSet<String> = queue.iter().cloned().collect();

        while let Some(candidate) = queue.pop_front() {
            let Some(id) = table
                .canonical_id(EntityType::Mapping, &candidate)
                .unwrap_or(candidate.as_str())
                .parse::<i64>()
                .ok()
            else {
                tracing::debug!(reference = %candidate, "Discovered mapping is not in this environment");
                continue;
            };
            if !included.insert(id) {
                continue;
            }

            let mut mapping = match self.store.find(EntityType::Mapping, id).await {
                Ok(mapping) => mapping,
                Err(e) => match StorageError::operation(EntityType::Mapping, "find", e) {
                    StorageError::NotFound { .. } => {
                        tracing::debug!(id, "Discovered mapping does not exist");
                        continue;
                    }
                    other => return Err(other.into()),
                },
            };
            mapping.ensure_slug();

            let Some(exported) = self.export_one(&mapping, table) else {
                continue;
            };
            tracing::debug!(id, slug = mapping.slug(), "Including transitively used mapping");
            for next in exported.discovered_mapping_ids {
                if seen.insert(next.clone()) {
                    queue.push_back(next);
                }
            }
            document.push(EntityType::Mapping, exported.record);
        }
        Ok(())
    }

    /// Import a document into the store
    ///
    /// Types are imported in dependency order and each imported entity is
    /// added to the lookup table as soon as it is written. References to
    /// entities further down the document (follow-ups, rule configuration
    /// keys, cycles) are resolved in a second pass once every entity has an
    /// id. Records whose slug already exists are updated in place. Nothing
    /// is rolled back on failure.
    pub async fn import_configuration(
        &self,
        document: &ExportDocument,
        options: &ImportOptions,
    ) -> PortResult<ImportReport> {
        document.check_version(&self.config.format_version)?;
        let on_error = options
            .on_import_error
            .unwrap_or(self.config.on_import_error);

        let known = self.load_known().await?;
        let mut table = self.build_mapping_table(&known);
        let mut report = ImportReport::default();

        for (type_key, records) in &document.entities {
            let error: PortError = match type_key.parse::<EntityType>() {
                Err(e) => e.into(),
                Ok(entity_type) if self.handlers.dispatch(entity_type).is_err() => {
                    EntityError::NoHandler { entity_type }.into()
                }
                Ok(_) => continue,
            };
            tracing::warn!(entity_type = %type_key, records = records.len(), error = %error, "Cannot import entity group");
            for record in records {
                report.failures.push(ImportFailure::new(type_key, record, &error));
            }
            if on_error == OnImportError::Abort && !records.is_empty() {
                report.aborted = true;
                return Ok(report);
            }
        }

        let mut written = Vec::new();
        for entity_type in self.handlers.entity_types() {
            let handler = self.handlers.dispatch(entity_type)?;
            for record in document.records(entity_type) {
                let mut record = record.clone();
                if let Some(configuration_id) = &options.configuration_id {
                    add_configuration(&mut record, configuration_id);
                }
                let resolved = handler
                    .prepare_import(record.clone(), &table)
                    .map(|plan| plan.record)
                    .ok();

                match handler.import(record.clone(), &table, self.store.as_ref()).await {
                    Ok(entity) => {
                        table.register(&entity);
                        let imported = report.imported.entry(entity_type).or_default();
                        if let (Some(id), Some(resolved)) = (entity.id(), resolved) {
                            written.push(Written {
                                entity_type,
                                id,
                                position: imported.len(),
                                record,
                                resolved,
                            });
                        }
                        imported.push(entity);
                    }
                    Err(e) => {
                        let failure = ImportFailure::new(entity_type.as_str(), &record, &e);
                        tracing::warn!(
                            %entity_type,
                            slug = ?failure.slug,
                            error = %e,
                            "Failed to import entity"
                        );
                        report.failures.push(failure);
                        if on_error == OnImportError::Abort {
                            report.aborted = true;
                            self.relink(written, &table, on_error, &mut report).await?;
                            return Ok(report);
                        }
                    }
                }
            }
        }

        self.relink(written, &table, on_error, &mut report).await?;

        tracing::info!(
            configuration_id = %document.configuration_id,
            imported = report.imported_count(),
            failed = report.failures.len(),
            "Imported configuration"
        );
        Ok(report)
    }

    /// Re-resolve written records against the complete table
    ///
    /// Only records whose references now resolve differently are updated.
    async fn relink(
        &self,
        written: Vec<Written>,
        table: &MappingTable,
        on_error: OnImportError,
        report: &mut ImportReport,
    ) -> PortResult<()> {
        for entry in written {
            let handler = self.handlers.dispatch(entry.entity_type)?;
            let plan = handler.prepare_import(entry.record.clone(), table)?;
            if plan.record == entry.resolved {
                continue;
            }

            let entity_type = entry.entity_type;
            tracing::debug!(%entity_type, slug = %plan.slug, id = entry.id, "Resolving forward references");
            match self
                .store
                .update_from_record(entity_type, entry.id, plan.record)
                .await
            {
                Ok(entity) => {
                    if let Some(slot) = report
                        .imported
                        .get_mut(&entity_type)
                        .and_then(|imported| imported.get_mut(entry.position))
                    {
                        *slot = entity;
                    }
                }
                Err(e) => {
                    let error: PortError = StorageError::operation(entity_type, "update", e).into();
                    let failure = ImportFailure::new(entity_type.as_str(), &entry.record, &error);
                    tracing::warn!(
                        %entity_type,
                        slug = ?failure.slug,
                        error = %error,
                        "Failed to resolve forward references"
                    );
                    report.failures.push(failure);
                    if on_error == OnImportError::Abort {
                        report.aborted = true;
                        return Ok(());
                    }
                }
            }
        }
        Ok(())
    }
}

/// An entity written in the first import pass
struct Written {
    entity_type: EntityType,
    id: i64,
    /// Index into the report's list for this type
    position: usize,
    /// The document record, before resolution
    record: Record,
    /// The record as resolved against the table at write time
    resolved: Record,
}

fn add_configuration(record: &mut Record, configuration_id: &str) {
    let entry = record
        .entry("configurations")
        .or_insert_with(|| Value::Array(Vec::new()));
    if !entry.is_array() {
        *entry = Value::Array(Vec::new());
    }
    if let Value::Array(ids) = entry
        && !ids.iter().any(|id| id.as_str() == Some(configuration_id))
    {
        ids.push(Value::String(configuration_id.to_string()));
    }
}
