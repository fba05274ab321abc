//! Bidirectional id ↔ slug lookup tables
//!
//! A [`MappingTable`] is built once per export or import from the complete
//! entity set, before any handler runs, so references resolve the same way
//! whichever entity is processed first.

use crate::core::entity::EntityType;
use crate::entities::Entity;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

/// Lookup table for a single entity type
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SlugIndex {
    /// Numeric id (and UUID) as text -> slug
    #[serde(rename = "idToSlug")]
    id_to_slug: HashMap<String, String>,

    /// Slug -> numeric id as text
    #[serde(rename = "slugToId")]
    slug_to_id: HashMap<String, String>,
}

impl SlugIndex {
    /// Record an id/slug pair
    pub fn insert(&mut self, id: impl Into<String>, slug: impl Into<String>) {
        let id = id.into();
        let slug = slug.into();
        self.id_to_slug.insert(id.clone(), slug.clone());
        self.slug_to_id.insert(slug, id);
    }

    /// Register an alias (e.g. a UUID) that resolves to an existing slug
    /// without becoming the slug's canonical id
    pub fn insert_alias(&mut self, alias: impl Into<String>, slug: impl Into<String>) {
        self.id_to_slug.insert(alias.into(), slug.into());
    }

    pub fn slug_for(&self, id: &str) -> Option<&str> {
        self.id_to_slug.get(id).map(String::as_str)
    }

    pub fn id_for(&self, slug: &str) -> Option<&str> {
        self.slug_to_id.get(slug).map(String::as_str)
    }

    /// Number of distinct slugs
    pub fn len(&self) -> usize {
        self.slug_to_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slug_to_id.is_empty()
    }
}

/// Per-type lookup tables for every entity type
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct MappingTable {
    tables: BTreeMap<EntityType, SlugIndex>,
}

impl Default for MappingTable {
    fn default() -> Self {
        Self::new()
    }
}

impl MappingTable {
    /// Create a table with an empty sub-table for every entity type
    pub fn new() -> Self {
        Self {
            tables: EntityType::ALL
                .into_iter()
                .map(|t| (t, SlugIndex::default()))
                .collect(),
        }
    }

    /// Build the table from a complete entity set
    ///
    /// Entities must already carry a slug; entities without a slug or an
    /// id are skipped. When two entities of one type share a slug the last
    /// one wins.
    pub fn build<'a>(entities: impl IntoIterator<Item = &'a Entity>) -> Self {
        let mut table = Self::new();
        for entity in entities {
            table.register(entity);
        }

        tracing::debug!(
            sizes = ?table.tables.iter().map(|(t, idx)| (t.as_str(), idx.len())).collect::<Vec<_>>(),
            "Built mapping table"
        );
        table
    }

    /// Add one entity to the table
    ///
    /// Returns false when the entity has no id or no slug.
    pub fn register(&mut self, entity: &Entity) -> bool {
        let entity_type = entity.entity_type();
        let (Some(id), slug) = (entity.id(), entity.slug()) else {
            tracing::debug!(%entity_type, name = entity.name(), "Skipping unsaved entity");
            return false;
        };
        if slug.is_empty() {
            tracing::debug!(%entity_type, id, "Skipping entity without slug");
            return false;
        }

        let index = self.index_mut(entity_type);
        if let Some(previous) = index.id_for(slug)
            && previous != id.to_string()
        {
            tracing::warn!(
                %entity_type,
                slug,
                previous_id = previous,
                id,
                "Duplicate slug, later entity wins"
            );
        }

        index.insert(id.to_string(), slug);
        if let Some(uuid) = entity.uuid() {
            index.insert_alias(uuid.to_string(), slug);
        }
        true
    }

    /// The sub-table of one entity type
    pub fn index(&self, entity_type: EntityType) -> &SlugIndex {
        // Every type is pre-populated in `new`
        &self.tables[&entity_type]
    }

    fn index_mut(&mut self, entity_type: EntityType) -> &mut SlugIndex {
        self.tables.entry(entity_type).or_default()
    }

    /// Slug for an id (or UUID) of the given type
    pub fn slug_for(&self, entity_type: EntityType, id: &str) -> Option<&str> {
        self.index(entity_type).slug_for(id)
    }

    /// Numeric id for a slug of the given type
    pub fn id_for(&self, entity_type: EntityType, slug: &str) -> Option<&str> {
        self.index(entity_type).id_for(slug)
    }

    /// Normalize an id, UUID or slug to the numeric id, if it is known
    pub fn canonical_id(&self, entity_type: EntityType, candidate: &str) -> Option<&str> {
        let index = self.index(entity_type);
        match index.slug_for(candidate) {
            Some(slug) => index.id_for(slug),
            None => index.id_for(candidate),
        }
    }

    /// Render the table in its documented JSON shape
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{Mapping, Register, Source};
    use uuid::Uuid;

    fn source(id: i64, slug: &str) -> Entity {
        let mut source = Source::new(slug);
        source.id = Some(id);
        source.slug = slug.to_string();
        source.into()
    }

    #[test]
    fn test_build_is_bidirectional() {
        let entities = vec![source(1, "petstore"), source(2, "zaken")];
        let table = MappingTable::build(&entities);

        assert_eq!(table.slug_for(EntityType::Source, "1"), Some("petstore"));
        assert_eq!(table.id_for(EntityType::Source, "zaken"), Some("2"));
        assert_eq!(table.index(EntityType::Source).len(), 2);
        assert!(table.index(EntityType::Mapping).is_empty());
    }

    #[test]
    fn test_types_do_not_collide() {
        let mut register = Register::new("Pets");
        register.id = Some(1);
        register.slug = "pets".to_string();
        let entities = vec![source(1, "petstore"), register.into()];
        let table = MappingTable::build(&entities);

        assert_eq!(table.slug_for(EntityType::Source, "1"), Some("petstore"));
        assert_eq!(table.slug_for(EntityType::Register, "1"), Some("pets"));
    }

    #[test]
    fn test_uuid_resolves_to_slug() {
        let uuid = Uuid::new_v4();
        let mut mapping = Mapping::new("Pet");
        mapping.id = Some(3);
        mapping.uuid = Some(uuid);
        mapping.slug = "pet".to_string();
        let entities = vec![Entity::from(mapping)];
        let table = MappingTable::build(&entities);

        assert_eq!(table.slug_for(EntityType::Mapping, &uuid.to_string()), Some("pet"));
        assert_eq!(table.id_for(EntityType::Mapping, "pet"), Some("3"));
        assert_eq!(table.canonical_id(EntityType::Mapping, &uuid.to_string()), Some("3"));
        assert_eq!(table.canonical_id(EntityType::Mapping, "pet"), Some("3"));
        assert_eq!(table.canonical_id(EntityType::Mapping, "3"), Some("3"));
        assert_eq!(table.canonical_id(EntityType::Mapping, "other"), None);
    }

    #[test]
    fn test_entities_without_slug_or_id_are_skipped() {
        let mut unsaved = Source::new("New");
        unsaved.slug = "new".to_string();
        let mut unslugged = Source::new("Old");
        unslugged.id = Some(5);

        let entities = vec![Entity::from(unsaved), Entity::from(unslugged)];
        let table = MappingTable::build(&entities);
        assert!(table.index(EntityType::Source).is_empty());
    }

    #[test]
    fn test_register_after_build() {
        let mut table = MappingTable::new();
        assert!(table.register(&source(8, "late")));
        assert_eq!(table.id_for(EntityType::Source, "late"), Some("8"));
    }

    #[test]
    fn test_json_shape() {
        let entities = vec![source(1, "petstore")];
        let json = MappingTable::build(&entities).to_json();
        assert_eq!(json["source"]["idToSlug"]["1"], "petstore");
        assert_eq!(json["source"]["slugToId"]["petstore"], "1");
        assert!(json["schema"]["idToSlug"].as_object().unwrap().is_empty());
    }
}
