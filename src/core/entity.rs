//! Entity traits and type tags shared by every portable entity

use crate::core::error::EntityError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// A plain structured record, the serialized form of an entity
pub type Record = serde_json::Map<String, serde_json::Value>;

/// Closed set of entity type tags.
///
/// The tag selects the handler for an entity and the sub-table of the
/// [`MappingTable`](crate::core::table::MappingTable) that references of
/// this type are looked up in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityType {
    Source,
    Endpoint,
    Mapping,
    Rule,
    Job,
    Synchronization,
    Register,
    Schema,
}

impl EntityType {
    /// Every type tag, in declaration order
    pub const ALL: [EntityType; 8] = [
        EntityType::Source,
        EntityType::Endpoint,
        EntityType::Mapping,
        EntityType::Rule,
        EntityType::Job,
        EntityType::Synchronization,
        EntityType::Register,
        EntityType::Schema,
    ];

    /// Types that own a handler, in import dependency order.
    ///
    /// Sources come first because mappings, rules, endpoints and
    /// synchronizations point at them; jobs come last because they point
    /// at synchronizations and endpoints.
    pub const HANDLED: [EntityType; 6] = [
        EntityType::Source,
        EntityType::Mapping,
        EntityType::Rule,
        EntityType::Endpoint,
        EntityType::Synchronization,
        EntityType::Job,
    ];

    /// The stable tag used in documents and mapping tables
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityType::Source => "source",
            EntityType::Endpoint => "endpoint",
            EntityType::Mapping => "mapping",
            EntityType::Rule => "rule",
            EntityType::Job => "job",
            EntityType::Synchronization => "synchronization",
            EntityType::Register => "register",
            EntityType::Schema => "schema",
        }
    }

    /// Whether entities of this type are exported and imported as records.
    ///
    /// Registers and schemas live in another system; they only take part
    /// in reference resolution.
    pub fn has_handler(&self) -> bool {
        !matches!(self, EntityType::Register | EntityType::Schema)
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntityType {
    type Err = EntityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EntityType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| EntityError::UnknownType {
                entity_type: s.to_string(),
            })
    }
}

/// Base trait for every portable entity.
///
/// All entities have:
/// - id: environment-local numeric identifier (absent before creation)
/// - uuid: globally unique, stable identifier
/// - slug: URL-safe handle, unique within the entity type
/// - name: human readable name, the usual slug source
///
/// Implementations are generated by the `impl_config_entity!` macro.
pub trait ConfigEntity: Clone + Send + Sync + Serialize + for<'de> Deserialize<'de> + 'static {
    /// The type tag of this entity type
    const ENTITY_TYPE: EntityType;

    /// Get the numeric identifier, if the entity has been persisted
    fn id(&self) -> Option<i64>;

    /// Get the UUID, if one was assigned
    fn uuid(&self) -> Option<Uuid>;

    /// Get the slug (may be empty before assignment)
    fn slug(&self) -> &str;

    /// Replace the slug
    fn set_slug(&mut self, slug: String);

    /// Get the human readable name
    fn name(&self) -> &str;

    /// Ids of the configurations this entity belongs to
    fn configurations(&self) -> &[String];

    /// Get the last modification timestamp
    fn updated(&self) -> Option<DateTime<Utc>>;

    /// Check whether this entity belongs to the given configuration
    fn belongs_to(&self, configuration_id: &str) -> bool {
        self.configurations().iter().any(|c| c == configuration_id)
    }
}
