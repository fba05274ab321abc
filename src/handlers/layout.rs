//! Where each entity type keeps its references
//!
//! | Type            | Simple                                   | Composite                      | List                                   | Nested          |
//! |-----------------|------------------------------------------|--------------------------------|----------------------------------------|-----------------|
//! | source          |                                          |                                |                                        |                 |
//! | endpoint        | inputMapping, outputMapping              | targetId/targetType            | rules (drop unresolved)                |                 |
//! | mapping         | source_id, target_id                     |                                |                                        |                 |
//! | rule            | source_id, target_id                     |                                |                                        | configuration   |
//! | job             | arguments.{synchronizationId, endpointId, sourceId} |                     |                                        |                 |
//! | synchronization | sourceTargetMapping, targetSourceMapping | sourceId/sourceType, targetId/targetType | actions, conditions, followUps |                 |
//!
//! Mapping bodies are scanned separately, see
//! [`MappingCallScanner`](crate::handlers::scanner::MappingCallScanner).

use super::resolver::{FieldRule, Unresolved};
use crate::core::entity::EntityType;

pub const SOURCE: &[FieldRule] = &[];

pub const ENDPOINT: &[FieldRule] = &[
    FieldRule::Simple {
        path: &["inputMapping"],
        target: EntityType::Mapping,
    },
    FieldRule::Simple {
        path: &["outputMapping"],
        target: EntityType::Mapping,
    },
    FieldRule::Composite {
        id_field: "targetId",
        type_field: "targetType",
    },
    FieldRule::List {
        field: "rules",
        target: EntityType::Rule,
        unresolved: Unresolved::Drop,
    },
];

pub const MAPPING: &[FieldRule] = &[
    FieldRule::Simple {
        path: &["source_id"],
        target: EntityType::Source,
    },
    FieldRule::Simple {
        path: &["target_id"],
        target: EntityType::Source,
    },
];

/// Types a rule configuration may point at by key name
pub const RULE_CONFIGURATION_TARGETS: &[EntityType] = &[
    EntityType::Source,
    EntityType::Job,
    EntityType::Endpoint,
    EntityType::Mapping,
    EntityType::Register,
    EntityType::Schema,
];

pub const RULE: &[FieldRule] = &[
    FieldRule::Simple {
        path: &["source_id"],
        target: EntityType::Source,
    },
    FieldRule::Simple {
        path: &["target_id"],
        target: EntityType::Source,
    },
    FieldRule::Nested {
        field: "configuration",
        targets: RULE_CONFIGURATION_TARGETS,
    },
];

pub const JOB: &[FieldRule] = &[
    FieldRule::Simple {
        path: &["arguments", "synchronizationId"],
        target: EntityType::Synchronization,
    },
    FieldRule::Simple {
        path: &["arguments", "endpointId"],
        target: EntityType::Endpoint,
    },
    FieldRule::Simple {
        path: &["arguments", "sourceId"],
        target: EntityType::Source,
    },
];

pub const SYNCHRONIZATION: &[FieldRule] = &[
    FieldRule::Simple {
        path: &["sourceTargetMapping"],
        target: EntityType::Mapping,
    },
    FieldRule::Simple {
        path: &["targetSourceMapping"],
        target: EntityType::Mapping,
    },
    FieldRule::Composite {
        id_field: "sourceId",
        type_field: "sourceType",
    },
    FieldRule::Composite {
        id_field: "targetId",
        type_field: "targetType",
    },
    FieldRule::List {
        field: "actions",
        target: EntityType::Rule,
        unresolved: Unresolved::Keep,
    },
    FieldRule::List {
        field: "conditions",
        target: EntityType::Rule,
        unresolved: Unresolved::Keep,
    },
    FieldRule::List {
        field: "followUps",
        target: EntityType::Synchronization,
        unresolved: Unresolved::Keep,
    },
];

/// The layout of a handled entity type; reference-only types have none
pub fn for_type(entity_type: EntityType) -> &'static [FieldRule] {
    match entity_type {
        EntityType::Source => SOURCE,
        EntityType::Endpoint => ENDPOINT,
        EntityType::Mapping => MAPPING,
        EntityType::Rule => RULE,
        EntityType::Job => JOB,
        EntityType::Synchronization => SYNCHRONIZATION,
        EntityType::Register | EntityType::Schema => &[],
    }
}
