//! Synchronization handler: mappings, composite source/target references
//! and rule and follow-up lists

use super::EntityHandler;
use crate::core::entity::EntityType;

/// Exports and imports synchronizations
#[derive(Debug, Clone, Copy, Default)]
pub struct SynchronizationHandler;

impl EntityHandler for SynchronizationHandler {
    fn entity_type(&self) -> EntityType {
        EntityType::Synchronization
    }
}
