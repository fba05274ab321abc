//! Job handler: references inside the job arguments

use super::EntityHandler;
use crate::core::entity::EntityType;

/// Exports and imports jobs
#[derive(Debug, Clone, Copy, Default)]
pub struct JobHandler;

impl EntityHandler for JobHandler {
    fn entity_type(&self) -> EntityType {
        EntityType::Job
    }
}
