//! Source handler: no outgoing references, credentials removed on export

use super::desensitize::Desensitizer;
use super::EntityHandler;
use crate::core::entity::{EntityType, Record};

/// Exports and imports sources
#[derive(Debug, Clone, Default)]
pub struct SourceHandler {
    desensitizer: Desensitizer,
}

impl SourceHandler {
    pub fn new(desensitizer: Desensitizer) -> Self {
        Self { desensitizer }
    }
}

impl EntityHandler for SourceHandler {
    fn entity_type(&self) -> EntityType {
        EntityType::Source
    }

    fn desensitize(&self, record: &mut Record) {
        self.desensitizer.apply(record);
    }
}
