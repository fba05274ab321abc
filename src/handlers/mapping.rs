//! Mapping handler: source references plus calls to other mappings

use super::scanner::MappingCallScanner;
use super::EntityHandler;
use crate::core::entity::{EntityType, Record};
use crate::core::table::MappingTable;
use indexmap::IndexSet;

/// Exports and imports mappings
#[derive(Debug, Clone, Default)]
pub struct MappingHandler {
    scanner: MappingCallScanner,
}

impl MappingHandler {
    pub fn new(scanner: MappingCallScanner) -> Self {
        Self { scanner }
    }
}

impl EntityHandler for MappingHandler {
    fn entity_type(&self) -> EntityType {
        EntityType::Mapping
    }

    fn discover(&self, record: &Record, table: &MappingTable) -> IndexSet<String> {
        match record.get("mapping") {
            Some(body) => self.scanner.discover(body, table),
            None => IndexSet::new(),
        }
    }
}
