//! Rule handler: source references plus ids inside the rule configuration

use super::EntityHandler;
use crate::core::entity::EntityType;

/// Exports and imports rules
#[derive(Debug, Clone, Copy, Default)]
pub struct RuleHandler;

impl EntityHandler for RuleHandler {
    fn entity_type(&self) -> EntityType {
        EntityType::Rule
    }
}
