//! Endpoint handler: mapping, rule and target references

use super::EntityHandler;
use crate::core::entity::EntityType;

/// Exports and imports endpoints
#[derive(Debug, Clone, Copy, Default)]
pub struct EndpointHandler;

impl EntityHandler for EndpointHandler {
    fn entity_type(&self) -> EntityType {
        EntityType::Endpoint
    }
}
