//! Core module containing fundamental traits and types for the engine

pub mod entity;
pub mod error;
pub mod slug;
pub mod store;
pub mod table;

pub use entity::{ConfigEntity, EntityType, Record};
pub use error::{ConfigError, DocumentError, EntityError, PortError, PortResult, StorageError};
pub use slug::Slugifier;
pub use store::EntityStore;
pub use table::{MappingTable, SlugIndex};
