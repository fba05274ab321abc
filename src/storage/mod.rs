//! Storage implementations for the entity store boundary

pub mod in_memory;

pub use in_memory::InMemoryEntityStore;
