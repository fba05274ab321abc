//! Configuration export and import
//!
//! [`ConfigurationService`] gathers the entities of a configuration,
//! builds one [`MappingTable`](crate::core::table::MappingTable) from
//! everything the store knows, and runs each entity through its handler.
//! The result is an [`ExportDocument`]; importing one yields an
//! [`ImportReport`] with per-entity outcomes.

pub mod document;
pub mod service;

pub use document::{ExportDocument, ImportFailure, ImportReport};
pub use service::{ConfigurationService, ImportOptions};
