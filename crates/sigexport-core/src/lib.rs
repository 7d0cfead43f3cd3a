pub mod config;
pub mod constants;
pub mod error;
pub mod ingest;
pub mod metadata;
pub mod models;
pub mod pipeline;
pub mod store;
pub mod tracing_setup;

// Re-export the pipeline entry points at crate root for convenience
pub use config::{ChatFilter, CoreConfig, IngestOptions, MetadataOptions};
pub use error::{ExportError, Result};
pub use metadata::export_group_metadata;
pub use models::{Contact, Contacts, Conversations, GroupExport, Message};
pub use pipeline::{fetch_archive, Archive};
pub use store::{ConfigFileKeyResolver, KeyResolver, Secret, SecretSource};
