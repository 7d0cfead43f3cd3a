pub mod contacts;
pub mod messages;
pub mod prune;

pub use contacts::normalize_contacts;
pub use messages::{ingest_messages, IngestStats};
pub use prune::prune_conversations;
