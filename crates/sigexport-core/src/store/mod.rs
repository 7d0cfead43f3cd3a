pub mod rows;
pub mod secret;
pub mod session;

#[cfg(test)]
pub(crate) mod fixtures;

pub use rows::{ConversationRow, MessageRow};
pub use secret::{ConfigFileKeyResolver, KeyResolver, Secret, SecretSource};
pub use session::Session;
