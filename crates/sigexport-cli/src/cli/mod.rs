pub mod config;
pub mod export;

pub use config::CliConfig;
pub use export::{
    dump_conversations, list_chats, prepare_dest, resolve_owner, write_group_metadata,
};
