//! Store compatibility constants
//!
//! Values here describe the on-disk format written by Signal Desktop.
//! They are not tunables: changing any of them makes the store unreadable.

/// SQLCipher parameters, applied in this order before the key is bound.
pub mod cipher {
    pub const PAGE_SIZE: u32 = 4096;
    pub const KDF_ITER: u32 = 64000;
    pub const HMAC_ALGORITHM: &str = "HMAC_SHA512";
    pub const KDF_ALGORITHM: &str = "PBKDF2_HMAC_SHA512";
}

/// Conversation `type` column value marking a group conversation
pub const GROUP_KIND: &str = "group";

/// Message `type` values that are system notices, never exported
pub const EXCLUDED_MESSAGE_TYPES: &[&str] = &["keychange", "profile-change"];

// Store layout, relative to the Signal source directory
pub const DB_RELATIVE_PATH: &str = "sql/db.sqlite";
pub const CONFIG_FILE: &str = "config.json";

/// Directory name of Signal Desktop under the platform config dir
pub const SIGNAL_DIR_NAME: &str = "Signal";

/// `items` row holding the local account's `<serviceId>.<deviceId>`
pub const OWNER_ITEM_ID: &str = "uuid_id";

/// Env var enabling the extra debug log file
pub const LOG_FILE_ENV: &str = "SIGEXPORT_LOG_FILE";
