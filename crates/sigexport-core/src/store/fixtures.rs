//! Encrypted test stores laid out like a Signal Desktop source directory.

use rusqlite::{params, Connection};
use tempfile::{tempdir, TempDir};

use super::secret::Secret;
use super::session::apply_cipher;
use crate::config::CoreConfig;
use crate::constants::CONFIG_FILE;

pub(crate) const TEST_KEY: &str =
    "2b7e151628aed2a6abf7158809cf4f3c2b7e151628aed2a6abf7158809cf4f3c";

pub(crate) struct FixtureStore {
    pub(crate) dir: TempDir,
    conn: Connection,
}

/// A message row to insert; defaults describe a plain incoming text message
pub(crate) struct FixtureMessage<'a> {
    pub(crate) id: &'a str,
    pub(crate) conversation_id: Option<&'a str>,
    pub(crate) kind: Option<&'a str>,
    pub(crate) payload: Option<&'a str>,
    pub(crate) body: &'a str,
    pub(crate) sent_at: i64,
    pub(crate) expire_timer: Option<i64>,
}

impl<'a> FixtureMessage<'a> {
    pub(crate) fn text(id: &'a str, conversation_id: &'a str, sent_at: i64) -> Self {
        Self {
            id,
            conversation_id: Some(conversation_id),
            kind: Some("incoming"),
            payload: Some("{}"),
            body: "hello",
            sent_at,
            expire_timer: None,
        }
    }
}

impl FixtureStore {
    pub(crate) fn new() -> Self {
        let dir = tempdir().unwrap();
        let config = CoreConfig::new(dir.path());
        std::fs::create_dir_all(config.db_path().parent().unwrap()).unwrap();
        std::fs::write(
            config.config_json_path(),
            format!(r#"{{"key": "{}"}}"#, TEST_KEY),
        )
        .unwrap();

        let conn = Connection::open(config.db_path()).unwrap();
        apply_cipher(&conn, &Secret::from_hex(TEST_KEY).unwrap()).unwrap();
        conn.execute_batch(
            r#"
            CREATE TABLE conversations (
                id TEXT PRIMARY KEY,
                type TEXT,
                serviceId TEXT,
                e164 TEXT,
                name TEXT,
                profileName TEXT,
                members TEXT
            );
            CREATE TABLE messages (
                id TEXT PRIMARY KEY,
                conversationId TEXT,
                type TEXT,
                json TEXT,
                body TEXT,
                sourceServiceId TEXT,
                timestamp INTEGER,
                sent_at INTEGER,
                serverTimestamp INTEGER,
                hasAttachments INTEGER,
                readStatus INTEGER,
                seenStatus INTEGER,
                expireTimer INTEGER
            );
            CREATE TABLE items (
                id TEXT PRIMARY KEY,
                json TEXT
            );
            "#,
        )
        .unwrap();

        Self { dir, conn }
    }

    pub(crate) fn config(&self) -> CoreConfig {
        CoreConfig::new(self.dir.path())
    }

    pub(crate) fn add_person(&self, id: &str, service_id: &str, name: Option<&str>, profile_name: Option<&str>) {
        self.conn
            .execute(
                "INSERT INTO conversations (id, type, serviceId, e164, name, profileName, members)
                 VALUES (?1, 'private', ?2, ?3, ?4, ?5, NULL)",
                params![id, service_id, format!("+1555{}", id.len()), name, profile_name],
            )
            .unwrap();
    }

    pub(crate) fn add_group(&self, id: &str, name: &str, members: &[&str]) {
        self.conn
            .execute(
                "INSERT INTO conversations (id, type, serviceId, e164, name, profileName, members)
                 VALUES (?1, 'group', NULL, NULL, ?2, NULL, ?3)",
                params![id, name, members.join(" ")],
            )
            .unwrap();
    }

    pub(crate) fn add_message(&self, message: FixtureMessage<'_>) {
        self.conn
            .execute(
                "INSERT INTO messages (id, conversationId, type, json, body, sourceServiceId,
                    timestamp, sent_at, serverTimestamp, hasAttachments, readStatus, seenStatus, expireTimer)
                 VALUES (?1, ?2, ?3, ?4, ?5, NULL, ?6, ?6, ?6, 0, 0, 0, ?7)",
                params![
                    message.id,
                    message.conversation_id,
                    message.kind,
                    message.payload,
                    message.body,
                    message.sent_at,
                    message.expire_timer,
                ],
            )
            .unwrap();
    }

    pub(crate) fn set_owner(&self, service_id: &str) {
        let json = serde_json::json!({ "id": "uuid_id", "value": format!("{}.1", service_id) });
        self.conn
            .execute(
                "INSERT INTO items (id, json) VALUES ('uuid_id', ?1)",
                params![json.to_string()],
            )
            .unwrap();
    }

    pub(crate) fn drop_table(&self, table: &str) {
        self.conn
            .execute_batch(&format!("DROP TABLE {};", table))
            .unwrap();
    }

    /// Rewrite `config.json` with a different key
    pub(crate) fn write_config_key(&self, key: &str) {
        std::fs::write(
            self.dir.path().join(CONFIG_FILE),
            format!(r#"{{"key": "{}"}}"#, key),
        )
        .unwrap();
    }
}
