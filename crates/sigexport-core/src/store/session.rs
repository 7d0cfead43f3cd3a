use rusqlite::{Connection, OpenFlags, OptionalExtension, Row};
use std::path::Path;
use tracing::{debug, warn};

use super::rows::{
    ConversationRow, MessageRow, CONVERSATIONS_QUERY, ITEMS_TABLE, MESSAGES_QUERY, OWNER_QUERY,
    TABLE_EXISTS_QUERY,
};
use super::secret::{Secret, SecretSource};
use crate::constants::{cipher, OWNER_ITEM_ID};
use crate::error::{ExportError, Result};

/// An open, keyed handle on the encrypted store.
///
/// Dropping the session closes the connection; `close` does it explicitly and
/// reports failures.
pub struct Session {
    conn: Connection,
}

/// Bind the cipher parameters and then the key.
///
/// A wrong key or parameter set is not detected here; the first query fails
/// instead.
pub(crate) fn apply_cipher(conn: &Connection, secret: &Secret) -> Result<()> {
    let pragmas = [
        format!("PRAGMA cipher_default_page_size = {};", cipher::PAGE_SIZE),
        format!("PRAGMA cipher_default_kdf_iter = {};", cipher::KDF_ITER),
        format!(
            "PRAGMA cipher_default_hmac_algorithm = {};",
            cipher::HMAC_ALGORITHM
        ),
        format!(
            "PRAGMA cipher_default_kdf_algorithm = {};",
            cipher::KDF_ALGORITHM
        ),
    ];
    for pragma in &pragmas {
        conn.execute_batch(pragma)
            .map_err(ExportError::store("applying cipher parameters"))?;
    }

    // Parameter binding does not work for pragmas; the key is validated hex
    conn.execute_batch(&format!("PRAGMA key = {};", secret.key_literal()))
        .map_err(ExportError::store("binding the store key"))?;
    Ok(())
}

impl Session {
    pub fn open(db_path: &Path, source: SecretSource<'_>) -> Result<Self> {
        let secret = source.resolve()?;
        debug!(path = %db_path.display(), "opening store");

        // Read only: never create a missing store, never write to the live one
        let flags = OpenFlags::SQLITE_OPEN_READ_ONLY
            | OpenFlags::SQLITE_OPEN_URI
            | OpenFlags::SQLITE_OPEN_NO_MUTEX;
        let conn = Connection::open_with_flags(db_path, flags).map_err(ExportError::store(
            format!("opening {}", db_path.display()),
        ))?;
        apply_cipher(&conn, &secret)?;
        Ok(Self { conn })
    }

    /// Run `sql` and hand the mapped rows to `consume` as a one-shot stream.
    fn stream<R, T, F>(
        &self,
        sql: &str,
        context: &'static str,
        map: fn(&Row<'_>) -> rusqlite::Result<R>,
        consume: F,
    ) -> Result<T>
    where
        F: FnOnce(&mut dyn Iterator<Item = Result<R>>) -> Result<T>,
    {
        let mut stmt = self.conn.prepare(sql).map_err(ExportError::store(context))?;
        let rows = stmt.query_map([], map).map_err(ExportError::store(context))?;
        let mut rows = rows.map(|row| row.map_err(ExportError::store(context)));
        consume(&mut rows)
    }

    pub fn conversation_rows<T, F>(&self, consume: F) -> Result<T>
    where
        F: FnOnce(&mut dyn Iterator<Item = Result<ConversationRow>>) -> Result<T>,
    {
        self.stream(
            CONVERSATIONS_QUERY,
            "reading conversations",
            ConversationRow::from_row,
            consume,
        )
    }

    /// Message rows, ordered by `sent_at`
    pub fn message_rows<T, F>(&self, consume: F) -> Result<T>
    where
        F: FnOnce(&mut dyn Iterator<Item = Result<MessageRow>>) -> Result<T>,
    {
        self.stream(
            MESSAGES_QUERY,
            "reading messages",
            MessageRow::from_row,
            consume,
        )
    }

    fn has_table(&self, name: &str) -> Result<bool> {
        self.conn
            .query_row(TABLE_EXISTS_QUERY, [name], |row| row.get(0))
            .map_err(ExportError::store("inspecting the schema"))
    }

    /// Service id of the account that owns this store, if recorded
    pub fn owner_service_id(&self) -> Result<Option<String>> {
        if !self.has_table(ITEMS_TABLE)? {
            debug!("store has no items table, no owner resolved");
            return Ok(None);
        }

        let json: Option<String> = self
            .conn
            .query_row(OWNER_QUERY, [OWNER_ITEM_ID], |row| row.get(0))
            .optional()
            .map_err(ExportError::store("reading the account identity"))?;

        let Some(json) = json else {
            return Ok(None);
        };

        // Stored as {"id": "uuid_id", "value": "<serviceId>.<deviceId>"}
        let value = serde_json::from_str::<serde_json::Value>(&json)
            .ok()
            .and_then(|v| v.get("value").and_then(|s| s.as_str()).map(str::to_string));

        match value {
            Some(value) => {
                let service_id = value.split('.').next().unwrap_or_default();
                Ok((!service_id.is_empty()).then(|| service_id.to_string()))
            }
            None => {
                warn!("account identity item is malformed, no owner resolved");
                Ok(None)
            }
        }
    }

    pub fn close(self) -> Result<()> {
        self.conn
            .close()
            .map_err(|(_, e)| ExportError::StoreAccess {
                context: "closing the store".to_string(),
                source: e,
            })
    }
}
