use tracing::{info, warn};

use crate::config::{CoreConfig, IngestOptions};
use crate::error::{ExportError, Result};
use crate::ingest::{ingest_messages, normalize_contacts, prune_conversations};
use crate::models::{Contact, Contacts, Conversations};
use crate::store::{SecretSource, Session};

/// Normalized, filtered contents of one store
#[derive(Debug, Clone)]
pub struct Archive {
    pub conversations: Conversations,
    pub contacts: Contacts,
    /// Service id of the account the store belongs to
    pub owner_service_id: Option<String>,
}

impl Archive {
    /// The store owner's contact, if both the identity and its contact exist
    pub fn owner(&self) -> Option<&Contact> {
        self.owner_service_id
            .as_deref()
            .and_then(|sid| self.contacts.find_by_service_id(sid))
    }
}

fn read_archive(session: &Session, options: &IngestOptions) -> Result<Archive> {
    let (contacts, mut conversations) =
        session.conversation_rows(|rows| normalize_contacts(rows, &options.chats))?;
    let unmatched = options.chats.unmatched(&contacts);
    if !unmatched.is_empty() {
        return Err(ExportError::config(format!(
            "no chat named {}",
            unmatched.join(", ")
        )));
    }
    info!(
        contacts = contacts.len(),
        retained = conversations.len(),
        "loaded conversations"
    );

    session.message_rows(|rows| {
        ingest_messages(rows, &mut conversations, options.include_disappearing)
    })?;

    let owner_service_id = session.owner_service_id()?;

    Ok(Archive {
        conversations,
        contacts,
        owner_service_id,
    })
}

/// Open the store, ingest it, and release the handle before pruning.
///
/// Any failure aborts the whole run; there is no partial result.
pub fn fetch_archive(
    config: &CoreConfig,
    secret: SecretSource<'_>,
    options: &IngestOptions,
) -> Result<Archive> {
    let db_path = config.db_path();
    info!(path = %db_path.display(), "fetching data");

    let session = Session::open(&db_path, secret)?;
    let archive = match read_archive(&session, options) {
        Ok(archive) => archive,
        Err(e) => {
            if let Err(close_err) = session.close() {
                warn!(error = %close_err, "failed to close store after ingestion error");
            }
            return Err(e);
        }
    };
    session.close()?;

    let conversations = prune_conversations(archive.conversations, options.include_empty);
    Ok(Archive {
        conversations,
        ..archive
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ChatFilter;
    use crate::store::fixtures::{FixtureMessage, FixtureStore, TEST_KEY};
    use crate::store::ConfigFileKeyResolver;

    const WRONG_KEY: &str = "ffeeddccbbaa99887766554433221100ffeeddccbbaa99887766554433221100";

    fn sample_store() -> FixtureStore {
        let store = FixtureStore::new();
        store.add_person("conv-o", "sid-o", Some("Me"), Some("Me Myself"));
        store.add_person("conv-a", "sid-a", None, Some("Ann"));
        store.add_person("conv-b", "sid-b", Some("Ben"), None);
        store.add_group("conv-g", "Hikers", &["sid-o", "sid-a", "sid-b"]);
        store.set_owner("sid-o");

        store.add_message(FixtureMessage::text("m3", "conv-a", 30));
        store.add_message(FixtureMessage::text("m1", "conv-a", 10));
        store.add_message(FixtureMessage::text("m2", "conv-g", 20));
        store.add_message(FixtureMessage {
            kind: Some("keychange"),
            ..FixtureMessage::text("m4", "conv-a", 40)
        });
        store.add_message(FixtureMessage {
            expire_timer: Some(86400),
            ..FixtureMessage::text("m5", "conv-g", 50)
        });
        store.add_message(FixtureMessage::text("m6", "conv-unknown", 60));
        store
    }

    fn raw() -> SecretSource<'static> {
        SecretSource::Raw(TEST_KEY.to_string())
    }

    #[test]
    fn test_fetch_archive_end_to_end() {
        let store = sample_store();
        let archive = fetch_archive(&store.config(), raw(), &IngestOptions::default()).unwrap();

        assert_eq!(archive.contacts.len(), 4);
        assert_eq!(archive.contacts.get("conv-a").unwrap().name.as_deref(), Some("Ann"));
        assert!(archive.contacts.get("conv-g").unwrap().is_group);

        // conv-o and conv-b have no messages and are pruned
        assert_eq!(archive.conversations.len(), 2);
        let ids: Vec<&str> = archive.conversations["conv-a"].iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, vec!["m1", "m3"]);
        let ids: Vec<&str> = archive.conversations["conv-g"].iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, vec!["m2"]);

        assert_eq!(archive.owner().unwrap().id, "conv-o");
    }

    #[test]
    fn test_fetch_archive_options() {
        let store = sample_store();
        let options = IngestOptions {
            chats: ChatFilter::parse("Hikers,Ben"),
            include_empty: true,
            include_disappearing: true,
        };
        let archive = fetch_archive(&store.config(), raw(), &options).unwrap();

        assert_eq!(archive.conversations.len(), 2);
        assert!(archive.conversations["conv-b"].is_empty());
        let ids: Vec<&str> = archive.conversations["conv-g"].iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, vec!["m2", "m5"]);
        assert!(!archive.conversations.contains_key("conv-a"));
    }

    #[test]
    fn test_chat_filter_without_match_is_configuration_error() {
        let store = sample_store();
        let options = IngestOptions {
            chats: ChatFilter::parse("Ann,Nobody"),
            ..Default::default()
        };

        match fetch_archive(&store.config(), raw(), &options) {
            Err(ExportError::Configuration { message }) => {
                assert!(message.contains("Nobody"));
                assert!(!message.contains("Ann"));
            }
            other => panic!("Expected Configuration, got {:?}", other.map(|a| a.contacts.len())),
        }
    }

    #[test]
    fn test_attachment_with_unusual_fields_is_ingested() {
        let store = sample_store();
        store.add_message(FixtureMessage {
            payload: Some(r#"{"attachments": [{"size": 1024.5, "width": 640, "cdnKey": "k"}]}"#),
            ..FixtureMessage::text("m7", "conv-a", 70)
        });

        let archive = fetch_archive(&store.config(), raw(), &IngestOptions::default()).unwrap();
        let message = archive.conversations["conv-a"].last().unwrap();
        assert_eq!(message.id, "m7");
        assert_eq!(message.attachments[0].size, Some(1024));
        assert_eq!(message.attachments[0].extra["width"], 640);
    }

    #[test]
    fn test_store_without_items_table() {
        let store = sample_store();
        store.drop_table("items");

        let archive = fetch_archive(&store.config(), raw(), &IngestOptions::default()).unwrap();
        assert!(archive.owner_service_id.is_none());
        assert_eq!(archive.conversations.len(), 2);
    }

    #[test]
    fn test_fetch_archive_with_key_delegate() {
        let store = sample_store();
        let source = SecretSource::Delegate {
            resolver: &ConfigFileKeyResolver,
            source_dir: store.dir.path().to_path_buf(),
            password: None,
        };
        let archive = fetch_archive(&store.config(), source, &IngestOptions::default()).unwrap();
        assert_eq!(archive.conversations.len(), 2);
    }

    #[test]
    fn test_wrong_key_fails_on_first_query() {
        let store = sample_store();
        store.write_config_key(WRONG_KEY);
        let source = SecretSource::Delegate {
            resolver: &ConfigFileKeyResolver,
            source_dir: store.dir.path().to_path_buf(),
            password: None,
        };

        let err = fetch_archive(&store.config(), source, &IngestOptions::default()).unwrap_err();
        assert!(matches!(err, ExportError::StoreAccess { .. }));
        assert!(!err.to_string().contains(WRONG_KEY));
    }

    #[test]
    fn test_invalid_raw_key() {
        let store = sample_store();
        let err = fetch_archive(
            &store.config(),
            SecretSource::Raw("hunter2".to_string()),
            &IngestOptions::default(),
        )
        .unwrap_err();
        assert!(matches!(err, ExportError::SecretResolution { .. }));
        assert!(!err.to_string().contains("hunter2"));
    }

    #[test]
    fn test_malformed_payload_aborts() {
        let store = sample_store();
        store.add_message(FixtureMessage {
            payload: Some("{broken"),
            ..FixtureMessage::text("m-bad", "conv-a", 70)
        });

        match fetch_archive(&store.config(), raw(), &IngestOptions::default()) {
            Err(ExportError::MalformedRow { message_id, .. }) => assert_eq!(message_id, "m-bad"),
            other => panic!("Expected MalformedRow, got {:?}", other.map(|a| a.contacts.len())),
        }
    }

    #[test]
    fn test_missing_store_is_not_created() {
        let dir = tempfile::tempdir().unwrap();
        let config = CoreConfig::new(dir.path());
        let err = fetch_archive(&config, raw(), &IngestOptions::default()).unwrap_err();
        assert!(matches!(err, ExportError::StoreAccess { .. }));
        assert!(!config.db_path().exists());
    }

    #[test]
    fn test_missing_owner_item() {
        let store = FixtureStore::new();
        store.add_person("conv-a", "sid-a", Some("Ann"), None);
        let archive = fetch_archive(&store.config(), raw(), &IngestOptions::default()).unwrap();
        assert!(archive.owner_service_id.is_none());
        assert!(archive.owner().is_none());
        assert!(archive.conversations.is_empty());
    }
}
