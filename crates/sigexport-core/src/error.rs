/// Errors that can occur while ingesting a store or building group metadata.
///
/// Every variant is terminal for the current run. None of them ever carry the
/// store secret.
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("Failed to resolve store secret: {message}")]
    SecretResolution { message: String },

    #[error("Store access failed while {context}: {source}")]
    StoreAccess {
        context: String,
        #[source]
        source: rusqlite::Error,
    },

    #[error("Malformed payload in message {message_id}: {reason}")]
    MalformedRow { message_id: String, reason: String },

    #[error("Group {group} lists member {service_id} with no matching contact")]
    IncompleteIndex { group: String, service_id: String },

    #[error("Configuration error: {message}")]
    Configuration { message: String },
}

impl ExportError {
    pub(crate) fn store(context: impl Into<String>) -> impl FnOnce(rusqlite::Error) -> Self {
        let context = context.into();
        move |source| ExportError::StoreAccess { context, source }
    }

    pub(crate) fn config(message: impl Into<String>) -> Self {
        ExportError::Configuration {
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ExportError>;
