use shared::{domain::RecordKey, error::ValidationErrors};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("server responded with status {0}")]
    Status(u16),
    #[error("unexpected response body: {0}")]
    Decode(String),
    #[error("invalid resource url: {0}")]
    Url(#[from] url::ParseError),
}

#[derive(Debug, Error)]
pub enum AdminError {
    /// Read failed; the previous snapshot is kept.
    #[error("{message}: {source}")]
    Load {
        message: String,
        source: TransportError,
    },
    /// Create, update or delete failed; the user has been notified.
    #[error("{message}: {source}")]
    Write {
        message: String,
        source: TransportError,
    },
    #[error("invalid form input: {0}")]
    Validation(#[from] ValidationErrors),
    #[error("{entity} record {key} is not in the current list")]
    UnknownRecord { entity: String, key: RecordKey },
    #[error("unknown entity {0}")]
    UnknownEntity(String),
    #[error("no create or edit form is open")]
    NoActiveForm,
}

impl AdminError {
    /// Message suitable for showing to the user as-is.
    pub fn user_message(&self) -> String {
        match self {
            Self::Load { message, .. } | Self::Write { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }
}
