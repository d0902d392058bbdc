use tether_attachments::AttachmentError;
use tether_persist::PersistError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Unknown provider: {0}")]
    UnknownProvider(String),

    #[error("Stream already in progress for thread: {0}")]
    StreamInProgress(String),

    #[error("No active stream for thread: {0}")]
    NoActiveStream(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Rejected before any I/O
    #[error("{0}")]
    Validation(AttachmentError),

    #[error("Attachment store error: {0}")]
    Attachment(AttachmentError),

    #[error("Persistence error: {0}")]
    Persist(#[from] PersistError),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<AttachmentError> for EngineError {
    fn from(err: AttachmentError) -> Self {
        if err.is_validation() {
            Self::Validation(err)
        } else {
            Self::Attachment(err)
        }
    }
}

pub type Result<T> = std::result::Result<T, EngineError>;
