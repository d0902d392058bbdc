use thiserror::Error;

#[derive(Error, Debug)]
pub enum AttachmentError {
    #[error("Unsupported attachment mime type: {0}")]
    UnsupportedMimeType(String),

    #[error("Attachment exceeds max size of {max} bytes")]
    TooLarge { size: u64, max: u64 },

    #[error("Attachment I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Attachment storage error: {0}")]
    Storage(String),
}

impl AttachmentError {
    /// Whether the upload was rejected before any I/O
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::UnsupportedMimeType(_) | Self::TooLarge { .. })
    }
}

pub type Result<T> = std::result::Result<T, AttachmentError>;
