pub mod bucket;
pub mod error;
pub mod local;
pub mod store;
pub mod validation;

pub use bucket::{BucketAttachmentStore, InMemoryBucket, ObjectBucket, DEFAULT_BUCKET_PREFIX};
pub use error::{AttachmentError, Result};
pub use local::{LocalAttachmentStore, LOCAL_URL_PREFIX};
pub use store::AttachmentStore;
pub use validation::{
    is_allowed_mime_type, validate_attachment, ALLOWED_MIME_TYPES, MAX_ATTACHMENT_BYTES,
};
