use crate::error::{AttachmentError, Result};

/// 10 MiB
pub const MAX_ATTACHMENT_BYTES: u64 = 10 * 1024 * 1024;

/// Non-image types accepted for upload
pub const ALLOWED_MIME_TYPES: &[&str] = &["application/pdf"];

pub fn is_allowed_mime_type(mime_type: &str) -> bool {
    mime_type.starts_with("image/") || ALLOWED_MIME_TYPES.contains(&mime_type)
}

/// Reject disallowed types and oversize payloads. Type is checked first.
pub fn validate_attachment(mime_type: &str, size_bytes: u64) -> Result<()> {
    if !is_allowed_mime_type(mime_type) {
        return Err(AttachmentError::UnsupportedMimeType(mime_type.to_string()));
    }

    if size_bytes > MAX_ATTACHMENT_BYTES {
        return Err(AttachmentError::TooLarge {
            size: size_bytes,
            max: MAX_ATTACHMENT_BYTES,
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allowed_types() {
        assert!(is_allowed_mime_type("image/png"));
        assert!(is_allowed_mime_type("image/svg+xml"));
        assert!(is_allowed_mime_type("application/pdf"));
        assert!(!is_allowed_mime_type("text/plain"));
        assert!(!is_allowed_mime_type("application/zip"));
    }

    #[test]
    fn test_size_limit_is_inclusive() {
        assert!(validate_attachment("image/png", 0).is_ok());
        assert!(validate_attachment("image/png", MAX_ATTACHMENT_BYTES).is_ok());

        match validate_attachment("application/pdf", MAX_ATTACHMENT_BYTES + 1) {
            Err(AttachmentError::TooLarge { size, max }) => {
                assert_eq!(size, MAX_ATTACHMENT_BYTES + 1);
                assert_eq!(max, MAX_ATTACHMENT_BYTES);
            }
            other => panic!("Expected TooLarge, got {:?}", other),
        }
    }

    #[test]
    fn test_error_messages() {
        let err = validate_attachment("text/plain", 1).unwrap_err();
        assert_eq!(err.to_string(), "Unsupported attachment mime type: text/plain");
        assert!(err.is_validation());

        let err = validate_attachment("image/png", MAX_ATTACHMENT_BYTES + 1).unwrap_err();
        assert_eq!(err.to_string(), "Attachment exceeds max size of 10485760 bytes");
    }
}
