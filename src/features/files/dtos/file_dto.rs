use crate::core::error::{AppError, Result};

/// Uploaded photo as received from the client, before it is stored
#[derive(Debug, Clone)]
pub struct FileUpload {
    pub original_filename: String,
    pub content_type: String,
    pub data: Vec<u8>,
}

impl FileUpload {
    /// Reject empty, oversized, or non-image payloads
    pub fn ensure_acceptable(&self) -> Result<()> {
        if self.data.is_empty() {
            return Err(AppError::BadRequest("Image must not be empty".to_string()));
        }

        if self.data.len() > MAX_FILE_SIZE {
            return Err(AppError::BadRequest(format!(
                "File too large. Maximum size is {} bytes ({} MB)",
                MAX_FILE_SIZE,
                MAX_FILE_SIZE / 1024 / 1024
            )));
        }

        if !is_mime_type_allowed(&self.content_type) {
            return Err(AppError::BadRequest(format!(
                "File type '{}' is not allowed. Allowed types: {}",
                self.content_type,
                ALLOWED_MIME_TYPES.join(", ")
            )));
        }

        Ok(())
    }
}

/// Allowed MIME types for accident photos
pub const ALLOWED_MIME_TYPES: &[&str] = &["image/jpeg", "image/png", "image/gif", "image/webp"];

/// Maximum file size in bytes (10MB)
pub const MAX_FILE_SIZE: usize = 10 * 1024 * 1024;

pub fn is_mime_type_allowed(content_type: &str) -> bool {
    ALLOWED_MIME_TYPES.contains(&content_type)
}

/// Get file extension from content type
pub fn get_extension_from_content_type(content_type: &str) -> Option<&'static str> {
    match content_type {
        "image/jpeg" => Some("jpg"),
        "image/png" => Some("png"),
        "image/gif" => Some("gif"),
        "image/webp" => Some("webp"),
        _ => None,
    }
}
