use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::DomainError;

pub const ALLOWED_IMAGE_TYPES: [&str; 4] = ["image/jpeg", "image/jpg", "image/png", "image/webp"];
pub const MAX_IMAGE_BYTES: usize = 5 * 1024 * 1024;
const RANDOM_SUFFIX_LEN: usize = 13;

/// An image received from the admin, not yet stored.
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// Where an uploaded image ended up.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadedImage {
    pub path: String,
    pub public_url: String,
}

impl ImageUpload {
    /// Reject unsupported types and oversized files before any upload.
    pub fn validate(&self) -> Result<(), DomainError> {
        let mut errors = Vec::new();
        let content_type = self.content_type.to_ascii_lowercase();
        if !ALLOWED_IMAGE_TYPES.contains(&content_type.as_str()) {
            errors.push(
                "Invalid file type. Please upload a JPEG, PNG, or WebP image.".to_string(),
            );
        }
        if self.bytes.len() > MAX_IMAGE_BYTES {
            errors.push(
                "File size too large. Please upload an image smaller than 5MB.".to_string(),
            );
        }
        if self.bytes.is_empty() {
            errors.push("File is empty".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(DomainError::Validation(errors))
        }
    }

    /// Extension from the original file name, else from the content type.
    fn extension(&self) -> String {
        self.file_name
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_ascii_lowercase())
            .filter(|ext| !ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric()))
            .unwrap_or_else(|| match self.content_type.to_ascii_lowercase().as_str() {
                "image/png" => "png".to_string(),
                "image/webp" => "webp".to_string(),
                _ => "jpg".to_string(),
            })
    }

    /// Collision-resistant name: `<unix millis>-<13 random [a-z0-9]>.<ext>`.
    pub fn storage_name(&self, now: DateTime<Utc>) -> String {
        let random: String = Uuid::new_v4()
            .simple()
            .to_string()
            .chars()
            .take(RANDOM_SUFFIX_LEN)
            .collect();
        format!("{}-{}.{}", now.timestamp_millis(), random, self.extension())
    }
}
