use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::modules::image::schema::UserImageEntity;

pub const MAX_IMAGE_SLOTS: i16 = 6;

/// Accepted content types and the extension files of that type are stored under.
pub const IMAGE_TYPES: [(&str, &str); 4] =
    [("image/jpeg", "jpg"), ("image/png", "png"), ("image/gif", "gif"), ("image/webp", "webp")];

pub fn extension_for(mime_type: &str) -> Option<&'static str> {
    IMAGE_TYPES.iter().find(|(mime, _)| *mime == mime_type).map(|(_, ext)| *ext)
}

/// Declared content type wins; `application/octet-stream` or a missing one falls back to the
/// file name.
pub fn resolve_mime(declared: Option<&str>, filename: &str) -> String {
    match declared {
        Some(mime) if mime != "application/octet-stream" => mime.to_string(),
        _ => mime_guess::from_path(filename)
            .first()
            .map(|m| m.essence_str().to_string())
            .unwrap_or_else(|| "application/octet-stream".to_string()),
    }
}

pub fn mime_for_extension(extension: &str) -> Option<&'static str> {
    IMAGE_TYPES.iter().find(|(_, ext)| *ext == extension).map(|(mime, _)| *mime)
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ImageResponse {
    pub slot: i16,
    pub url: String,
}

impl From<UserImageEntity> for ImageResponse {
    fn from(entity: UserImageEntity) -> Self {
        ImageResponse { slot: entity.slot, url: entity.url }
    }
}

#[derive(Debug, Clone)]
pub struct NewImage {
    pub user_id: Uuid,
    pub slot: i16,
    pub url: String,
    pub storage_path: String,
    pub mime_type: String,
}

#[derive(Debug, Clone)]
pub struct UploadConfig {
    pub max_file_size: usize,
    pub allowed_mime_types: Vec<String>,
    pub upload_dir: String,
    pub base_url: String,
}

impl UploadConfig {
    pub fn new(upload_dir: impl Into<String>, base_url: impl Into<String>, max: usize) -> Self {
        Self {
            max_file_size: max,
            allowed_mime_types: IMAGE_TYPES.iter().map(|(mime, _)| mime.to_string()).collect(),
            upload_dir: upload_dir.into(),
            base_url: base_url.into(),
        }
    }
}
