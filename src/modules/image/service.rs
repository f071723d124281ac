use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use uuid::Uuid;

use crate::api::error;
use crate::modules::image::{
    model::{
        ImageResponse, MAX_IMAGE_SLOTS, NewImage, UploadConfig, extension_for, mime_for_extension,
    },
    repository::ImageRepository,
};

#[derive(Clone)]
pub struct ImageService<R>
where
    R: ImageRepository + Send + Sync,
{
    repo: Arc<R>,
    config: UploadConfig,
}

impl<R> ImageService<R>
where
    R: ImageRepository + Send + Sync,
{
    pub fn new(repo: Arc<R>, config: UploadConfig) -> Self {
        Self { repo, config }
    }

    pub fn max_file_size(&self) -> usize {
        self.config.max_file_size
    }

    fn validate_slot(slot: i16) -> Result<(), error::SystemError> {
        if !(0..MAX_IMAGE_SLOTS).contains(&slot) {
            return Err(error::SystemError::bad_request(format!(
                "Slot must be between 0 and {}",
                MAX_IMAGE_SLOTS - 1
            )));
        }
        Ok(())
    }

    fn validate_file(&self, file_size: usize, mime_type: &str) -> Result<(), error::SystemError> {
        if file_size == 0 {
            return Err(error::SystemError::bad_request("File is empty"));
        }

        if file_size > self.config.max_file_size {
            return Err(error::SystemError::bad_request(format!(
                "File size exceeds maximum allowed size of {} bytes",
                self.config.max_file_size
            )));
        }

        if !self.config.allowed_mime_types.iter().any(|m| m == mime_type) {
            return Err(error::SystemError::bad_request(format!(
                "File type '{mime_type}' is not allowed"
            )));
        }

        Ok(())
    }

    /// The extension follows the validated content type, never the client's file name.
    fn generate_filename(user_id: &Uuid, mime_type: &str) -> Result<String, error::SystemError> {
        let extension = extension_for(mime_type).ok_or_else(|| {
            error::SystemError::bad_request(format!("File type '{mime_type}' is not allowed"))
        })?;
        Ok(format!("{user_id}_{}.{extension}", Uuid::now_v7()))
    }

    pub async fn list(&self, user_id: Uuid) -> Result<Vec<ImageResponse>, error::SystemError> {
        let images = self.repo.find_by_user(&user_id).await?;
        Ok(images.into_iter().map(ImageResponse::from).collect())
    }

    /// Slots for several users at once, keyed by owner.
    pub async fn list_for_users(
        &self,
        user_ids: &[Uuid],
    ) -> Result<HashMap<Uuid, Vec<ImageResponse>>, error::SystemError> {
        let images = self.repo.find_by_users(user_ids).await?;
        let mut grouped: HashMap<Uuid, Vec<ImageResponse>> = HashMap::new();
        for image in images {
            grouped.entry(image.user_id).or_default().push(ImageResponse::from(image));
        }
        Ok(grouped)
    }

    pub async fn upload(
        &self,
        user_id: Uuid,
        slot: i16,
        original_filename: &str,
        bytes: Vec<u8>,
        mime_type: String,
    ) -> Result<ImageResponse, error::SystemError> {
        Self::validate_slot(slot)?;
        self.validate_file(bytes.len(), &mime_type)?;

        let filename = Self::generate_filename(&user_id, &mime_type)?;

        tokio::fs::create_dir_all(&self.config.upload_dir).await?;
        let storage_path = format!("{}/{}", self.config.upload_dir, filename);
        tokio::fs::write(&storage_path, &bytes).await?;

        let image = NewImage {
            user_id,
            slot,
            url: format!("{}/{}", self.config.base_url.trim_end_matches('/'), filename),
            storage_path: storage_path.clone(),
            mime_type,
        };

        let (entity, previous) = match self.repo.upsert(&image).await {
            Ok(result) => result,
            Err(e) => {
                self.remove_files(&[storage_path]).await;
                return Err(e);
            }
        };

        if let Some(old_path) = previous {
            self.remove_files(&[old_path]).await;
        }

        log::info!("User {user_id} uploaded '{original_filename}' to slot {slot}");
        Ok(ImageResponse::from(entity))
    }

    pub async fn delete(&self, user_id: Uuid, slot: i16) -> Result<(), error::SystemError> {
        Self::validate_slot(slot)?;

        let deleted = self
            .repo
            .delete_slot(&user_id, slot)
            .await?
            .ok_or_else(|| error::SystemError::not_found("No image in this slot"))?;

        self.remove_files(&[deleted.storage_path]).await;
        Ok(())
    }

    /// Bytes and content type of a stored file. Only image extensions are served; names with
    /// path separators are rejected.
    pub async fn read_media(
        &self,
        filename: &str,
    ) -> Result<(Vec<u8>, &'static str), error::SystemError> {
        if filename.is_empty() || filename.contains(['/', '\\']) || filename.starts_with('.') {
            return Err(error::SystemError::not_found("File not found"));
        }

        let mime = Path::new(filename)
            .extension()
            .and_then(|ext| ext.to_str())
            .and_then(mime_for_extension)
            .ok_or_else(|| error::SystemError::not_found("File not found"))?;

        let path = Path::new(&self.config.upload_dir).join(filename);
        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(error::SystemError::not_found("File not found"));
            }
            Err(e) => return Err(e.into()),
        };
        Ok((bytes, mime))
    }

    pub async fn storage_paths(&self, user_id: Uuid) -> Result<Vec<String>, error::SystemError> {
        let images = self.repo.find_by_user(&user_id).await?;
        Ok(images.into_iter().map(|i| i.storage_path).collect())
    }

    /// Best effort; a missing file is not an error.
    pub async fn remove_files(&self, paths: &[String]) {
        for path in paths {
            match tokio::fs::remove_file(path).await {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => log::warn!("Failed to remove file {path}: {e}"),
            }
        }
    }
}
