use uuid::Uuid;

use crate::{
    api::error,
    modules::image::{model::NewImage, schema::UserImageEntity},
};

#[async_trait::async_trait]
pub trait ImageRepository {
    async fn find_by_user(&self, user_id: &Uuid)
    -> Result<Vec<UserImageEntity>, error::SystemError>;

    async fn find_by_users(
        &self,
        user_ids: &[Uuid],
    ) -> Result<Vec<UserImageEntity>, error::SystemError>;

    /// Inserts or replaces the slot; returns the storage path of the replaced image, if any.
    async fn upsert(
        &self,
        image: &NewImage,
    ) -> Result<(UserImageEntity, Option<String>), error::SystemError>;

    async fn delete_slot(
        &self,
        user_id: &Uuid,
        slot: i16,
    ) -> Result<Option<UserImageEntity>, error::SystemError>;
}
