use uuid::Uuid;

use crate::{
    api::error,
    modules::user::{
        model::{InsertUser, UpdateUser, UserSummary},
        schema::UserEntity,
    },
};

#[async_trait::async_trait]
pub trait UserRepository {
    async fn find_by_id(&self, id: &Uuid) -> Result<Option<UserEntity>, error::SystemError>;

    async fn find_by_email(&self, email: &str) -> Result<Option<UserEntity>, error::SystemError>;

    /// Summaries for the given ids; unknown or deleted ids are skipped.
    async fn find_summaries(&self, ids: &[Uuid]) -> Result<Vec<UserSummary>, error::SystemError>;

    async fn create(&self, user: &InsertUser) -> Result<UserEntity, error::SystemError>;

    async fn update(&self, id: &Uuid, user: &UpdateUser) -> Result<UserEntity, error::SystemError>;

    /// Removes everything that references the user and soft-deletes the row.
    async fn delete_cascade(&self, id: &Uuid) -> Result<bool, error::SystemError>;
}
