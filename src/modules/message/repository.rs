use uuid::Uuid;

use crate::{
    api::error,
    modules::message::{model::InsertMessage, schema::MessageEntity},
};

#[async_trait::async_trait]
pub trait MessageRepository {
    /// Ignores soft-deleted messages.
    async fn find_by_id(&self, message_id: &Uuid) -> Result<Option<MessageEntity>, error::SystemError>;

    /// Newest first, strictly older than `before` when given.
    async fn find_page(
        &self,
        conversation_id: &Uuid,
        before: Option<chrono::DateTime<chrono::Utc>>,
        limit: i64,
    ) -> Result<Vec<MessageEntity>, error::SystemError>;
}

#[async_trait::async_trait]
pub trait MessageRepo: MessageRepository + Send + Sync {
    /// Inserts the message, bumps unread counters of the other members and the
    /// conversation timestamp.
    async fn create_atomic(&self, message: &InsertMessage) -> Result<MessageEntity, error::SystemError>;

    async fn soft_delete(&self, message_id: &Uuid, sender_id: &Uuid) -> Result<bool, error::SystemError>;
}
