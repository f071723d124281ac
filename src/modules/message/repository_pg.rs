use uuid::Uuid;

use crate::{
    api::error,
    modules::message::{
        model::InsertMessage,
        repository::{MessageRepo, MessageRepository},
        schema::MessageEntity,
    },
};

#[derive(Clone)]
pub struct MessageRepositoryPg {
    pool: sqlx::PgPool,
}

impl MessageRepositoryPg {
    pub fn new(pool: sqlx::PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl MessageRepository for MessageRepositoryPg {
    async fn find_by_id(&self, message_id: &Uuid) -> Result<Option<MessageEntity>, error::SystemError> {
        let message = sqlx::query_as::<_, MessageEntity>(
            "SELECT * FROM messages WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(message_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(message)
    }

    async fn find_page(
        &self,
        conversation_id: &Uuid,
        before: Option<chrono::DateTime<chrono::Utc>>,
        limit: i64,
    ) -> Result<Vec<MessageEntity>, error::SystemError> {
        // served by messages_conversation_created_idx
        let messages = sqlx::query_as::<_, MessageEntity>(
            r#"
            SELECT * FROM messages
            WHERE conversation_id = $1
            AND deleted_at IS NULL
            AND ($2::timestamptz IS NULL OR created_at < $2)
            ORDER BY created_at DESC
            LIMIT $3
            "#,
        )
        .bind(conversation_id)
        .bind(before)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(messages)
    }
}

#[async_trait::async_trait]
impl MessageRepo for MessageRepositoryPg {
    async fn create_atomic(&self, message: &InsertMessage) -> Result<MessageEntity, error::SystemError> {
        let mut tx = self.pool.begin().await?;

        let created = sqlx::query_as::<_, MessageEntity>(
            r#"
            INSERT INTO messages (id, conversation_id, sender_id, content)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(Uuid::now_v7())
        .bind(message.conversation_id)
        .bind(message.sender_id)
        .bind(&message.content)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query(
            r#"
            UPDATE participants
            SET unread_count = unread_count + 1
            WHERE conversation_id = $1 AND user_id <> $2 AND deleted_at IS NULL
            "#,
        )
        .bind(message.conversation_id)
        .bind(message.sender_id)
        .execute(&mut *tx)
        .await?;

        sqlx::query("UPDATE conversations SET updated_at = $2 WHERE id = $1")
            .bind(message.conversation_id)
            .bind(created.created_at)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(created)
    }

    async fn soft_delete(&self, message_id: &Uuid, sender_id: &Uuid) -> Result<bool, error::SystemError> {
        let rows = sqlx::query(
            r#"
            UPDATE messages
            SET deleted_at = NOW(), updated_at = NOW()
            WHERE id = $1 AND sender_id = $2 AND deleted_at IS NULL
            "#,
        )
        .bind(message_id)
        .bind(sender_id)
        .execute(&self.pool)
        .await?
        .rows_affected();

        Ok(rows > 0)
    }
}
