use uuid::Uuid;

use crate::{
    api::error,
    modules::conversation::{
        model::{ConversationRaw, ParticipantRow},
        repository::{ConversationRepo, ConversationRepository, ParticipantRepository},
        schema::{ConversationEntity, ConversationType},
    },
    utils::normalize_pair,
};

#[derive(Clone)]
pub struct ConversationRepositoryPg {
    pool: sqlx::PgPool,
}

impl ConversationRepositoryPg {
    pub fn new(pool: sqlx::PgPool) -> Self {
        Self { pool }
    }
}

async fn insert_conversation(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    _type: ConversationType,
) -> Result<ConversationEntity, error::SystemError> {
    let conversation = sqlx::query_as::<_, ConversationEntity>(
        "INSERT INTO conversations (id, type) VALUES ($1, $2) RETURNING *",
    )
    .bind(Uuid::now_v7())
    .bind(_type)
    .fetch_one(&mut **tx)
    .await?;

    Ok(conversation)
}

async fn insert_participants(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    conversation_id: &Uuid,
    user_ids: &[Uuid],
) -> Result<(), error::SystemError> {
    sqlx::query(
        r#"
        INSERT INTO participants (conversation_id, user_id, unread_count)
        SELECT $1, unnest($2::uuid[]), 0
        "#,
    )
    .bind(conversation_id)
    .bind(user_ids)
    .execute(&mut **tx)
    .await?;

    Ok(())
}

#[async_trait::async_trait]
impl ConversationRepository for ConversationRepositoryPg {
    async fn find_by_id(
        &self,
        conversation_id: &Uuid,
    ) -> Result<Option<ConversationEntity>, error::SystemError> {
        let conversation =
            sqlx::query_as::<_, ConversationEntity>("SELECT * FROM conversations WHERE id = $1")
                .bind(conversation_id)
                .fetch_optional(&self.pool)
                .await?;

        Ok(conversation)
    }

    async fn find_for_user(
        &self,
        user_id: &Uuid,
        only: Option<&Uuid>,
    ) -> Result<Vec<ConversationRaw>, error::SystemError> {
        let rows = sqlx::query_as::<_, ConversationRaw>(
            r#"
            SELECT
                c.id,
                c.type,
                c.created_at,
                c.updated_at,

                g.name          AS group_name,
                g.created_by    AS group_created_by,
                g.avatar_url    AS group_avatar_url,

                lm.id           AS last_id,
                lm.content      AS last_content,
                lm.sender_id    AS last_sender_id,
                lm.created_at   AS last_created_at,

                p.unread_count
            FROM conversations c
            JOIN participants p
                ON p.conversation_id = c.id
                AND p.user_id = $1
                AND p.deleted_at IS NULL
            LEFT JOIN group_conversations g
                ON g.conversation_id = c.id
            LEFT JOIN LATERAL (
                SELECT id, content, sender_id, created_at
                FROM messages m
                WHERE m.conversation_id = c.id
                AND m.deleted_at IS NULL
                ORDER BY created_at DESC
                LIMIT 1
            ) lm ON TRUE
            WHERE ($2::uuid IS NULL OR c.id = $2)
            ORDER BY c.updated_at DESC
            "#,
        )
        .bind(user_id)
        .bind(only)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }
}

#[async_trait::async_trait]
impl ConversationRepo for ConversationRepositoryPg {
    async fn create_direct_atomic(
        &self,
        user_a: &Uuid,
        user_b: &Uuid,
    ) -> Result<(ConversationEntity, bool), error::SystemError> {
        let (u1, u2) = normalize_pair(*user_a, *user_b);
        let mut tx = self.pool.begin().await?;

        sqlx::query("SELECT pg_advisory_xact_lock(hashtextextended($1::text || $2::text, 1))")
            .bind(u1)
            .bind(u2)
            .execute(&mut *tx)
            .await?;

        let existing = sqlx::query_as::<_, ConversationEntity>(
            r#"
            SELECT c.*
            FROM conversations c
            WHERE c.type = 'direct'
            AND EXISTS (
                SELECT 1 FROM participants p1
                WHERE p1.conversation_id = c.id AND p1.user_id = $1 AND p1.deleted_at IS NULL
            )
            AND EXISTS (
                SELECT 1 FROM participants p2
                WHERE p2.conversation_id = c.id AND p2.user_id = $2 AND p2.deleted_at IS NULL
            )
            LIMIT 1
            "#,
        )
        .bind(u1)
        .bind(u2)
        .fetch_optional(&mut *tx)
        .await?;

        if let Some(conversation) = existing {
            tx.commit().await?;
            return Ok((conversation, false));
        }

        let conversation = insert_conversation(&mut tx, ConversationType::Direct).await?;
        insert_participants(&mut tx, &conversation.id, &[u1, u2]).await?;

        tx.commit().await?;
        Ok((conversation, true))
    }

    async fn create_group_atomic(
        &self,
        name: &str,
        created_by: &Uuid,
        member_ids: &[Uuid],
    ) -> Result<ConversationEntity, error::SystemError> {
        let mut tx = self.pool.begin().await?;

        let conversation = insert_conversation(&mut tx, ConversationType::Group).await?;

        sqlx::query(
            "INSERT INTO group_conversations (conversation_id, name, created_by) VALUES ($1, $2, $3)",
        )
        .bind(conversation.id)
        .bind(name)
        .bind(created_by)
        .execute(&mut *tx)
        .await?;

        insert_participants(&mut tx, &conversation.id, member_ids).await?;

        tx.commit().await?;
        Ok(conversation)
    }
}

#[derive(Clone)]
pub struct ParticipantRepositoryPg {
    pool: sqlx::PgPool,
}

impl ParticipantRepositoryPg {
    pub fn new(pool: sqlx::PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl ParticipantRepository for ParticipantRepositoryPg {
    async fn is_member(
        &self,
        conversation_id: &Uuid,
        user_id: &Uuid,
    ) -> Result<bool, error::SystemError> {
        let is_member = sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM participants
                WHERE conversation_id = $1 AND user_id = $2 AND deleted_at IS NULL
            )
            "#,
        )
        .bind(conversation_id)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(is_member)
    }

    async fn find_by_conversations(
        &self,
        conversation_ids: &[Uuid],
    ) -> Result<Vec<ParticipantRow>, error::SystemError> {
        if conversation_ids.is_empty() {
            return Ok(vec![]);
        }

        let participants = sqlx::query_as::<_, ParticipantRow>(
            r#"
            SELECT
                p.conversation_id,
                p.user_id,
                u.name,
                (
                    SELECT i.url FROM user_images i
                    WHERE i.user_id = u.id
                    ORDER BY i.slot
                    LIMIT 1
                ) AS avatar_url,
                p.unread_count,
                p.joined_at
            FROM participants p
            JOIN users u ON u.id = p.user_id
            WHERE p.conversation_id = ANY($1)
            AND p.deleted_at IS NULL
            ORDER BY p.joined_at
            "#,
        )
        .bind(conversation_ids)
        .fetch_all(&self.pool)
        .await?;

        Ok(participants)
    }

    async fn member_ids(&self, conversation_id: &Uuid) -> Result<Vec<Uuid>, error::SystemError> {
        let ids = sqlx::query_scalar::<_, Uuid>(
            "SELECT user_id FROM participants WHERE conversation_id = $1 AND deleted_at IS NULL",
        )
        .bind(conversation_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(ids)
    }

    async fn reset_unread(
        &self,
        conversation_id: &Uuid,
        user_id: &Uuid,
    ) -> Result<bool, error::SystemError> {
        let rows = sqlx::query(
            r#"
            UPDATE participants
            SET unread_count = 0
            WHERE conversation_id = $1 AND user_id = $2 AND deleted_at IS NULL
            "#,
        )
        .bind(conversation_id)
        .bind(user_id)
        .execute(&self.pool)
        .await?
        .rows_affected();

        Ok(rows > 0)
    }

    async fn leave(&self, conversation_id: &Uuid, user_id: &Uuid) -> Result<bool, error::SystemError> {
        let rows = sqlx::query(
            r#"
            UPDATE participants
            SET deleted_at = NOW(), unread_count = 0
            WHERE conversation_id = $1 AND user_id = $2 AND deleted_at IS NULL
            "#,
        )
        .bind(conversation_id)
        .bind(user_id)
        .execute(&self.pool)
        .await?
        .rows_affected();

        Ok(rows > 0)
    }
}
