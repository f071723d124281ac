use uuid::Uuid;

use crate::{
    api::error,
    modules::image::{model::NewImage, repository::ImageRepository, schema::UserImageEntity},
};

#[derive(Clone)]
pub struct ImageRepositoryPg {
    pool: sqlx::PgPool,
}

impl ImageRepositoryPg {
    pub fn new(pool: sqlx::PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl ImageRepository for ImageRepositoryPg {
    async fn find_by_user(
        &self,
        user_id: &Uuid,
    ) -> Result<Vec<UserImageEntity>, error::SystemError> {
        let images = sqlx::query_as::<_, UserImageEntity>(
            "SELECT * FROM user_images WHERE user_id = $1 ORDER BY slot",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(images)
    }

    async fn find_by_users(
        &self,
        user_ids: &[Uuid],
    ) -> Result<Vec<UserImageEntity>, error::SystemError> {
        if user_ids.is_empty() {
            return Ok(vec![]);
        }

        let images = sqlx::query_as::<_, UserImageEntity>(
            "SELECT * FROM user_images WHERE user_id = ANY($1) ORDER BY user_id, slot",
        )
        .bind(user_ids)
        .fetch_all(&self.pool)
        .await?;

        Ok(images)
    }

    async fn upsert(
        &self,
        image: &NewImage,
    ) -> Result<(UserImageEntity, Option<String>), error::SystemError> {
        let mut tx = self.pool.begin().await?;

        let previous = sqlx::query_scalar::<_, String>(
            "SELECT storage_path FROM user_images WHERE user_id = $1 AND slot = $2 FOR UPDATE",
        )
        .bind(image.user_id)
        .bind(image.slot)
        .fetch_optional(&mut *tx)
        .await?;

        let entity = sqlx::query_as::<_, UserImageEntity>(
            r#"
            INSERT INTO user_images (user_id, slot, url, storage_path, mime_type)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (user_id, slot) DO UPDATE
            SET url = EXCLUDED.url,
                storage_path = EXCLUDED.storage_path,
                mime_type = EXCLUDED.mime_type,
                created_at = NOW()
            RETURNING *
            "#,
        )
        .bind(image.user_id)
        .bind(image.slot)
        .bind(&image.url)
        .bind(&image.storage_path)
        .bind(&image.mime_type)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok((entity, previous))
    }

    async fn delete_slot(
        &self,
        user_id: &Uuid,
        slot: i16,
    ) -> Result<Option<UserImageEntity>, error::SystemError> {
        let deleted = sqlx::query_as::<_, UserImageEntity>(
            "DELETE FROM user_images WHERE user_id = $1 AND slot = $2 RETURNING *",
        )
        .bind(user_id)
        .bind(slot)
        .fetch_optional(&self.pool)
        .await?;

        Ok(deleted)
    }
}
