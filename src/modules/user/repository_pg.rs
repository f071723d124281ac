use uuid::Uuid;

use crate::{
    api::error,
    modules::user::{
        model::{InsertUser, UpdateUser, UserSummary},
        repository::UserRepository,
        schema::UserEntity,
    },
};

#[derive(Clone)]
pub struct UserRepositoryPg {
    pool: sqlx::PgPool,
}

impl UserRepositoryPg {
    pub fn new(pool: sqlx::PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl UserRepository for UserRepositoryPg {
    async fn find_by_id(&self, id: &Uuid) -> Result<Option<UserEntity>, error::SystemError> {
        let user = sqlx::query_as::<_, UserEntity>(
            "SELECT * FROM users WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<UserEntity>, error::SystemError> {
        let user = sqlx::query_as::<_, UserEntity>(
            "SELECT * FROM users WHERE lower(email) = lower($1) AND deleted_at IS NULL",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn find_summaries(&self, ids: &[Uuid]) -> Result<Vec<UserSummary>, error::SystemError> {
        if ids.is_empty() {
            return Ok(vec![]);
        }

        let users = sqlx::query_as::<_, UserSummary>(
            r#"
            SELECT
                u.id,
                u.name,
                u.gender,
                un.name AS university_name,
                u.degree,
                u.year,
                (
                    SELECT i.url
                    FROM user_images i
                    WHERE i.user_id = u.id
                    ORDER BY i.slot
                    LIMIT 1
                ) AS avatar_url
            FROM users u
            LEFT JOIN universities un ON un.id = u.university_id
            WHERE u.id = ANY($1)
            AND u.deleted_at IS NULL
            "#,
        )
        .bind(ids)
        .fetch_all(&self.pool)
        .await?;
        Ok(users)
    }

    async fn create(&self, user: &InsertUser) -> Result<UserEntity, error::SystemError> {
        let id = Uuid::now_v7();
        let user = sqlx::query_as::<_, UserEntity>(
            r#"
            INSERT INTO users (id, email, name, gender, bio, university_id, degree, year)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&user.email)
        .bind(&user.name)
        .bind(user.gender)
        .bind(&user.bio)
        .bind(user.university_id)
        .bind(&user.degree)
        .bind(user.year)
        .fetch_one(&self.pool)
        .await?;
        Ok(user)
    }

    async fn update(&self, id: &Uuid, user: &UpdateUser) -> Result<UserEntity, error::SystemError> {
        let user = sqlx::query_as::<_, UserEntity>(
            r#"
        UPDATE users
        SET
            name          = COALESCE($2, name),
            gender        = COALESCE($3, gender),
            bio           = CASE WHEN $4::boolean THEN $5 ELSE bio END,
            university_id = CASE WHEN $6::boolean THEN $7 ELSE university_id END,
            degree        = CASE WHEN $8::boolean THEN $9 ELSE degree END,
            year          = CASE WHEN $10::boolean THEN $11 ELSE year END,
            interests     = COALESCE($12, interests),
            updated_at    = NOW()
        WHERE id = $1 AND deleted_at IS NULL
        RETURNING *
        "#,
        )
        .bind(id)
        .bind(&user.name) // $2
        .bind(user.gender) // $3
        .bind(user.bio.is_some()) // $4
        .bind(user.bio.as_ref().and_then(|v| v.as_ref())) // $5
        .bind(user.university_id.is_some()) // $6
        .bind(user.university_id.flatten()) // $7
        .bind(user.degree.is_some()) // $8
        .bind(user.degree.as_ref().and_then(|v| v.as_ref())) // $9
        .bind(user.year.is_some()) // $10
        .bind(user.year.flatten()) // $11
        .bind(&user.interests) // $12
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| error::SystemError::not_found("User not found"))?;

        Ok(user)
    }

    async fn delete_cascade(&self, id: &Uuid) -> Result<bool, error::SystemError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM adjective_selections WHERE user_id = $1 OR target_user_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        sqlx::query("DELETE FROM matches WHERE user_id_1 = $1 OR user_id_2 = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        sqlx::query("DELETE FROM connections WHERE user_id_1 = $1 OR user_id_2 = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        sqlx::query("DELETE FROM connection_requests WHERE requester_id = $1 OR target_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        sqlx::query("DELETE FROM user_images WHERE user_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        sqlx::query(
            "UPDATE participants SET deleted_at = NOW() WHERE user_id = $1 AND deleted_at IS NULL",
        )
        .bind(id)
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r#"
            UPDATE bookings
            SET booking_status = 'cancelled', updated_at = NOW()
            WHERE user_id = $1
            AND booking_status = 'confirmed'
            AND event_id IN (SELECT id FROM dinner_events WHERE event_date > NOW())
            "#,
        )
        .bind(id)
        .execute(&mut *tx)
        .await?;

        let rows = sqlx::query(
            r#"
            UPDATE users
            SET deleted_at = NOW(),
                email = 'deleted+' || id::text || '@deleted.invalid',
                bio = NULL,
                interests = '{}'
            WHERE id = $1 AND deleted_at IS NULL
            "#,
        )
        .bind(id)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        tx.commit().await?;

        Ok(rows > 0)
    }
}
