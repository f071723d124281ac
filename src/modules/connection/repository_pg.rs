use uuid::Uuid;

use crate::{
    api::error,
    modules::connection::{
        repository::{ConnectionRepo, ConnectionRepository},
        schema::{ConnectionEntity, ConnectionRequestEntity},
    },
    utils::normalize_pair,
};

#[derive(Clone)]
pub struct ConnectionRepositoryPg {
    pool: sqlx::PgPool,
}

impl ConnectionRepositoryPg {
    pub fn new(pool: sqlx::PgPool) -> Self {
        Self { pool }
    }
}

async fn set_match_connected(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    user_a: &Uuid,
    user_b: &Uuid,
    connected: bool,
) -> Result<(), error::SystemError> {
    let (u1, u2) = normalize_pair(*user_a, *user_b);
    sqlx::query("UPDATE matches SET is_connected = $3 WHERE user_id_1 = $1 AND user_id_2 = $2")
        .bind(u1)
        .bind(u2)
        .bind(connected)
        .execute(&mut **tx)
        .await?;
    Ok(())
}

#[async_trait::async_trait]
impl ConnectionRepository for ConnectionRepositoryPg {
    async fn find_connection(
        &self,
        user_a: &Uuid,
        user_b: &Uuid,
    ) -> Result<Option<ConnectionEntity>, error::SystemError> {
        let (u1, u2) = normalize_pair(*user_a, *user_b);
        let connection = sqlx::query_as::<_, ConnectionEntity>(
            "SELECT * FROM connections WHERE user_id_1 = $1 AND user_id_2 = $2",
        )
        .bind(u1)
        .bind(u2)
        .fetch_optional(&self.pool)
        .await?;

        Ok(connection)
    }

    async fn find_relations(
        &self,
        user_id: &Uuid,
    ) -> Result<Vec<ConnectionEntity>, error::SystemError> {
        let rows = sqlx::query_as::<_, ConnectionEntity>(
            "SELECT * FROM connections WHERE user_id_1 = $1 OR user_id_2 = $1",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    async fn find_connected(
        &self,
        user_id: &Uuid,
    ) -> Result<Vec<ConnectionEntity>, error::SystemError> {
        let rows = sqlx::query_as::<_, ConnectionEntity>(
            r#"
            SELECT * FROM connections
            WHERE (user_id_1 = $1 OR user_id_2 = $1)
            AND status = 'connected'
            ORDER BY updated_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    async fn find_pending_request(
        &self,
        requester_id: &Uuid,
        target_id: &Uuid,
    ) -> Result<Option<ConnectionRequestEntity>, error::SystemError> {
        let request = sqlx::query_as::<_, ConnectionRequestEntity>(
            r#"
            SELECT * FROM connection_requests
            WHERE requester_id = $1 AND target_id = $2 AND status = 'pending'
            "#,
        )
        .bind(requester_id)
        .bind(target_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(request)
    }

    async fn find_incoming_requests(
        &self,
        user_id: &Uuid,
    ) -> Result<Vec<ConnectionRequestEntity>, error::SystemError> {
        let requests = sqlx::query_as::<_, ConnectionRequestEntity>(
            r#"
            SELECT * FROM connection_requests
            WHERE target_id = $1 AND status = 'pending'
            ORDER BY created_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(requests)
    }

    async fn find_outgoing_requests(
        &self,
        user_id: &Uuid,
    ) -> Result<Vec<ConnectionRequestEntity>, error::SystemError> {
        let requests = sqlx::query_as::<_, ConnectionRequestEntity>(
            r#"
            SELECT * FROM connection_requests
            WHERE requester_id = $1 AND status = 'pending'
            ORDER BY created_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(requests)
    }
}

#[async_trait::async_trait]
impl ConnectionRepo for ConnectionRepositoryPg {
    async fn create_request_atomic(
        &self,
        requester_id: &Uuid,
        target_id: &Uuid,
    ) -> Result<ConnectionRequestEntity, error::SystemError> {
        let (u1, u2) = normalize_pair(*requester_id, *target_id);
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO connections (user_id_1, user_id_2, status, action_user_id)
            VALUES ($1, $2, 'requested', $3)
            "#,
        )
        .bind(u1)
        .bind(u2)
        .bind(requester_id)
        .execute(&mut *tx)
        .await?;

        let request = sqlx::query_as::<_, ConnectionRequestEntity>(
            r#"
            INSERT INTO connection_requests (id, requester_id, target_id, status)
            VALUES ($1, $2, $3, 'pending')
            RETURNING *
            "#,
        )
        .bind(Uuid::now_v7())
        .bind(requester_id)
        .bind(target_id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(request)
    }

    async fn accept_request_atomic(
        &self,
        accepter_id: &Uuid,
        requester_id: &Uuid,
    ) -> Result<Option<ConnectionEntity>, error::SystemError> {
        let (u1, u2) = normalize_pair(*accepter_id, *requester_id);
        let mut tx = self.pool.begin().await?;

        let accepted = sqlx::query_scalar::<_, Uuid>(
            r#"
            UPDATE connection_requests
            SET status = 'accepted', updated_at = NOW()
            WHERE requester_id = $1 AND target_id = $2 AND status = 'pending'
            RETURNING id
            "#,
        )
        .bind(requester_id)
        .bind(accepter_id)
        .fetch_optional(&mut *tx)
        .await?;

        if accepted.is_none() {
            return Ok(None);
        }

        // a block placed in the meantime wins
        let connection = sqlx::query_as::<_, ConnectionEntity>(
            r#"
            INSERT INTO connections (user_id_1, user_id_2, status, action_user_id)
            VALUES ($1, $2, 'connected', $3)
            ON CONFLICT (user_id_1, user_id_2) DO UPDATE
            SET status = 'connected', action_user_id = $3, updated_at = NOW()
            WHERE connections.status <> 'blocked'
            RETURNING *
            "#,
        )
        .bind(u1)
        .bind(u2)
        .bind(accepter_id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(connection) = connection else {
            return Err(error::SystemError::conflict("Connection is blocked"));
        };

        set_match_connected(&mut tx, accepter_id, requester_id, true).await?;

        tx.commit().await?;
        Ok(Some(connection))
    }

    async fn reject_request_atomic(
        &self,
        rejecter_id: &Uuid,
        requester_id: &Uuid,
    ) -> Result<bool, error::SystemError> {
        let (u1, u2) = normalize_pair(*rejecter_id, *requester_id);
        let mut tx = self.pool.begin().await?;

        let rejected = sqlx::query(
            r#"
            UPDATE connection_requests
            SET status = 'rejected', updated_at = NOW()
            WHERE requester_id = $1 AND target_id = $2 AND status = 'pending'
            "#,
        )
        .bind(requester_id)
        .bind(rejecter_id)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        if rejected == 0 {
            return Ok(false);
        }

        sqlx::query(
            r#"
            DELETE FROM connections
            WHERE user_id_1 = $1 AND user_id_2 = $2 AND status = 'requested'
            "#,
        )
        .bind(u1)
        .bind(u2)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(true)
    }

    async fn remove_connection_atomic(
        &self,
        user_id: &Uuid,
        other_id: &Uuid,
    ) -> Result<bool, error::SystemError> {
        let (u1, u2) = normalize_pair(*user_id, *other_id);
        let mut tx = self.pool.begin().await?;

        let removed = sqlx::query(
            r#"
            DELETE FROM connections
            WHERE user_id_1 = $1 AND user_id_2 = $2 AND status <> 'blocked'
            "#,
        )
        .bind(u1)
        .bind(u2)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        if removed == 0 {
            return Ok(false);
        }

        sqlx::query(
            r#"
            DELETE FROM connection_requests
            WHERE (requester_id = $1 AND target_id = $2)
               OR (requester_id = $2 AND target_id = $1)
            "#,
        )
        .bind(user_id)
        .bind(other_id)
        .execute(&mut *tx)
        .await?;

        set_match_connected(&mut tx, user_id, other_id, false).await?;

        tx.commit().await?;
        Ok(true)
    }

    async fn block_atomic(
        &self,
        blocker_id: &Uuid,
        target_id: &Uuid,
    ) -> Result<ConnectionEntity, error::SystemError> {
        let (u1, u2) = normalize_pair(*blocker_id, *target_id);
        let mut tx = self.pool.begin().await?;

        let connection = sqlx::query_as::<_, ConnectionEntity>(
            r#"
            INSERT INTO connections (user_id_1, user_id_2, status, action_user_id)
            VALUES ($1, $2, 'blocked', $3)
            ON CONFLICT (user_id_1, user_id_2) DO UPDATE
            SET status = 'blocked', action_user_id = $3, updated_at = NOW()
            RETURNING *
            "#,
        )
        .bind(u1)
        .bind(u2)
        .bind(blocker_id)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query(
            r#"
            DELETE FROM connection_requests
            WHERE status = 'pending'
            AND ((requester_id = $1 AND target_id = $2)
              OR (requester_id = $2 AND target_id = $1))
            "#,
        )
        .bind(blocker_id)
        .bind(target_id)
        .execute(&mut *tx)
        .await?;

        set_match_connected(&mut tx, blocker_id, target_id, false).await?;

        tx.commit().await?;
        Ok(connection)
    }

    async fn unblock(&self, blocker_id: &Uuid, target_id: &Uuid) -> Result<bool, error::SystemError> {
        let (u1, u2) = normalize_pair(*blocker_id, *target_id);
        let rows = sqlx::query(
            r#"
            DELETE FROM connections
            WHERE user_id_1 = $1 AND user_id_2 = $2
            AND status = 'blocked' AND action_user_id = $3
            "#,
        )
        .bind(u1)
        .bind(u2)
        .bind(blocker_id)
        .execute(&self.pool)
        .await?
        .rows_affected();

        Ok(rows > 0)
    }
}
