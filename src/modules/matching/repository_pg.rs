use uuid::Uuid;

use crate::{
    api::error,
    modules::matching::{
        model::{ConnectOutcome, SelectionOutcome},
        repository::{MatchingRepo, MatchingRepository},
        schema::{AdjectiveSelectionEntity, MatchEntity},
    },
    utils::normalize_pair,
};

#[derive(Clone)]
pub struct MatchingRepositoryPg {
    pool: sqlx::PgPool,
}

impl MatchingRepositoryPg {
    pub fn new(pool: sqlx::PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl MatchingRepository for MatchingRepositoryPg {
    async fn find_selection(
        &self,
        user_id: &Uuid,
        target_user_id: &Uuid,
    ) -> Result<Option<AdjectiveSelectionEntity>, error::SystemError> {
        let selection = sqlx::query_as::<_, AdjectiveSelectionEntity>(
            "SELECT * FROM adjective_selections WHERE user_id = $1 AND target_user_id = $2",
        )
        .bind(user_id)
        .bind(target_user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(selection)
    }

    async fn find_matches(&self, user_id: &Uuid) -> Result<Vec<MatchEntity>, error::SystemError> {
        let matches = sqlx::query_as::<_, MatchEntity>(
            r#"
            SELECT m.* FROM matches m
            JOIN users u1 ON u1.id = m.user_id_1 AND u1.deleted_at IS NULL
            JOIN users u2 ON u2.id = m.user_id_2 AND u2.deleted_at IS NULL
            WHERE m.user_id_1 = $1 OR m.user_id_2 = $1
            ORDER BY m.matched_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(matches)
    }
}

#[async_trait::async_trait]
impl MatchingRepo for MatchingRepositoryPg {
    async fn select_adjective_atomic(
        &self,
        user_id: &Uuid,
        target_user_id: &Uuid,
        adjective: &str,
        ice_breaking_prompt: &str,
    ) -> Result<SelectionOutcome, error::SystemError> {
        let (u1, u2) = normalize_pair(*user_id, *target_user_id);
        let mut tx = self.pool.begin().await?;

        // both sides selecting at once must still see each other
        sqlx::query("SELECT pg_advisory_xact_lock(hashtextextended($1::text || $2::text, 0))")
            .bind(u1)
            .bind(u2)
            .execute(&mut *tx)
            .await?;

        sqlx::query(
            r#"
            INSERT INTO adjective_selections (user_id, target_user_id, adjective, is_matched)
            VALUES ($1, $2, $3, FALSE)
            ON CONFLICT (user_id, target_user_id) DO UPDATE
            SET adjective = EXCLUDED.adjective, is_matched = FALSE, selected_at = NOW()
            "#,
        )
        .bind(user_id)
        .bind(target_user_id)
        .bind(adjective)
        .execute(&mut *tx)
        .await?;

        let reverse = sqlx::query_scalar::<_, String>(
            r#"
            SELECT adjective FROM adjective_selections
            WHERE user_id = $1 AND target_user_id = $2
            FOR UPDATE
            "#,
        )
        .bind(target_user_id)
        .bind(user_id)
        .fetch_optional(&mut *tx)
        .await?;

        if reverse.as_deref() != Some(adjective) {
            tx.commit().await?;
            return Ok(SelectionOutcome::Pending);
        }

        let existing = sqlx::query_as::<_, MatchEntity>(
            "SELECT * FROM matches WHERE user_id_1 = $1 AND user_id_2 = $2 FOR UPDATE",
        )
        .bind(u1)
        .bind(u2)
        .fetch_optional(&mut *tx)
        .await?;

        let outcome = match existing {
            Some(found) if found.mutual_adjective == adjective => {
                SelectionOutcome::ExistingMatch(found)
            }
            _ => {
                // a pair that is already connected starts its match connected
                let matched = sqlx::query_as::<_, MatchEntity>(
                    r#"
                    INSERT INTO matches
                        (id, user_id_1, user_id_2, mutual_adjective, ice_breaking_prompt, is_connected)
                    VALUES ($1, $2, $3, $4, $5, EXISTS (
                        SELECT 1 FROM connections
                        WHERE user_id_1 = $2 AND user_id_2 = $3 AND status = 'connected'
                    ))
                    ON CONFLICT ON CONSTRAINT matches_pair_key DO UPDATE
                    SET mutual_adjective = EXCLUDED.mutual_adjective,
                        ice_breaking_prompt = EXCLUDED.ice_breaking_prompt,
                        matched_at = NOW()
                    RETURNING *
                    "#,
                )
                .bind(Uuid::now_v7())
                .bind(u1)
                .bind(u2)
                .bind(adjective)
                .bind(ice_breaking_prompt)
                .fetch_one(&mut *tx)
                .await?;
                SelectionOutcome::NewMatch(matched)
            }
        };

        sqlx::query(
            r#"
            UPDATE adjective_selections SET is_matched = TRUE
            WHERE (user_id = $1 AND target_user_id = $2)
               OR (user_id = $2 AND target_user_id = $1)
            "#,
        )
        .bind(user_id)
        .bind(target_user_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(outcome)
    }

    async fn connect_after_match_atomic(
        &self,
        user_id: &Uuid,
        other_id: &Uuid,
    ) -> Result<ConnectOutcome, error::SystemError> {
        let (u1, u2) = normalize_pair(*user_id, *other_id);
        let mut tx = self.pool.begin().await?;

        let found = sqlx::query_as::<_, MatchEntity>(
            "SELECT * FROM matches WHERE user_id_1 = $1 AND user_id_2 = $2 FOR UPDATE",
        )
        .bind(u1)
        .bind(u2)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(found) = found else {
            return Ok(ConnectOutcome::NoMatch);
        };

        if found.is_connected {
            return Ok(ConnectOutcome::AlreadyConnected);
        }

        let connected = sqlx::query_scalar::<_, bool>(
            r#"
            INSERT INTO connections (user_id_1, user_id_2, status, action_user_id)
            VALUES ($1, $2, 'connected', $3)
            ON CONFLICT (user_id_1, user_id_2) DO UPDATE
            SET status = 'connected', action_user_id = $3, updated_at = NOW()
            WHERE connections.status = 'requested'
            RETURNING TRUE
            "#,
        )
        .bind(u1)
        .bind(u2)
        .bind(user_id)
        .fetch_optional(&mut *tx)
        .await?;

        if connected.is_none() {
            // row exists and is either connected or blocked
            let status = sqlx::query_scalar::<_, String>(
                "SELECT status::text FROM connections WHERE user_id_1 = $1 AND user_id_2 = $2",
            )
            .bind(u1)
            .bind(u2)
            .fetch_one(&mut *tx)
            .await?;

            if status == "blocked" {
                return Err(error::SystemError::conflict("Connection is blocked"));
            }

            // connected through a request before the match existed
            sqlx::query("UPDATE matches SET is_connected = TRUE WHERE id = $1")
                .bind(found.id)
                .execute(&mut *tx)
                .await?;
            tx.commit().await?;
            return Ok(ConnectOutcome::AlreadyConnected);
        }

        sqlx::query(
            r#"
            UPDATE connection_requests
            SET status = 'accepted', updated_at = NOW()
            WHERE status = 'pending'
            AND ((requester_id = $1 AND target_id = $2)
              OR (requester_id = $2 AND target_id = $1))
            "#,
        )
        .bind(user_id)
        .bind(other_id)
        .execute(&mut *tx)
        .await?;

        let updated = sqlx::query_as::<_, MatchEntity>(
            "UPDATE matches SET is_connected = TRUE WHERE id = $1 RETURNING *",
        )
        .bind(found.id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(ConnectOutcome::Connected(updated))
    }
}
