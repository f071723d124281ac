use uuid::Uuid;

use crate::{
    api::error,
    modules::explore::{
        model::{CandidateFilter, ExploreCandidate},
        repository::ExploreRepository,
    },
};

#[derive(Clone)]
pub struct ExploreRepositoryPg {
    pool: sqlx::PgPool,
}

impl ExploreRepositoryPg {
    pub fn new(pool: sqlx::PgPool) -> Self {
        Self { pool }
    }
}

const CANDIDATE_COLUMNS: &str = r#"
    SELECT
        u.id,
        u.name,
        u.gender,
        u.bio,
        u.university_id,
        un.name AS university_name,
        un.country,
        u.degree,
        u.year,
        u.interests
    FROM users u
    LEFT JOIN universities un ON un.id = u.university_id
"#;

fn like_pattern(value: &str) -> String {
    let escaped = value.replace('\\', "\\\\").replace('%', "\\%").replace('_', "\\_");
    format!("%{escaped}%")
}

#[async_trait::async_trait]
impl ExploreRepository for ExploreRepositoryPg {
    async fn find_candidates(
        &self,
        viewer_id: &Uuid,
        filter: &CandidateFilter,
        cap: i64,
    ) -> Result<Vec<ExploreCandidate>, error::SystemError> {
        let sql = format!(
            r#"
            {CANDIDATE_COLUMNS}
            WHERE u.deleted_at IS NULL
            AND u.id <> $1
            AND NOT EXISTS (
                SELECT 1 FROM connections c
                WHERE c.status = 'blocked'
                AND ((c.user_id_1 = $1 AND c.user_id_2 = u.id)
                  OR (c.user_id_1 = u.id AND c.user_id_2 = $1))
            )
            AND ($2::gender IS NULL OR u.gender = $2)
            AND ($3::uuid IS NULL OR u.university_id = $3)
            AND ($4::text IS NULL OR u.degree ILIKE $4)
            AND ($5::smallint IS NULL OR u.year = $5)
            AND ($6::text IS NULL
                OR u.name ILIKE $6
                OR u.bio ILIKE $6
                OR u.degree ILIKE $6
                OR un.name ILIKE $6
                OR array_to_string(u.interests, ' ') ILIKE $6)
            ORDER BY u.created_at DESC
            LIMIT $7
            "#
        );

        let candidates = sqlx::query_as::<_, ExploreCandidate>(&sql)
            .bind(viewer_id)
            .bind(filter.gender)
            .bind(filter.university_id)
            .bind(filter.degree.as_deref().map(like_pattern))
            .bind(filter.year)
            .bind(filter.search.as_deref().map(like_pattern))
            .bind(cap)
            .fetch_all(&self.pool)
            .await?;

        Ok(candidates)
    }

    async fn find_candidate(&self, id: &Uuid) -> Result<Option<ExploreCandidate>, error::SystemError> {
        let sql = format!("{CANDIDATE_COLUMNS} WHERE u.id = $1 AND u.deleted_at IS NULL");
        let candidate = sqlx::query_as::<_, ExploreCandidate>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(candidate)
    }
}
