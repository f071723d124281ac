use uuid::Uuid;

use crate::{
    api::error,
    modules::university::{repository::UniversityRepository, schema::UniversityEntity},
};

#[derive(Clone)]
pub struct UniversityRepositoryPg {
    pool: sqlx::PgPool,
}

impl UniversityRepositoryPg {
    pub fn new(pool: sqlx::PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl UniversityRepository for UniversityRepositoryPg {
    async fn find_all(&self) -> Result<Vec<UniversityEntity>, error::SystemError> {
        let universities =
            sqlx::query_as::<_, UniversityEntity>("SELECT * FROM universities ORDER BY name")
                .fetch_all(&self.pool)
                .await?;
        Ok(universities)
    }

    async fn find_by_id(&self, id: &Uuid) -> Result<Option<UniversityEntity>, error::SystemError> {
        let university =
            sqlx::query_as::<_, UniversityEntity>("SELECT * FROM universities WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(university)
    }
}
