use uuid::Uuid;

use crate::{api::error, modules::university::schema::UniversityEntity};

#[async_trait::async_trait]
pub trait UniversityRepository {
    async fn find_all(&self) -> Result<Vec<UniversityEntity>, error::SystemError>;

    async fn find_by_id(&self, id: &Uuid) -> Result<Option<UniversityEntity>, error::SystemError>;
}
