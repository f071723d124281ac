use std::sync::Arc;

use crate::{
    api::error,
    configs::CacheStore,
    modules::university::{repository::UniversityRepository, schema::UniversityEntity},
};

const UNIVERSITIES_KEY: &str = "universities:all";

#[derive(Clone)]
pub struct UniversityService<R, K>
where
    R: UniversityRepository + Send + Sync,
    K: CacheStore,
{
    repo: Arc<R>,
    cache: Arc<K>,
    ttl: usize,
}

impl<R, K> UniversityService<R, K>
where
    R: UniversityRepository + Send + Sync,
    K: CacheStore,
{
    pub fn with_dependencies(repo: Arc<R>, cache: Arc<K>, ttl: usize) -> Self {
        UniversityService { repo, cache, ttl }
    }

    pub async fn list(&self) -> Result<Vec<UniversityEntity>, error::SystemError> {
        match self.cache.get::<Vec<UniversityEntity>>(UNIVERSITIES_KEY).await {
            Ok(Some(cached)) => return Ok(cached),
            Ok(None) => {}
            Err(e) => log::warn!("University cache read failed: {e}"),
        }

        let universities = self.repo.find_all().await?;

        if let Err(e) = self.cache.set(UNIVERSITIES_KEY, &universities, self.ttl).await {
            log::warn!("University cache write failed: {e}");
        }

        Ok(universities)
    }
}
