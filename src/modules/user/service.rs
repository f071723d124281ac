use log::info;
use std::sync::Arc;
use uuid::Uuid;

use crate::api::error;
use crate::configs::CacheStore;
use crate::constants::USER_CACHE_TTL;
use crate::modules::image::{repository::ImageRepository, service::ImageService};
use crate::modules::university::repository::UniversityRepository;
use crate::modules::user::{
    model::{ProfileCore, ProfileResponse, UpdateProfileModel, UpdateUser},
    repository::UserRepository,
    schema::UserEntity,
};

pub fn user_cache_key(id: &Uuid) -> String {
    format!("user:{id}")
}

#[derive(Clone)]
pub struct UserService<U, N, I, K>
where
    U: UserRepository + Send + Sync,
    N: UniversityRepository + Send + Sync,
    I: ImageRepository + Send + Sync,
    K: CacheStore,
{
    repo: Arc<U>,
    universities: Arc<N>,
    images: ImageService<I>,
    cache: Arc<K>,
}

impl<U, N, I, K> UserService<U, N, I, K>
where
    U: UserRepository + Send + Sync,
    N: UniversityRepository + Send + Sync,
    I: ImageRepository + Send + Sync,
    K: CacheStore,
{
    pub fn with_dependencies(
        repo: Arc<U>,
        universities: Arc<N>,
        images: ImageService<I>,
        cache: Arc<K>,
    ) -> Self {
        info!("UserService initialized with dependencies");
        UserService { repo, universities, images, cache }
    }

    async fn build_core(&self, entity: UserEntity) -> Result<ProfileCore, error::SystemError> {
        let university = match entity.university_id {
            Some(id) => self.universities.find_by_id(&id).await?,
            None => None,
        };
        Ok(ProfileCore::new(entity, university))
    }

    async fn load_core(&self, id: Uuid) -> Result<ProfileCore, error::SystemError> {
        let key = user_cache_key(&id);
        match self.cache.get::<ProfileCore>(&key).await {
            Ok(Some(cached)) => return Ok(cached),
            Ok(None) => {}
            Err(e) => log::warn!("Profile cache read failed for {id}: {e}"),
        }

        let entity = self
            .repo
            .find_by_id(&id)
            .await?
            .ok_or_else(|| error::SystemError::not_found("User not found"))?;

        let core = self.build_core(entity).await?;
        if let Err(e) = self.cache.set(&key, &core, USER_CACHE_TTL).await {
            log::warn!("Profile cache write failed for {id}: {e}");
        }
        Ok(core)
    }

    /// Email is only exposed to the profile owner.
    pub async fn get_profile(
        &self,
        viewer_id: Uuid,
        id: Uuid,
    ) -> Result<ProfileResponse, error::SystemError> {
        let (core, images) = tokio::try_join!(self.load_core(id), self.images.list(id))?;
        Ok(ProfileResponse::from_core(core, images, viewer_id == id))
    }

    pub async fn profile_for(&self, entity: UserEntity) -> Result<ProfileResponse, error::SystemError> {
        let id = entity.id;
        let (core, images) = tokio::try_join!(self.build_core(entity), self.images.list(id))?;
        Ok(ProfileResponse::from_core(core, images, true))
    }

    pub async fn update_me(
        &self,
        id: Uuid,
        model: UpdateProfileModel,
    ) -> Result<ProfileResponse, error::SystemError> {
        if model.is_empty() {
            return Err(error::SystemError::bad_request("No fields to update"));
        }

        if let Some(Some(university_id)) = model.university_id {
            if self.universities.find_by_id(&university_id).await?.is_none() {
                return Err(error::SystemError::not_found("University not found"));
            }
        }

        let entity = self.repo.update(&id, &UpdateUser::from(model)).await?;

        self.invalidate(&id).await;
        self.profile_for(entity).await
    }

    pub async fn delete_me(&self, id: Uuid) -> Result<(), error::SystemError> {
        let paths = self.images.storage_paths(id).await?;

        if !self.repo.delete_cascade(&id).await? {
            return Err(error::SystemError::not_found("User not found"));
        }

        self.images.remove_files(&paths).await;
        self.invalidate(&id).await;
        info!("User {id} deleted their account");
        Ok(())
    }

    pub async fn invalidate(&self, id: &Uuid) {
        if let Err(e) = self.cache.delete(&user_cache_key(id)).await {
            log::warn!("Profile cache delete failed for {id}: {e}");
        }
    }
}
