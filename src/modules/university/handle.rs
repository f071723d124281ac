use actix_web::{get, web};

use crate::{
    api::{error, success},
    configs::RedisCache,
    modules::university::{
        repository_pg::UniversityRepositoryPg, schema::UniversityEntity,
        service::UniversityService,
    },
};

pub type UniversitySvc = UniversityService<UniversityRepositoryPg, RedisCache>;

#[get("")]
pub async fn list_universities(
    university_service: web::Data<UniversitySvc>,
) -> Result<success::Success<Vec<UniversityEntity>>, error::Error> {
    let universities = university_service.list().await?;
    Ok(success::Success::ok(Some(universities)).message("Universities retrieved successfully"))
}
