use actix_web::{HttpRequest, delete, get, patch, web};
use uuid::Uuid;

use crate::{
    api::{error, success},
    configs::RedisCache,
    middlewares::get_claims,
    modules::{
        image::repository_pg::ImageRepositoryPg,
        university::repository_pg::UniversityRepositoryPg,
        user::{
            model::{ProfileResponse, UpdateProfileModel},
            repository_pg::UserRepositoryPg,
            service::UserService,
        },
    },
    utils::ValidatedJson,
};

pub type UserSvc =
    UserService<UserRepositoryPg, UniversityRepositoryPg, ImageRepositoryPg, RedisCache>;

#[get("/me")]
pub async fn get_me(
    user_service: web::Data<UserSvc>,
    req: HttpRequest,
) -> Result<success::Success<ProfileResponse>, error::Error> {
    let id = get_claims(&req)?.sub;
    let user = user_service.get_profile(id, id).await?;
    Ok(success::Success::ok(Some(user)).message("Profile retrieved successfully"))
}

#[get("/{id:[0-9a-fA-F-]{36}}")]
pub async fn get_user(
    user_service: web::Data<UserSvc>,
    user_id: web::Path<Uuid>,
    req: HttpRequest,
) -> Result<success::Success<ProfileResponse>, error::Error> {
    let viewer_id = get_claims(&req)?.sub;
    let user = user_service.get_profile(viewer_id, user_id.into_inner()).await?;
    Ok(success::Success::ok(Some(user)).message("User retrieved successfully"))
}

#[patch("/me")]
pub async fn update_me(
    user_service: web::Data<UserSvc>,
    body: ValidatedJson<UpdateProfileModel>,
    req: HttpRequest,
) -> Result<success::Success<ProfileResponse>, error::Error> {
    let id = get_claims(&req)?.sub;
    let user = user_service.update_me(id, body.0).await?;
    Ok(success::Success::ok(Some(user)).message("Profile updated successfully"))
}

#[delete("/me")]
pub async fn delete_me(
    user_service: web::Data<UserSvc>,
    req: HttpRequest,
) -> Result<success::Success<()>, error::Error> {
    let id = get_claims(&req)?.sub;
    user_service.delete_me(id).await?;
    Ok(success::Success::no_content())
}
