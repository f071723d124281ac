use actix_web::{HttpRequest, get, web};
use uuid::Uuid;

use crate::{
    api::{error, success},
    middlewares::get_claims,
    modules::{
        connection::repository_pg::ConnectionRepositoryPg,
        explore::{
            model::{ExploreItem, ExploreQuery, ExploreResponse},
            repository_pg::ExploreRepositoryPg,
            service::ExploreService,
        },
        image::repository_pg::ImageRepositoryPg,
    },
    utils::ValidatedQuery,
};

pub type ExploreSvc =
    ExploreService<ExploreRepositoryPg, ConnectionRepositoryPg, ImageRepositoryPg>;

#[get("")]
pub async fn explore(
    explore_service: web::Data<ExploreSvc>,
    query: ValidatedQuery<ExploreQuery>,
    req: HttpRequest,
) -> Result<success::Success<ExploreResponse>, error::Error> {
    let user_id = get_claims(&req)?.sub;
    let feed = explore_service.explore(user_id, query.0).await?;
    Ok(success::Success::ok(Some(feed)))
}

#[get("/{user_id}")]
pub async fn explore_profile(
    explore_service: web::Data<ExploreSvc>,
    target_id: web::Path<Uuid>,
    req: HttpRequest,
) -> Result<success::Success<ExploreItem>, error::Error> {
    let user_id = get_claims(&req)?.sub;
    let item = explore_service.get_profile(user_id, target_id.into_inner()).await?;
    Ok(success::Success::ok(Some(item)))
}
