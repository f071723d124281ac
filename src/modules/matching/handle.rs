use actix_web::{HttpRequest, get, post, web};
use uuid::Uuid;

use crate::{
    api::{error, success},
    middlewares::get_claims,
    modules::{
        matching::{
            model::{
                AdjectiveOptions, MatchData, MatchResponse, SelectAdjectiveModel,
                SelectAdjectiveResponse,
            },
            repository_pg::MatchingRepositoryPg,
            service::MatchingService,
        },
        user::repository_pg::UserRepositoryPg,
    },
    utils::ValidatedJson,
};

pub type MatchingSvc = MatchingService<MatchingRepositoryPg, UserRepositoryPg>;

#[get("/{target_id}")]
pub async fn get_adjectives(
    matching_service: web::Data<MatchingSvc>,
    target_id: web::Path<Uuid>,
    req: HttpRequest,
) -> Result<success::Success<AdjectiveOptions>, error::Error> {
    let user_id = get_claims(&req)?.sub;
    let options = matching_service.get_adjectives(user_id, target_id.into_inner()).await?;
    Ok(success::Success::ok(Some(options)))
}

#[post("/select")]
pub async fn select_adjective(
    matching_service: web::Data<MatchingSvc>,
    body: ValidatedJson<SelectAdjectiveModel>,
    req: HttpRequest,
) -> Result<success::Success<SelectAdjectiveResponse>, error::Error> {
    let user_id = get_claims(&req)?.sub;
    let body = body.0;
    let result = matching_service
        .select_adjective(user_id, body.target_user_id, &body.adjective)
        .await?;

    let message = if result.matched { "It's a match!" } else { "Adjective selected" };
    Ok(success::Success::ok(Some(result)).message(message))
}

#[get("")]
pub async fn list_matches(
    matching_service: web::Data<MatchingSvc>,
    req: HttpRequest,
) -> Result<success::Success<Vec<MatchResponse>>, error::Error> {
    let user_id = get_claims(&req)?.sub;
    let matches = matching_service.get_matches(user_id).await?;
    Ok(success::Success::ok(Some(matches)).message("Matches retrieved successfully"))
}

#[post("/{user_id}/connect")]
pub async fn connect_match(
    matching_service: web::Data<MatchingSvc>,
    other_id: web::Path<Uuid>,
    req: HttpRequest,
) -> Result<success::Success<MatchData>, error::Error> {
    let user_id = get_claims(&req)?.sub;
    let data = matching_service.connect_after_match(user_id, other_id.into_inner()).await?;
    Ok(success::Success::ok(Some(data)).message("Connected successfully"))
}
