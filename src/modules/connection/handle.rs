use actix_web::{HttpRequest, get, post, web};
use uuid::Uuid;

use crate::{
    api::{error, success},
    middlewares::get_claims,
    modules::{
        connection::{
            model::{
                ConnectionAction, ConnectionActionResponse, ConnectionRequestsResponse,
                ConnectionResponse, ConnectionStateResponse,
            },
            repository_pg::ConnectionRepositoryPg,
            service::ConnectionService,
        },
        user::repository_pg::UserRepositoryPg,
    },
};

pub type ConnectionSvc = ConnectionService<ConnectionRepositoryPg, UserRepositoryPg>;

#[post("/{user_id}/{action}")]
pub async fn connection_action(
    connection_service: web::Data<ConnectionSvc>,
    path: web::Path<(Uuid, ConnectionAction)>,
    req: HttpRequest,
) -> Result<success::Success<ConnectionActionResponse>, error::Error> {
    let user_id = get_claims(&req)?.sub;
    let (target_id, action) = path.into_inner();
    let state = connection_service.apply(user_id, target_id, action).await?;

    Ok(success::Success::ok(Some(ConnectionActionResponse { action, state }))
        .message("Connection updated successfully"))
}

#[get("")]
pub async fn list_connections(
    connection_service: web::Data<ConnectionSvc>,
    req: HttpRequest,
) -> Result<success::Success<Vec<ConnectionResponse>>, error::Error> {
    let user_id = get_claims(&req)?.sub;
    let connections = connection_service.get_connections(user_id).await?;
    Ok(success::Success::ok(Some(connections)).message("Connections retrieved successfully"))
}

#[get("/requests")]
pub async fn list_requests(
    connection_service: web::Data<ConnectionSvc>,
    req: HttpRequest,
) -> Result<success::Success<ConnectionRequestsResponse>, error::Error> {
    let user_id = get_claims(&req)?.sub;
    let requests = connection_service.get_requests(user_id).await?;
    Ok(success::Success::ok(Some(requests)).message("Connection requests retrieved successfully"))
}

#[get("/{user_id}/state")]
pub async fn connection_state(
    connection_service: web::Data<ConnectionSvc>,
    other_id: web::Path<Uuid>,
    req: HttpRequest,
) -> Result<success::Success<ConnectionStateResponse>, error::Error> {
    let user_id = get_claims(&req)?.sub;
    let other_id = other_id.into_inner();
    let state = connection_service.get_state(user_id, other_id).await?;
    Ok(success::Success::ok(Some(ConnectionStateResponse { user_id: other_id, state })))
}
