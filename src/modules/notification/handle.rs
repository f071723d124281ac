use actix_web::{HttpRequest, get, web};

use crate::{
    api::{error, success},
    middlewares::get_claims,
    modules::{
        connection::repository_pg::ConnectionRepositoryPg,
        matching::repository_pg::MatchingRepositoryPg,
        notification::{model::NotificationsResponse, service::NotificationService},
        user::repository_pg::UserRepositoryPg,
    },
};

pub type NotificationSvc =
    NotificationService<ConnectionRepositoryPg, MatchingRepositoryPg, UserRepositoryPg>;

#[get("")]
pub async fn get_notifications(
    notification_service: web::Data<NotificationSvc>,
    req: HttpRequest,
) -> Result<success::Success<NotificationsResponse>, error::Error> {
    let user_id = get_claims(&req)?.sub;
    let notifications = notification_service.get_notifications(user_id).await?;
    Ok(success::Success::ok(Some(notifications)))
}
