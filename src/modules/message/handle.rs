use actix_web::{HttpRequest, delete, get, post, web};
use uuid::Uuid;

use crate::{
    api::{error, success},
    middlewares::get_claims,
    modules::{
        conversation::repository_pg::{ConversationRepositoryPg, ParticipantRepositoryPg},
        message::{
            model::{GetMessageResponse, MessageQueryRequest, SendMessage},
            repository_pg::MessageRepositoryPg,
            schema::MessageEntity,
            service::MessageService,
        },
    },
    utils::{ValidatedJson, ValidatedQuery},
};

pub type MessageSvc =
    MessageService<MessageRepositoryPg, ConversationRepositoryPg, ParticipantRepositoryPg>;

#[get("")]
pub async fn get_messages(
    message_service: web::Data<MessageSvc>,
    conversation_id: web::Path<Uuid>,
    query: ValidatedQuery<MessageQueryRequest>,
    req: HttpRequest,
) -> Result<success::Success<GetMessageResponse>, error::Error> {
    let user_id = get_claims(&req)?.sub;
    let query = query.0;
    let page = message_service
        .get_messages(user_id, conversation_id.into_inner(), query.limit, query.cursor)
        .await?;

    Ok(success::Success::ok(Some(page)).message("Successfully retrieved messages"))
}

#[post("")]
pub async fn send_message(
    message_service: web::Data<MessageSvc>,
    conversation_id: web::Path<Uuid>,
    body: ValidatedJson<SendMessage>,
    req: HttpRequest,
) -> Result<success::Success<MessageEntity>, error::Error> {
    let user_id = get_claims(&req)?.sub;
    let message =
        message_service.send(user_id, conversation_id.into_inner(), body.0.content).await?;

    Ok(success::Success::created(Some(message)).message("Message sent"))
}

#[delete("/{message_id}")]
pub async fn delete_message(
    message_service: web::Data<MessageSvc>,
    message_id: web::Path<Uuid>,
    req: HttpRequest,
) -> Result<success::Success<()>, error::Error> {
    let user_id = get_claims(&req)?.sub;
    message_service.delete(user_id, message_id.into_inner()).await?;
    Ok(success::Success::no_content())
}
