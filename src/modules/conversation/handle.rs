use actix_web::{HttpRequest, get, post, web};
use uuid::Uuid;

use crate::{
    api::{error, success},
    middlewares::get_claims,
    modules::{
        connection::repository_pg::ConnectionRepositoryPg,
        conversation::{
            model::{ConversationDetail, NewConversation},
            repository_pg::{ConversationRepositoryPg, ParticipantRepositoryPg},
            service::ConversationService,
        },
    },
    utils::ValidatedJson,
};

pub type ConversationSvc =
    ConversationService<ConversationRepositoryPg, ParticipantRepositoryPg, ConnectionRepositoryPg>;

#[get("")]
pub async fn get_conversations(
    conversation_service: web::Data<ConversationSvc>,
    req: HttpRequest,
) -> Result<success::Success<Vec<ConversationDetail>>, error::Error> {
    let user_id = get_claims(&req)?.sub;
    let conversations = conversation_service.list(user_id).await?;
    Ok(success::Success::ok(Some(conversations)).message("Successfully retrieved conversations"))
}

#[post("")]
pub async fn create_conversation(
    conversation_service: web::Data<ConversationSvc>,
    body: ValidatedJson<NewConversation>,
    req: HttpRequest,
) -> Result<success::Success<ConversationDetail>, error::Error> {
    let user_id = get_claims(&req)?.sub;
    let (conversation, created) = conversation_service.create(user_id, body.0).await?;

    if created {
        Ok(success::Success::created(Some(conversation))
            .message("Successfully created conversation"))
    } else {
        Ok(success::Success::ok(Some(conversation)).message("Conversation already exists"))
    }
}

#[post("/{conversation_id}/read")]
pub async fn mark_as_read(
    conversation_service: web::Data<ConversationSvc>,
    conversation_id: web::Path<Uuid>,
    req: HttpRequest,
) -> Result<success::Success<()>, error::Error> {
    let user_id = get_claims(&req)?.sub;
    conversation_service.mark_read(user_id, conversation_id.into_inner()).await?;
    Ok(success::Success::no_content())
}

#[post("/{conversation_id}/leave")]
pub async fn leave_conversation(
    conversation_service: web::Data<ConversationSvc>,
    conversation_id: web::Path<Uuid>,
    req: HttpRequest,
) -> Result<success::Success<()>, error::Error> {
    let user_id = get_claims(&req)?.sub;
    conversation_service.leave(user_id, conversation_id.into_inner()).await?;
    Ok(success::Success::no_content())
}
