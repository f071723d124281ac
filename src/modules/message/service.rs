use std::sync::Arc;

use uuid::Uuid;

use crate::{
    api::error,
    modules::{
        conversation::repository::{ConversationRepository, ParticipantRepository},
        message::{
            model::{
                DEFAULT_MESSAGE_LIMIT, GetMessageResponse, InsertMessage, NewMessageEvent,
            },
            repository::MessageRepo,
            schema::MessageEntity,
        },
        websocket::{message::ServerMessage, notifier::Notifier},
    },
};

#[derive(Clone)]
pub struct MessageService<M, C, P>
where
    M: MessageRepo + Send + Sync,
    C: ConversationRepository + Send + Sync,
    P: ParticipantRepository + Send + Sync,
{
    message_repo: Arc<M>,
    conversation_repo: Arc<C>,
    participant_repo: Arc<P>,
    notifier: Notifier,
}

impl<M, C, P> MessageService<M, C, P>
where
    M: MessageRepo + Send + Sync,
    C: ConversationRepository + Send + Sync,
    P: ParticipantRepository + Send + Sync,
{
    pub fn with_dependencies(
        message_repo: Arc<M>,
        conversation_repo: Arc<C>,
        participant_repo: Arc<P>,
        notifier: Notifier,
    ) -> Self {
        MessageService { message_repo, conversation_repo, participant_repo, notifier }
    }

    async fn ensure_member(&self, conversation_id: &Uuid, user_id: &Uuid) -> Result<(), error::SystemError> {
        let (conversation, is_member) = tokio::try_join!(
            self.conversation_repo.find_by_id(conversation_id),
            self.participant_repo.is_member(conversation_id, user_id),
        )?;

        if conversation.is_none() {
            return Err(error::SystemError::not_found("Conversation not found"));
        }
        if !is_member {
            return Err(error::SystemError::forbidden("You are not a member of this conversation"));
        }
        Ok(())
    }

    /// Oldest first within the page; `cursor` points at the oldest returned message
    /// and is `None` on the last page.
    pub async fn get_messages(
        &self,
        user_id: Uuid,
        conversation_id: Uuid,
        limit: Option<i64>,
        cursor: Option<String>,
    ) -> Result<GetMessageResponse, error::SystemError> {
        self.ensure_member(&conversation_id, &user_id).await?;

        let before = match cursor {
            Some(c) => Some(
                chrono::DateTime::parse_from_rfc3339(&c)
                    .map_err(|_| error::SystemError::bad_request("Invalid cursor format"))?
                    .with_timezone(&chrono::Utc),
            ),
            None => None,
        };

        let limit = limit.unwrap_or(DEFAULT_MESSAGE_LIMIT).clamp(1, 100);
        let mut messages =
            self.message_repo.find_page(&conversation_id, before, limit + 1).await?;

        let has_more = messages.len() > limit as usize;
        messages.truncate(limit as usize);
        let cursor = if has_more { messages.last().map(|m| m.created_at.to_rfc3339()) } else { None };

        messages.reverse();
        Ok(GetMessageResponse { messages, cursor })
    }

    pub async fn send(
        &self,
        sender_id: Uuid,
        conversation_id: Uuid,
        content: String,
    ) -> Result<MessageEntity, error::SystemError> {
        let content = content.trim().to_string();
        if content.is_empty() {
            return Err(error::SystemError::bad_request("Message content is required"));
        }

        self.ensure_member(&conversation_id, &sender_id).await?;

        let message = self
            .message_repo
            .create_atomic(&InsertMessage { conversation_id, sender_id, content })
            .await?;

        let payload = serde_json::to_value(&message)?;
        self.notifier.emit_to_group(
            conversation_id,
            ServerMessage::NewMessage { conversation_id, message: payload },
            Some(sender_id),
        );

        // members outside the room still get a push
        let others: Vec<Uuid> = self
            .participant_repo
            .member_ids(&conversation_id)
            .await?
            .into_iter()
            .filter(|id| *id != sender_id)
            .collect();
        self.notifier.emit_to_users(
            others,
            "newMessage",
            &NewMessageEvent { conversation_id, message: &message },
        );

        Ok(message)
    }

    pub async fn delete(&self, user_id: Uuid, message_id: Uuid) -> Result<(), error::SystemError> {
        let message = self
            .message_repo
            .find_by_id(&message_id)
            .await?
            .ok_or_else(|| error::SystemError::not_found("Message not found"))?;

        if message.sender_id != user_id {
            return Err(error::SystemError::forbidden("You can only delete your own messages"));
        }

        if !self.message_repo.soft_delete(&message_id, &user_id).await? {
            return Err(error::SystemError::not_found("Message not found or already deleted"));
        }

        self.notifier.emit_to_group(
            message.conversation_id,
            ServerMessage::MessageDeleted { conversation_id: message.conversation_id, message_id },
            None,
        );

        Ok(())
    }
}
