use std::{collections::HashMap, sync::Arc};

use uuid::Uuid;

use crate::{
    api::error,
    modules::{
        connection::{repository::ConnectionRepository, schema::ConnectionStatus},
        conversation::{
            model::{ConversationDetail, NewConversation, ParticipantRow},
            repository::{ConversationRepo, ParticipantRepository},
            schema::{ConversationEntity, ConversationType},
        },
        websocket::notifier::Notifier,
    },
};

#[derive(Clone)]
pub struct ConversationService<R, P, C>
where
    R: ConversationRepo + Send + Sync,
    P: ParticipantRepository + Send + Sync,
    C: ConnectionRepository + Send + Sync,
{
    conversation_repo: Arc<R>,
    participant_repo: Arc<P>,
    connection_repo: Arc<C>,
    notifier: Notifier,
}

impl<R, P, C> ConversationService<R, P, C>
where
    R: ConversationRepo + Send + Sync,
    P: ParticipantRepository + Send + Sync,
    C: ConnectionRepository + Send + Sync,
{
    pub fn with_dependencies(
        conversation_repo: Arc<R>,
        participant_repo: Arc<P>,
        connection_repo: Arc<C>,
        notifier: Notifier,
    ) -> Self {
        ConversationService { conversation_repo, participant_repo, connection_repo, notifier }
    }

    async fn is_connected(&self, user_id: &Uuid, other_id: &Uuid) -> Result<bool, error::SystemError> {
        let connection = self.connection_repo.find_connection(user_id, other_id).await?;
        Ok(connection.is_some_and(|c| c.status == ConnectionStatus::Connected))
    }

    /// 404 for an unknown conversation, 403 when the user is not an active member.
    pub async fn ensure_member(
        &self,
        conversation_id: Uuid,
        user_id: Uuid,
    ) -> Result<ConversationEntity, error::SystemError> {
        let (conversation, is_member) = tokio::try_join!(
            self.conversation_repo.find_by_id(&conversation_id),
            self.participant_repo.is_member(&conversation_id, &user_id),
        )?;

        let conversation =
            conversation.ok_or_else(|| error::SystemError::not_found("Conversation not found"))?;
        if !is_member {
            return Err(error::SystemError::forbidden("You are not a member of this conversation"));
        }
        Ok(conversation)
    }

    async fn details(
        &self,
        user_id: Uuid,
        only: Option<&Uuid>,
    ) -> Result<Vec<ConversationDetail>, error::SystemError> {
        let rows = self.conversation_repo.find_for_user(&user_id, only).await?;
        let ids: Vec<Uuid> = rows.iter().map(|r| r.id).collect();

        let participants = self.participant_repo.find_by_conversations(&ids).await?;
        let mut by_conversation: HashMap<Uuid, Vec<ParticipantRow>> = HashMap::new();
        for p in participants {
            by_conversation.entry(p.conversation_id).or_default().push(p);
        }

        Ok(rows
            .into_iter()
            .map(|raw| {
                let members = by_conversation.remove(&raw.id).unwrap_or_default();
                ConversationDetail::new(raw, members)
            })
            .collect())
    }

    pub async fn list(&self, user_id: Uuid) -> Result<Vec<ConversationDetail>, error::SystemError> {
        self.details(user_id, None).await
    }

    async fn detail(
        &self,
        user_id: Uuid,
        conversation_id: Uuid,
    ) -> Result<ConversationDetail, error::SystemError> {
        self.details(user_id, Some(&conversation_id))
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| error::SystemError::not_found("Conversation not found"))
    }

    /// Returns the conversation and whether it was newly created.
    pub async fn create(
        &self,
        user_id: Uuid,
        body: NewConversation,
    ) -> Result<(ConversationDetail, bool), error::SystemError> {
        let mut members: Vec<Uuid> = Vec::with_capacity(body.member_ids.len());
        for id in body.member_ids {
            if id != user_id && !members.contains(&id) {
                members.push(id);
            }
        }

        if members.is_empty() {
            return Err(error::SystemError::bad_request(
                "At least one member other than yourself is required",
            ));
        }

        match body._type {
            ConversationType::Direct => self.create_direct(user_id, &members).await,
            ConversationType::Group => {
                let name = body
                    .name
                    .map(|n| n.trim().to_string())
                    .filter(|n| !n.is_empty())
                    .ok_or_else(|| error::SystemError::bad_request("Group name is required"))?;
                let detail = self.create_group(user_id, &name, members).await?;
                Ok((detail, true))
            }
        }
    }

    async fn create_direct(
        &self,
        user_id: Uuid,
        members: &[Uuid],
    ) -> Result<(ConversationDetail, bool), error::SystemError> {
        let [other_id] = members else {
            return Err(error::SystemError::bad_request(
                "A direct conversation has exactly one other member",
            ));
        };

        if !self.is_connected(&user_id, other_id).await? {
            return Err(error::SystemError::forbidden("You can only message your connections"));
        }

        let (conversation, created) =
            self.conversation_repo.create_direct_atomic(&user_id, other_id).await?;
        let detail = self.detail(user_id, conversation.id).await?;

        if created {
            log::info!("Direct conversation {} created by {user_id}", conversation.id);
            self.notifier.emit_to_user(*other_id, "newConversation", &detail);
        }
        Ok((detail, created))
    }

    async fn create_group(
        &self,
        user_id: Uuid,
        name: &str,
        members: Vec<Uuid>,
    ) -> Result<ConversationDetail, error::SystemError> {
        for member in &members {
            if !self.is_connected(&user_id, member).await? {
                return Err(error::SystemError::forbidden(
                    "Group members must be your connections",
                ));
            }
        }

        let mut all = Vec::with_capacity(members.len() + 1);
        all.push(user_id);
        all.extend_from_slice(&members);

        let conversation = self.conversation_repo.create_group_atomic(name, &user_id, &all).await?;
        let detail = self.detail(user_id, conversation.id).await?;

        log::info!("Group conversation {} created by {user_id}", conversation.id);
        self.notifier.emit_to_users(members, "newConversation", &detail);
        Ok(detail)
    }

    pub async fn mark_read(&self, user_id: Uuid, conversation_id: Uuid) -> Result<(), error::SystemError> {
        self.ensure_member(conversation_id, user_id).await?;
        self.participant_repo.reset_unread(&conversation_id, &user_id).await?;
        Ok(())
    }

    pub async fn leave(&self, user_id: Uuid, conversation_id: Uuid) -> Result<(), error::SystemError> {
        let conversation = self.ensure_member(conversation_id, user_id).await?;
        if conversation._type != ConversationType::Group {
            return Err(error::SystemError::bad_request("Only group conversations can be left"));
        }

        if !self.participant_repo.leave(&conversation_id, &user_id).await? {
            return Err(error::SystemError::not_found("Conversation not found"));
        }

        log::info!("User {user_id} left conversation {conversation_id}");
        Ok(())
    }
}
