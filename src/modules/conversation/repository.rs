use uuid::Uuid;

use crate::{
    api::error,
    modules::conversation::{
        model::{ConversationRaw, ParticipantRow},
        schema::ConversationEntity,
    },
};

#[async_trait::async_trait]
pub trait ConversationRepository {
    async fn find_by_id(
        &self,
        conversation_id: &Uuid,
    ) -> Result<Option<ConversationEntity>, error::SystemError>;

    /// Conversations the user is an active member of, most recently updated first.
    /// `only` narrows the result to one conversation.
    async fn find_for_user(
        &self,
        user_id: &Uuid,
        only: Option<&Uuid>,
    ) -> Result<Vec<ConversationRaw>, error::SystemError>;
}

#[async_trait::async_trait]
pub trait ConversationRepo: ConversationRepository + Send + Sync {
    /// Returns the existing direct conversation of the pair when there is one;
    /// the flag is `true` only when a new one was created.
    async fn create_direct_atomic(
        &self,
        user_a: &Uuid,
        user_b: &Uuid,
    ) -> Result<(ConversationEntity, bool), error::SystemError>;

    /// `member_ids` must already contain the creator.
    async fn create_group_atomic(
        &self,
        name: &str,
        created_by: &Uuid,
        member_ids: &[Uuid],
    ) -> Result<ConversationEntity, error::SystemError>;
}

#[async_trait::async_trait]
pub trait ParticipantRepository {
    async fn is_member(&self, conversation_id: &Uuid, user_id: &Uuid)
    -> Result<bool, error::SystemError>;

    async fn find_by_conversations(
        &self,
        conversation_ids: &[Uuid],
    ) -> Result<Vec<ParticipantRow>, error::SystemError>;

    async fn member_ids(&self, conversation_id: &Uuid) -> Result<Vec<Uuid>, error::SystemError>;

    async fn reset_unread(&self, conversation_id: &Uuid, user_id: &Uuid)
    -> Result<bool, error::SystemError>;

    async fn leave(&self, conversation_id: &Uuid, user_id: &Uuid) -> Result<bool, error::SystemError>;
}
