use uuid::Uuid;

use crate::{
    api::error,
    modules::matching::{
        model::{ConnectOutcome, SelectionOutcome},
        schema::{AdjectiveSelectionEntity, MatchEntity},
    },
};

#[async_trait::async_trait]
pub trait MatchingRepository {
    async fn find_selection(
        &self,
        user_id: &Uuid,
        target_user_id: &Uuid,
    ) -> Result<Option<AdjectiveSelectionEntity>, error::SystemError>;

    /// Newest first.
    async fn find_matches(&self, user_id: &Uuid) -> Result<Vec<MatchEntity>, error::SystemError>;
}

#[async_trait::async_trait]
pub trait MatchingRepo: MatchingRepository + Send + Sync {
    /// Upserts the caller's selection and, when the reverse selection carries the same word,
    /// upserts the pair's match and flags both selections. A match already on that word is
    /// left unchanged. Serialized per pair.
    async fn select_adjective_atomic(
        &self,
        user_id: &Uuid,
        target_user_id: &Uuid,
        adjective: &str,
        ice_breaking_prompt: &str,
    ) -> Result<SelectionOutcome, error::SystemError>;

    async fn connect_after_match_atomic(
        &self,
        user_id: &Uuid,
        other_id: &Uuid,
    ) -> Result<ConnectOutcome, error::SystemError>;
}
