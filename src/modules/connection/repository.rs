use uuid::Uuid;

use crate::api::error;
use crate::modules::connection::schema::{ConnectionEntity, ConnectionRequestEntity};

#[async_trait::async_trait]
pub trait ConnectionRepository {
    async fn find_connection(
        &self,
        user_a: &Uuid,
        user_b: &Uuid,
    ) -> Result<Option<ConnectionEntity>, error::SystemError>;

    /// Every row the user takes part in, whatever its status.
    async fn find_relations(&self, user_id: &Uuid)
    -> Result<Vec<ConnectionEntity>, error::SystemError>;

    async fn find_connected(&self, user_id: &Uuid)
    -> Result<Vec<ConnectionEntity>, error::SystemError>;

    async fn find_pending_request(
        &self,
        requester_id: &Uuid,
        target_id: &Uuid,
    ) -> Result<Option<ConnectionRequestEntity>, error::SystemError>;

    async fn find_incoming_requests(
        &self,
        user_id: &Uuid,
    ) -> Result<Vec<ConnectionRequestEntity>, error::SystemError>;

    async fn find_outgoing_requests(
        &self,
        user_id: &Uuid,
    ) -> Result<Vec<ConnectionRequestEntity>, error::SystemError>;
}

/// State transitions; each runs in one transaction.
#[async_trait::async_trait]
pub trait ConnectionRepo: ConnectionRepository + Send + Sync {
    /// Fails with a unique violation when a row already exists for the pair.
    async fn create_request_atomic(
        &self,
        requester_id: &Uuid,
        target_id: &Uuid,
    ) -> Result<ConnectionRequestEntity, error::SystemError>;

    /// `None` when no pending request from `requester_id` exists.
    async fn accept_request_atomic(
        &self,
        accepter_id: &Uuid,
        requester_id: &Uuid,
    ) -> Result<Option<ConnectionEntity>, error::SystemError>;

    async fn reject_request_atomic(
        &self,
        rejecter_id: &Uuid,
        requester_id: &Uuid,
    ) -> Result<bool, error::SystemError>;

    async fn remove_connection_atomic(
        &self,
        user_id: &Uuid,
        other_id: &Uuid,
    ) -> Result<bool, error::SystemError>;

    async fn block_atomic(
        &self,
        blocker_id: &Uuid,
        target_id: &Uuid,
    ) -> Result<ConnectionEntity, error::SystemError>;

    /// Only removes a block placed by `blocker_id`.
    async fn unblock(&self, blocker_id: &Uuid, target_id: &Uuid)
    -> Result<bool, error::SystemError>;
}
