use std::{collections::HashMap, sync::Arc};

use futures_util::future::join_all;
use uuid::Uuid;

use crate::{
    api::error,
    modules::{
        connection::{
            model::{
                ConnectionAction, ConnectionEvent, ConnectionRequestResponse,
                ConnectionRequestsResponse, ConnectionResponse, ConnectionState,
            },
            repository::ConnectionRepo,
            schema::{ConnectionRequestEntity, ConnectionStatus},
        },
        user::{model::UserSummary, repository::UserRepository},
        websocket::notifier::Notifier,
    },
};

#[derive(Clone)]
pub struct ConnectionService<R, U>
where
    R: ConnectionRepo + Send + Sync,
    U: UserRepository + Send + Sync,
{
    connection_repo: Arc<R>,
    user_repo: Arc<U>,
    notifier: Notifier,
}

impl<R, U> ConnectionService<R, U>
where
    R: ConnectionRepo + Send + Sync,
    U: UserRepository + Send + Sync,
{
    pub fn with_dependencies(connection_repo: Arc<R>, user_repo: Arc<U>, notifier: Notifier) -> Self {
        ConnectionService { connection_repo, user_repo, notifier }
    }

    pub async fn get_state(
        &self,
        viewer_id: Uuid,
        other_id: Uuid,
    ) -> Result<ConnectionState, error::SystemError> {
        if viewer_id == other_id {
            return Ok(ConnectionState::None);
        }

        let (connection, sent, received) = tokio::try_join!(
            self.connection_repo.find_connection(&viewer_id, &other_id),
            self.connection_repo.find_pending_request(&viewer_id, &other_id),
            self.connection_repo.find_pending_request(&other_id, &viewer_id),
        )?;

        Ok(ConnectionState::derive(&viewer_id, connection.as_ref(), sent.as_ref().or(received.as_ref())))
    }

    pub async fn apply(
        &self,
        user_id: Uuid,
        target_id: Uuid,
        action: ConnectionAction,
    ) -> Result<ConnectionState, error::SystemError> {
        if user_id == target_id {
            return Err(error::SystemError::bad_request("Cannot perform this action on yourself"));
        }

        match action {
            ConnectionAction::Connect => self.connect(user_id, target_id).await,
            ConnectionAction::Accept => self.accept(user_id, target_id).await,
            ConnectionAction::Reject => self.reject(user_id, target_id).await,
            ConnectionAction::Remove => self.remove(user_id, target_id).await,
            ConnectionAction::Block => self.block(user_id, target_id).await,
            ConnectionAction::Unblock => self.unblock(user_id, target_id).await,
        }
    }

    async fn connect(
        &self,
        user_id: Uuid,
        target_id: Uuid,
    ) -> Result<ConnectionState, error::SystemError> {
        if self.user_repo.find_by_id(&target_id).await?.is_none() {
            return Err(error::SystemError::not_found("User not found"));
        }

        match self.get_state(user_id, target_id).await? {
            ConnectionState::Connected => {
                return Err(error::SystemError::conflict("Already connected"));
            }
            ConnectionState::PendingSent => {
                return Err(error::SystemError::conflict("Connection request already sent"));
            }
            ConnectionState::BlockedByMe | ConnectionState::BlockedByThem => {
                return Err(error::SystemError::conflict("Connection is blocked"));
            }
            // they asked first: connecting back accepts
            ConnectionState::PendingReceived => return self.accept(user_id, target_id).await,
            ConnectionState::None => {}
        }

        self.connection_repo.create_request_atomic(&user_id, &target_id).await.map_err(|e| {
            match e {
                error::SystemError::UniqueViolation(_) => {
                    error::SystemError::conflict("Connection request already exists")
                }
                other => other,
            }
        })?;

        log::info!("User {user_id} sent a connection request to {target_id}");
        self.notifier.emit_to_user(
            target_id,
            "connectionRequest",
            &ConnectionEvent { user_id, state: ConnectionState::PendingReceived },
        );

        Ok(ConnectionState::PendingSent)
    }

    async fn accept(
        &self,
        user_id: Uuid,
        requester_id: Uuid,
    ) -> Result<ConnectionState, error::SystemError> {
        self.connection_repo
            .accept_request_atomic(&user_id, &requester_id)
            .await?
            .ok_or_else(|| error::SystemError::not_found("Connection request not found"))?;

        log::info!("User {user_id} accepted connection request from {requester_id}");
        self.notifier.emit_to_user(
            requester_id,
            "connectionAccepted",
            &ConnectionEvent { user_id, state: ConnectionState::Connected },
        );

        Ok(ConnectionState::Connected)
    }

    async fn reject(
        &self,
        user_id: Uuid,
        requester_id: Uuid,
    ) -> Result<ConnectionState, error::SystemError> {
        if !self.connection_repo.reject_request_atomic(&user_id, &requester_id).await? {
            return Err(error::SystemError::not_found("Connection request not found"));
        }
        Ok(ConnectionState::None)
    }

    async fn remove(
        &self,
        user_id: Uuid,
        other_id: Uuid,
    ) -> Result<ConnectionState, error::SystemError> {
        if !self.connection_repo.remove_connection_atomic(&user_id, &other_id).await? {
            return Err(error::SystemError::not_found("Connection not found"));
        }
        Ok(ConnectionState::None)
    }

    async fn block(
        &self,
        user_id: Uuid,
        target_id: Uuid,
    ) -> Result<ConnectionState, error::SystemError> {
        if self.user_repo.find_by_id(&target_id).await?.is_none() {
            return Err(error::SystemError::not_found("User not found"));
        }

        if let Some(existing) = self.connection_repo.find_connection(&user_id, &target_id).await? {
            if existing.status == ConnectionStatus::Blocked {
                return if existing.action_user_id == user_id {
                    Ok(ConnectionState::BlockedByMe)
                } else {
                    Err(error::SystemError::conflict("Connection is blocked"))
                };
            }
        }

        self.connection_repo.block_atomic(&user_id, &target_id).await?;
        log::info!("User {user_id} blocked {target_id}");
        Ok(ConnectionState::BlockedByMe)
    }

    async fn unblock(
        &self,
        user_id: Uuid,
        target_id: Uuid,
    ) -> Result<ConnectionState, error::SystemError> {
        if self.connection_repo.unblock(&user_id, &target_id).await? {
            return Ok(ConnectionState::None);
        }

        match self.connection_repo.find_connection(&user_id, &target_id).await? {
            Some(c) if c.status == ConnectionStatus::Blocked => {
                Err(error::SystemError::forbidden("Only the user who blocked can unblock"))
            }
            _ => Err(error::SystemError::not_found("Block not found")),
        }
    }

    async fn summaries(&self, ids: &[Uuid]) -> Result<HashMap<Uuid, UserSummary>, error::SystemError> {
        let users = self.user_repo.find_summaries(ids).await?;
        Ok(users.into_iter().map(|u| (u.id, u)).collect())
    }

    /// Connected users with their live presence.
    pub async fn get_connections(
        &self,
        user_id: Uuid,
    ) -> Result<Vec<ConnectionResponse>, error::SystemError> {
        let rows = self.connection_repo.find_connected(&user_id).await?;
        let ids: Vec<Uuid> = rows.iter().map(|c| c.other(&user_id)).collect();
        let mut users = self.summaries(&ids).await?;
        let online = join_all(ids.iter().map(|id| self.notifier.is_user_online(*id))).await;

        Ok(rows
            .into_iter()
            .zip(online)
            .filter_map(|(c, is_online)| {
                users.remove(&c.other(&user_id)).map(|user| ConnectionResponse {
                    user,
                    is_online,
                    connected_at: c.updated_at,
                })
            })
            .collect())
    }

    fn request_cards(
        requests: Vec<ConnectionRequestEntity>,
        users: &HashMap<Uuid, UserSummary>,
        other: impl Fn(&ConnectionRequestEntity) -> Uuid,
    ) -> Vec<ConnectionRequestResponse> {
        requests
            .into_iter()
            .filter_map(|r| {
                users.get(&other(&r)).cloned().map(|user| ConnectionRequestResponse {
                    id: r.id,
                    user,
                    created_at: r.created_at,
                })
            })
            .collect()
    }

    pub async fn get_incoming_requests(
        &self,
        user_id: Uuid,
    ) -> Result<Vec<ConnectionRequestResponse>, error::SystemError> {
        let requests = self.connection_repo.find_incoming_requests(&user_id).await?;
        let ids: Vec<Uuid> = requests.iter().map(|r| r.requester_id).collect();
        let users = self.summaries(&ids).await?;
        Ok(Self::request_cards(requests, &users, |r| r.requester_id))
    }

    pub async fn get_requests(
        &self,
        user_id: Uuid,
    ) -> Result<ConnectionRequestsResponse, error::SystemError> {
        let (received, sent) = tokio::try_join!(
            self.connection_repo.find_incoming_requests(&user_id),
            self.connection_repo.find_outgoing_requests(&user_id),
        )?;

        let ids: Vec<Uuid> = received
            .iter()
            .map(|r| r.requester_id)
            .chain(sent.iter().map(|r| r.target_id))
            .collect();
        let users = self.summaries(&ids).await?;

        Ok(ConnectionRequestsResponse {
            received: Self::request_cards(received, &users, |r| r.requester_id),
            sent: Self::request_cards(sent, &users, |r| r.target_id),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        modules::user::schema::Gender,
        test::{InMemoryConnectionRepository, InMemoryUserRepository, test_notifier},
    };

    struct Fixture {
        service: ConnectionService<InMemoryConnectionRepository, InMemoryUserRepository>,
        repo: Arc<InMemoryConnectionRepository>,
        alice: Uuid,
        bob: Uuid,
    }

    fn fixture() -> Fixture {
        let users = Arc::new(InMemoryUserRepository::default());
        let alice = users.insert("alice@uni.edu", "Alice", Gender::Female);
        let bob = users.insert("bob@uni.edu", "Bob", Gender::Male);
        let repo = Arc::new(InMemoryConnectionRepository::default());
        let service = ConnectionService::with_dependencies(repo.clone(), users, test_notifier());
        Fixture { service, repo, alice, bob }
    }

    #[actix_web::test]
    async fn test_request_then_accept() {
        let f = fixture();

        let state = f.service.apply(f.alice, f.bob, ConnectionAction::Connect).await.unwrap();
        assert_eq!(state, ConnectionState::PendingSent);
        assert_eq!(f.service.get_state(f.bob, f.alice).await.unwrap(), ConnectionState::PendingReceived);

        let requests = f.service.get_requests(f.bob).await.unwrap();
        assert_eq!(requests.received.len(), 1);
        assert_eq!(requests.received[0].user.id, f.alice);
        assert!(requests.sent.is_empty());

        let twice = f.service.apply(f.alice, f.bob, ConnectionAction::Connect).await;
        assert!(matches!(twice, Err(error::SystemError::Conflict(_))));

        let state = f.service.apply(f.bob, f.alice, ConnectionAction::Accept).await.unwrap();
        assert_eq!(state, ConnectionState::Connected);

        let connections = f.service.get_connections(f.alice).await.unwrap();
        assert_eq!(connections.len(), 1);
        assert_eq!(connections[0].user.id, f.bob);
        assert!(f.service.get_incoming_requests(f.bob).await.unwrap().is_empty());
    }

    #[actix_web::test]
    async fn test_connecting_back_accepts_pending_request() {
        let f = fixture();

        f.service.apply(f.alice, f.bob, ConnectionAction::Connect).await.unwrap();
        let state = f.service.apply(f.bob, f.alice, ConnectionAction::Connect).await.unwrap();
        assert_eq!(state, ConnectionState::Connected);
        let connections = f.service.get_connections(f.bob).await.unwrap();
        assert_eq!(connections.len(), 1);
        assert_eq!(connections[0].user.id, f.alice);
        assert!(!connections[0].is_online);
    }

    #[actix_web::test]
    async fn test_reject_and_remove() {
        let f = fixture();

        f.service.apply(f.alice, f.bob, ConnectionAction::Connect).await.unwrap();
        let state = f.service.apply(f.bob, f.alice, ConnectionAction::Reject).await.unwrap();
        assert_eq!(state, ConnectionState::None);
        assert!(!f.repo.has_row(f.alice, f.bob));

        let missing = f.service.apply(f.bob, f.alice, ConnectionAction::Accept).await;
        assert!(matches!(missing, Err(error::SystemError::NotFound(_))));

        f.repo.set(f.alice, f.bob, ConnectionStatus::Connected);
        f.service.apply(f.bob, f.alice, ConnectionAction::Remove).await.unwrap();
        assert_eq!(f.service.get_state(f.alice, f.bob).await.unwrap(), ConnectionState::None);
    }

    #[actix_web::test]
    async fn test_block_then_unblock_removes_row() {
        let f = fixture();

        f.service.apply(f.alice, f.bob, ConnectionAction::Connect).await.unwrap();
        let state = f.service.apply(f.bob, f.alice, ConnectionAction::Block).await.unwrap();
        assert_eq!(state, ConnectionState::BlockedByMe);
        assert_eq!(f.service.get_state(f.alice, f.bob).await.unwrap(), ConnectionState::BlockedByThem);
        assert!(f.service.get_incoming_requests(f.bob).await.unwrap().is_empty());

        // blocking again is a no-op for the blocker, a conflict for the other side
        let again = f.service.apply(f.bob, f.alice, ConnectionAction::Block).await.unwrap();
        assert_eq!(again, ConnectionState::BlockedByMe);
        let reverse = f.service.apply(f.alice, f.bob, ConnectionAction::Block).await;
        assert!(matches!(reverse, Err(error::SystemError::Conflict(_))));

        let connect = f.service.apply(f.alice, f.bob, ConnectionAction::Connect).await;
        assert!(matches!(connect, Err(error::SystemError::Conflict(_))));

        let not_mine = f.service.apply(f.alice, f.bob, ConnectionAction::Unblock).await;
        assert!(matches!(not_mine, Err(error::SystemError::Forbidden(_))));

        let state = f.service.apply(f.bob, f.alice, ConnectionAction::Unblock).await.unwrap();
        assert_eq!(state, ConnectionState::None);
        assert!(!f.repo.has_row(f.alice, f.bob));

        let nothing = f.service.apply(f.bob, f.alice, ConnectionAction::Unblock).await;
        assert!(matches!(nothing, Err(error::SystemError::NotFound(_))));
    }

    #[actix_web::test]
    async fn test_rejects_self_and_unknown_users() {
        let f = fixture();

        let own = f.service.apply(f.alice, f.alice, ConnectionAction::Connect).await;
        assert!(matches!(own, Err(error::SystemError::BadRequest(_))));

        let ghost = f.service.apply(f.alice, Uuid::now_v7(), ConnectionAction::Connect).await;
        assert!(matches!(ghost, Err(error::SystemError::NotFound(_))));
    }
}
