use uuid::Uuid;

use crate::{
    api::error,
    modules::{
        connection::{repository::ConnectionRepo, service::ConnectionService},
        matching::{repository::MatchingRepo, service::MatchingService},
        notification::model::{NotificationsResponse, group_matches},
        user::repository::UserRepository,
    },
};

#[derive(Clone)]
pub struct NotificationService<C, M, U>
where
    C: ConnectionRepo + Send + Sync,
    M: MatchingRepo + Send + Sync,
    U: UserRepository + Send + Sync,
{
    connections: ConnectionService<C, U>,
    matching: MatchingService<M, U>,
}

impl<C, M, U> NotificationService<C, M, U>
where
    C: ConnectionRepo + Send + Sync,
    M: MatchingRepo + Send + Sync,
    U: UserRepository + Send + Sync,
{
    pub fn with_dependencies(
        connections: ConnectionService<C, U>,
        matching: MatchingService<M, U>,
    ) -> Self {
        NotificationService { connections, matching }
    }

    pub async fn get_notifications(
        &self,
        user_id: Uuid,
    ) -> Result<NotificationsResponse, error::SystemError> {
        let (connection_requests, matches) = tokio::try_join!(
            self.connections.get_incoming_requests(user_id),
            self.matching.get_matches(user_id),
        )?;

        let total = connection_requests.len() + matches.len();
        Ok(NotificationsResponse { connection_requests, matches: group_matches(matches), total })
    }
}
