use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::modules::{
    connection::schema::{ConnectionEntity, ConnectionRequestEntity, ConnectionStatus},
    user::model::UserSummary,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionAction {
    Connect,
    Accept,
    Reject,
    Remove,
    Block,
    Unblock,
}

/// Relationship between two users, always seen from the viewer's side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionState {
    None,
    PendingSent,
    PendingReceived,
    Connected,
    BlockedByMe,
    BlockedByThem,
}

impl ConnectionState {
    /// The pair row decides; a pending request without a row still counts as pending.
    pub fn derive(
        viewer: &Uuid,
        connection: Option<&ConnectionEntity>,
        pending: Option<&ConnectionRequestEntity>,
    ) -> Self {
        if let Some(c) = connection {
            let mine = c.action_user_id == *viewer;
            return match (c.status, mine) {
                (ConnectionStatus::Connected, _) => ConnectionState::Connected,
                (ConnectionStatus::Blocked, true) => ConnectionState::BlockedByMe,
                (ConnectionStatus::Blocked, false) => ConnectionState::BlockedByThem,
                (ConnectionStatus::Requested, true) => ConnectionState::PendingSent,
                (ConnectionStatus::Requested, false) => ConnectionState::PendingReceived,
            };
        }

        match pending {
            Some(r) if r.requester_id == *viewer => ConnectionState::PendingSent,
            Some(_) => ConnectionState::PendingReceived,
            None => ConnectionState::None,
        }
    }

    pub fn is_blocked(&self) -> bool {
        matches!(self, ConnectionState::BlockedByMe | ConnectionState::BlockedByThem)
    }
}

#[derive(Debug, Serialize)]
pub struct ConnectionActionResponse {
    pub action: ConnectionAction,
    pub state: ConnectionState,
}

#[derive(Debug, Serialize)]
pub struct ConnectionStateResponse {
    pub user_id: Uuid,
    pub state: ConnectionState,
}

#[derive(Debug, Clone, Serialize)]
pub struct ConnectionResponse {
    pub user: UserSummary,
    pub is_online: bool,
    pub connected_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ConnectionRequestResponse {
    pub id: Uuid,
    /// Requester for received requests, target for sent ones.
    pub user: UserSummary,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Serialize)]
pub struct ConnectionRequestsResponse {
    pub received: Vec<ConnectionRequestResponse>,
    pub sent: Vec<ConnectionRequestResponse>,
}

/// Payload of the `connectionRequest` / `connectionAccepted` push events.
#[derive(Debug, Serialize)]
pub struct ConnectionEvent {
    pub user_id: Uuid,
    pub state: ConnectionState,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(a: Uuid, b: Uuid, status: ConnectionStatus, actor: Uuid) -> ConnectionEntity {
        let (user_id_1, user_id_2) = crate::utils::normalize_pair(a, b);
        ConnectionEntity {
            user_id_1,
            user_id_2,
            status,
            action_user_id: actor,
            created_at: chrono::Utc::now(),
            updated_at: chrono::Utc::now(),
        }
    }

    #[test]
    fn test_state_is_relative_to_viewer() {
        let me = Uuid::now_v7();
        let them = Uuid::now_v7();

        let requested = row(me, them, ConnectionStatus::Requested, me);
        assert_eq!(ConnectionState::derive(&me, Some(&requested), None), ConnectionState::PendingSent);
        assert_eq!(
            ConnectionState::derive(&them, Some(&requested), None),
            ConnectionState::PendingReceived
        );

        let blocked = row(me, them, ConnectionStatus::Blocked, them);
        assert_eq!(ConnectionState::derive(&me, Some(&blocked), None), ConnectionState::BlockedByThem);
        assert_eq!(ConnectionState::derive(&them, Some(&blocked), None), ConnectionState::BlockedByMe);

        let connected = row(me, them, ConnectionStatus::Connected, them);
        assert_eq!(ConnectionState::derive(&me, Some(&connected), None), ConnectionState::Connected);
    }

    #[test]
    fn test_state_without_row_falls_back_to_request() {
        let me = Uuid::now_v7();
        let them = Uuid::now_v7();
        let request = ConnectionRequestEntity {
            id: Uuid::now_v7(),
            requester_id: them,
            target_id: me,
            status: crate::modules::connection::schema::RequestStatus::Pending,
            created_at: chrono::Utc::now(),
            updated_at: chrono::Utc::now(),
        };

        assert_eq!(ConnectionState::derive(&me, None, Some(&request)), ConnectionState::PendingReceived);
        assert_eq!(ConnectionState::derive(&me, None, None), ConnectionState::None);
    }

    #[test]
    fn test_state_serializes_snake_case() {
        let json = serde_json::to_string(&ConnectionState::BlockedByMe).unwrap();
        assert_eq!(json, r#""blocked_by_me""#);
        let action: ConnectionAction = serde_json::from_str(r#""unblock""#).unwrap();
        assert_eq!(action, ConnectionAction::Unblock);
    }
}
