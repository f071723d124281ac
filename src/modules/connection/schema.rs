use serde::{Deserialize, Serialize};
use sqlx::prelude::{FromRow, Type};
use uuid::Uuid;

#[derive(Debug, PartialEq, Eq, Clone, Copy, Type, Serialize, Deserialize)]
#[sqlx(type_name = "connection_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ConnectionStatus {
    Requested,
    Connected,
    Blocked,
}

#[derive(Debug, PartialEq, Eq, Clone, Copy, Type, Serialize, Deserialize)]
#[sqlx(type_name = "request_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum RequestStatus {
    Pending,
    Accepted,
    Rejected,
}

/// One row per unordered pair, stored with `user_id_1 < user_id_2`.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct ConnectionEntity {
    pub user_id_1: Uuid,
    pub user_id_2: Uuid,
    pub status: ConnectionStatus,
    pub action_user_id: Uuid,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

impl ConnectionEntity {
    pub fn other(&self, user_id: &Uuid) -> Uuid {
        if self.user_id_1 == *user_id { self.user_id_2 } else { self.user_id_1 }
    }
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct ConnectionRequestEntity {
    pub id: Uuid,
    pub requester_id: Uuid,
    pub target_id: Uuid,
    pub status: RequestStatus,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}
