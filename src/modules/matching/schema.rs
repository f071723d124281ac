use serde::Serialize;
use sqlx::prelude::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct AdjectiveSelectionEntity {
    pub user_id: Uuid,
    pub target_user_id: Uuid,
    pub adjective: String,
    pub is_matched: bool,
    pub selected_at: chrono::DateTime<chrono::Utc>,
}

/// One row per unordered pair (`user_id_1 < user_id_2`).
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct MatchEntity {
    pub id: Uuid,
    pub user_id_1: Uuid,
    pub user_id_2: Uuid,
    pub mutual_adjective: String,
    pub is_connected: bool,
    pub ice_breaking_prompt: Option<String>,
    pub matched_at: chrono::DateTime<chrono::Utc>,
}

impl MatchEntity {
    pub fn other(&self, user_id: &Uuid) -> Uuid {
        if self.user_id_1 == *user_id { self.user_id_2 } else { self.user_id_1 }
    }
}
