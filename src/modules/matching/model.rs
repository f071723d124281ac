use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::modules::{
    matching::schema::MatchEntity,
    user::model::UserSummary,
};

#[derive(Debug, Deserialize, Validate)]
pub struct SelectAdjectiveModel {
    pub target_user_id: Uuid,
    #[validate(length(min = 1, max = 40, message = "Adjective must be between 1 and 40 characters"))]
    pub adjective: String,
}

#[derive(Debug, Serialize)]
pub struct AdjectiveOptions {
    pub adjectives: Vec<&'static str>,
    pub selected: Option<String>,
    pub is_matched: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct MatchData {
    pub match_id: Uuid,
    pub user_id: Uuid,
    pub mutual_adjective: String,
    pub ice_breaking_prompt: Option<String>,
    pub is_connected: bool,
    pub matched_at: chrono::DateTime<chrono::Utc>,
}

impl MatchData {
    /// Seen from `viewer`: `user_id` is the other side of the match.
    pub fn for_viewer(entity: &MatchEntity, viewer: &Uuid) -> Self {
        MatchData {
            match_id: entity.id,
            user_id: entity.other(viewer),
            mutual_adjective: entity.mutual_adjective.clone(),
            ice_breaking_prompt: entity.ice_breaking_prompt.clone(),
            is_connected: entity.is_connected,
            matched_at: entity.matched_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SelectAdjectiveResponse {
    pub matched: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub match_data: Option<MatchData>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MatchResponse {
    pub id: Uuid,
    pub user: UserSummary,
    pub mutual_adjective: String,
    pub is_connected: bool,
    pub ice_breaking_prompt: Option<String>,
    pub matched_at: chrono::DateTime<chrono::Utc>,
}

pub enum SelectionOutcome {
    Pending,
    NewMatch(MatchEntity),
    /// The pair was already matched on this word; the row is returned untouched.
    ExistingMatch(MatchEntity),
}

pub enum ConnectOutcome {
    NoMatch,
    AlreadyConnected,
    Connected(MatchEntity),
}
