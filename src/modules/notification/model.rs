use serde::Serialize;
use uuid::Uuid;

use crate::modules::{
    connection::model::ConnectionRequestResponse, matching::model::MatchResponse,
    user::model::UserSummary,
};

#[derive(Debug, Clone, Serialize)]
pub struct MatchedUser {
    pub match_id: Uuid,
    pub user: UserSummary,
    pub is_connected: bool,
    pub matched_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MatchGroup {
    pub adjective: String,
    pub users: Vec<MatchedUser>,
}

#[derive(Debug, Serialize)]
pub struct NotificationsResponse {
    pub connection_requests: Vec<ConnectionRequestResponse>,
    pub matches: Vec<MatchGroup>,
    pub total: usize,
}

/// Groups by mutual adjective. Input must be newest first; groups keep that order
/// so the group holding the most recent match comes first.
pub fn group_matches(matches: Vec<MatchResponse>) -> Vec<MatchGroup> {
    let mut groups: Vec<MatchGroup> = Vec::new();

    for m in matches {
        let user = MatchedUser {
            match_id: m.id,
            user: m.user,
            is_connected: m.is_connected,
            matched_at: m.matched_at,
        };

        match groups.iter_mut().find(|g| g.adjective == m.mutual_adjective) {
            Some(group) => group.users.push(user),
            None => groups.push(MatchGroup { adjective: m.mutual_adjective, users: vec![user] }),
        }
    }

    groups
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::user::schema::Gender;
    use chrono::{Duration, Utc};

    fn match_response(adjective: &str, minutes_ago: i64) -> MatchResponse {
        let id = Uuid::now_v7();
        MatchResponse {
            id,
            user: UserSummary {
                id: Uuid::now_v7(),
                name: format!("user-{adjective}-{minutes_ago}"),
                gender: Gender::Other,
                university_name: None,
                degree: None,
                year: None,
                avatar_url: None,
            },
            mutual_adjective: adjective.to_string(),
            is_connected: false,
            ice_breaking_prompt: None,
            matched_at: Utc::now() - Duration::minutes(minutes_ago),
        }
    }

    #[test]
    fn test_group_matches_by_adjective_most_recent_first() {
        let groups = group_matches(vec![
            match_response("Kind", 1),
            match_response("Smart", 5),
            match_response("Kind", 10),
            match_response("Witty", 20),
        ]);

        let adjectives: Vec<_> = groups.iter().map(|g| g.adjective.as_str()).collect();
        assert_eq!(adjectives, vec!["Kind", "Smart", "Witty"]);
        assert_eq!(groups[0].users.len(), 2);
        assert!(groups[0].users[0].matched_at > groups[0].users[1].matched_at);
    }

    #[test]
    fn test_group_matches_empty() {
        assert!(group_matches(vec![]).is_empty());
    }
}
