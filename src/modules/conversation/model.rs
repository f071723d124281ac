use serde::{Deserialize, Serialize};
use sqlx::prelude::FromRow;
use uuid::Uuid;
use validator::Validate;

use crate::modules::conversation::schema::ConversationType;

#[derive(Debug, Deserialize, Validate)]
pub struct NewConversation {
    #[serde(rename = "type")]
    pub _type: ConversationType,
    #[validate(length(min = 1, max = 80, message = "Group name must be between 1 and 80 characters"))]
    pub name: Option<String>,
    #[validate(length(min = 1, max = 50, message = "Between 1 and 50 members are required"))]
    pub member_ids: Vec<Uuid>,
}

#[derive(Debug, Clone, Serialize)]
pub struct GroupInfo {
    pub name: String,
    pub created_by: Uuid,
    pub avatar_url: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct LastMessage {
    pub id: Uuid,
    pub content: String,
    pub sender_id: Uuid,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// One conversation as seen by one participant, flattened by the list query.
#[derive(Debug, Clone, FromRow)]
pub struct ConversationRaw {
    pub id: Uuid,
    #[sqlx(rename = "type")]
    pub _type: ConversationType,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,

    pub group_name: Option<String>,
    pub group_created_by: Option<Uuid>,
    pub group_avatar_url: Option<String>,

    pub last_id: Option<Uuid>,
    pub last_content: Option<String>,
    pub last_sender_id: Option<Uuid>,
    pub last_created_at: Option<chrono::DateTime<chrono::Utc>>,

    pub unread_count: i32,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct ParticipantRow {
    #[serde(skip)]
    pub conversation_id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub avatar_url: Option<String>,
    pub unread_count: i32,
    pub joined_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ConversationDetail {
    pub id: Uuid,
    #[serde(rename = "type")]
    pub _type: ConversationType,
    pub group_info: Option<GroupInfo>,
    pub last_message: Option<LastMessage>,
    pub participants: Vec<ParticipantRow>,
    pub unread_count: i32,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

impl ConversationDetail {
    pub fn new(raw: ConversationRaw, participants: Vec<ParticipantRow>) -> Self {
        let group_info = match (raw.group_name, raw.group_created_by) {
            (Some(name), Some(created_by)) => {
                Some(GroupInfo { name, created_by, avatar_url: raw.group_avatar_url })
            }
            _ => None,
        };

        let last_message =
            match (raw.last_id, raw.last_content, raw.last_sender_id, raw.last_created_at) {
                (Some(id), Some(content), Some(sender_id), Some(created_at)) => {
                    Some(LastMessage { id, content, sender_id, created_at })
                }
                _ => None,
            };

        ConversationDetail {
            id: raw.id,
            _type: raw._type,
            group_info,
            last_message,
            participants,
            unread_count: raw.unread_count,
            created_at: raw.created_at,
            updated_at: raw.updated_at,
        }
    }
}
