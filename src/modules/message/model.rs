use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::modules::message::schema::MessageEntity;

pub const DEFAULT_MESSAGE_LIMIT: i64 = 50;

#[derive(Debug, Clone)]
pub struct InsertMessage {
    pub conversation_id: Uuid,
    pub sender_id: Uuid,
    pub content: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct MessageQueryRequest {
    #[validate(range(min = 1, max = 100, message = "Limit must be between 1 and 100"))]
    pub limit: Option<i64>,
    /// RFC3339 `created_at` of the oldest message already loaded.
    pub cursor: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct SendMessage {
    #[validate(length(min = 1, max = 4000, message = "Message must be between 1 and 4000 characters"))]
    pub content: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct GetMessageResponse {
    pub messages: Vec<MessageEntity>,
    pub cursor: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct NewMessageEvent<'a> {
    pub conversation_id: Uuid,
    pub message: &'a MessageEntity,
}
