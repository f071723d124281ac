use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Frames sent by the client.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ClientMessage {
    #[serde(rename_all = "camelCase")]
    Auth { token: String },

    #[serde(rename_all = "camelCase")]
    JoinConversation { conversation_id: Uuid },

    #[serde(rename_all = "camelCase")]
    LeaveConversation { conversation_id: Uuid },

    #[serde(rename_all = "camelCase")]
    TypingStart { conversation_id: Uuid },

    #[serde(rename_all = "camelCase")]
    TypingStop { conversation_id: Uuid },

    Ping,
}

/// Frames pushed by the server.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ServerMessage {
    #[serde(rename_all = "camelCase")]
    AuthSuccess { user_id: Uuid },

    #[serde(rename_all = "camelCase")]
    AuthFailed { reason: String },

    #[serde(rename_all = "camelCase")]
    NewMessage { conversation_id: Uuid, message: serde_json::Value },

    #[serde(rename_all = "camelCase")]
    MessageDeleted { conversation_id: Uuid, message_id: Uuid },

    #[serde(rename_all = "camelCase")]
    UserTyping { conversation_id: Uuid, user_id: Uuid },

    #[serde(rename_all = "camelCase")]
    UserStoppedTyping { conversation_id: Uuid, user_id: Uuid },

    /// Domain events (`connectionRequest`, `connectionAccepted`, `adjectiveMatch`, ...).
    #[serde(rename_all = "camelCase")]
    Notification { event: String, data: serde_json::Value },

    Pong,

    #[serde(rename_all = "camelCase")]
    Error { message: String },
}
