use actix::Addr;
use serde::Serialize;
use uuid::Uuid;

use super::events::{BroadcastToRoom, IsOnline, SendToUser, SendToUsers};
use super::message::ServerMessage;
use super::server::WebSocketServer;

/// Fire-and-forget push used by the HTTP services. Delivery to offline users is dropped.
#[derive(Clone)]
pub struct Notifier {
    server: Addr<WebSocketServer>,
}

impl Notifier {
    pub fn new(server: Addr<WebSocketServer>) -> Self {
        Self { server }
    }

    fn notification<T: Serialize>(event: &str, payload: &T) -> Option<ServerMessage> {
        match serde_json::to_value(payload) {
            Ok(data) => Some(ServerMessage::Notification { event: event.to_string(), data }),
            Err(e) => {
                tracing::error!("Failed to serialize {event} payload: {e}");
                None
            }
        }
    }

    pub fn emit_to_user<T: Serialize>(&self, user_id: Uuid, event: &str, payload: &T) {
        if let Some(message) = Self::notification(event, payload) {
            self.server.do_send(SendToUser { user_id, message });
        }
    }

    pub fn emit_to_users<T: Serialize>(&self, user_ids: Vec<Uuid>, event: &str, payload: &T) {
        if let Some(message) = Self::notification(event, payload) {
            self.server.do_send(SendToUsers { user_ids, message });
        }
    }

    pub fn emit_to_group(&self, conversation_id: Uuid, message: ServerMessage, skip: Option<Uuid>) {
        self.server.do_send(BroadcastToRoom { conversation_id, message, skip_user_id: skip });
    }

    pub async fn is_user_online(&self, user_id: Uuid) -> bool {
        self.server.send(IsOnline { user_id }).await.unwrap_or(false)
    }
}
