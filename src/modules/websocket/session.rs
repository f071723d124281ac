use actix::prelude::*;
use std::sync::Arc;
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::modules::conversation::repository::ParticipantRepository;
use crate::utils::{Claims, TypeClaims};

use super::events::*;
use super::message::{ClientMessage, ServerMessage};
use super::server::WebSocketServer;

pub type MembershipRepo = Arc<dyn ParticipantRepository + Send + Sync>;

pub struct WebSocketSession {
    pub id: Uuid,
    pub user_id: Option<Uuid>,
    pub server: Addr<WebSocketServer>,
    /// Outbound JSON frames, drained by the socket task in `handler.rs`.
    pub tx: mpsc::UnboundedSender<String>,
    jwt_secret: String,
    /// `None` skips the membership check on join.
    participants: Option<MembershipRepo>,
}

impl WebSocketSession {
    pub fn new(
        server: Addr<WebSocketServer>,
        tx: mpsc::UnboundedSender<String>,
        jwt_secret: String,
        participants: Option<MembershipRepo>,
    ) -> Self {
        Self { id: Uuid::now_v7(), user_id: None, server, tx, jwt_secret, participants }
    }

    fn send_to_client(&self, msg: &ServerMessage) {
        match serde_json::to_string(msg) {
            Ok(json) => {
                if let Err(e) = self.tx.send(json) {
                    tracing::error!("Failed to queue frame for session {}: {}", self.id, e);
                }
            }
            Err(e) => tracing::error!("Failed to serialize frame for session {}: {}", self.id, e),
        }
    }

    fn send_error(&self, message: &str) {
        self.send_to_client(&ServerMessage::Error { message: message.to_string() });
    }

    fn require_auth(&self) -> Option<Uuid> {
        if self.user_id.is_none() {
            self.send_error("Authenticate before sending this message");
        }
        self.user_id
    }

    fn handle_client_message(&mut self, msg: ClientMessage, ctx: &mut Context<Self>) {
        match msg {
            ClientMessage::Auth { token } => self.handle_auth(&token),
            ClientMessage::JoinConversation { conversation_id } => {
                self.handle_join_conversation(conversation_id, ctx)
            }
            ClientMessage::LeaveConversation { conversation_id } => {
                if let Some(user_id) = self.require_auth() {
                    self.server.do_send(LeaveRoom { user_id, conversation_id });
                }
            }
            ClientMessage::TypingStart { conversation_id } => {
                if let Some(user_id) = self.require_auth() {
                    self.server.do_send(BroadcastToRoom {
                        conversation_id,
                        message: ServerMessage::UserTyping { conversation_id, user_id },
                        skip_user_id: Some(user_id),
                    });
                }
            }
            ClientMessage::TypingStop { conversation_id } => {
                if let Some(user_id) = self.require_auth() {
                    self.server.do_send(BroadcastToRoom {
                        conversation_id,
                        message: ServerMessage::UserStoppedTyping { conversation_id, user_id },
                        skip_user_id: Some(user_id),
                    });
                }
            }
            ClientMessage::Ping => self.send_to_client(&ServerMessage::Pong),
        }
    }

    fn handle_auth(&mut self, token: &str) {
        if self.user_id.is_some() {
            self.send_error("Session already authenticated");
            return;
        }

        let claims = match Claims::decode(token, self.jwt_secret.as_bytes()) {
            Ok(claims) if claims._type == Some(TypeClaims::AccessToken) => claims,
            Ok(_) => {
                self.send_to_client(&ServerMessage::AuthFailed {
                    reason: "Access token required".to_string(),
                });
                return;
            }
            Err(e) => {
                tracing::warn!("WebSocket auth failed on session {}: {}", self.id, e);
                self.send_to_client(&ServerMessage::AuthFailed {
                    reason: "Token invalid or expired".to_string(),
                });
                return;
            }
        };

        let user_id = claims.sub;
        self.user_id = Some(user_id);
        self.server.do_send(Authenticate { session_id: self.id, user_id });
        self.send_to_client(&ServerMessage::AuthSuccess { user_id });
    }

    fn handle_join_conversation(&self, conversation_id: Uuid, ctx: &mut Context<Self>) {
        let Some(user_id) = self.require_auth() else {
            return;
        };

        let Some(participants) = self.participants.clone() else {
            self.server.do_send(JoinRoom { user_id, conversation_id });
            return;
        };

        let server = self.server.clone();
        let tx = self.tx.clone();

        ctx.spawn(
            async move {
                let reply = match participants.is_member(&conversation_id, &user_id).await {
                    Ok(true) => {
                        server.do_send(JoinRoom { user_id, conversation_id });
                        return;
                    }
                    Ok(false) => "You are not a member of this conversation",
                    Err(e) => {
                        tracing::error!("Membership check failed for {conversation_id}: {e}");
                        "Could not join conversation"
                    }
                };

                let frame = ServerMessage::Error { message: reply.to_string() };
                if let Ok(json) = serde_json::to_string(&frame) {
                    let _ = tx.send(json);
                }
            }
            .into_actor(self),
        );
    }
}

impl Actor for WebSocketSession {
    type Context = Context<Self>;

    fn started(&mut self, ctx: &mut Self::Context) {
        self.server.do_send(Connect { id: self.id, addr: ctx.address() });
    }

    fn stopped(&mut self, _ctx: &mut Self::Context) {
        self.server.do_send(Disconnect { id: self.id });
    }
}

impl Message for ClientMessage {
    type Result = ();
}

impl Handler<ClientMessage> for WebSocketSession {
    type Result = ();

    fn handle(&mut self, msg: ClientMessage, ctx: &mut Context<Self>) {
        self.handle_client_message(msg, ctx);
    }
}

impl Handler<Shutdown> for WebSocketSession {
    type Result = ();

    fn handle(&mut self, _: Shutdown, ctx: &mut Context<Self>) {
        ctx.stop();
    }
}

impl Handler<ServerMessage> for WebSocketSession {
    type Result = ();

    fn handle(&mut self, msg: ServerMessage, _ctx: &mut Context<Self>) {
        self.send_to_client(&msg);
    }
}
