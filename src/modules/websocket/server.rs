use actix::prelude::*;
use std::collections::{HashMap, HashSet};
use uuid::Uuid;

use super::events::*;
use super::message::ServerMessage;
use super::session::WebSocketSession;

/// Owns every live socket. A user may hold several sessions (one per device);
/// rooms hold user ids, not sessions.
#[derive(Default)]
pub struct WebSocketServer {
    sessions: HashMap<Uuid, Addr<WebSocketSession>>,
    users: HashMap<Uuid, HashSet<Uuid>>,
    rooms: HashMap<Uuid, HashSet<Uuid>>,
}

impl WebSocketServer {
    pub fn new() -> Self {
        Self::default()
    }

    fn send_to_session(&self, session_id: &Uuid, message: ServerMessage) {
        if let Some(session_addr) = self.sessions.get(session_id) {
            session_addr.do_send(message);
        }
    }

    fn send_to_user(&self, user_id: &Uuid, message: &ServerMessage) -> usize {
        match self.users.get(user_id) {
            Some(session_ids) => {
                for session_id in session_ids {
                    self.send_to_session(session_id, message.clone());
                }
                session_ids.len()
            }
            None => 0,
        }
    }
}

impl Actor for WebSocketServer {
    type Context = Context<Self>;

    fn started(&mut self, _ctx: &mut Self::Context) {
        tracing::info!("WebSocket server started");
    }

    fn stopped(&mut self, _ctx: &mut Self::Context) {
        tracing::info!("WebSocket server stopped");
    }
}

impl Handler<Connect> for WebSocketServer {
    type Result = ();

    fn handle(&mut self, msg: Connect, _: &mut Context<Self>) {
        tracing::debug!("New WebSocket session connected: {}", msg.id);
        self.sessions.insert(msg.id, msg.addr);
    }
}

impl Handler<Disconnect> for WebSocketServer {
    type Result = ();

    fn handle(&mut self, msg: Disconnect, _: &mut Context<Self>) {
        tracing::debug!("WebSocket session disconnected: {}", msg.id);
        self.sessions.remove(&msg.id);

        let mut user_to_remove: Option<Uuid> = None;
        for (&user_id, sessions) in self.users.iter_mut() {
            if sessions.remove(&msg.id) {
                if sessions.is_empty() {
                    user_to_remove = Some(user_id);
                }
                break;
            }
        }

        if let Some(user_id) = user_to_remove {
            self.users.remove(&user_id);

            for room_users in self.rooms.values_mut() {
                room_users.remove(&user_id);
            }
            self.rooms.retain(|_, users| !users.is_empty());

            tracing::info!("User {} went offline", user_id);
        }
    }
}

impl Handler<Authenticate> for WebSocketServer {
    type Result = ();

    fn handle(&mut self, msg: Authenticate, _: &mut Context<Self>) {
        let sessions = self.users.entry(msg.user_id).or_default();
        sessions.insert(msg.session_id);

        tracing::info!("User {} now has {} active session(s)", msg.user_id, sessions.len());
    }
}

impl Handler<JoinRoom> for WebSocketServer {
    type Result = ();

    fn handle(&mut self, msg: JoinRoom, _: &mut Context<Self>) {
        let room = self.rooms.entry(msg.conversation_id).or_default();
        room.insert(msg.user_id);

        tracing::debug!(
            "User {} joined conversation {} ({} users in room)",
            msg.user_id,
            msg.conversation_id,
            room.len()
        );
    }
}

impl Handler<LeaveRoom> for WebSocketServer {
    type Result = ();

    fn handle(&mut self, msg: LeaveRoom, _: &mut Context<Self>) {
        if let Some(room) = self.rooms.get_mut(&msg.conversation_id) {
            room.remove(&msg.user_id);

            if room.is_empty() {
                self.rooms.remove(&msg.conversation_id);
            }
        }
    }
}

impl Handler<BroadcastToRoom> for WebSocketServer {
    type Result = ();

    fn handle(&mut self, msg: BroadcastToRoom, _: &mut Context<Self>) {
        let Some(room_users) = self.rooms.get(&msg.conversation_id) else {
            return;
        };

        let sent: usize = room_users
            .iter()
            .filter(|user_id| Some(**user_id) != msg.skip_user_id)
            .map(|user_id| self.send_to_user(user_id, &msg.message))
            .sum();

        tracing::debug!("Broadcast to room {}: sent to {} sessions", msg.conversation_id, sent);
    }
}

impl Handler<SendToUser> for WebSocketServer {
    type Result = ();

    fn handle(&mut self, msg: SendToUser, _: &mut Context<Self>) {
        if self.send_to_user(&msg.user_id, &msg.message) == 0 {
            tracing::debug!("User {} not online, message not sent", msg.user_id);
        }
    }
}

impl Handler<SendToUsers> for WebSocketServer {
    type Result = ();

    fn handle(&mut self, msg: SendToUsers, _: &mut Context<Self>) {
        let sent: usize =
            msg.user_ids.iter().map(|user_id| self.send_to_user(user_id, &msg.message)).sum();

        tracing::debug!("Sent message to {} users ({} sessions)", msg.user_ids.len(), sent);
    }
}

impl Handler<IsOnline> for WebSocketServer {
    type Result = bool;

    fn handle(&mut self, msg: IsOnline, _: &mut Context<Self>) -> Self::Result {
        self.users.contains_key(&msg.user_id)
    }
}

impl Message for ServerMessage {
    type Result = ();
}
