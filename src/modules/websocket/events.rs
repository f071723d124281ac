//! Messages exchanged between session actors and the server actor.
use actix::prelude::*;
use uuid::Uuid;

use super::message::ServerMessage;
use super::session::WebSocketSession;

#[derive(Message)]
#[rtype(result = "()")]
pub struct Connect {
    pub id: Uuid,
    pub addr: Addr<WebSocketSession>,
}

#[derive(Message)]
#[rtype(result = "()")]
pub struct Disconnect {
    pub id: Uuid,
}

#[derive(Message)]
#[rtype(result = "()")]
pub struct Authenticate {
    pub session_id: Uuid,
    pub user_id: Uuid,
}

#[derive(Message)]
#[rtype(result = "()")]
pub struct JoinRoom {
    pub user_id: Uuid,
    pub conversation_id: Uuid,
}

#[derive(Message)]
#[rtype(result = "()")]
pub struct LeaveRoom {
    pub user_id: Uuid,
    pub conversation_id: Uuid,
}

/// Delivered to every online member of the room, optionally skipping one user.
#[derive(Message, Clone)]
#[rtype(result = "()")]
pub struct BroadcastToRoom {
    pub conversation_id: Uuid,
    pub message: ServerMessage,
    pub skip_user_id: Option<Uuid>,
}

#[derive(Message)]
#[rtype(result = "()")]
pub struct SendToUser {
    pub user_id: Uuid,
    pub message: ServerMessage,
}

#[derive(Message)]
#[rtype(result = "()")]
pub struct SendToUsers {
    pub user_ids: Vec<Uuid>,
    pub message: ServerMessage,
}

#[derive(Message)]
#[rtype(result = "bool")]
pub struct IsOnline {
    pub user_id: Uuid,
}

/// Sent to a session when its socket closes.
#[derive(Message)]
#[rtype(result = "()")]
pub struct Shutdown;
