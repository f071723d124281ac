use actix::{Actor, Addr};
use actix_web::{Error, HttpRequest, HttpResponse, web};
use actix_ws::Message;
use tokio::sync::mpsc;

use super::message::ClientMessage;
use super::server::WebSocketServer;
use super::session::{MembershipRepo, WebSocketSession};
use crate::ENV;

/// `GET /ws`: upgrades the request and pumps frames between the socket and a session actor.
pub async fn websocket_handler(
    req: HttpRequest,
    stream: web::Payload,
    server: web::Data<Addr<WebSocketServer>>,
    participants: web::Data<MembershipRepo>,
) -> Result<HttpResponse, Error> {
    let (response, mut ws_session, mut msg_stream) = actix_ws::handle(&req, stream)?;

    let (tx, mut rx) = mpsc::unbounded_channel::<String>();

    let addr = WebSocketSession::new(
        server.get_ref().clone(),
        tx,
        ENV.jwt_secret.clone(),
        Some(participants.get_ref().clone()),
    )
    .start();

    actix_web::rt::spawn(async move {
        loop {
            tokio::select! {
                msg = msg_stream.recv() => {
                    match msg {
                        Some(Ok(Message::Text(text))) => {
                            match serde_json::from_str::<ClientMessage>(&text) {
                                Ok(client_msg) => addr.do_send(client_msg),
                                Err(e) => {
                                    tracing::warn!("Unparseable client frame: {}", e);
                                    let frame = format!(
                                        r#"{{"type":"error","message":"Invalid message: {}"}}"#,
                                        e.to_string().replace('"', "'")
                                    );
                                    if ws_session.text(frame).await.is_err() {
                                        break;
                                    }
                                }
                            }
                        }
                        Some(Ok(Message::Ping(data))) => {
                            if ws_session.pong(&data).await.is_err() {
                                break;
                            }
                        }
                        Some(Ok(Message::Close(reason))) => {
                            tracing::debug!("WebSocket close frame: {:?}", reason);
                            break;
                        }
                        Some(Ok(Message::Binary(_))) => {
                            tracing::warn!("Binary frames are not supported");
                        }
                        Some(Ok(Message::Pong(_) | Message::Continuation(_) | Message::Nop)) => {}
                        Some(Err(e)) => {
                            tracing::error!("WebSocket protocol error: {}", e);
                            break;
                        }
                        None => break,
                    }
                }

                Some(json) = rx.recv() => {
                    if ws_session.text(json).await.is_err() {
                        break;
                    }
                }
            }
        }

        let _ = ws_session.close(None).await;
        addr.do_send(super::events::Shutdown);
    });

    Ok(response)
}
