//! Socket endpoint for realtime chat updates.
//!
//! Connection lifecycle:
//! 1. Authenticate the token (Bearer header or `?token=`) before upgrading
//! 2. Upgrade to a websocket
//! 3. Join the user's room
//! 4. Forward room updates and answer client frames until disconnect
//! 5. Leave the room

use std::sync::Arc;

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Query, State,
    },
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use futures::{stream::SplitSink, SinkExt, StreamExt};
use serde::Deserialize;
use tokio::sync::{broadcast::error::RecvError, mpsc};

use crate::adapters::http::chat::chat_error_body;
use crate::adapters::http::middleware::{auth_error_response, bearer_token, AuthRejection};
use crate::application::handlers::{MarkReadCommand, MarkReadHandler};
use crate::domain::foundation::{CommandMetadata, Timestamp, UserId};
use crate::ports::SessionValidator;

use super::messages::{ClientMessage, ConnectedMessage, ServerMessage};
use super::rooms::{ClientId, RoomManager};

/// Fixed path of the realtime endpoint.
pub const SOCKET_PATH: &str = "/api/socket";

/// Replies queued for one connection before the reader waits.
const REPLY_BUFFER: usize = 16;

#[derive(Clone)]
pub struct SocketState {
    pub rooms: Arc<RoomManager>,
    pub validator: Arc<dyn SessionValidator>,
    pub mark_read: Arc<MarkReadHandler>,
}

impl SocketState {
    pub fn new(
        rooms: Arc<RoomManager>,
        validator: Arc<dyn SessionValidator>,
        mark_read: Arc<MarkReadHandler>,
    ) -> Self {
        Self {
            rooms,
            validator,
            mark_read,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct SocketParams {
    pub token: Option<String>,
}

/// GET /api/socket - Upgrade to the caller's realtime channel
pub async fn socket_handler(
    State(state): State<SocketState>,
    headers: HeaderMap,
    Query(params): Query<SocketParams>,
    ws: Option<WebSocketUpgrade>,
) -> Response {
    let token = bearer_token(&headers)
        .map(str::to_owned)
        .or_else(|| params.token.filter(|t| !t.trim().is_empty()));
    let Some(token) = token else {
        return AuthRejection::Unauthenticated.into_response();
    };

    let user = match state.validator.validate(&token).await {
        Ok(user) => user,
        Err(e) => return auth_error_response(&e),
    };

    let Some(ws) = ws else {
        return (
            StatusCode::UPGRADE_REQUIRED,
            Json(serde_json::json!({
                "error": "Websocket upgrade required",
                "code": "UPGRADE_REQUIRED"
            })),
        )
            .into_response();
    };

    ws.on_upgrade(move |socket| handle_socket(socket, user.id, state))
}

async fn handle_socket(socket: WebSocket, user_id: UserId, state: SocketState) {
    let (mut sender, mut receiver) = socket.split();
    let client_id = ClientId::new();

    let mut room_rx = state.rooms.join(&user_id, client_id.clone()).await;
    tracing::info!(user_id = %user_id, client_id = %client_id, "Socket connected");

    let connected = ServerMessage::Connected(ConnectedMessage {
        user_id: user_id.to_string(),
        client_id: client_id.to_string(),
        timestamp: Timestamp::now().to_rfc3339(),
    });
    if let Err(e) = send_frame(&mut sender, &connected).await {
        tracing::debug!(client_id = %client_id, error = %e, "Client gone before connect ack");
        drop(room_rx);
        state.rooms.leave(&client_id).await;
        return;
    }

    let (reply_tx, mut reply_rx) = mpsc::channel::<ServerMessage>(REPLY_BUFFER);

    let mut send_task = {
        let client_id = client_id.clone();
        let user_id = user_id.clone();
        tokio::spawn(async move {
            loop {
                let frame = tokio::select! {
                    update = room_rx.recv() => match update {
                        Ok(update) => ServerMessage::from(update),
                        Err(RecvError::Lagged(skipped)) => {
                            tracing::warn!(
                                user_id = %user_id,
                                client_id = %client_id,
                                skipped,
                                "Slow socket missed chat updates"
                            );
                            continue;
                        }
                        Err(RecvError::Closed) => break,
                    },
                    reply = reply_rx.recv() => match reply {
                        Some(reply) => reply,
                        None => break,
                    },
                };

                if let Err(e) = send_frame(&mut sender, &frame).await {
                    tracing::debug!(client_id = %client_id, error = %e, "Send failed, closing");
                    break;
                }
            }
        })
    };

    let mut recv_task = {
        let client_id = client_id.clone();
        let mark_read = state.mark_read.clone();
        tokio::spawn(async move {
            while let Some(result) = receiver.next().await {
                match result {
                    Ok(Message::Text(text)) => {
                        let Some(reply) = handle_client_frame(&text, &user_id, &mark_read).await
                        else {
                            continue;
                        };
                        if reply_tx.send(reply).await.is_err() {
                            break;
                        }
                    }
                    Ok(Message::Binary(_)) => {
                        tracing::warn!(client_id = %client_id, "Unsupported binary frame");
                    }
                    Ok(Message::Close(_)) => {
                        tracing::debug!(client_id = %client_id, "Client sent close frame");
                        break;
                    }
                    // Protocol ping/pong is answered by axum.
                    Ok(Message::Ping(_)) | Ok(Message::Pong(_)) => {}
                    Err(e) => {
                        tracing::debug!(client_id = %client_id, error = %e, "Receive error");
                        break;
                    }
                }
            }
        })
    };

    tokio::select! {
        _ = &mut send_task => {
            recv_task.abort();
            let _ = recv_task.await;
        }
        _ = &mut recv_task => {
            send_task.abort();
            let _ = send_task.await;
        }
    }

    state.rooms.leave(&client_id).await;
    tracing::info!(client_id = %client_id, "Socket disconnected");
}

/// Answers one client text frame. `None` means nothing to send back.
async fn handle_client_frame(
    text: &str,
    user_id: &UserId,
    mark_read: &MarkReadHandler,
) -> Option<ServerMessage> {
    let frame = match serde_json::from_str::<ClientMessage>(text) {
        Ok(frame) => frame,
        Err(e) => {
            tracing::debug!(user_id = %user_id, error = %e, "Unrecognized client frame");
            return Some(ServerMessage::error("BAD_REQUEST", "Unrecognized frame"));
        }
    };

    match frame {
        ClientMessage::Ping => Some(ServerMessage::pong()),
        ClientMessage::MarkRead { conversation_id } => {
            let metadata = CommandMetadata::new(user_id.clone()).with_source("websocket");
            match mark_read
                .handle(MarkReadCommand { conversation_id }, metadata)
                .await
            {
                // Receipts reach every tab through the messages_read update.
                Ok(_) => None,
                Err(e) => {
                    let (_, body) = chat_error_body(e);
                    Some(ServerMessage::error(body.code, body.message))
                }
            }
        }
    }
}

async fn send_frame(
    sender: &mut SplitSink<WebSocket, Message>,
    msg: &ServerMessage,
) -> Result<(), axum::Error> {
    let json = serde_json::to_string(msg).map_err(axum::Error::new)?;
    sender.send(Message::Text(json)).await
}

/// Router exposing the socket endpoint at [`SOCKET_PATH`].
pub fn socket_router(state: SocketState) -> Router {
    Router::new()
        .route(SOCKET_PATH, get(socket_handler))
        .with_state(state)
}
