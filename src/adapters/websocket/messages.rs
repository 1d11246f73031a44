//! Socket frame types for realtime chat updates.
//!
//! Defines the protocol between server and connected clients:
//! - Server → Client: connection status, chat updates, errors, pongs
//! - Client → Server: pings, read receipts

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{ConversationId, Timestamp};
use crate::ports::{ChatUpdate, ChatUpdateType};

// ============================================
// Server → Client Messages
// ============================================

/// All frames the server sends.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// Connection established and subscribed to the user's topic.
    Connected(ConnectedMessage),

    #[serde(rename = "chat.update")]
    ChatUpdate(ChatUpdateMessage),

    Error(ErrorMessage),

    /// Heartbeat response.
    Pong(PongMessage),
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectedMessage {
    pub user_id: String,
    pub client_id: String,
    pub timestamp: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatUpdateMessage {
    pub update_type: ChatUpdateType,
    pub data: serde_json::Value,
    pub timestamp: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub correlation_id: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ErrorMessage {
    pub code: String,
    pub message: String,
    pub timestamp: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct PongMessage {
    pub timestamp: String,
}

impl ServerMessage {
    pub fn error(code: impl Into<String>, message: impl Into<String>) -> Self {
        ServerMessage::Error(ErrorMessage {
            code: code.into(),
            message: message.into(),
            timestamp: Timestamp::now().to_rfc3339(),
        })
    }

    pub fn pong() -> Self {
        ServerMessage::Pong(PongMessage {
            timestamp: Timestamp::now().to_rfc3339(),
        })
    }
}

impl From<ChatUpdate> for ServerMessage {
    fn from(update: ChatUpdate) -> Self {
        ServerMessage::ChatUpdate(ChatUpdateMessage {
            update_type: update.update_type,
            data: update.data,
            timestamp: update.timestamp.to_rfc3339(),
            correlation_id: update.correlation_id,
        })
    }
}

// ============================================
// Client → Server Messages
// ============================================

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    Ping,

    /// Record receipts for every message addressed to the caller.
    #[serde(rename_all = "camelCase")]
    MarkRead { conversation_id: ConversationId },
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn chat_update_serializes_with_dotted_type() {
        let update = ChatUpdate {
            update_type: ChatUpdateType::MessageCreated,
            data: json!({"conversationId": "c-1"}),
            timestamp: Timestamp::now(),
            correlation_id: Some("req-7".to_string()),
        };

        let json = serde_json::to_value(ServerMessage::from(update)).unwrap();

        assert_eq!(json["type"], "chat.update");
        assert_eq!(json["updateType"], "message_created");
        assert_eq!(json["data"]["conversationId"], "c-1");
        assert_eq!(json["correlationId"], "req-7");
    }

    #[test]
    fn connected_message_uses_camel_case() {
        let msg = ServerMessage::Connected(ConnectedMessage {
            user_id: "student-1".to_string(),
            client_id: "abc".to_string(),
            timestamp: "2026-01-01T00:00:00Z".to_string(),
        });

        let json = serde_json::to_value(msg).unwrap();
        assert_eq!(json["type"], "connected");
        assert_eq!(json["userId"], "student-1");
        assert_eq!(json["clientId"], "abc");
    }

    #[test]
    fn error_and_pong_frames_are_tagged() {
        let error = serde_json::to_value(ServerMessage::error("FORBIDDEN", "nope")).unwrap();
        assert_eq!(error["type"], "error");
        assert_eq!(error["code"], "FORBIDDEN");

        let pong = serde_json::to_value(ServerMessage::pong()).unwrap();
        assert_eq!(pong["type"], "pong");
        assert!(pong["timestamp"].is_string());
    }

    #[test]
    fn client_ping_deserializes() {
        let msg: ClientMessage = serde_json::from_str(r#"{"type":"ping"}"#).unwrap();
        assert_eq!(msg, ClientMessage::Ping);
    }

    #[test]
    fn client_mark_read_deserializes() {
        let id = ConversationId::new();
        let raw = format!(r#"{{"type":"mark_read","conversationId":"{}"}}"#, id);

        let msg: ClientMessage = serde_json::from_str(&raw).unwrap();
        assert_eq!(msg, ClientMessage::MarkRead { conversation_id: id });
    }

    #[test]
    fn unknown_client_frame_is_rejected() {
        assert!(serde_json::from_str::<ClientMessage>(r#"{"type":"typing"}"#).is_err());
    }
}
