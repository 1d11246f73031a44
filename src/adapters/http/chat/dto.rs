//! HTTP DTOs for the chat endpoints.
//!
//! All JSON is camelCase. Identifiers and timestamps are rendered as
//! strings.

use serde::{Deserialize, Serialize};

use crate::application::handlers::{ConversationListItem, MarkReadResult, OpenConversationResult};
use crate::domain::conversation::Message;
use crate::domain::user::{ChatUser, Role};
use crate::ports::{LastMessage, MessagePage};

// ════════════════════════════════════════════════════════════════════════════════
// Request DTOs
// ════════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpenConversationRequest {
    pub other_user_id: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendMessageRequest {
    pub content: String,
    /// Must be the other participant when present.
    #[serde(default)]
    pub receiver_id: Option<String>,
}

/// Query string of `GET /api/conversations/:id/messages`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MessageHistoryParams {
    pub offset: Option<u32>,
    pub limit: Option<u32>,
}

// ════════════════════════════════════════════════════════════════════════════════
// Response DTOs
// ════════════════════════════════════════════════════════════════════════════════

/// Public profile of a chat user. Email addresses are not exposed.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactResponse {
    pub id: String,
    pub role: Role,
    pub display_name: String,
}

impl From<ChatUser> for ContactResponse {
    fn from(user: ChatUser) -> Self {
        Self {
            id: user.id.to_string(),
            role: user.role,
            display_name: user.display_name,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationResponse {
    pub id: String,
    pub participants: Vec<String>,
    pub counterpart: ContactResponse,
    pub created_at: String,
    pub updated_at: String,
}

impl From<OpenConversationResult> for ConversationResponse {
    fn from(result: OpenConversationResult) -> Self {
        let conversation = result.conversation;
        Self {
            id: conversation.id().to_string(),
            participants: conversation
                .participants()
                .iter()
                .map(|u| u.to_string())
                .collect(),
            counterpart: result.counterpart.into(),
            created_at: conversation.created_at().to_rfc3339(),
            updated_at: conversation.updated_at().to_rfc3339(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LastMessageResponse {
    pub id: String,
    pub sender_id: String,
    pub content: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub created_at: String,
}

impl From<LastMessage> for LastMessageResponse {
    fn from(message: LastMessage) -> Self {
        Self {
            id: message.id.to_string(),
            sender_id: message.sender_id.to_string(),
            content: message.content,
            kind: message.kind.to_string(),
            created_at: message.created_at.to_rfc3339(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationSummaryResponse {
    pub id: String,
    pub counterpart_id: String,
    /// Null if the counterpart is no longer in the directory.
    pub counterpart: Option<ContactResponse>,
    pub last_message: Option<LastMessageResponse>,
    pub unread_count: u32,
    pub created_at: String,
    pub updated_at: String,
}

impl From<ConversationListItem> for ConversationSummaryResponse {
    fn from(item: ConversationListItem) -> Self {
        let summary = item.summary;
        Self {
            id: summary.id.to_string(),
            counterpart_id: summary.counterpart_id.to_string(),
            counterpart: item.counterpart.map(Into::into),
            last_message: summary.last_message.map(Into::into),
            unread_count: summary.unread_count,
            created_at: summary.created_at.to_rfc3339(),
            updated_at: summary.updated_at.to_rfc3339(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MessagePageResponse {
    pub messages: Vec<Message>,
    pub total: u32,
    pub offset: u32,
    pub limit: u32,
}

impl From<MessagePage> for MessagePageResponse {
    fn from(page: MessagePage) -> Self {
        Self {
            messages: page.items,
            total: page.total,
            offset: page.offset,
            limit: page.limit,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkReadResponse {
    pub message_ids: Vec<String>,
    pub read_at: String,
}

impl From<MarkReadResult> for MarkReadResponse {
    fn from(result: MarkReadResult) -> Self {
        Self {
            message_ids: result.message_ids.iter().map(|id| id.to_string()).collect(),
            read_at: result.read_at.to_rfc3339(),
        }
    }
}

/// Standard error response.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ErrorResponse {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new("BAD_REQUEST", message)
    }

    pub fn not_found(resource_type: &str, id: &str) -> Self {
        Self::new("NOT_FOUND", format!("{} not found: {}", resource_type, id))
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new("FORBIDDEN", message)
    }

    pub fn payload_too_large(message: impl Into<String>) -> Self {
        Self::new("PAYLOAD_TOO_LARGE", message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new("INTERNAL_ERROR", message)
    }

    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }

    fn new(code: &str, message: impl Into<String>) -> Self {
        Self {
            code: code.to_string(),
            message: message.into(),
            details: None,
        }
    }
}
