//! Conversation reader port (read side / CQRS queries).
//!
//! Views for the conversation list and message history.

use async_trait::async_trait;

use crate::domain::conversation::{Message, MessageKind};
use crate::domain::foundation::{ConversationId, DomainError, MessageId, Timestamp, UserId};

/// Reader port for conversation queries.
#[async_trait]
pub trait ConversationReader: Send + Sync {
    /// Conversations in which `user` is a participant, most recent activity
    /// first.
    async fn list_for_user(&self, user: &UserId) -> Result<Vec<ConversationSummary>, DomainError>;

    /// Messages oldest first, with attachments and read receipts.
    async fn messages(
        &self,
        conversation_id: &ConversationId,
        offset: u32,
        limit: u32,
    ) -> Result<MessagePage, DomainError>;
}

/// One row of a user's conversation list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversationSummary {
    pub id: ConversationId,
    /// The other participant.
    pub counterpart_id: UserId,
    pub last_message: Option<LastMessage>,
    /// Messages addressed to the listing user that they have not read.
    pub unread_count: u32,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Preview of the newest message in a conversation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LastMessage {
    pub id: MessageId,
    pub sender_id: UserId,
    pub content: String,
    pub kind: MessageKind,
    pub created_at: Timestamp,
}

impl From<&Message> for LastMessage {
    fn from(message: &Message) -> Self {
        Self {
            id: message.id,
            sender_id: message.sender_id.clone(),
            content: message.content.clone(),
            kind: message.kind,
            created_at: message.created_at,
        }
    }
}

/// A page of message history.
#[derive(Debug, Clone, Default)]
pub struct MessagePage {
    pub items: Vec<Message>,
    /// Total messages in the conversation.
    pub total: u32,
    pub offset: u32,
    /// Page size the items were read with.
    pub limit: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conversation_reader_is_object_safe() {
        fn _accepts_dyn(_reader: &dyn ConversationReader) {}
    }
}
