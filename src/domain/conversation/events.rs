//! Conversation domain events.
//!
//! Every payload carries the participant pair so realtime delivery can route
//! it to both users without another lookup.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{
    domain_event, ConversationId, EventId, MessageId, Timestamp, UserId,
};

use super::{Message, ParticipantPair};

pub const CONVERSATION_STARTED: &str = "conversation.started.v1";
pub const MESSAGE_SENT: &str = "message.sent.v1";
pub const MESSAGES_READ: &str = "messages.read.v1";

/// Event types that realtime delivery forwards to participants.
pub const CHAT_EVENT_TYPES: [&str; 3] = [CONVERSATION_STARTED, MESSAGE_SENT, MESSAGES_READ];

// ════════════════════════════════════════════════════════════════════════════
// ConversationStarted
// ════════════════════════════════════════════════════════════════════════════

/// Published once, when the first contact between two users creates their
/// conversation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationStarted {
    pub event_id: EventId,
    pub conversation_id: ConversationId,
    pub participants: ParticipantPair,
    /// User whose request created the conversation.
    pub started_by: UserId,
    pub started_at: Timestamp,
}

domain_event!(
    ConversationStarted,
    event_type = CONVERSATION_STARTED,
    aggregate_id = conversation_id,
    aggregate_type = "Conversation",
    occurred_at = started_at,
    event_id = event_id
);

// ════════════════════════════════════════════════════════════════════════════
// MessageSent
// ════════════════════════════════════════════════════════════════════════════

/// Published for every persisted message, including the welcome message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageSent {
    pub event_id: EventId,
    pub conversation_id: ConversationId,
    pub participants: ParticipantPair,
    pub message: Message,
    pub sent_at: Timestamp,
}

domain_event!(
    MessageSent,
    event_type = MESSAGE_SENT,
    aggregate_id = conversation_id,
    aggregate_type = "Conversation",
    occurred_at = sent_at,
    event_id = event_id
);

impl MessageSent {
    pub fn new(participants: ParticipantPair, message: Message) -> Self {
        Self {
            event_id: EventId::new(),
            conversation_id: message.conversation_id,
            participants,
            sent_at: message.created_at,
            message,
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// MessagesRead
// ════════════════════════════════════════════════════════════════════════════

/// Published when a reader records receipts for one or more messages.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessagesRead {
    pub event_id: EventId,
    pub conversation_id: ConversationId,
    pub participants: ParticipantPair,
    pub reader_id: UserId,
    pub message_ids: Vec<MessageId>,
    pub read_at: Timestamp,
}

domain_event!(
    MessagesRead,
    event_type = MESSAGES_READ,
    aggregate_id = conversation_id,
    aggregate_type = "Conversation",
    occurred_at = read_at,
    event_id = event_id
);

/// The routing fields shared by every chat event payload.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatEventRoute {
    pub conversation_id: ConversationId,
    pub participants: ParticipantPair,
}
