//! Conversation module - two-party chat threads between a student and an admin.
//!
//! # Domain Invariants
//!
//! 1. A conversation has exactly two distinct participants of opposite roles
//! 2. At most one conversation exists per unordered pair of participants
//! 3. Every message's sender and receiver are the conversation's participants
//! 4. An attachment belongs to exactly one message
//! 5. A reader has at most one receipt per message

mod attachment;
mod conversation;
mod errors;
mod events;
mod message;
mod participants;

pub use attachment::{Attachment, AttachmentPolicy, AttachmentRejection, MAX_ATTACHMENT_BYTES};
pub use conversation::Conversation;
pub use errors::ChatError;
pub use events::{
    ChatEventRoute, ConversationStarted, MessageSent, MessagesRead, CHAT_EVENT_TYPES,
    CONVERSATION_STARTED, MESSAGES_READ, MESSAGE_SENT,
};
pub use message::{Message, MessageKind, ReadReceipt, DEFAULT_MAX_MESSAGE_CHARS};
pub use participants::ParticipantPair;
