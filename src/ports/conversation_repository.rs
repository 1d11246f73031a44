//! Conversation repository port (write side).
//!
//! # Design
//!
//! - **Pair-scoped**: at most one conversation per normalized participant
//!   pair, enforced by the store rather than by callers
//! - **Message ownership**: messages and their attachments are written with
//!   the conversation's activity bump in one unit

use async_trait::async_trait;

use crate::domain::conversation::{Conversation, Message};
use crate::domain::foundation::{ConversationId, DomainError, MessageId, Timestamp, UserId};

/// Result of a lookup-or-create.
#[derive(Debug, Clone)]
pub struct OpenedConversation {
    pub conversation: Conversation,
    /// True when this call created the conversation.
    pub created: bool,
}

/// Repository port for conversation persistence.
#[async_trait]
pub trait ConversationRepository: Send + Sync {
    /// Returns the conversation for `candidate`'s participant pair, creating
    /// it from `candidate` if none exists.
    ///
    /// `welcome` is written together with a newly created conversation and
    /// ignored when the conversation already existed. Two concurrent calls
    /// for the same pair must resolve to the same conversation.
    async fn find_or_create(
        &self,
        candidate: &Conversation,
        welcome: Option<&Message>,
    ) -> Result<OpenedConversation, DomainError>;

    /// Returns `None` if not found.
    async fn find_by_id(&self, id: &ConversationId) -> Result<Option<Conversation>, DomainError>;

    /// Persists a message (with its attachment, if any) and moves the
    /// conversation's `updated_at` to the message's `created_at`.
    ///
    /// # Errors
    ///
    /// - `ConversationNotFound` if the conversation doesn't exist
    /// - `DatabaseError` on persistence failure
    async fn append_message(&self, message: &Message) -> Result<(), DomainError>;

    /// Records a receipt by `reader` for every message in the conversation
    /// addressed to `reader` that has none yet.
    ///
    /// Returns the ids of newly receipted messages; empty when nothing was
    /// unread.
    async fn mark_read(
        &self,
        conversation_id: &ConversationId,
        reader: &UserId,
        read_at: Timestamp,
    ) -> Result<Vec<MessageId>, DomainError>;
}
