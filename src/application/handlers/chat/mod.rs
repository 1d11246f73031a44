//! Chat handlers - conversations between students and admins.
//!
//! Every operation authorizes against the user directory and the
//! conversation's participant pair before touching storage, then publishes
//! domain events for realtime delivery once the write has committed.

mod access;
mod list_contacts;
mod list_conversations;
mod list_messages;
mod mark_read;
mod open_conversation;
mod send_message;
mod upload_attachment;

#[cfg(test)]
mod testing;

pub use access::ChatAccess;
pub use list_contacts::{ListContactsHandler, ListContactsQuery};
pub use list_conversations::{ConversationListItem, ListConversationsHandler, ListConversationsQuery};
pub use list_messages::{ListMessagesHandler, ListMessagesQuery, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};
pub use mark_read::{MarkReadCommand, MarkReadHandler, MarkReadResult};
pub use open_conversation::{
    OpenConversationCommand, OpenConversationHandler, OpenConversationResult,
};
pub use send_message::{SendMessageCommand, SendMessageHandler};
pub use upload_attachment::{
    RejectOversizedCommand, UploadAttachmentCommand, UploadAttachmentHandler,
};

use crate::domain::conversation::{ChatError, Conversation, DEFAULT_MAX_MESSAGE_CHARS};
use crate::domain::foundation::UserId;

/// Tunables shared by the chat handlers.
#[derive(Debug, Clone)]
pub struct ChatSettings {
    /// Text of the system message written when a conversation is created.
    /// Blank disables the welcome message.
    pub welcome_message: String,
    pub max_message_chars: usize,
}

impl Default for ChatSettings {
    fn default() -> Self {
        Self {
            welcome_message:
                "Welcome! Send us your assignment details and an admin will reply shortly."
                    .to_string(),
            max_message_chars: DEFAULT_MAX_MESSAGE_CHARS,
        }
    }
}

/// Resolves the receiver of a message sent by `sender`. A client-supplied
/// receiver must be the other participant.
fn resolve_receiver(
    conversation: &Conversation,
    sender: &UserId,
    requested: Option<&UserId>,
) -> Result<UserId, ChatError> {
    let counterpart = conversation
        .counterpart_of(sender)
        .cloned()
        .ok_or_else(|| ChatError::forbidden("User is not a participant in this conversation"))?;

    match requested {
        Some(receiver) if receiver != &counterpart => Err(ChatError::validation(
            "receiverId",
            "Receiver must be the other participant of the conversation",
        )),
        _ => Ok(counterpart),
    }
}
