//! Application layer - Commands, Queries, and Handlers.
//!
//! This layer orchestrates domain operations and coordinates between ports.
//! Following CQRS, it separates command handlers (write) from query handlers (read).

pub mod handlers;

pub use handlers::{
    ChatAccess, ChatSettings, ConversationListItem, ListContactsHandler, ListContactsQuery,
    ListConversationsHandler, ListConversationsQuery, ListMessagesHandler, ListMessagesQuery,
    MarkReadCommand, MarkReadHandler, MarkReadResult, OpenConversationCommand,
    OpenConversationHandler, OpenConversationResult, RejectOversizedCommand, SendMessageCommand,
    SendMessageHandler, UploadAttachmentCommand, UploadAttachmentHandler,
};
