//! Application handlers.
//!
//! Command and query handlers that orchestrate domain operations.

pub mod chat;

pub use chat::{
    // Shared
    ChatAccess,
    ChatSettings,
    // Commands
    MarkReadCommand,
    MarkReadHandler,
    MarkReadResult,
    OpenConversationCommand,
    OpenConversationHandler,
    OpenConversationResult,
    RejectOversizedCommand,
    SendMessageCommand,
    SendMessageHandler,
    UploadAttachmentCommand,
    UploadAttachmentHandler,
    // Queries
    ConversationListItem,
    ListContactsHandler,
    ListContactsQuery,
    ListConversationsHandler,
    ListConversationsQuery,
    ListMessagesHandler,
    ListMessagesQuery,
};
