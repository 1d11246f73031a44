//! HTTP adapter for chat endpoints.
//!
//! - `GET /api/conversations` - the caller's conversations
//! - `POST /api/conversations` - find or create a conversation
//! - `GET /api/conversations/:id/messages` - message history
//! - `POST /api/conversations/:id/messages` - send a text message
//! - `POST /api/conversations/:id/attachments` - upload a file
//! - `POST /api/conversations/:id/read` - mark messages read
//! - `GET /api/contacts` - users the caller may chat with

pub mod dto;
pub mod handlers;
pub mod routes;

pub use dto::ErrorResponse;
pub use handlers::{chat_error_body, ChatHandlers, REQUEST_ID_HEADER};
pub use routes::chat_routes;
