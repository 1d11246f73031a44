//! HTTP routes for chat endpoints.

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use super::handlers::{
    list_contacts, list_conversations, list_messages, mark_read, open_conversation, send_message,
    upload_attachment, ChatHandlers,
};

/// Creates the chat router. Paths are absolute.
pub fn chat_routes(handlers: ChatHandlers) -> Router {
    Router::new()
        .route(
            "/api/conversations",
            get(list_conversations).post(open_conversation),
        )
        .route(
            "/api/conversations/:id/messages",
            get(list_messages).post(send_message),
        )
        .route(
            "/api/conversations/:id/attachments",
            post(upload_attachment).layer(DefaultBodyLimit::disable()),
        )
        .route("/api/conversations/:id/read", post(mark_read))
        .route("/api/contacts", get(list_contacts))
        .with_state(handlers)
}
