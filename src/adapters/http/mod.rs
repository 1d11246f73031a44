//! HTTP adapters - REST API and application router.

pub mod chat;
pub mod middleware;
pub mod router;

pub use chat::{chat_routes, ChatHandlers};
pub use router::{app_router, HttpSettings};
