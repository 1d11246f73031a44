//! In-memory adapters for persistence ports.
//!
//! Used by unit and integration tests.

mod chat_store;
mod user_directory;

pub use chat_store::InMemoryChatStore;
pub use user_directory::InMemoryUserDirectory;
