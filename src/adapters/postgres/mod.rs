//! PostgreSQL adapters for the chat persistence ports.
//!
//! - `PostgresConversationRepository` - lookup-or-create, messages, receipts
//! - `PostgresConversationReader` - conversation list and message history
//! - `PostgresUserDirectory` - roles and verification from `chat_users`

mod conversation_reader;
mod conversation_repository;
mod rows;
mod user_directory;

pub use conversation_reader::PostgresConversationReader;
pub use conversation_repository::PostgresConversationRepository;
pub use user_directory::PostgresUserDirectory;

/// Embedded schema migrations.
pub static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!();
