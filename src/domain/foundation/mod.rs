//! Foundation module - Shared domain primitives.
//!
//! Identifiers, timestamps, error types and event plumbing used by
//! every other part of the chat domain.

mod auth;
mod command;
mod errors;
mod events;
mod ids;
mod timestamp;

pub use auth::{AuthError, AuthenticatedUser};
pub use command::CommandMetadata;
pub use errors::{DomainError, ErrorCode, ValidationError};
pub use events::{
    domain_event, DomainEvent, EventEnvelope, EventId, EventMetadata, SerializableDomainEvent,
};
pub use ids::{AttachmentId, ConversationId, MessageId, UserId};
pub use timestamp::Timestamp;
