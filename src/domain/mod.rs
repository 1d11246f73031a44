//! Domain layer containing business logic and domain types.
//!
//! # Module Organization
//!
//! - `foundation` - Shared domain primitives (IDs, timestamps, errors, events)
//! - `user` - Chat roles and directory records
//! - `conversation` - Conversations, messages, attachments and read receipts

pub mod conversation;
pub mod foundation;
pub mod user;
