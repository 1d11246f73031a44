//! Assignment Chat - student/admin conversations with realtime delivery.
//!
//! Students and admins hold one conversation per pair. Messages carry text
//! or a single attachment, read receipts are tracked per reader, and every
//! change is pushed to both participants over a websocket at `/api/socket`.
//!
//! The crate follows a hexagonal layout:
//!
//! - `domain` - conversations, messages, attachments, roles
//! - `ports` - traits the application depends on
//! - `application` - command and query handlers
//! - `adapters` - HTTP, websocket, PostgreSQL, Zitadel, Resend, Redis
//! - `config` - environment-driven settings

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
