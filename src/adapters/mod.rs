//! Adapters - Implementations of port interfaces.
//!
//! - `auth` - access-token validation (Zitadel, mock)
//! - `email` - oversized-upload alerts (Resend, log only)
//! - `events` - in-process event bus
//! - `http` - REST API, middleware and the application router
//! - `memory` - in-memory persistence for tests
//! - `postgres` - PostgreSQL persistence and migrations
//! - `storage` - attachment files on the local filesystem
//! - `websocket` - realtime delivery

pub mod auth;
pub mod email;
pub mod events;
pub mod http;
pub mod memory;
pub mod postgres;
pub mod storage;
pub mod websocket;

pub use events::InProcessEventBus;
