//! Realtime delivery port.
//!
//! Delivery is publish/subscribe keyed by user id: every open connection of
//! a user listens on that user's topic. Implementations exist for a single
//! instance (in-process rooms) and for several instances (Redis channels).

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::foundation::{Timestamp, UserId};

/// What changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChatUpdateType {
    ConversationStarted,
    MessageCreated,
    MessagesRead,
}

/// An update addressed to one user's topic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatUpdate {
    pub update_type: ChatUpdateType,
    pub data: serde_json::Value,
    pub timestamp: Timestamp,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub correlation_id: Option<String>,
}

/// Publishes updates onto user topics.
#[async_trait]
pub trait DeliveryBus: Send + Sync {
    /// Delivers to every connection `user` currently has. Having no
    /// connections is not an error.
    async fn deliver(&self, user: &UserId, update: ChatUpdate) -> Result<(), DeliveryError>;
}

#[derive(Debug, Clone, Error)]
pub enum DeliveryError {
    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Transport error: {0}")]
    Transport(String),
}
