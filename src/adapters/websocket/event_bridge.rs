//! Bridge from chat domain events to user topics.
//!
//! ```text
//! EventPublisher ──► ChatDeliveryBridge ──► DeliveryBus
//!                      │  transform              ├── topic(low)
//!                      │  route to both users    └── topic(high)
//! ```
//!
//! Every chat event payload carries its participant pair, so routing needs
//! no storage lookup.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;

use crate::domain::conversation::{
    ChatEventRoute, ConversationStarted, MessageSent, MessagesRead, CHAT_EVENT_TYPES,
    CONVERSATION_STARTED, MESSAGES_READ, MESSAGE_SENT,
};
use crate::domain::foundation::{DomainError, ErrorCode, EventEnvelope};
use crate::ports::{ChatUpdate, ChatUpdateType, DeliveryBus, EventHandler, EventSubscriber};

/// Forwards chat events to both participants' topics.
pub struct ChatDeliveryBridge {
    bus: Arc<dyn DeliveryBus>,
}

impl ChatDeliveryBridge {
    pub fn new(bus: Arc<dyn DeliveryBus>) -> Self {
        Self { bus }
    }

    pub fn new_shared(bus: Arc<dyn DeliveryBus>) -> Arc<Self> {
        Arc::new(Self::new(bus))
    }

    /// Subscribes this bridge to every chat event type.
    ///
    /// ```ignore
    /// let bridge = ChatDeliveryBridge::new_shared(rooms);
    /// bridge.register(event_bus.as_ref());
    /// ```
    pub fn register(self: &Arc<Self>, subscriber: &dyn EventSubscriber) {
        subscriber.subscribe_all(&CHAT_EVENT_TYPES, self.clone());
    }

    /// Builds the client-facing update. `None` for unrelated event types.
    fn transform(event: &EventEnvelope) -> Result<Option<ChatUpdate>, serde_json::Error> {
        let (update_type, data) = match event.event_type.as_str() {
            CONVERSATION_STARTED => {
                let started: ConversationStarted = event.payload_as()?;
                (
                    ChatUpdateType::ConversationStarted,
                    json!({
                        "conversationId": started.conversation_id,
                        "participants": started.participants,
                        "startedBy": started.started_by,
                        "startedAt": started.started_at,
                    }),
                )
            }
            MESSAGE_SENT => {
                let sent: MessageSent = event.payload_as()?;
                (
                    ChatUpdateType::MessageCreated,
                    json!({
                        "conversationId": sent.conversation_id,
                        "message": sent.message,
                    }),
                )
            }
            MESSAGES_READ => {
                let read: MessagesRead = event.payload_as()?;
                (
                    ChatUpdateType::MessagesRead,
                    json!({
                        "conversationId": read.conversation_id,
                        "readerId": read.reader_id,
                        "messageIds": read.message_ids,
                        "readAt": read.read_at,
                    }),
                )
            }
            _ => return Ok(None),
        };

        Ok(Some(ChatUpdate {
            update_type,
            data,
            timestamp: event.occurred_at,
            correlation_id: event.metadata.correlation_id.clone(),
        }))
    }
}

#[async_trait]
impl EventHandler for ChatDeliveryBridge {
    async fn handle(&self, event: EventEnvelope) -> Result<(), DomainError> {
        let malformed = |e: serde_json::Error| {
            DomainError::new(
                ErrorCode::InternalError,
                format!("Malformed {} payload: {}", event.event_type, e),
            )
        };

        let Some(update) = Self::transform(&event).map_err(malformed)? else {
            return Ok(());
        };
        let route: ChatEventRoute = event.payload_as().map_err(malformed)?;

        let mut failures = Vec::new();
        for user in route.participants.iter() {
            if let Err(e) = self.bus.deliver(user, update.clone()).await {
                tracing::warn!(
                    user_id = %user,
                    conversation_id = %route.conversation_id,
                    event_type = %event.event_type,
                    error = %e,
                    "Realtime delivery failed"
                );
                failures.push(e.to_string());
            }
        }

        if failures.is_empty() {
            Ok(())
        } else {
            Err(DomainError::new(
                ErrorCode::InternalError,
                format!("Delivery failed: {}", failures.join(", ")),
            ))
        }
    }

    fn name(&self) -> &'static str {
        "ChatDeliveryBridge"
    }
}
