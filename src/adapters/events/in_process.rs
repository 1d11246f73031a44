//! In-process event bus.
//!
//! Delivers each published event to the handlers subscribed to its type,
//! in subscription order, before `publish` returns. A recording bus also
//! keeps every published envelope so tests can assert on them.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use crate::domain::foundation::{DomainError, ErrorCode, EventEnvelope};
use crate::ports::{EventHandler, EventPublisher, EventSubscriber};

/// Synchronous, in-process event bus.
///
/// ```ignore
/// let bus = Arc::new(InProcessEventBus::recording());
/// bus.publish(envelope).await?;
/// assert!(bus.has_event("message.sent.v1"));
/// ```
pub struct InProcessEventBus {
    handlers: RwLock<HashMap<String, Vec<Arc<dyn EventHandler>>>>,
    published: Option<RwLock<Vec<EventEnvelope>>>,
}

impl InProcessEventBus {
    /// Creates a bus that only dispatches.
    pub fn new() -> Self {
        Self {
            handlers: RwLock::new(HashMap::new()),
            published: None,
        }
    }

    /// Creates a bus that also records every published event.
    pub fn recording() -> Self {
        Self {
            handlers: RwLock::new(HashMap::new()),
            published: Some(RwLock::new(Vec::new())),
        }
    }

    // === Recording helpers ===

    /// All recorded events; empty for a non-recording bus.
    pub fn published_events(&self) -> Vec<EventEnvelope> {
        self.published
            .as_ref()
            .map(|p| p.read().unwrap_or_else(PoisonError::into_inner).clone())
            .unwrap_or_default()
    }

    pub fn events_of_type(&self, event_type: &str) -> Vec<EventEnvelope> {
        self.published_events()
            .into_iter()
            .filter(|e| e.event_type == event_type)
            .collect()
    }

    pub fn event_count(&self) -> usize {
        self.published_events().len()
    }

    pub fn has_event(&self, event_type: &str) -> bool {
        self.published_events()
            .iter()
            .any(|e| e.event_type == event_type)
    }

    pub fn clear(&self) {
        if let Some(published) = &self.published {
            published
                .write()
                .unwrap_or_else(PoisonError::into_inner)
                .clear();
        }
    }
}

impl Default for InProcessEventBus {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EventPublisher for InProcessEventBus {
    async fn publish(&self, event: EventEnvelope) -> Result<(), DomainError> {
        if let Some(published) = &self.published {
            published
                .write()
                .unwrap_or_else(PoisonError::into_inner)
                .push(event.clone());
        }

        // Clone handlers to release lock before await points
        let type_handlers: Vec<Arc<dyn EventHandler>> = {
            let handlers = self.handlers.read().unwrap_or_else(PoisonError::into_inner);
            handlers.get(&event.event_type).cloned().unwrap_or_default()
        };

        let mut errors = Vec::new();
        for handler in type_handlers {
            if let Err(e) = handler.handle(event.clone()).await {
                tracing::warn!(
                    handler = handler.name(),
                    event_type = %event.event_type,
                    error = %e,
                    "Event handler failed"
                );
                errors.push(format!("{}: {}", handler.name(), e));
            }
        }

        if !errors.is_empty() {
            return Err(DomainError::new(
                ErrorCode::InternalError,
                format!("Handler errors: {}", errors.join(", ")),
            ));
        }

        Ok(())
    }

    async fn publish_all(&self, events: Vec<EventEnvelope>) -> Result<(), DomainError> {
        let mut first_error = None;
        for event in events {
            if let Err(e) = self.publish(event).await {
                first_error.get_or_insert(e);
            }
        }
        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

impl EventSubscriber for InProcessEventBus {
    fn subscribe(&self, event_type: &str, handler: Arc<dyn EventHandler>) {
        self.handlers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(event_type.to_string())
            .or_default()
            .push(handler);
    }

    fn subscribe_all(&self, event_types: &[&str], handler: Arc<dyn EventHandler>) {
        let mut handlers = self.handlers.write().unwrap_or_else(PoisonError::into_inner);
        for event_type in event_types {
            handlers
                .entry(event_type.to_string())
                .or_default()
                .push(Arc::clone(&handler));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn envelope(event_type: &str) -> EventEnvelope {
        EventEnvelope::new(event_type, "conv-1", "Conversation", json!({}))
    }

    struct CountingHandler(Arc<AtomicUsize>);

    #[async_trait]
    impl EventHandler for CountingHandler {
        async fn handle(&self, _: EventEnvelope) -> Result<(), DomainError> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
        fn name(&self) -> &'static str {
            "CountingHandler"
        }
    }

    struct FailingHandler;

    #[async_trait]
    impl EventHandler for FailingHandler {
        async fn handle(&self, _: EventEnvelope) -> Result<(), DomainError> {
            Err(DomainError::new(ErrorCode::InternalError, "boom"))
        }
        fn name(&self) -> &'static str {
            "FailingHandler"
        }
    }

    #[tokio::test]
    async fn recording_bus_keeps_events() {
        let bus = InProcessEventBus::recording();
        bus.publish(envelope("message.sent.v1")).await.unwrap();
        bus.publish(envelope("messages.read.v1")).await.unwrap();

        assert_eq!(bus.event_count(), 2);
        assert_eq!(bus.events_of_type("message.sent.v1").len(), 1);
        assert!(bus.has_event("messages.read.v1"));

        bus.clear();
        assert_eq!(bus.event_count(), 0);
    }

    #[tokio::test]
    async fn plain_bus_records_nothing() {
        let bus = InProcessEventBus::new();
        bus.publish(envelope("message.sent.v1")).await.unwrap();
        assert_eq!(bus.event_count(), 0);
    }

    #[tokio::test]
    async fn handlers_only_receive_their_types() {
        let bus = InProcessEventBus::new();
        let counter = Arc::new(AtomicUsize::new(0));
        bus.subscribe_all(
            &["a.v1", "b.v1"],
            Arc::new(CountingHandler(counter.clone())),
        );

        bus.publish(envelope("a.v1")).await.unwrap();
        bus.publish(envelope("b.v1")).await.unwrap();
        bus.publish(envelope("c.v1")).await.unwrap();

        assert_eq!(counter.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn failing_handler_does_not_block_others() {
        let bus = InProcessEventBus::new();
        let counter = Arc::new(AtomicUsize::new(0));
        bus.subscribe("a.v1", Arc::new(FailingHandler));
        bus.subscribe("a.v1", Arc::new(CountingHandler(counter.clone())));

        let result = bus.publish(envelope("a.v1")).await;

        assert!(result.is_err());
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn publish_all_delivers_every_event_despite_errors() {
        let bus = InProcessEventBus::recording();
        bus.subscribe("a.v1", Arc::new(FailingHandler));

        let result = bus
            .publish_all(vec![envelope("a.v1"), envelope("b.v1")])
            .await;

        assert!(result.is_err());
        assert_eq!(bus.event_count(), 2);
    }
}
