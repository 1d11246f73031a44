//! EventPublisher port - Interface for publishing domain events.
//!
//! The application layer publishes without knowing whether events stay
//! in-process or leave the instance.

use async_trait::async_trait;

use crate::domain::foundation::{DomainError, EventEnvelope};

/// Port for publishing domain events.
///
/// Implementations must ensure:
/// - Handler failures for one event don't stop delivery to other handlers
/// - Errors in the transport itself are propagated to the caller
#[async_trait]
pub trait EventPublisher: Send + Sync {
    async fn publish(&self, event: EventEnvelope) -> Result<(), DomainError>;

    /// Publish several events in order.
    async fn publish_all(&self, events: Vec<EventEnvelope>) -> Result<(), DomainError>;
}
