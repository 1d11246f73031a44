//! Command infrastructure for CQRS handlers.
//!
//! Every handler takes a `CommandMetadata` rather than loose
//! `user_id`/`correlation_id` parameters, and copies it onto the events it
//! emits.

use serde::{Deserialize, Serialize};

use super::{EventEnvelope, UserId};

/// Context that flows through command processing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandMetadata {
    /// The user executing this command.
    pub user_id: UserId,

    /// Request id of the originating HTTP call or socket frame.
    #[serde(skip_serializing_if = "Option::is_none")]
    correlation_id: Option<String>,

    /// Where the command came from ("api", "websocket").
    #[serde(skip_serializing_if = "Option::is_none")]
    source: Option<String>,
}

impl CommandMetadata {
    pub fn new(user_id: UserId) -> Self {
        Self {
            user_id,
            correlation_id: None,
            source: None,
        }
    }

    pub fn with_correlation_id(mut self, id: impl Into<String>) -> Self {
        self.correlation_id = Some(id.into());
        self
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    pub fn correlation_id(&self) -> Option<&str> {
        self.correlation_id.as_deref()
    }

    pub fn source(&self) -> Option<&str> {
        self.source.as_deref()
    }

    /// Copies user and correlation context onto an outgoing event.
    pub fn stamp(&self, envelope: EventEnvelope) -> EventEnvelope {
        let envelope = envelope.with_user_id(self.user_id.as_str());
        match &self.correlation_id {
            Some(id) => envelope.with_correlation_id(id.clone()),
            None => envelope,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn user() -> UserId {
        UserId::new("student-1").unwrap()
    }

    #[test]
    fn new_has_no_optional_context() {
        let meta = CommandMetadata::new(user());
        assert!(meta.correlation_id().is_none());
        assert!(meta.source().is_none());
    }

    #[test]
    fn stamp_copies_user_and_correlation() {
        let meta = CommandMetadata::new(user())
            .with_correlation_id("req-1")
            .with_source("api");
        let envelope = meta.stamp(EventEnvelope::new("x.v1", "agg", "Agg", json!({})));

        assert_eq!(envelope.metadata.user_id.as_deref(), Some("student-1"));
        assert_eq!(envelope.metadata.correlation_id.as_deref(), Some("req-1"));
    }

    #[test]
    fn stamp_without_correlation_leaves_it_empty() {
        let envelope =
            CommandMetadata::new(user()).stamp(EventEnvelope::new("x.v1", "agg", "Agg", json!({})));
        assert!(envelope.metadata.correlation_id.is_none());
    }

    #[test]
    fn serialization_skips_missing_fields() {
        let json = serde_json::to_string(&CommandMetadata::new(user())).unwrap();
        assert!(!json.contains("correlation_id"));
        assert!(!json.contains("source"));
    }
}
