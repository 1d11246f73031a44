//! Authorization and publishing helpers shared by the chat handlers.

use std::sync::Arc;

use crate::domain::conversation::{ChatError, Conversation};
use crate::domain::foundation::{
    CommandMetadata, ConversationId, EventEnvelope, SerializableDomainEvent, UserId,
};
use crate::domain::user::ChatUser;
use crate::ports::{ConversationRepository, EventPublisher, UserDirectory};

/// Looks up the facts every chat operation authorizes against.
#[derive(Clone)]
pub struct ChatAccess {
    repository: Arc<dyn ConversationRepository>,
    users: Arc<dyn UserDirectory>,
}

impl ChatAccess {
    pub fn new(repository: Arc<dyn ConversationRepository>, users: Arc<dyn UserDirectory>) -> Self {
        Self { repository, users }
    }

    pub fn users(&self) -> &Arc<dyn UserDirectory> {
        &self.users
    }

    /// The acting user, who must be a verified directory user.
    pub async fn verified_user(&self, id: &UserId) -> Result<ChatUser, ChatError> {
        match self.users.find_by_id(id).await? {
            Some(user) if user.verified => Ok(user),
            Some(_) => Err(ChatError::forbidden("Account is not verified")),
            None => Err(ChatError::forbidden("User is not registered for chat")),
        }
    }

    /// The conversation, provided `user` is one of its participants.
    pub async fn participant_conversation(
        &self,
        id: &ConversationId,
        user: &UserId,
    ) -> Result<Conversation, ChatError> {
        let conversation = self
            .repository
            .find_by_id(id)
            .await?
            .ok_or(ChatError::NotFound(*id))?;

        if !conversation.includes(user) {
            return Err(ChatError::forbidden(
                "User is not a participant in this conversation",
            ));
        }
        Ok(conversation)
    }
}

/// Wraps an event for publishing, stamped with the command's context.
/// Serialization failures are logged and the event is dropped.
pub(crate) fn envelope_for<E>(event: &E, metadata: &CommandMetadata) -> Option<EventEnvelope>
where
    E: SerializableDomainEvent,
{
    match event.to_envelope() {
        Ok(envelope) => Some(metadata.stamp(envelope)),
        Err(e) => {
            tracing::error!(
                event_type = event.event_type(),
                error = %e,
                "Failed to serialize domain event"
            );
            None
        }
    }
}

/// Publishes after the write has committed. Failures are logged, never
/// surfaced: the write already happened and realtime delivery is
/// best-effort.
pub(crate) async fn publish_best_effort(
    publisher: &dyn EventPublisher,
    envelopes: Vec<EventEnvelope>,
) {
    if envelopes.is_empty() {
        return;
    }
    if let Err(e) = publisher.publish_all(envelopes).await {
        tracing::warn!(error = %e, "Publishing chat events failed");
    }
}
