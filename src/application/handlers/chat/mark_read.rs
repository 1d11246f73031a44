//! MarkReadHandler - records read receipts for a conversation.

use std::sync::Arc;

use crate::domain::conversation::{ChatError, MessagesRead};
use crate::domain::foundation::{CommandMetadata, ConversationId, EventId, MessageId, Timestamp};
use crate::ports::{ConversationRepository, EventPublisher};

use super::access::{envelope_for, publish_best_effort};
use super::ChatAccess;

#[derive(Debug, Clone)]
pub struct MarkReadCommand {
    pub conversation_id: ConversationId,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkReadResult {
    /// Messages that gained a receipt from this call. Empty when everything
    /// was already read.
    pub message_ids: Vec<MessageId>,
    pub read_at: Timestamp,
}

/// Marks every message addressed to the caller as read.
pub struct MarkReadHandler {
    access: ChatAccess,
    repository: Arc<dyn ConversationRepository>,
    event_publisher: Arc<dyn EventPublisher>,
}

impl MarkReadHandler {
    pub fn new(
        access: ChatAccess,
        repository: Arc<dyn ConversationRepository>,
        event_publisher: Arc<dyn EventPublisher>,
    ) -> Self {
        Self {
            access,
            repository,
            event_publisher,
        }
    }

    pub async fn handle(
        &self,
        cmd: MarkReadCommand,
        metadata: CommandMetadata,
    ) -> Result<MarkReadResult, ChatError> {
        let conversation = self
            .access
            .participant_conversation(&cmd.conversation_id, &metadata.user_id)
            .await?;

        let read_at = Timestamp::now();
        let message_ids = self
            .repository
            .mark_read(&conversation.id(), &metadata.user_id, read_at)
            .await?;

        if !message_ids.is_empty() {
            tracing::debug!(
                conversation_id = %conversation.id(),
                reader = %metadata.user_id,
                count = message_ids.len(),
                "Messages marked read"
            );
            let event = MessagesRead {
                event_id: EventId::new(),
                conversation_id: conversation.id(),
                participants: conversation.participants().clone(),
                reader_id: metadata.user_id.clone(),
                message_ids: message_ids.clone(),
                read_at,
            };
            publish_best_effort(
                self.event_publisher.as_ref(),
                envelope_for(&event, &metadata).into_iter().collect(),
            )
            .await;
        }

        Ok(MarkReadResult {
            message_ids,
            read_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::super::testing::*;
    use super::*;
    use crate::domain::conversation::{Message, MESSAGES_READ};
    use crate::ports::ConversationReader;

    fn handler(fx: &Fixture) -> MarkReadHandler {
        MarkReadHandler::new(fx.access(), Arc::new(fx.store.clone()), fx.bus.clone())
    }

    fn mark(conversation_id: ConversationId) -> MarkReadCommand {
        MarkReadCommand { conversation_id }
    }

    async fn append(fx: &Fixture, conversation_id: ConversationId, from: &str, to: &str) -> Message {
        let message = Message::text(conversation_id, uid(from), uid(to), "hello", 100).unwrap();
        fx.store.append_message(&message).await.unwrap();
        message
    }

    #[tokio::test]
    async fn marks_messages_received_by_reader() {
        let fx = Fixture::new();
        let conv = fx.conversation(STUDENT, ADMIN).await;
        let incoming = append(&fx, conv.id(), STUDENT, ADMIN).await;
        append(&fx, conv.id(), ADMIN, STUDENT).await;

        let result = handler(&fx).handle(mark(conv.id()), meta(ADMIN)).await.unwrap();

        assert_eq!(result.message_ids, vec![incoming.id]);
        let list = fx.store.list_for_user(&uid(ADMIN)).await.unwrap();
        assert_eq!(list[0].unread_count, 0);
    }

    #[tokio::test]
    async fn second_call_records_nothing_and_publishes_once() {
        let fx = Fixture::new();
        let conv = fx.conversation(STUDENT, ADMIN).await;
        append(&fx, conv.id(), STUDENT, ADMIN).await;
        let h = handler(&fx);

        let first = h.handle(mark(conv.id()), meta(ADMIN)).await.unwrap();
        let second = h.handle(mark(conv.id()), meta(ADMIN)).await.unwrap();

        assert_eq!(first.message_ids.len(), 1);
        assert!(second.message_ids.is_empty());
        assert_eq!(fx.bus.events_of_type(MESSAGES_READ).len(), 1);

        let page = fx.store.messages(&conv.id(), 0, 10).await.unwrap();
        assert_eq!(page.items[0].read_receipts.len(), 1);
    }

    #[tokio::test]
    async fn published_event_names_reader_and_messages() {
        let fx = Fixture::new();
        let conv = fx.conversation(STUDENT, ADMIN).await;
        let incoming = append(&fx, conv.id(), ADMIN, STUDENT).await;

        handler(&fx).handle(mark(conv.id()), meta(STUDENT)).await.unwrap();

        let events = fx.bus.events_of_type(MESSAGES_READ);
        let payload: MessagesRead = events[0].payload_as().unwrap();
        assert_eq!(payload.reader_id, uid(STUDENT));
        assert_eq!(payload.message_ids, vec![incoming.id]);
        assert!(payload.participants.contains(&uid(ADMIN)));
    }

    #[tokio::test]
    async fn non_participant_is_forbidden() {
        let fx = Fixture::new();
        let conv = fx.conversation(STUDENT, ADMIN).await;

        let err = handler(&fx)
            .handle(mark(conv.id()), meta(OTHER_ADMIN))
            .await
            .unwrap_err();
        assert!(matches!(err, ChatError::Forbidden(_)));
    }

    #[tokio::test]
    async fn missing_conversation_is_not_found() {
        let fx = Fixture::new();
        let missing = ConversationId::new();

        let err = handler(&fx).handle(mark(missing), meta(ADMIN)).await.unwrap_err();
        assert_eq!(err, ChatError::NotFound(missing));
    }
}
