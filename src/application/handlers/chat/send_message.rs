//! SendMessageHandler - persists a text message and announces it.

use std::sync::Arc;

use crate::domain::conversation::{ChatError, Message, MessageSent};
use crate::domain::foundation::{CommandMetadata, ConversationId, UserId};
use crate::ports::{ConversationRepository, EventPublisher};

use super::access::{envelope_for, publish_best_effort};
use super::{resolve_receiver, ChatAccess, ChatSettings};

#[derive(Debug, Clone)]
pub struct SendMessageCommand {
    pub conversation_id: ConversationId,
    /// Optional; when present it must be the other participant.
    pub receiver_id: Option<UserId>,
    pub content: String,
}

pub struct SendMessageHandler {
    access: ChatAccess,
    repository: Arc<dyn ConversationRepository>,
    event_publisher: Arc<dyn EventPublisher>,
    settings: ChatSettings,
}

impl SendMessageHandler {
    pub fn new(
        access: ChatAccess,
        repository: Arc<dyn ConversationRepository>,
        event_publisher: Arc<dyn EventPublisher>,
        settings: ChatSettings,
    ) -> Self {
        Self {
            access,
            repository,
            event_publisher,
            settings,
        }
    }

    pub async fn handle(
        &self,
        cmd: SendMessageCommand,
        metadata: CommandMetadata,
    ) -> Result<Message, ChatError> {
        let conversation = self
            .access
            .participant_conversation(&cmd.conversation_id, &metadata.user_id)
            .await?;
        self.access.verified_user(&metadata.user_id).await?;

        let receiver =
            resolve_receiver(&conversation, &metadata.user_id, cmd.receiver_id.as_ref())?;

        let message = Message::text(
            conversation.id(),
            metadata.user_id.clone(),
            receiver,
            &cmd.content,
            self.settings.max_message_chars,
        )?;

        self.repository.append_message(&message).await?;

        tracing::debug!(
            conversation_id = %conversation.id(),
            message_id = %message.id,
            "Message sent"
        );

        let event = MessageSent::new(conversation.participants().clone(), message.clone());
        publish_best_effort(
            self.event_publisher.as_ref(),
            envelope_for(&event, &metadata).into_iter().collect(),
        )
        .await;

        Ok(message)
    }
}
