//! OpenConversationHandler - lookup-or-create of a student/admin conversation.

use std::sync::Arc;

use crate::domain::conversation::{
    ChatError, Conversation, ConversationStarted, Message, MessageSent,
};
use crate::domain::foundation::{CommandMetadata, EventId, UserId};
use crate::domain::user::{ChatUser, Role};
use crate::ports::{ConversationRepository, EventPublisher};

use super::access::{envelope_for, publish_best_effort};
use super::{ChatAccess, ChatSettings};

#[derive(Debug, Clone)]
pub struct OpenConversationCommand {
    pub other_user_id: UserId,
}

#[derive(Debug, Clone)]
pub struct OpenConversationResult {
    pub conversation: Conversation,
    pub counterpart: ChatUser,
    /// False when the conversation already existed.
    pub created: bool,
}

/// Returns the one conversation between the requester and another user,
/// creating it (with a welcome message) on first contact.
pub struct OpenConversationHandler {
    access: ChatAccess,
    repository: Arc<dyn ConversationRepository>,
    event_publisher: Arc<dyn EventPublisher>,
    settings: ChatSettings,
}

impl OpenConversationHandler {
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
        cmd: OpenConversationCommand,
        metadata: CommandMetadata,
    ) -> Result<OpenConversationResult, ChatError> {
        let requester = self.access.verified_user(&metadata.user_id).await?;

        if cmd.other_user_id == requester.id {
            return Err(ChatError::validation(
                "otherUserId",
                "Cannot open a conversation with yourself",
            ));
        }

        let other = self
            .access
            .users()
            .find_by_id(&cmd.other_user_id)
            .await?
            .ok_or_else(|| ChatError::UserNotFound(cmd.other_user_id.clone()))?;

        if !requester.can_chat_with(&other) {
            return Err(ChatError::forbidden(
                "Conversations are only allowed between a student and an admin",
            ));
        }
        if !other.verified {
            return Err(ChatError::forbidden("User is not available for chat"));
        }

        let candidate = Conversation::start(requester.id.clone(), other.id.clone())?;
        let welcome = self.welcome_message(&candidate, &requester, &other);

        let opened = self
            .repository
            .find_or_create(&candidate, welcome.as_ref())
            .await?;

        if opened.created {
            tracing::info!(
                conversation_id = %opened.conversation.id(),
                requester = %requester.id,
                "Conversation started"
            );
            self.publish_created(&opened.conversation, welcome, &metadata)
                .await;
        }

        Ok(OpenConversationResult {
            conversation: opened.conversation,
            counterpart: other,
            created: opened.created,
        })
    }

    /// The welcome message always goes from the admin to the student,
    /// whoever opened the conversation.
    fn welcome_message(
        &self,
        conversation: &Conversation,
        requester: &ChatUser,
        other: &ChatUser,
    ) -> Option<Message> {
        let text = self.settings.welcome_message.trim();
        if text.is_empty() {
            return None;
        }
        let (admin, student) = match requester.role {
            Role::Admin => (requester, other),
            Role::Student => (other, requester),
        };
        Some(Message::system_welcome(
            conversation.id(),
            admin.id.clone(),
            student.id.clone(),
            text,
        ))
    }

    async fn publish_created(
        &self,
        conversation: &Conversation,
        welcome: Option<Message>,
        metadata: &CommandMetadata,
    ) {
        let started = ConversationStarted {
            event_id: EventId::new(),
            conversation_id: conversation.id(),
            participants: conversation.participants().clone(),
            started_by: metadata.user_id.clone(),
            started_at: conversation.created_at(),
        };

        let mut envelopes: Vec<_> = envelope_for(&started, metadata).into_iter().collect();
        if let Some(welcome) = welcome {
            let sent = MessageSent::new(conversation.participants().clone(), welcome);
            envelopes.extend(envelope_for(&sent, metadata));
        }

        publish_best_effort(self.event_publisher.as_ref(), envelopes).await;
    }
}
