//! UploadAttachmentHandler - validates, stores and posts a file message.

use std::sync::Arc;

use crate::domain::conversation::{
    Attachment, AttachmentPolicy, AttachmentRejection, ChatError, Message, MessageSent,
};
use crate::domain::foundation::{
    AttachmentId, CommandMetadata, ConversationId, Timestamp, UserId,
};
use crate::ports::{
    AttachmentStorage, ConversationRepository, EventPublisher, OversizedUpload, StorageError,
    UploadAlertNotifier,
};

use super::access::{envelope_for, publish_best_effort};
use super::{resolve_receiver, ChatAccess, ChatSettings};

#[derive(Debug, Clone)]
pub struct UploadAttachmentCommand {
    pub conversation_id: ConversationId,
    pub receiver_id: Option<UserId>,
    pub file_name: String,
    /// As sent by the client; parameters such as charset are ignored.
    pub content_type: String,
    pub bytes: Vec<u8>,
    /// Message text; the file name is used when absent or blank.
    pub caption: Option<String>,
}

/// An upload whose body was abandoned once it passed the size limit.
#[derive(Debug, Clone)]
pub struct RejectOversizedCommand {
    pub conversation_id: ConversationId,
    pub file_name: String,
    pub content_type: String,
    /// Bytes read before the body was abandoned; a lower bound on the file size.
    pub received_bytes: u64,
}

pub struct UploadAttachmentHandler {
    access: ChatAccess,
    repository: Arc<dyn ConversationRepository>,
    storage: Arc<dyn AttachmentStorage>,
    alerts: Arc<dyn UploadAlertNotifier>,
    event_publisher: Arc<dyn EventPublisher>,
    policy: AttachmentPolicy,
    settings: ChatSettings,
}

impl UploadAttachmentHandler {
    pub fn new(
        access: ChatAccess,
        repository: Arc<dyn ConversationRepository>,
        storage: Arc<dyn AttachmentStorage>,
        alerts: Arc<dyn UploadAlertNotifier>,
        event_publisher: Arc<dyn EventPublisher>,
        policy: AttachmentPolicy,
        settings: ChatSettings,
    ) -> Self {
        Self {
            access,
            repository,
            storage,
            alerts,
            event_publisher,
            policy,
            settings,
        }
    }

    pub fn policy(&self) -> AttachmentPolicy {
        self.policy
    }

    pub async fn handle(
        &self,
        cmd: UploadAttachmentCommand,
        metadata: CommandMetadata,
    ) -> Result<Message, ChatError> {
        let conversation = self
            .access
            .participant_conversation(&cmd.conversation_id, &metadata.user_id)
            .await?;
        self.access.verified_user(&metadata.user_id).await?;

        let receiver =
            resolve_receiver(&conversation, &metadata.user_id, cmd.receiver_id.as_ref())?;

        // Nothing is stored until every check has passed.
        let caption = cmd
            .caption
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty());
        if let Some(caption) = caption {
            Message::validate_content(caption, self.settings.max_message_chars)?;
        }

        let file_name = cmd.file_name.trim().to_string();
        let size = cmd.bytes.len() as u64;
        if let Err(rejection) = self.policy.check(&file_name, &cmd.content_type, size) {
            if rejection.is_oversized() {
                self.alert_oversized(
                    cmd.conversation_id,
                    &metadata.user_id,
                    &cmd.file_name,
                    &cmd.content_type,
                    size,
                )
                .await;
            }
            tracing::info!(
                conversation_id = %conversation.id(),
                file_name = %file_name,
                size_bytes = size,
                reason = %rejection,
                "Attachment rejected"
            );
            return Err(rejection.into());
        }

        let attachment_id = AttachmentId::new();
        let stored = self
            .storage
            .store(conversation.id(), attachment_id, &file_name, &cmd.bytes)
            .await
            .map_err(storage_failure)?;

        let attachment = Attachment {
            id: attachment_id,
            file_name,
            file_url: stored.url.clone(),
            file_type: AttachmentPolicy::normalize_content_type(&cmd.content_type),
            file_size: stored.size_bytes,
            checksum: stored.checksum.clone(),
        };

        let message = Message::with_attachment(
            conversation.id(),
            metadata.user_id.clone(),
            receiver,
            caption,
            attachment,
            self.settings.max_message_chars,
        )?;

        if let Err(e) = self.repository.append_message(&message).await {
            if let Err(cleanup) = self.storage.delete(&stored.key).await {
                tracing::warn!(
                    key = %stored.key,
                    error = %cleanup,
                    "Failed to remove orphaned attachment"
                );
            }
            return Err(e.into());
        }

        tracing::info!(
            conversation_id = %conversation.id(),
            message_id = %message.id,
            size_bytes = stored.size_bytes,
            "Attachment uploaded"
        );

        let event = MessageSent::new(conversation.participants().clone(), message.clone());
        publish_best_effort(
            self.event_publisher.as_ref(),
            envelope_for(&event, &metadata).into_iter().collect(),
        )
        .await;

        Ok(message)
    }

    /// Rejects an upload that was cut off while streaming because it already
    /// exceeded the limit. Participants get the same rejection and alert as a
    /// fully buffered oversized file.
    pub async fn reject_oversized(
        &self,
        cmd: RejectOversizedCommand,
        metadata: CommandMetadata,
    ) -> ChatError {
        if let Err(e) = self
            .access
            .participant_conversation(&cmd.conversation_id, &metadata.user_id)
            .await
        {
            return e;
        }

        self.alert_oversized(
            cmd.conversation_id,
            &metadata.user_id,
            &cmd.file_name,
            &cmd.content_type,
            cmd.received_bytes,
        )
        .await;
        tracing::info!(
            conversation_id = %cmd.conversation_id,
            file_name = %cmd.file_name,
            received_bytes = cmd.received_bytes,
            "Oversized attachment abandoned while streaming"
        );

        AttachmentRejection::TooLarge {
            size: cmd.received_bytes,
            max: self.policy.max_bytes(),
        }
        .into()
    }

    async fn alert_oversized(
        &self,
        conversation_id: ConversationId,
        sender: &UserId,
        file_name: &str,
        content_type: &str,
        size_bytes: u64,
    ) {
        let attempt = OversizedUpload {
            conversation_id,
            sender_id: sender.clone(),
            file_name: file_name.to_string(),
            content_type: content_type.to_string(),
            size_bytes,
            max_bytes: self.policy.max_bytes(),
            attempted_at: Timestamp::now(),
        };
        if let Err(e) = self.alerts.oversized_upload(&attempt).await {
            tracing::warn!(error = %e, "Oversized upload alert failed");
        }
    }
}

fn storage_failure(err: StorageError) -> ChatError {
    match err {
        StorageError::InvalidFileName { name } => {
            ChatError::validation("file", format!("Invalid file name: {}", name))
        }
        other => {
            tracing::error!(error = %other, "Attachment storage failed");
            ChatError::infrastructure(other.to_string())
        }
    }
}
