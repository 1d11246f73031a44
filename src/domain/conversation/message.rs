//! Chat messages and read receipts.
//!
//! Messages are immutable once written. The only state that accrues on a
//! message afterwards is its read receipts.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::domain::foundation::{ConversationId, MessageId, Timestamp, UserId, ValidationError};

use super::Attachment;

/// Default ceiling on message length, in characters.
pub const DEFAULT_MAX_MESSAGE_CHARS: usize = 5000;

/// What a message carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MessageKind {
    Text,
    Image,
    File,
    /// Generated by the service, e.g. the welcome message.
    System,
}

impl MessageKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageKind::Text => "TEXT",
            MessageKind::Image => "IMAGE",
            MessageKind::File => "FILE",
            MessageKind::System => "SYSTEM",
        }
    }
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for MessageKind {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "TEXT" => Ok(MessageKind::Text),
            "IMAGE" => Ok(MessageKind::Image),
            "FILE" => Ok(MessageKind::File),
            "SYSTEM" => Ok(MessageKind::System),
            other => Err(ValidationError::invalid_format(
                "message_type",
                format!("unknown message type '{}'", other),
            )),
        }
    }
}

/// A record that `reader_id` has seen `message_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadReceipt {
    pub message_id: MessageId,
    pub reader_id: UserId,
    pub read_at: Timestamp,
}

/// A single message in a conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: MessageId,
    pub conversation_id: ConversationId,
    pub sender_id: UserId,
    pub receiver_id: UserId,
    pub content: String,
    #[serde(rename = "type")]
    pub kind: MessageKind,
    pub created_at: Timestamp,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attachment: Option<Attachment>,
    #[serde(default)]
    pub read_receipts: Vec<ReadReceipt>,
}

impl Message {
    /// Creates a text message.
    ///
    /// # Errors
    ///
    /// - `EmptyField` if the content is blank
    /// - `TooLong` if the trimmed content exceeds `max_chars`
    pub fn text(
        conversation_id: ConversationId,
        sender_id: UserId,
        receiver_id: UserId,
        content: &str,
        max_chars: usize,
    ) -> Result<Self, ValidationError> {
        let content = Self::validate_content(content, max_chars)?;
        Ok(Self::build(
            conversation_id,
            sender_id,
            receiver_id,
            content,
            MessageKind::Text,
            None,
        ))
    }

    /// Creates a message carrying a stored attachment. The caption becomes
    /// the content; without one the file name is used.
    ///
    /// # Errors
    ///
    /// - `TooLong` if the caption exceeds `max_chars`
    pub fn with_attachment(
        conversation_id: ConversationId,
        sender_id: UserId,
        receiver_id: UserId,
        caption: Option<&str>,
        attachment: Attachment,
        max_chars: usize,
    ) -> Result<Self, ValidationError> {
        let content = match caption.map(str::trim).filter(|c| !c.is_empty()) {
            Some(caption) => Self::validate_content(caption, max_chars)?,
            None => attachment.file_name.clone(),
        };
        let kind = attachment.kind();
        Ok(Self::build(
            conversation_id,
            sender_id,
            receiver_id,
            content,
            kind,
            Some(attachment),
        ))
    }

    /// The greeting written when a conversation is first created. It is
    /// always sent from the admin side to the student.
    pub fn system_welcome(
        conversation_id: ConversationId,
        admin_id: UserId,
        student_id: UserId,
        text: impl Into<String>,
    ) -> Self {
        Self::build(
            conversation_id,
            admin_id,
            student_id,
            text.into(),
            MessageKind::System,
            None,
        )
    }

    fn build(
        conversation_id: ConversationId,
        sender_id: UserId,
        receiver_id: UserId,
        content: String,
        kind: MessageKind,
        attachment: Option<Attachment>,
    ) -> Self {
        Self {
            id: MessageId::new(),
            conversation_id,
            sender_id,
            receiver_id,
            content,
            kind,
            created_at: Timestamp::now(),
            attachment,
            read_receipts: Vec::new(),
        }
    }

    /// Trims and length-checks message text, returning the stored form.
    pub fn validate_content(raw: &str, max_chars: usize) -> Result<String, ValidationError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(ValidationError::empty_field("content"));
        }
        let len = trimmed.chars().count();
        if len > max_chars {
            return Err(ValidationError::too_long("content", max_chars, len));
        }
        Ok(trimmed.to_string())
    }

    pub fn is_read_by(&self, user: &UserId) -> bool {
        self.read_receipts.iter().any(|r| &r.reader_id == user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::AttachmentId;

    fn uid(s: &str) -> UserId {
        UserId::new(s).unwrap()
    }

    fn attachment(file_type: &str) -> Attachment {
        Attachment {
            id: AttachmentId::new(),
            file_name: "brief.pdf".to_string(),
            file_url: "/files/brief.pdf".to_string(),
            file_type: file_type.to_string(),
            file_size: 42,
            checksum: "abc".to_string(),
        }
    }

    #[test]
    fn text_trims_content() {
        let msg = Message::text(ConversationId::new(), uid("s"), uid("a"), "  hi  ", 10).unwrap();
        assert_eq!(msg.content, "hi");
        assert_eq!(msg.kind, MessageKind::Text);
        assert!(msg.read_receipts.is_empty());
    }

    #[test]
    fn text_rejects_blank_content() {
        let err = Message::text(ConversationId::new(), uid("s"), uid("a"), " \n ", 10).unwrap_err();
        assert_eq!(err, ValidationError::empty_field("content"));
    }

    #[test]
    fn text_length_counts_characters_not_bytes() {
        assert!(Message::text(ConversationId::new(), uid("s"), uid("a"), "ééééé", 5).is_ok());
        let err = Message::text(ConversationId::new(), uid("s"), uid("a"), "ééééé!", 5).unwrap_err();
        assert_eq!(err, ValidationError::too_long("content", 5, 6));
    }

    #[test]
    fn attachment_without_caption_uses_file_name() {
        let msg = Message::with_attachment(
            ConversationId::new(),
            uid("s"),
            uid("a"),
            Some("   "),
            attachment("application/pdf"),
            100,
        )
        .unwrap();
        assert_eq!(msg.content, "brief.pdf");
        assert_eq!(msg.kind, MessageKind::File);
    }

    #[test]
    fn image_attachment_produces_image_message() {
        let msg = Message::with_attachment(
            ConversationId::new(),
            uid("s"),
            uid("a"),
            Some("see this"),
            attachment("image/png"),
            100,
        )
        .unwrap();
        assert_eq!(msg.content, "see this");
        assert_eq!(msg.kind, MessageKind::Image);
    }

    #[test]
    fn welcome_is_a_system_message_from_admin() {
        let msg = Message::system_welcome(ConversationId::new(), uid("admin"), uid("student"), "Hi");
        assert_eq!(msg.kind, MessageKind::System);
        assert_eq!(msg.sender_id, uid("admin"));
        assert_eq!(msg.receiver_id, uid("student"));
    }

    #[test]
    fn serializes_kind_as_type() {
        let msg = Message::text(ConversationId::new(), uid("s"), uid("a"), "yo", 10).unwrap();
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["type"], "TEXT");
        assert_eq!(json["senderId"], "s");
        assert!(json.get("attachment").is_none());
        assert_eq!(json["readReceipts"], serde_json::json!([]));
    }

    #[test]
    fn is_read_by_checks_receipts() {
        let mut msg = Message::text(ConversationId::new(), uid("s"), uid("a"), "yo", 10).unwrap();
        assert!(!msg.is_read_by(&uid("a")));
        msg.read_receipts.push(ReadReceipt {
            message_id: msg.id,
            reader_id: uid("a"),
            read_at: Timestamp::now(),
        });
        assert!(msg.is_read_by(&uid("a")));
    }

    #[test]
    fn kind_parses_from_storage_form() {
        assert_eq!("IMAGE".parse::<MessageKind>().unwrap(), MessageKind::Image);
        assert!("VIDEO".parse::<MessageKind>().is_err());
    }
}
