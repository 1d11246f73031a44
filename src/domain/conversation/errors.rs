//! Conversation-specific error types.

use thiserror::Error;

use crate::domain::foundation::{ConversationId, DomainError, ErrorCode, UserId, ValidationError};

use super::AttachmentRejection;

/// Errors raised by chat operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChatError {
    #[error("Conversation not found: {0}")]
    NotFound(ConversationId),

    #[error("User not found: {0}")]
    UserNotFound(UserId),

    #[error("{0}")]
    Forbidden(String),

    #[error("Validation failed for '{field}': {message}")]
    Validation { field: String, message: String },

    #[error("Attachment rejected: {0}")]
    AttachmentRejected(AttachmentRejection),

    #[error("Error: {0}")]
    Infrastructure(String),
}

impl ChatError {
    pub fn forbidden(reason: impl Into<String>) -> Self {
        ChatError::Forbidden(reason.into())
    }

    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        ChatError::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn infrastructure(message: impl Into<String>) -> Self {
        ChatError::Infrastructure(message.into())
    }

    pub fn code(&self) -> ErrorCode {
        match self {
            ChatError::NotFound(_) => ErrorCode::ConversationNotFound,
            ChatError::UserNotFound(_) => ErrorCode::UserNotFound,
            ChatError::Forbidden(_) => ErrorCode::Forbidden,
            ChatError::Validation { .. } | ChatError::AttachmentRejected(_) => {
                ErrorCode::ValidationFailed
            }
            ChatError::Infrastructure(_) => ErrorCode::InternalError,
        }
    }
}

impl From<ValidationError> for ChatError {
    fn from(err: ValidationError) -> Self {
        ChatError::Validation {
            field: err.field().to_string(),
            message: err.to_string(),
        }
    }
}

impl From<AttachmentRejection> for ChatError {
    fn from(rejection: AttachmentRejection) -> Self {
        ChatError::AttachmentRejected(rejection)
    }
}

impl From<DomainError> for ChatError {
    fn from(err: DomainError) -> Self {
        match err.code {
            ErrorCode::ValidationFailed => ChatError::Validation {
                field: err.details.get("field").cloned().unwrap_or_default(),
                message: err.message,
            },
            ErrorCode::Forbidden | ErrorCode::Unauthorized => ChatError::Forbidden(err.message),
            _ => ChatError::Infrastructure(err.to_string()),
        }
    }
}
