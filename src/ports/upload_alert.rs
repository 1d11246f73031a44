//! Oversized-upload alerting port.
//!
//! Alerts are a side channel: callers log failures and carry on.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::foundation::{ConversationId, Timestamp, UserId};

/// An upload refused for exceeding the size limit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OversizedUpload {
    pub conversation_id: ConversationId,
    pub sender_id: UserId,
    pub file_name: String,
    pub content_type: String,
    pub size_bytes: u64,
    pub max_bytes: u64,
    pub attempted_at: Timestamp,
}

/// Notifies operators about rejected oversized uploads.
#[async_trait]
pub trait UploadAlertNotifier: Send + Sync {
    async fn oversized_upload(&self, attempt: &OversizedUpload) -> Result<(), AlertError>;
}

#[derive(Debug, Clone, Error)]
pub enum AlertError {
    #[error("Alert transport failed: {0}")]
    Transport(String),

    #[error("Alert rejected by provider ({status}): {body}")]
    Rejected { status: u16, body: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upload_alert_notifier_is_object_safe() {
        fn _accepts_dyn(_notifier: &dyn UploadAlertNotifier) {}
    }

    #[test]
    fn rejected_alert_displays_status() {
        let err = AlertError::Rejected {
            status: 422,
            body: "invalid from".to_string(),
        };
        assert_eq!(err.to_string(), "Alert rejected by provider (422): invalid from");
    }
}
