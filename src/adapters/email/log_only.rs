//! Upload alerts that only write a log line, used when e-mail is not
//! configured.

use async_trait::async_trait;

use crate::ports::{AlertError, OversizedUpload, UploadAlertNotifier};

#[derive(Debug, Default, Clone, Copy)]
pub struct LogUploadAlert;

#[async_trait]
impl UploadAlertNotifier for LogUploadAlert {
    async fn oversized_upload(&self, attempt: &OversizedUpload) -> Result<(), AlertError> {
        tracing::warn!(
            conversation_id = %attempt.conversation_id,
            sender_id = %attempt.sender_id,
            file_name = %attempt.file_name,
            size_bytes = attempt.size_bytes,
            max_bytes = attempt.max_bytes,
            "Oversized upload rejected"
        );
        Ok(())
    }
}
