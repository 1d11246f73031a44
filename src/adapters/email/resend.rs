//! Resend adapter for oversized-upload alerts.
//!
//! ```ignore
//! let config = ResendConfig::new(api_key, "Assignment Chat <alerts@example.com>")
//!     .with_recipients(vec!["ops@example.com".to_string()]);
//! let notifier = ResendUploadAlert::new(config)?;
//! ```

use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, Secret};
use serde::Serialize;
use std::time::Duration;

use crate::ports::{AlertError, OversizedUpload, UploadAlertNotifier};

#[derive(Debug, Clone)]
pub struct ResendConfig {
    api_key: Secret<String>,
    /// "Name <address>" header value.
    pub from: String,
    pub recipients: Vec<String>,
    /// Default: https://api.resend.com
    pub base_url: String,
    pub timeout: Duration,
}

impl ResendConfig {
    pub fn new(api_key: impl Into<String>, from: impl Into<String>) -> Self {
        Self {
            api_key: Secret::new(api_key.into()),
            from: from.into(),
            recipients: Vec::new(),
            base_url: "https://api.resend.com".to_string(),
            timeout: Duration::from_secs(10),
        }
    }

    pub fn with_recipients(mut self, recipients: Vec<String>) -> Self {
        self.recipients = recipients;
        self
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    fn emails_url(&self) -> String {
        format!("{}/emails", self.base_url.trim_end_matches('/'))
    }
}

#[derive(Debug, Serialize)]
struct SendEmailRequest<'a> {
    from: &'a str,
    to: &'a [String],
    subject: String,
    text: String,
}

/// Sends one e-mail per oversized upload to the configured recipients.
pub struct ResendUploadAlert {
    config: ResendConfig,
    client: Client,
}

impl ResendUploadAlert {
    pub fn new(config: ResendConfig) -> Result<Self, AlertError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| AlertError::Transport(e.to_string()))?;
        Ok(Self { config, client })
    }

    fn build_request<'a>(&'a self, attempt: &OversizedUpload) -> SendEmailRequest<'a> {
        let subject = format!("Oversized upload rejected: {}", attempt.file_name);
        let text = format!(
            "An attachment was rejected for exceeding the size limit.\n\n\
             Conversation: {}\n\
             Sender: {}\n\
             File: {} ({})\n\
             Size: {} bytes (limit {} bytes)\n\
             At: {}\n",
            attempt.conversation_id,
            attempt.sender_id,
            attempt.file_name,
            attempt.content_type,
            attempt.size_bytes,
            attempt.max_bytes,
            attempt.attempted_at.to_rfc3339(),
        );
        SendEmailRequest {
            from: &self.config.from,
            to: &self.config.recipients,
            subject,
            text,
        }
    }
}

#[async_trait]
impl UploadAlertNotifier for ResendUploadAlert {
    async fn oversized_upload(&self, attempt: &OversizedUpload) -> Result<(), AlertError> {
        if self.config.recipients.is_empty() {
            tracing::debug!("No alert recipients configured, skipping e-mail");
            return Ok(());
        }

        let response = self
            .client
            .post(self.config.emails_url())
            .header(
                "Authorization",
                format!("Bearer {}", self.config.api_key.expose_secret()),
            )
            .json(&self.build_request(attempt))
            .send()
            .await
            .map_err(|e| AlertError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AlertError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        tracing::info!(
            conversation_id = %attempt.conversation_id,
            recipients = self.config.recipients.len(),
            "Oversized upload alert sent"
        );
        Ok(())
    }
}

impl std::fmt::Debug for ResendUploadAlert {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResendUploadAlert")
            .field("from", &self.config.from)
            .field("recipients", &self.config.recipients)
            .finish_non_exhaustive()
    }
}
