//! Email configuration

use secrecy::{ExposeSecret, Secret};
use serde::Deserialize;

use super::error::ValidationError;
use crate::adapters::email::ResendConfig;

/// Resend settings for oversized-upload alerts.
///
/// Optional; without it rejected uploads are only logged.
#[derive(Debug, Clone, Deserialize)]
pub struct EmailConfig {
    /// Resend API key
    pub resend_api_key: Secret<String>,

    #[serde(default = "default_from_email")]
    pub from_email: String,

    #[serde(default = "default_from_name")]
    pub from_name: String,

    /// Comma-separated addresses that receive upload alerts
    pub alert_recipients: Option<String>,
}

impl EmailConfig {
    /// Get formatted "From" header value
    pub fn from_header(&self) -> String {
        format!("{} <{}>", self.from_name, self.from_email)
    }

    pub fn alert_recipients_list(&self) -> Vec<String> {
        self.alert_recipients
            .as_deref()
            .map(|s| {
                s.split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Settings for the Resend alert adapter.
    pub fn resend_config(&self) -> ResendConfig {
        ResendConfig::new(self.resend_api_key.expose_secret().clone(), self.from_header())
            .with_recipients(self.alert_recipients_list())
    }

    /// Validate email configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        let key = self.resend_api_key.expose_secret();
        if key.is_empty() {
            return Err(ValidationError::MissingRequired("EMAIL__RESEND_API_KEY"));
        }
        if !key.starts_with("re_") {
            return Err(ValidationError::InvalidResendKey);
        }
        if !self.from_email.contains('@') {
            return Err(ValidationError::InvalidFromEmail);
        }
        if let Some(bad) = self
            .alert_recipients_list()
            .into_iter()
            .find(|r| !r.contains('@'))
        {
            return Err(ValidationError::InvalidAlertRecipient(bad));
        }
        Ok(())
    }
}

impl Default for EmailConfig {
    fn default() -> Self {
        Self {
            resend_api_key: Secret::new(String::new()),
            from_email: default_from_email(),
            from_name: default_from_name(),
            alert_recipients: None,
        }
    }
}

fn default_from_email() -> String {
    "noreply@assignment-chat.local".to_string()
}

fn default_from_name() -> String {
    "Assignment Chat".to_string()
}
