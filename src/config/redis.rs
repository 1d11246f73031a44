//! Redis configuration

use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;

/// Redis settings for cross-instance realtime fan-out.
///
/// The section is optional; without it updates are delivered only to
/// sockets connected to the local process.
#[derive(Debug, Clone, Deserialize)]
pub struct RedisConfig {
    /// Redis connection URL
    pub url: String,

    /// Prefix for per-user channels (`{prefix}:user:{id}`)
    #[serde(default = "default_channel_prefix")]
    pub channel_prefix: String,

    /// Connection timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

impl RedisConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Validate Redis configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.url.is_empty() {
            return Err(ValidationError::MissingRequired("REDIS__URL"));
        }
        if !self.url.starts_with("redis://") && !self.url.starts_with("rediss://") {
            return Err(ValidationError::InvalidRedisUrl);
        }
        if self.channel_prefix.trim().is_empty() {
            return Err(ValidationError::MissingRequired("REDIS__CHANNEL_PREFIX"));
        }
        Ok(())
    }
}

impl Default for RedisConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            channel_prefix: default_channel_prefix(),
            timeout_secs: default_timeout(),
        }
    }
}

fn default_channel_prefix() -> String {
    "assignment-chat".to_string()
}

fn default_timeout() -> u64 {
    5
}
