//! Chat behaviour configuration

use serde::Deserialize;

use super::error::ValidationError;
use crate::adapters::websocket::DEFAULT_ROOM_CAPACITY;
use crate::application::handlers::chat::ChatSettings;
use crate::domain::conversation::DEFAULT_MAX_MESSAGE_CHARS;

#[derive(Debug, Clone, Deserialize)]
pub struct ChatConfig {
    /// System message written into every new conversation. Empty disables it.
    #[serde(default = "default_welcome_message")]
    pub welcome_message: String,

    #[serde(default = "default_max_message_chars")]
    pub max_message_chars: usize,

    /// Buffered updates per connected user before slow sockets start lagging
    #[serde(default = "default_ws_channel_capacity")]
    pub ws_channel_capacity: usize,
}

impl ChatConfig {
    pub fn settings(&self) -> ChatSettings {
        ChatSettings {
            welcome_message: self.welcome_message.clone(),
            max_message_chars: self.max_message_chars,
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.max_message_chars == 0 {
            return Err(ValidationError::InvalidMessageLimit);
        }
        Ok(())
    }
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            welcome_message: default_welcome_message(),
            max_message_chars: default_max_message_chars(),
            ws_channel_capacity: default_ws_channel_capacity(),
        }
    }
}

fn default_welcome_message() -> String {
    ChatSettings::default().welcome_message
}

fn default_max_message_chars() -> usize {
    DEFAULT_MAX_MESSAGE_CHARS
}

fn default_ws_channel_capacity() -> usize {
    DEFAULT_ROOM_CAPACITY
}
