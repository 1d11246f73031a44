use serde::Serialize;

use super::Role;
use crate::domain::foundation::UserId;

/// A user record from the directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatUser {
    pub id: UserId,
    pub role: Role,
    pub verified: bool,
    pub display_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

impl ChatUser {
    pub fn new(id: UserId, role: Role, display_name: impl Into<String>) -> Self {
        Self {
            id,
            role,
            verified: true,
            display_name: display_name.into(),
            email: None,
        }
    }

    pub fn unverified(mut self) -> Self {
        self.verified = false;
        self
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    /// Whether this user may chat with `other`.
    pub fn can_chat_with(&self, other: &ChatUser) -> bool {
        self.id != other.id && self.role == other.role.counterpart()
    }
}
