//! User directory port.
//!
//! The marketplace owns user records; the chat service only reads the
//! role, verification flag and display name it needs for authorization.

use async_trait::async_trait;

use crate::domain::foundation::{DomainError, UserId};
use crate::domain::user::{ChatUser, Role};

/// Read access to users that can take part in chat.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// Returns `None` if the user is unknown.
    async fn find_by_id(&self, id: &UserId) -> Result<Option<ChatUser>, DomainError>;

    /// Users holding `role`, optionally restricted to verified users.
    /// Ordered by display name.
    async fn list_by_role(
        &self,
        role: Role,
        verified_only: bool,
    ) -> Result<Vec<ChatUser>, DomainError>;
}
