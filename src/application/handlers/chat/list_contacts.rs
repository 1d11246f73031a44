//! ListContactsHandler - users the caller may open a conversation with.

use std::sync::Arc;

use crate::domain::conversation::ChatError;
use crate::domain::foundation::UserId;
use crate::domain::user::ChatUser;
use crate::ports::UserDirectory;

#[derive(Debug, Clone)]
pub struct ListContactsQuery {
    pub user_id: UserId,
}

/// Verified users of the opposite role, sorted by display name.
pub struct ListContactsHandler {
    users: Arc<dyn UserDirectory>,
}

impl ListContactsHandler {
    pub fn new(users: Arc<dyn UserDirectory>) -> Self {
        Self { users }
    }

    pub async fn handle(&self, query: ListContactsQuery) -> Result<Vec<ChatUser>, ChatError> {
        let requester = self
            .users
            .find_by_id(&query.user_id)
            .await?
            .ok_or_else(|| ChatError::forbidden("User is not registered for chat"))?;

        let contacts = self
            .users
            .list_by_role(requester.role.counterpart(), true)
            .await?;
        Ok(contacts)
    }
}

#[cfg(test)]
mod tests {
    use super::super::testing::*;
    use super::*;
    use crate::domain::user::Role;

    fn handler(fx: &Fixture) -> ListContactsHandler {
        ListContactsHandler::new(Arc::new(fx.users.clone()))
    }

    fn query(user: &str) -> ListContactsQuery {
        ListContactsQuery { user_id: uid(user) }
    }

    #[tokio::test]
    async fn student_sees_admins_by_name() {
        let fx = Fixture::new();

        let contacts = handler(&fx).handle(query(STUDENT)).await.unwrap();

        let ids: Vec<_> = contacts.iter().map(|u| u.id.as_str()).collect();
        assert_eq!(ids, vec![ADMIN, OTHER_ADMIN]);
        assert!(contacts.iter().all(|u| u.role == Role::Admin));
    }

    #[tokio::test]
    async fn admin_sees_only_verified_students() {
        let fx = Fixture::new();

        let contacts = handler(&fx).handle(query(ADMIN)).await.unwrap();

        let ids: Vec<_> = contacts.iter().map(|u| u.id.as_str()).collect();
        assert_eq!(ids, vec![OTHER_STUDENT, STUDENT]);
    }

    #[tokio::test]
    async fn unknown_requester_is_forbidden() {
        let fx = Fixture::new();
        let err = handler(&fx).handle(query("stranger")).await.unwrap_err();
        assert!(matches!(err, ChatError::Forbidden(_)));
    }
}
