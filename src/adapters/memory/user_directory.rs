//! In-memory user directory.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::foundation::{DomainError, UserId};
use crate::domain::user::{ChatUser, Role};
use crate::ports::UserDirectory;

/// User directory backed by a map. Seeded at construction or via `insert`.
#[derive(Debug, Clone, Default)]
pub struct InMemoryUserDirectory {
    users: Arc<RwLock<HashMap<UserId, ChatUser>>>,
}

impl InMemoryUserDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_users(users: impl IntoIterator<Item = ChatUser>) -> Self {
        Self {
            users: Arc::new(RwLock::new(
                users.into_iter().map(|u| (u.id.clone(), u)).collect(),
            )),
        }
    }

    pub async fn insert(&self, user: ChatUser) {
        self.users.write().await.insert(user.id.clone(), user);
    }
}

#[async_trait]
impl UserDirectory for InMemoryUserDirectory {
    async fn find_by_id(&self, id: &UserId) -> Result<Option<ChatUser>, DomainError> {
        Ok(self.users.read().await.get(id).cloned())
    }

    async fn list_by_role(
        &self,
        role: Role,
        verified_only: bool,
    ) -> Result<Vec<ChatUser>, DomainError> {
        let mut users: Vec<ChatUser> = self
            .users
            .read()
            .await
            .values()
            .filter(|u| u.role == role && (u.verified || !verified_only))
            .cloned()
            .collect();
        users.sort_by(|a, b| {
            a.display_name
                .to_lowercase()
                .cmp(&b.display_name.to_lowercase())
                .then_with(|| a.id.cmp(&b.id))
        });
        Ok(users)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(id: &str, role: Role, name: &str) -> ChatUser {
        ChatUser::new(UserId::new(id).unwrap(), role, name)
    }

    #[tokio::test]
    async fn list_by_role_filters_and_sorts() {
        let directory = InMemoryUserDirectory::with_users(vec![
            user("a2", Role::Admin, "zoe"),
            user("a1", Role::Admin, "Adam"),
            user("a3", Role::Admin, "bea").unverified(),
            user("s1", Role::Student, "Sam"),
        ]);

        let verified = directory.list_by_role(Role::Admin, true).await.unwrap();
        let names: Vec<_> = verified.iter().map(|u| u.display_name.as_str()).collect();
        assert_eq!(names, vec!["Adam", "zoe"]);

        let all = directory.list_by_role(Role::Admin, false).await.unwrap();
        assert_eq!(all.len(), 3);
    }

    #[tokio::test]
    async fn insert_makes_user_findable() {
        let directory = InMemoryUserDirectory::new();
        directory.insert(user("s1", Role::Student, "Sam")).await;

        let found = directory.find_by_id(&UserId::new("s1").unwrap()).await.unwrap();
        assert_eq!(found.unwrap().display_name, "Sam");
        assert!(directory
            .find_by_id(&UserId::new("nobody").unwrap())
            .await
            .unwrap()
            .is_none());
    }
}
