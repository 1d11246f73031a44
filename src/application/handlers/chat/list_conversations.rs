//! ListConversationsHandler - the caller's conversations, newest activity first.

use std::collections::HashMap;
use std::sync::Arc;

use crate::domain::conversation::ChatError;
use crate::domain::foundation::UserId;
use crate::domain::user::ChatUser;
use crate::ports::{ConversationReader, ConversationSummary, UserDirectory};

#[derive(Debug, Clone)]
pub struct ListConversationsQuery {
    pub user_id: UserId,
}

/// A conversation summary with the counterpart's directory profile.
#[derive(Debug, Clone)]
pub struct ConversationListItem {
    pub summary: ConversationSummary,
    /// `None` if the counterpart has since left the directory.
    pub counterpart: Option<ChatUser>,
}

pub struct ListConversationsHandler {
    reader: Arc<dyn ConversationReader>,
    users: Arc<dyn UserDirectory>,
}

impl ListConversationsHandler {
    pub fn new(reader: Arc<dyn ConversationReader>, users: Arc<dyn UserDirectory>) -> Self {
        Self { reader, users }
    }

    pub async fn handle(
        &self,
        query: ListConversationsQuery,
    ) -> Result<Vec<ConversationListItem>, ChatError> {
        let summaries = self.reader.list_for_user(&query.user_id).await?;

        let mut profiles: HashMap<UserId, Option<ChatUser>> = HashMap::new();
        let mut items = Vec::with_capacity(summaries.len());
        for summary in summaries {
            let counterpart = match profiles.get(&summary.counterpart_id) {
                Some(cached) => cached.clone(),
                None => {
                    let found = self.users.find_by_id(&summary.counterpart_id).await?;
                    profiles.insert(summary.counterpart_id.clone(), found.clone());
                    found
                }
            };
            items.push(ConversationListItem {
                summary,
                counterpart,
            });
        }
        Ok(items)
    }
}

#[cfg(test)]
mod tests {
    use super::super::testing::*;
    use super::*;
    use crate::domain::conversation::Message;
    use crate::ports::ConversationRepository;

    fn handler(fx: &Fixture) -> ListConversationsHandler {
        ListConversationsHandler::new(Arc::new(fx.store.clone()), Arc::new(fx.users.clone()))
    }

    fn query(user: &str) -> ListConversationsQuery {
        ListConversationsQuery { user_id: uid(user) }
    }

    #[tokio::test]
    async fn lists_only_own_conversations_with_counterpart_profiles() {
        let fx = Fixture::new();
        fx.conversation(STUDENT, ADMIN).await;
        fx.conversation(STUDENT, OTHER_ADMIN).await;
        fx.conversation(OTHER_STUDENT, ADMIN).await;

        let items = handler(&fx).handle(query(STUDENT)).await.unwrap();

        assert_eq!(items.len(), 2);
        for item in &items {
            let counterpart = item.counterpart.as_ref().unwrap();
            assert_eq!(counterpart.id, item.summary.counterpart_id);
            assert!(counterpart.id.as_str().starts_with("admin"));
        }
    }

    #[tokio::test]
    async fn most_recent_activity_comes_first() {
        let fx = Fixture::new();
        let quiet = fx.conversation(STUDENT, ADMIN).await;
        let busy = fx.conversation(STUDENT, OTHER_ADMIN).await;

        let mut m = Message::text(quiet.id(), uid(ADMIN), uid(STUDENT), "ping", 100).unwrap();
        m.created_at = busy.updated_at().plus_millis(1_000);
        fx.store.append_message(&m).await.unwrap();

        let items = handler(&fx).handle(query(STUDENT)).await.unwrap();

        assert_eq!(items[0].summary.id, quiet.id());
        assert_eq!(items[0].summary.unread_count, 1);
        assert_eq!(items[1].summary.id, busy.id());
    }

    #[tokio::test]
    async fn user_without_conversations_gets_empty_list() {
        let fx = Fixture::new();
        fx.conversation(STUDENT, ADMIN).await;

        let items = handler(&fx).handle(query(OTHER_ADMIN)).await.unwrap();
        assert!(items.is_empty());
    }

    #[tokio::test]
    async fn missing_counterpart_profile_is_none() {
        let fx = Fixture::new();
        fx.conversation(STUDENT, "admin-gone").await;

        let items = handler(&fx).handle(query(STUDENT)).await.unwrap();
        assert_eq!(items.len(), 1);
        assert!(items[0].counterpart.is_none());
    }
}
