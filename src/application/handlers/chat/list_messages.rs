//! ListMessagesHandler - paginated message history for a participant.

use std::sync::Arc;

use crate::domain::conversation::ChatError;
use crate::domain::foundation::{ConversationId, UserId};
use crate::ports::{ConversationReader, MessagePage};

use super::ChatAccess;

pub const DEFAULT_PAGE_SIZE: u32 = 50;
pub const MAX_PAGE_SIZE: u32 = 100;

#[derive(Debug, Clone)]
pub struct ListMessagesQuery {
    pub conversation_id: ConversationId,
    pub user_id: UserId,
    pub offset: Option<u32>,
    pub limit: Option<u32>,
}

impl ListMessagesQuery {
    /// Limit clamped to `1..=MAX_PAGE_SIZE`, defaulting to
    /// `DEFAULT_PAGE_SIZE`.
    pub fn effective_limit(&self) -> u32 {
        self.limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE)
    }
}

pub struct ListMessagesHandler {
    access: ChatAccess,
    reader: Arc<dyn ConversationReader>,
}

impl ListMessagesHandler {
    pub fn new(access: ChatAccess, reader: Arc<dyn ConversationReader>) -> Self {
        Self { access, reader }
    }

    pub async fn handle(&self, query: ListMessagesQuery) -> Result<MessagePage, ChatError> {
        let conversation = self
            .access
            .participant_conversation(&query.conversation_id, &query.user_id)
            .await?;

        let page = self
            .reader
            .messages(
                &conversation.id(),
                query.offset.unwrap_or(0),
                query.effective_limit(),
            )
            .await?;
        Ok(page)
    }
}

#[cfg(test)]
mod tests {
    use super::super::testing::*;
    use super::*;
    use crate::domain::conversation::Message;
    use crate::ports::ConversationRepository;

    fn handler(fx: &Fixture) -> ListMessagesHandler {
        ListMessagesHandler::new(fx.access(), Arc::new(fx.store.clone()))
    }

    fn query(conversation_id: ConversationId, user: &str) -> ListMessagesQuery {
        ListMessagesQuery {
            conversation_id,
            user_id: uid(user),
            offset: None,
            limit: None,
        }
    }

    #[tokio::test]
    async fn returns_history_oldest_first() {
        let fx = Fixture::new();
        let conv = fx.conversation(STUDENT, ADMIN).await;
        for (i, body) in ["first", "second"].iter().enumerate() {
            let mut m = Message::text(conv.id(), uid(STUDENT), uid(ADMIN), body, 100).unwrap();
            m.created_at = conv.created_at().plus_millis(i as i64 + 1);
            fx.store.append_message(&m).await.unwrap();
        }

        let page = handler(&fx).handle(query(conv.id(), ADMIN)).await.unwrap();

        assert_eq!(page.total, 2);
        assert_eq!(page.items[0].content, "first");
        assert_eq!(page.items[1].content, "second");
    }

    #[tokio::test]
    async fn page_reports_the_window_it_was_read_with() {
        let fx = Fixture::new();
        let conv = fx.conversation(STUDENT, ADMIN).await;
        let mut q = query(conv.id(), STUDENT);
        q.offset = Some(3);
        q.limit = Some(10_000);

        let page = handler(&fx).handle(q).await.unwrap();

        assert_eq!(page.offset, 3);
        assert_eq!(page.limit, MAX_PAGE_SIZE);
        assert!(page.items.is_empty());
    }

    #[tokio::test]
    async fn non_participant_is_forbidden() {
        let fx = Fixture::new();
        let conv = fx.conversation(STUDENT, ADMIN).await;

        let err = handler(&fx)
            .handle(query(conv.id(), OTHER_STUDENT))
            .await
            .unwrap_err();
        assert!(matches!(err, ChatError::Forbidden(_)));
    }

    #[tokio::test]
    async fn missing_conversation_is_not_found() {
        let fx = Fixture::new();
        let missing = ConversationId::new();

        let err = handler(&fx).handle(query(missing, STUDENT)).await.unwrap_err();
        assert_eq!(err, ChatError::NotFound(missing));
    }

    #[test]
    fn limit_is_defaulted_and_clamped() {
        let mut q = query(ConversationId::new(), STUDENT);
        assert_eq!(q.effective_limit(), DEFAULT_PAGE_SIZE);
        q.limit = Some(0);
        assert_eq!(q.effective_limit(), 1);
        q.limit = Some(10_000);
        assert_eq!(q.effective_limit(), MAX_PAGE_SIZE);
    }
}
