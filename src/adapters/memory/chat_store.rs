//! In-memory conversation store.
//!
//! Implements both the repository and the reader over one lock, so every
//! operation sees a consistent snapshot.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::conversation::{Conversation, Message, ParticipantPair, ReadReceipt};
use crate::domain::foundation::{
    ConversationId, DomainError, ErrorCode, MessageId, Timestamp, UserId,
};
use crate::ports::{
    ConversationReader, ConversationRepository, ConversationSummary, LastMessage, MessagePage,
    OpenedConversation,
};

#[derive(Debug, Default)]
struct ChatState {
    conversations: HashMap<ConversationId, Conversation>,
    by_pair: HashMap<ParticipantPair, ConversationId>,
    /// Insertion order doubles as chronological order.
    messages: Vec<Message>,
}

/// In-memory storage for conversations and messages.
#[derive(Debug, Clone, Default)]
pub struct InMemoryChatStore {
    state: Arc<RwLock<ChatState>>,
}

impl InMemoryChatStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn conversation_count(&self) -> usize {
        self.state.read().await.conversations.len()
    }

    pub async fn message_count(&self) -> usize {
        self.state.read().await.messages.len()
    }
}

fn not_found(id: &ConversationId) -> DomainError {
    DomainError::new(ErrorCode::ConversationNotFound, "Conversation not found")
        .with_detail("conversation_id", id.to_string())
}

#[async_trait]
impl ConversationRepository for InMemoryChatStore {
    async fn find_or_create(
        &self,
        candidate: &Conversation,
        welcome: Option<&Message>,
    ) -> Result<OpenedConversation, DomainError> {
        let mut state = self.state.write().await;

        if let Some(existing) = state
            .by_pair
            .get(candidate.participants())
            .and_then(|id| state.conversations.get(id))
        {
            return Ok(OpenedConversation {
                conversation: existing.clone(),
                created: false,
            });
        }

        let mut conversation = candidate.clone();
        if let Some(welcome) = welcome {
            conversation.touch(welcome.created_at);
            state.messages.push(welcome.clone());
        }
        state
            .by_pair
            .insert(conversation.participants().clone(), conversation.id());
        state
            .conversations
            .insert(conversation.id(), conversation.clone());

        Ok(OpenedConversation {
            conversation,
            created: true,
        })
    }

    async fn find_by_id(&self, id: &ConversationId) -> Result<Option<Conversation>, DomainError> {
        Ok(self.state.read().await.conversations.get(id).cloned())
    }

    async fn append_message(&self, message: &Message) -> Result<(), DomainError> {
        let mut state = self.state.write().await;
        let conversation = state
            .conversations
            .get_mut(&message.conversation_id)
            .ok_or_else(|| not_found(&message.conversation_id))?;
        conversation.touch(message.created_at);
        state.messages.push(message.clone());
        Ok(())
    }

    async fn mark_read(
        &self,
        conversation_id: &ConversationId,
        reader: &UserId,
        read_at: Timestamp,
    ) -> Result<Vec<MessageId>, DomainError> {
        let mut state = self.state.write().await;
        if !state.conversations.contains_key(conversation_id) {
            return Err(not_found(conversation_id));
        }

        let mut marked = Vec::new();
        for message in state.messages.iter_mut().filter(|m| {
            &m.conversation_id == conversation_id && &m.receiver_id == reader && !m.is_read_by(reader)
        }) {
            message.read_receipts.push(ReadReceipt {
                message_id: message.id,
                reader_id: reader.clone(),
                read_at,
            });
            marked.push(message.id);
        }
        Ok(marked)
    }
}

#[async_trait]
impl ConversationReader for InMemoryChatStore {
    async fn list_for_user(&self, user: &UserId) -> Result<Vec<ConversationSummary>, DomainError> {
        let state = self.state.read().await;

        let mut summaries: Vec<ConversationSummary> = state
            .conversations
            .values()
            .filter_map(|conversation| {
                let counterpart_id = conversation.counterpart_of(user)?.clone();
                let thread = state
                    .messages
                    .iter()
                    .filter(|m| m.conversation_id == conversation.id());

                let mut last_message: Option<&Message> = None;
                let mut unread_count = 0;
                for message in thread {
                    if last_message.map_or(true, |last| message.created_at >= last.created_at) {
                        last_message = Some(message);
                    }
                    if &message.receiver_id == user && !message.is_read_by(user) {
                        unread_count += 1;
                    }
                }

                Some(ConversationSummary {
                    id: conversation.id(),
                    counterpart_id,
                    last_message: last_message.map(LastMessage::from),
                    unread_count,
                    created_at: conversation.created_at(),
                    updated_at: conversation.updated_at(),
                })
            })
            .collect();

        summaries.sort_by(|a, b| {
            b.updated_at
                .cmp(&a.updated_at)
                .then_with(|| a.id.cmp(&b.id))
        });
        Ok(summaries)
    }

    async fn messages(
        &self,
        conversation_id: &ConversationId,
        offset: u32,
        limit: u32,
    ) -> Result<MessagePage, DomainError> {
        let state = self.state.read().await;
        let mut thread: Vec<&Message> = state
            .messages
            .iter()
            .filter(|m| &m.conversation_id == conversation_id)
            .collect();
        thread.sort_by_key(|m| m.created_at);

        Ok(MessagePage {
            total: thread.len() as u32,
            items: thread
                .into_iter()
                .skip(offset as usize)
                .take(limit as usize)
                .cloned()
                .collect(),
            offset,
            limit,
        })
    }
}
