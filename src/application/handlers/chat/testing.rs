//! Shared fixtures for chat handler tests.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::adapters::events::InProcessEventBus;
use crate::adapters::memory::{InMemoryChatStore, InMemoryUserDirectory};
use crate::domain::conversation::{Conversation, Message};
use crate::domain::foundation::{
    AttachmentId, CommandMetadata, ConversationId, DomainError, ErrorCode, MessageId, Timestamp,
    UserId,
};
use crate::domain::user::{ChatUser, Role};
use crate::ports::{
    AlertError, AttachmentStorage, ConversationRepository, OpenedConversation, OversizedUpload,
    StorageError, StoredFile, UploadAlertNotifier,
};

use super::{ChatAccess, ChatSettings};

pub const STUDENT: &str = "student-1";
pub const OTHER_STUDENT: &str = "student-2";
pub const UNVERIFIED_STUDENT: &str = "student-x";
pub const ADMIN: &str = "admin-1";
pub const OTHER_ADMIN: &str = "admin-2";

pub fn uid(s: &str) -> UserId {
    UserId::new(s).unwrap()
}

pub fn meta(user: &str) -> CommandMetadata {
    CommandMetadata::new(uid(user)).with_correlation_id("req-test")
}

pub struct Fixture {
    pub store: InMemoryChatStore,
    pub users: InMemoryUserDirectory,
    pub bus: Arc<InProcessEventBus>,
    pub settings: ChatSettings,
}

impl Fixture {
    pub fn new() -> Self {
        let users = InMemoryUserDirectory::with_users(vec![
            ChatUser::new(uid(STUDENT), Role::Student, "Sam Student"),
            ChatUser::new(uid(OTHER_STUDENT), Role::Student, "Olive Student"),
            ChatUser::new(uid(UNVERIFIED_STUDENT), Role::Student, "Xavier").unverified(),
            ChatUser::new(uid(ADMIN), Role::Admin, "Ada Admin"),
            ChatUser::new(uid(OTHER_ADMIN), Role::Admin, "Bo Admin"),
        ]);
        Self {
            store: InMemoryChatStore::new(),
            users,
            bus: Arc::new(InProcessEventBus::recording()),
            settings: ChatSettings::default(),
        }
    }

    pub fn access(&self) -> ChatAccess {
        ChatAccess::new(Arc::new(self.store.clone()), Arc::new(self.users.clone()))
    }

    /// Creates the conversation between two users directly in the store.
    pub async fn conversation(&self, a: &str, b: &str) -> Conversation {
        self.store
            .find_or_create(&Conversation::start(uid(a), uid(b)).unwrap(), None)
            .await
            .unwrap()
            .conversation
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Attachment storage
// ════════════════════════════════════════════════════════════════════════════

#[derive(Default)]
pub struct RecordingStorage {
    pub files: Mutex<HashMap<String, Vec<u8>>>,
    pub fail: bool,
}

impl RecordingStorage {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn file_count(&self) -> usize {
        self.files.lock().unwrap().len()
    }
}

#[async_trait]
impl AttachmentStorage for RecordingStorage {
    async fn store(
        &self,
        conversation_id: ConversationId,
        attachment_id: AttachmentId,
        file_name: &str,
        bytes: &[u8],
    ) -> Result<StoredFile, StorageError> {
        if self.fail {
            return Err(StorageError::io("disk full"));
        }
        let key = format!("{}/{}-{}", conversation_id, attachment_id, file_name);
        self.files
            .lock()
            .unwrap()
            .insert(key.clone(), bytes.to_vec());
        Ok(StoredFile {
            url: format!("/files/{}", key),
            key,
            size_bytes: bytes.len() as u64,
            checksum: "checksum".to_string(),
        })
    }

    async fn delete(&self, key: &str) -> Result<(), StorageError> {
        self.files
            .lock()
            .unwrap()
            .remove(key)
            .map(|_| ())
            .ok_or_else(|| StorageError::NotFound {
                path: key.to_string(),
            })
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Upload alerts
// ════════════════════════════════════════════════════════════════════════════

#[derive(Default)]
pub struct RecordingAlerts {
    pub sent: Mutex<Vec<OversizedUpload>>,
    pub fail: bool,
}

impl RecordingAlerts {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }
}

#[async_trait]
impl UploadAlertNotifier for RecordingAlerts {
    async fn oversized_upload(&self, attempt: &OversizedUpload) -> Result<(), AlertError> {
        self.sent.lock().unwrap().push(attempt.clone());
        if self.fail {
            return Err(AlertError::Transport("smtp down".to_string()));
        }
        Ok(())
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Repository whose writes fail
// ════════════════════════════════════════════════════════════════════════════

pub struct FailingAppends(pub InMemoryChatStore);

#[async_trait]
impl ConversationRepository for FailingAppends {
    async fn find_or_create(
        &self,
        candidate: &Conversation,
        welcome: Option<&Message>,
    ) -> Result<OpenedConversation, DomainError> {
        self.0.find_or_create(candidate, welcome).await
    }

    async fn find_by_id(&self, id: &ConversationId) -> Result<Option<Conversation>, DomainError> {
        self.0.find_by_id(id).await
    }

    async fn append_message(&self, _message: &Message) -> Result<(), DomainError> {
        Err(DomainError::new(ErrorCode::DatabaseError, "connection reset"))
    }

    async fn mark_read(
        &self,
        conversation_id: &ConversationId,
        reader: &UserId,
        read_at: Timestamp,
    ) -> Result<Vec<MessageId>, DomainError> {
        self.0.mark_read(conversation_id, reader, read_at).await
    }
}
