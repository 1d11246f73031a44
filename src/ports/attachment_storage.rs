//! Attachment storage port.
//!
//! # Contract
//!
//! Implementations must:
//! - Write atomically (no partially written file is ever visible)
//! - Compute a SHA-256 checksum of the stored bytes
//! - Return a URL clients can fetch the file from
//! - Never let the client-supplied file name escape the storage root

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::foundation::{AttachmentId, ConversationId};

/// Port for storing uploaded attachment bytes.
#[async_trait]
pub trait AttachmentStorage: Send + Sync {
    /// Stores `bytes` for a message attachment.
    async fn store(
        &self,
        conversation_id: ConversationId,
        attachment_id: AttachmentId,
        file_name: &str,
        bytes: &[u8],
    ) -> Result<StoredFile, StorageError>;

    /// Removes a previously stored file by its storage key.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if nothing is stored under `key`.
    async fn delete(&self, key: &str) -> Result<(), StorageError>;
}

/// Where and what was stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredFile {
    /// Storage-relative key, used for deletion.
    pub key: String,
    /// Public URL of the file.
    pub url: String,
    pub size_bytes: u64,
    /// Hex-encoded SHA-256 of the content.
    pub checksum: String,
}

/// Errors that can occur during file storage operations.
#[derive(Debug, Clone, Error)]
pub enum StorageError {
    #[error("File not found: {path}")]
    NotFound { path: String },

    #[error("Permission denied: {path}")]
    PermissionDenied { path: String },

    #[error("Invalid file name: {name}")]
    InvalidFileName { name: String },

    #[error("IO error: {message}")]
    Io { message: String },
}

impl StorageError {
    pub fn io(message: impl Into<String>) -> Self {
        StorageError::Io {
            message: message.into(),
        }
    }
}
