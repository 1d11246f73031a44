//! Local filesystem storage for message attachments.
//!
//! Files are written with a write-to-temp-then-rename pattern so a crash
//! never leaves a partial attachment visible, and each file's SHA-256 is
//! computed from the bytes written.
//!
//! ```text
//! {base_path}/
//! └── {conversation_id}/
//!     ├── {attachment_id}-brief.pdf
//!     └── {attachment_id}-diagram.png
//! ```

use async_trait::async_trait;
use sha2::{Digest, Sha256};
use std::path::{Component, Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;

use crate::domain::foundation::{AttachmentId, ConversationId};
use crate::ports::{AttachmentStorage, StorageError, StoredFile};

/// Longest stored file name, in characters, before the attachment id prefix.
const MAX_STORED_NAME_CHARS: usize = 120;

#[derive(Debug, Clone)]
pub struct LocalAttachmentStorage {
    base_path: PathBuf,
    /// Prefix for public URLs, without a trailing slash.
    public_base_url: String,
}

impl LocalAttachmentStorage {
    pub fn new(base_path: impl Into<PathBuf>, public_base_url: impl Into<String>) -> Self {
        Self {
            base_path: base_path.into(),
            public_base_url: public_base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Reduces a client file name to a safe single path segment.
    fn sanitize_file_name(name: &str) -> Result<String, StorageError> {
        let base = name.rsplit(['/', '\\']).next().unwrap_or_default();
        let cleaned: String = base
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        let cleaned = cleaned.trim_start_matches('.');

        if cleaned.is_empty() || cleaned.chars().all(|c| c == '_') {
            return Err(StorageError::InvalidFileName {
                name: name.to_string(),
            });
        }

        // Keep the extension when truncating.
        if cleaned.chars().count() <= MAX_STORED_NAME_CHARS {
            return Ok(cleaned.to_string());
        }
        let (stem, ext) = cleaned.rsplit_once('.').unwrap_or((cleaned, ""));
        let keep = MAX_STORED_NAME_CHARS.saturating_sub(ext.len() + 1);
        let stem: String = stem.chars().take(keep).collect();
        Ok(if ext.is_empty() {
            stem
        } else {
            format!("{}.{}", stem, ext)
        })
    }

    fn compute_checksum(bytes: &[u8]) -> String {
        hex::encode(Sha256::digest(bytes))
    }

    /// Resolves a storage key under the base path, refusing anything that
    /// could escape it.
    fn resolve_key(&self, key: &str) -> Result<PathBuf, StorageError> {
        let relative = Path::new(key);
        let safe = !key.is_empty()
            && relative
                .components()
                .all(|c| matches!(c, Component::Normal(_)));
        if !safe {
            return Err(StorageError::InvalidFileName {
                name: key.to_string(),
            });
        }
        Ok(self.base_path.join(relative))
    }
}

fn io_error(action: &str, path: &Path, e: std::io::Error) -> StorageError {
    match e.kind() {
        std::io::ErrorKind::NotFound => StorageError::NotFound {
            path: path.display().to_string(),
        },
        std::io::ErrorKind::PermissionDenied => StorageError::PermissionDenied {
            path: path.display().to_string(),
        },
        _ => StorageError::io(format!("Failed to {} {}: {}", action, path.display(), e)),
    }
}

#[async_trait]
impl AttachmentStorage for LocalAttachmentStorage {
    async fn store(
        &self,
        conversation_id: ConversationId,
        attachment_id: AttachmentId,
        file_name: &str,
        bytes: &[u8],
    ) -> Result<StoredFile, StorageError> {
        let safe_name = Self::sanitize_file_name(file_name)?;
        let key = format!("{}/{}-{}", conversation_id, attachment_id, safe_name);

        let dir = self.base_path.join(conversation_id.to_string());
        fs::create_dir_all(&dir)
            .await
            .map_err(|e| io_error("create directory", &dir, e))?;

        let final_path = self.base_path.join(&key);
        let temp_path = dir.join(format!("{}.tmp", attachment_id));

        let mut file = fs::File::create(&temp_path)
            .await
            .map_err(|e| io_error("create", &temp_path, e))?;
        file.write_all(bytes)
            .await
            .map_err(|e| io_error("write", &temp_path, e))?;
        file.sync_all()
            .await
            .map_err(|e| io_error("sync", &temp_path, e))?;
        drop(file);

        if let Err(e) = fs::rename(&temp_path, &final_path).await {
            let _ = fs::remove_file(&temp_path).await;
            return Err(io_error("rename", &final_path, e));
        }

        tracing::debug!(key = %key, size_bytes = bytes.len(), "Attachment stored");

        Ok(StoredFile {
            url: format!("{}/{}", self.public_base_url, key),
            key,
            size_bytes: bytes.len() as u64,
            checksum: Self::compute_checksum(bytes),
        })
    }

    async fn delete(&self, key: &str) -> Result<(), StorageError> {
        let path = self.resolve_key(key)?;
        fs::remove_file(&path)
            .await
            .map_err(|e| io_error("delete", &path, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn create_storage() -> (LocalAttachmentStorage, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let storage = LocalAttachmentStorage::new(temp_dir.path(), "https://files.example.com/");
        (storage, temp_dir)
    }

    // ───────────────────────────────────────────────────────────────
    // Store
    // ───────────────────────────────────────────────────────────────

    #[tokio::test]
    async fn store_writes_bytes_under_conversation_directory() {
        let (storage, temp) = create_storage();
        let conversation_id = ConversationId::new();
        let attachment_id = AttachmentId::new();

        let stored = storage
            .store(conversation_id, attachment_id, "brief.pdf", b"%PDF-1.7")
            .await
            .unwrap();

        assert_eq!(
            stored.key,
            format!("{}/{}-brief.pdf", conversation_id, attachment_id)
        );
        assert_eq!(
            stored.url,
            format!("https://files.example.com/{}", stored.key)
        );
        assert_eq!(stored.size_bytes, 8);
        let on_disk = std::fs::read(temp.path().join(&stored.key)).unwrap();
        assert_eq!(on_disk, b"%PDF-1.7");
    }

    #[tokio::test]
    async fn store_computes_sha256_checksum() {
        let (storage, _temp) = create_storage();

        let stored = storage
            .store(ConversationId::new(), AttachmentId::new(), "a.txt", b"hello")
            .await
            .unwrap();

        assert_eq!(
            stored.checksum,
            "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824"
        );
    }

    #[tokio::test]
    async fn store_leaves_no_temp_file() {
        let (storage, temp) = create_storage();
        let conversation_id = ConversationId::new();

        storage
            .store(conversation_id, AttachmentId::new(), "a.txt", b"x")
            .await
            .unwrap();

        let names: Vec<String> = std::fs::read_dir(temp.path().join(conversation_id.to_string()))
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names.len(), 1);
        assert!(!names[0].ends_with(".tmp"));
    }

    #[tokio::test]
    async fn path_components_in_file_name_are_stripped() {
        let (storage, temp) = create_storage();

        let stored = storage
            .store(ConversationId::new(), AttachmentId::new(), "../../etc/passwd.txt", b"x")
            .await
            .unwrap();

        assert!(stored.key.ends_with("-passwd.txt"));
        assert!(temp.path().join(&stored.key).exists());
    }

    // ───────────────────────────────────────────────────────────────
    // Delete
    // ───────────────────────────────────────────────────────────────

    #[tokio::test]
    async fn delete_removes_stored_file() {
        let (storage, temp) = create_storage();
        let stored = storage
            .store(ConversationId::new(), AttachmentId::new(), "a.txt", b"x")
            .await
            .unwrap();

        storage.delete(&stored.key).await.unwrap();

        assert!(!temp.path().join(&stored.key).exists());
    }

    #[tokio::test]
    async fn delete_missing_file_is_not_found() {
        let (storage, _temp) = create_storage();
        let err = storage.delete("nope/missing.txt").await.unwrap_err();
        assert!(matches!(err, StorageError::NotFound { .. }));
    }

    #[tokio::test]
    async fn delete_refuses_keys_outside_storage() {
        let (storage, _temp) = create_storage();
        let err = storage.delete("../outside.txt").await.unwrap_err();
        assert!(matches!(err, StorageError::InvalidFileName { .. }));
    }

    // ───────────────────────────────────────────────────────────────
    // File names
    // ───────────────────────────────────────────────────────────────

    #[test]
    fn sanitize_replaces_unsafe_characters() {
        assert_eq!(
            LocalAttachmentStorage::sanitize_file_name("my essay (final).docx").unwrap(),
            "my_essay__final_.docx"
        );
    }

    #[test]
    fn sanitize_rejects_names_with_nothing_usable() {
        assert!(LocalAttachmentStorage::sanitize_file_name("...").is_err());
        assert!(LocalAttachmentStorage::sanitize_file_name("/").is_err());
    }

    #[test]
    fn sanitize_truncates_long_names_keeping_extension() {
        let long = format!("{}.pdf", "a".repeat(500));
        let cleaned = LocalAttachmentStorage::sanitize_file_name(&long).unwrap();
        assert_eq!(cleaned.chars().count(), MAX_STORED_NAME_CHARS);
        assert!(cleaned.ends_with(".pdf"));
    }
}
