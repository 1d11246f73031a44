//! Attachment storage configuration

use serde::Deserialize;
use std::path::PathBuf;

use super::error::ValidationError;
use crate::domain::conversation::{AttachmentPolicy, MAX_ATTACHMENT_BYTES};

#[derive(Debug, Clone, Deserialize)]
pub struct AttachmentsConfig {
    /// Directory that holds uploaded files, one subdirectory per conversation
    #[serde(default = "default_storage_dir")]
    pub storage_dir: PathBuf,

    /// URL prefix under which stored files are served
    #[serde(default = "default_public_base_url")]
    pub public_base_url: String,

    /// Per-file size limit; may lower but never raise the 5 MiB cap
    #[serde(default = "default_max_bytes")]
    pub max_bytes: u64,
}

impl AttachmentsConfig {
    pub fn policy(&self) -> AttachmentPolicy {
        AttachmentPolicy::new(self.max_bytes)
    }

    /// Request body limit for the JSON chat routes. The upload route streams
    /// its file against the policy limit instead.
    pub fn body_limit_bytes(&self) -> usize {
        usize::try_from(self.policy().max_bytes().saturating_mul(2)).unwrap_or(usize::MAX)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.max_bytes == 0 || self.max_bytes > MAX_ATTACHMENT_BYTES {
            return Err(ValidationError::InvalidAttachmentLimit {
                max: MAX_ATTACHMENT_BYTES,
            });
        }
        if self.storage_dir.as_os_str().is_empty() {
            return Err(ValidationError::MissingRequired("ATTACHMENTS__STORAGE_DIR"));
        }
        Ok(())
    }
}

impl Default for AttachmentsConfig {
    fn default() -> Self {
        Self {
            storage_dir: default_storage_dir(),
            public_base_url: default_public_base_url(),
            max_bytes: default_max_bytes(),
        }
    }
}

fn default_storage_dir() -> PathBuf {
    PathBuf::from("./data/attachments")
}

fn default_public_base_url() -> String {
    "/files".to_string()
}

fn default_max_bytes() -> u64 {
    MAX_ATTACHMENT_BYTES
}
