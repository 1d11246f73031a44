//! Attachments and the upload acceptance policy.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::foundation::AttachmentId;

use super::MessageKind;

/// Hard ceiling for a single attachment: 5 MiB.
pub const MAX_ATTACHMENT_BYTES: u64 = 5 * 1024 * 1024;

/// Accepted MIME types and the file extensions each may carry.
const ALLOWED_TYPES: &[(&str, &[&str])] = &[
    ("image/jpeg", &["jpg", "jpeg"]),
    ("image/png", &["png"]),
    ("image/gif", &["gif"]),
    ("image/webp", &["webp"]),
    ("application/pdf", &["pdf"]),
    ("text/plain", &["txt"]),
    ("application/msword", &["doc"]),
    (
        "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        &["docx"],
    ),
    ("application/vnd.ms-excel", &["xls"]),
    (
        "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        &["xlsx"],
    ),
    ("application/vnd.ms-powerpoint", &["ppt"]),
    (
        "application/vnd.openxmlformats-officedocument.presentationml.presentation",
        &["pptx"],
    ),
    ("application/zip", &["zip"]),
];

/// A stored file owned by exactly one message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attachment {
    pub id: AttachmentId,
    pub file_name: String,
    pub file_url: String,
    pub file_type: String,
    pub file_size: u64,
    /// SHA-256 of the stored bytes, hex encoded.
    pub checksum: String,
}

impl Attachment {
    /// IMAGE for `image/*`, FILE for everything else.
    pub fn kind(&self) -> MessageKind {
        kind_for(&self.file_type)
    }
}

fn kind_for(content_type: &str) -> MessageKind {
    if content_type.starts_with("image/") {
        MessageKind::Image
    } else {
        MessageKind::File
    }
}

/// Why an upload was refused.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AttachmentRejection {
    #[error("file name is required")]
    MissingFileName,

    #[error("file is empty")]
    Empty,

    #[error("file is {size} bytes, the limit is {max} bytes")]
    TooLarge { size: u64, max: u64 },

    #[error("file type '{content_type}' is not allowed")]
    DisallowedType { content_type: String },

    #[error("file extension of '{file_name}' does not match type '{content_type}'")]
    ExtensionMismatch {
        file_name: String,
        content_type: String,
    },
}

impl AttachmentRejection {
    pub fn is_oversized(&self) -> bool {
        matches!(self, AttachmentRejection::TooLarge { .. })
    }
}

/// Size and type rules an upload must pass before anything is stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttachmentPolicy {
    max_bytes: u64,
}

impl AttachmentPolicy {
    /// Creates a policy with the given size limit, capped at
    /// [`MAX_ATTACHMENT_BYTES`].
    pub fn new(max_bytes: u64) -> Self {
        Self {
            max_bytes: max_bytes.min(MAX_ATTACHMENT_BYTES),
        }
    }

    pub fn max_bytes(&self) -> u64 {
        self.max_bytes
    }

    /// Normalizes a Content-Type header value: lowercase, parameters dropped.
    pub fn normalize_content_type(content_type: &str) -> String {
        content_type
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase()
    }

    /// Checks an upload and returns the message kind it will produce.
    pub fn check(
        &self,
        file_name: &str,
        content_type: &str,
        size: u64,
    ) -> Result<MessageKind, AttachmentRejection> {
        if file_name.trim().is_empty() {
            return Err(AttachmentRejection::MissingFileName);
        }
        if size == 0 {
            return Err(AttachmentRejection::Empty);
        }
        if size > self.max_bytes {
            return Err(AttachmentRejection::TooLarge {
                size,
                max: self.max_bytes,
            });
        }

        let content_type = Self::normalize_content_type(content_type);
        let extensions = ALLOWED_TYPES
            .iter()
            .find(|(mime, _)| *mime == content_type)
            .map(|(_, exts)| *exts)
            .ok_or_else(|| AttachmentRejection::DisallowedType {
                content_type: content_type.clone(),
            })?;

        let extension = file_name
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_ascii_lowercase());
        match extension {
            Some(ext) if extensions.contains(&ext.as_str()) => Ok(kind_for(&content_type)),
            _ => Err(AttachmentRejection::ExtensionMismatch {
                file_name: file_name.to_string(),
                content_type,
            }),
        }
    }
}

impl Default for AttachmentPolicy {
    fn default() -> Self {
        Self::new(MAX_ATTACHMENT_BYTES)
    }
}
