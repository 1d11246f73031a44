//! Storage adapters for attachment bytes.

mod local_attachment_storage;

pub use local_attachment_storage::LocalAttachmentStorage;
