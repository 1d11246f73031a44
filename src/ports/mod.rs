//! Ports - Interfaces between the application core and the outside world.
//!
//! Adapters implement these traits; handlers depend only on them.
//!
//! - `SessionValidator` - access-token validation
//! - `UserDirectory` - roles and verification status
//! - `ConversationRepository` / `ConversationReader` - persistence
//! - `AttachmentStorage` - uploaded file bytes
//! - `UploadAlertNotifier` - oversized-upload alerts
//! - `EventPublisher` / `EventSubscriber` - domain events
//! - `DeliveryBus` - realtime per-user topics

mod attachment_storage;
mod conversation_reader;
mod conversation_repository;
mod delivery_bus;
mod event_publisher;
mod event_subscriber;
mod session_validator;
mod upload_alert;
mod user_directory;

pub use attachment_storage::{AttachmentStorage, StorageError, StoredFile};
pub use conversation_reader::{ConversationReader, ConversationSummary, LastMessage, MessagePage};
pub use conversation_repository::{ConversationRepository, OpenedConversation};
pub use delivery_bus::{ChatUpdate, ChatUpdateType, DeliveryBus, DeliveryError};
pub use event_publisher::EventPublisher;
pub use event_subscriber::{EventBus, EventHandler, EventSubscriber};
pub use session_validator::SessionValidator;
pub use upload_alert::{AlertError, OversizedUpload, UploadAlertNotifier};
pub use user_directory::UserDirectory;
