//! Realtime delivery over websockets.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                      InProcessEventBus                               │
//! └─────────────────────────────────────────────────────────────────────┘
//!                                     │ chat events
//!                                     ▼
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                    ChatDeliveryBridge                                │
//! │   - EventEnvelope → ChatUpdate                                       │
//! │   - one delivery per participant                                     │
//! └─────────────────────────────────────────────────────────────────────┘
//!                                     │ DeliveryBus
//!                    ┌────────────────┴────────────────┐
//!                    ▼                                 ▼
//!        RoomManager (single instance)     RedisDeliveryBus ─► RedisRelay
//!                                                                   │
//!                                                          RoomManager (each instance)
//!                                     │
//!                                     ▼
//!          Room: student-1 ├── tab-a ├── tab-b      Room: admin-7 └── tab-c
//! ```
//!
//! - [`messages`] - socket frame types
//! - [`rooms`] - per-user rooms
//! - [`handler`] - `/api/socket` upgrade and connection loop
//! - [`event_bridge`] - domain events to user topics
//! - [`redis_bus`] - cross-instance fan-out

pub mod event_bridge;
pub mod handler;
pub mod messages;
pub mod redis_bus;
pub mod rooms;

pub use event_bridge::ChatDeliveryBridge;
pub use handler::{socket_handler, socket_router, SocketState, SOCKET_PATH};
pub use messages::{ClientMessage, ServerMessage};
pub use redis_bus::{RedisDeliveryBus, RedisRelay};
pub use rooms::{ClientId, RoomManager, DEFAULT_ROOM_CAPACITY};
