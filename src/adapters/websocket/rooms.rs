//! Per-user rooms for realtime delivery.
//!
//! Each user has one room; every socket the user has open (tabs, devices)
//! joins it and receives every update addressed to the user.
//!
//! ```text
//! Room: student-1      Room: admin-7
//! ├── client-a         └── client-d
//! └── client-b
//! ```

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::{broadcast, RwLock};
use uuid::Uuid;

use crate::domain::foundation::UserId;
use crate::ports::{ChatUpdate, DeliveryBus, DeliveryError};

/// Default buffer per room. Receivers that fall further behind miss updates.
pub const DEFAULT_ROOM_CAPACITY: usize = 128;

/// Server-generated identifier for one socket connection.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ClientId(Uuid);

impl ClientId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ClientId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ClientId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Registry of user rooms, each backed by a bounded broadcast channel.
///
/// Broadcasts (reads) far outnumber joins and leaves (writes), hence the
/// `RwLock` around the registry.
pub struct RoomManager {
    rooms: RwLock<HashMap<UserId, broadcast::Sender<ChatUpdate>>>,

    /// client → user, for cleanup on disconnect.
    client_users: RwLock<HashMap<ClientId, UserId>>,

    channel_capacity: usize,
}

impl RoomManager {
    pub fn new(channel_capacity: usize) -> Self {
        Self {
            rooms: RwLock::new(HashMap::new()),
            client_users: RwLock::new(HashMap::new()),
            channel_capacity: channel_capacity.max(1),
        }
    }

    pub fn with_default_capacity() -> Self {
        Self::new(DEFAULT_ROOM_CAPACITY)
    }

    /// Joins `client_id` to the room of `user_id`, creating the room if needed.
    pub async fn join(
        &self,
        user_id: &UserId,
        client_id: ClientId,
    ) -> broadcast::Receiver<ChatUpdate> {
        let mut rooms = self.rooms.write().await;

        let sender = rooms.entry(user_id.clone()).or_insert_with(|| {
            let (tx, _) = broadcast::channel(self.channel_capacity);
            tx
        });

        self.client_users
            .write()
            .await
            .insert(client_id, user_id.clone());

        sender.subscribe()
    }

    /// Removes a client. The room is dropped once nobody listens on it.
    ///
    /// Call after the client's receiver has been dropped.
    pub async fn leave(&self, client_id: &ClientId) {
        let Some(user_id) = self.client_users.write().await.remove(client_id) else {
            return;
        };

        let mut rooms = self.rooms.write().await;
        if rooms
            .get(&user_id)
            .is_some_and(|sender| sender.receiver_count() == 0)
        {
            rooms.remove(&user_id);
        }
    }

    /// Sends `update` to every connection of `user_id` and returns how many
    /// received it. A user with no connections is a no-op.
    pub async fn broadcast_to_user(&self, user_id: &UserId, update: ChatUpdate) -> usize {
        let rooms = self.rooms.read().await;

        match rooms.get(user_id) {
            // Err means no receivers are left.
            Some(sender) => sender.send(update).unwrap_or(0),
            None => 0,
        }
    }

    pub async fn client_count(&self, user_id: &UserId) -> usize {
        self.rooms
            .read()
            .await
            .get(user_id)
            .map(|s| s.receiver_count())
            .unwrap_or(0)
    }

    pub async fn active_rooms(&self) -> Vec<UserId> {
        self.rooms.read().await.keys().cloned().collect()
    }

    pub async fn total_client_count(&self) -> usize {
        self.client_users.read().await.len()
    }
}

impl Default for RoomManager {
    fn default() -> Self {
        Self::with_default_capacity()
    }
}

#[async_trait]
impl DeliveryBus for RoomManager {
    async fn deliver(&self, user: &UserId, update: ChatUpdate) -> Result<(), DeliveryError> {
        let receivers = self.broadcast_to_user(user, update).await;
        tracing::trace!(user_id = %user, receivers, "Delivered chat update locally");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::Timestamp;
    use crate::ports::ChatUpdateType;
    use std::sync::Arc;
    use tokio::sync::broadcast::error::{RecvError, TryRecvError};

    fn uid(s: &str) -> UserId {
        UserId::new(s).unwrap()
    }

    fn update() -> ChatUpdate {
        ChatUpdate {
            update_type: ChatUpdateType::MessageCreated,
            data: serde_json::json!({"content": "hi"}),
            timestamp: Timestamp::now(),
            correlation_id: None,
        }
    }

    #[tokio::test]
    async fn join_creates_room_if_not_exists() {
        let manager = RoomManager::with_default_capacity();

        let _rx = manager.join(&uid("student-1"), ClientId::new()).await;

        assert_eq!(manager.active_rooms().await, vec![uid("student-1")]);
    }

    #[tokio::test]
    async fn every_connection_of_a_user_receives_updates() {
        let manager = Arc::new(RoomManager::with_default_capacity());
        let user = uid("student-1");

        let mut tab1 = manager.join(&user, ClientId::new()).await;
        let mut tab2 = manager.join(&user, ClientId::new()).await;

        let received = manager.broadcast_to_user(&user, update()).await;

        assert_eq!(received, 2);
        assert_eq!(tab1.recv().await.unwrap().update_type, ChatUpdateType::MessageCreated);
        assert!(tab2.recv().await.is_ok());
    }

    #[tokio::test]
    async fn other_users_do_not_receive_updates() {
        let manager = RoomManager::with_default_capacity();
        let _student = manager.join(&uid("student-1"), ClientId::new()).await;
        let mut admin = manager.join(&uid("admin-1"), ClientId::new()).await;

        manager.broadcast_to_user(&uid("student-1"), update()).await;

        assert!(matches!(admin.try_recv(), Err(TryRecvError::Empty)));
    }

    #[tokio::test]
    async fn leave_cleans_up_empty_room() {
        let manager = RoomManager::with_default_capacity();
        let user = uid("student-1");
        let client = ClientId::new();

        {
            let _rx = manager.join(&user, client.clone()).await;
        }
        manager.leave(&client).await;

        assert!(manager.active_rooms().await.is_empty());
        assert_eq!(manager.total_client_count().await, 0);
    }

    #[tokio::test]
    async fn leave_keeps_room_while_other_tabs_listen() {
        let manager = RoomManager::with_default_capacity();
        let user = uid("student-1");
        let closing = ClientId::new();

        let _open = manager.join(&user, ClientId::new()).await;
        {
            let _rx = manager.join(&user, closing.clone()).await;
        }
        manager.leave(&closing).await;

        assert_eq!(manager.client_count(&user).await, 1);
        assert_eq!(manager.total_client_count().await, 1);
    }

    #[tokio::test]
    async fn broadcast_to_user_without_connections_is_noop() {
        let manager = RoomManager::with_default_capacity();
        assert_eq!(manager.broadcast_to_user(&uid("nobody"), update()).await, 0);
    }

    #[tokio::test]
    async fn slow_receiver_lags_instead_of_blocking() {
        let manager = RoomManager::new(2);
        let user = uid("student-1");
        let mut rx = manager.join(&user, ClientId::new()).await;

        for _ in 0..5 {
            manager.broadcast_to_user(&user, update()).await;
        }

        assert!(matches!(rx.recv().await, Err(RecvError::Lagged(3))));
        assert!(rx.recv().await.is_ok());
    }

    #[tokio::test]
    async fn delivery_bus_routes_through_rooms() {
        let manager = RoomManager::with_default_capacity();
        let user = uid("admin-1");
        let mut rx = manager.join(&user, ClientId::new()).await;

        let bus: &dyn DeliveryBus = &manager;
        bus.deliver(&user, update()).await.unwrap();

        assert!(rx.recv().await.is_ok());
    }
}
