//! Redis fan-out for running several instances.
//!
//! Each user topic is the channel `<prefix>:user:<user_id>`. Publishing goes
//! through `RedisDeliveryBus`; every instance runs one `RedisRelay` that
//! pattern-subscribes to all user channels and hands each update to its
//! local `RoomManager`.
//!
//! ```text
//! instance A ── PUBLISH chat:user:admin-1 ──► Redis ──► relay(A) ──► rooms(A)
//!                                                  └──► relay(B) ──► rooms(B)
//! ```

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use redis::aio::MultiplexedConnection;
use redis::AsyncCommands;

use crate::domain::foundation::UserId;
use crate::ports::{ChatUpdate, DeliveryBus, DeliveryError};

use super::rooms::RoomManager;

const INITIAL_BACKOFF: Duration = Duration::from_millis(500);
const MAX_BACKOFF: Duration = Duration::from_secs(30);

fn next_backoff(current: Duration) -> Duration {
    (current * 2).min(MAX_BACKOFF)
}

fn topic(prefix: &str, user: &UserId) -> String {
    format!("{}:user:{}", prefix, user)
}

/// Extracts the user id from a channel name produced by [`topic`].
fn user_from_topic(prefix: &str, channel: &str) -> Option<UserId> {
    channel
        .strip_prefix(prefix)?
        .strip_prefix(":user:")
        .and_then(|id| UserId::new(id).ok())
}

/// Publishes updates to per-user Redis channels.
#[derive(Clone)]
pub struct RedisDeliveryBus {
    conn: MultiplexedConnection,
    prefix: String,
}

impl RedisDeliveryBus {
    pub fn new(conn: MultiplexedConnection, prefix: impl Into<String>) -> Self {
        Self {
            conn,
            prefix: prefix.into(),
        }
    }
}

#[async_trait]
impl DeliveryBus for RedisDeliveryBus {
    async fn deliver(&self, user: &UserId, update: ChatUpdate) -> Result<(), DeliveryError> {
        let payload = serde_json::to_string(&update)
            .map_err(|e| DeliveryError::Serialization(e.to_string()))?;

        let mut conn = self.conn.clone();
        let subscribers: i64 = conn
            .publish(topic(&self.prefix, user), payload)
            .await
            .map_err(|e: redis::RedisError| DeliveryError::Transport(e.to_string()))?;

        tracing::trace!(user_id = %user, subscribers, "Published chat update");
        Ok(())
    }
}

/// Relays updates from Redis into this instance's rooms.
pub struct RedisRelay {
    client: redis::Client,
    prefix: String,
    rooms: Arc<RoomManager>,
}

impl RedisRelay {
    pub fn new(client: redis::Client, prefix: impl Into<String>, rooms: Arc<RoomManager>) -> Self {
        Self {
            client,
            prefix: prefix.into(),
            rooms,
        }
    }

    /// Relays for the life of the process. A failed connection or a closed
    /// stream is retried with exponential backoff; the delay resets after
    /// every successful subscription.
    pub async fn run(self) {
        let mut backoff = INITIAL_BACKOFF;
        loop {
            match self.relay_once().await {
                Ok(()) => {
                    backoff = INITIAL_BACKOFF;
                    tracing::warn!(
                        retry_in_ms = backoff.as_millis() as u64,
                        "Realtime relay stream ended, resubscribing"
                    );
                }
                Err(e) => {
                    tracing::error!(
                        error = %e,
                        retry_in_ms = backoff.as_millis() as u64,
                        "Realtime relay failed, remote updates paused"
                    );
                }
            }
            tokio::time::sleep(backoff).await;
            backoff = next_backoff(backoff);
        }
    }

    /// Subscribes and relays until the Redis connection closes. Errors are
    /// only returned before the subscription is in place.
    async fn relay_once(&self) -> Result<(), DeliveryError> {
        let mut pubsub = self
            .client
            .get_async_connection()
            .await
            .map_err(|e| DeliveryError::Transport(e.to_string()))?
            .into_pubsub();

        let pattern = format!("{}:user:*", self.prefix);
        pubsub
            .psubscribe(&pattern)
            .await
            .map_err(|e| DeliveryError::Transport(e.to_string()))?;
        tracing::info!(pattern = %pattern, "Realtime relay subscribed");

        let mut messages = Box::pin(pubsub.on_message());
        while let Some(msg) = messages.next().await {
            let channel = msg.get_channel_name();
            let Some(user) = user_from_topic(&self.prefix, channel) else {
                tracing::debug!(channel, "Ignoring message on unexpected channel");
                continue;
            };

            let update = msg
                .get_payload::<String>()
                .map_err(|e| e.to_string())
                .and_then(|raw| {
                    serde_json::from_str::<ChatUpdate>(&raw).map_err(|e| e.to_string())
                });

            match update {
                Ok(update) => {
                    self.rooms.broadcast_to_user(&user, update).await;
                }
                Err(error) => {
                    tracing::warn!(channel, error = %error, "Dropping malformed chat update");
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn uid(s: &str) -> UserId {
        UserId::new(s).unwrap()
    }

    #[test]
    fn backoff_doubles_up_to_the_ceiling() {
        assert_eq!(next_backoff(INITIAL_BACKOFF), Duration::from_secs(1));
        assert_eq!(next_backoff(Duration::from_secs(20)), MAX_BACKOFF);
        assert_eq!(next_backoff(MAX_BACKOFF), MAX_BACKOFF);
    }

    #[tokio::test]
    async fn unreachable_redis_is_an_error_not_a_silent_stop() {
        let client = redis::Client::open("redis://127.0.0.1:1/").unwrap();
        let relay = RedisRelay::new(client, "chat", Arc::new(RoomManager::new(4)));

        let result = relay.relay_once().await;

        assert!(matches!(result, Err(DeliveryError::Transport(_))));
    }

    #[test]
    fn topic_embeds_prefix_and_user() {
        assert_eq!(topic("chat", &uid("admin-1")), "chat:user:admin-1");
    }

    #[test]
    fn user_is_recovered_from_topic() {
        let channel = topic("chat", &uid("auth0|abc:123"));
        assert_eq!(user_from_topic("chat", &channel), Some(uid("auth0|abc:123")));
    }

    #[test]
    fn foreign_channels_are_not_users() {
        assert_eq!(user_from_topic("chat", "other:user:x"), None);
        assert_eq!(user_from_topic("chat", "chat:room:x"), None);
        assert_eq!(user_from_topic("chat", "chat:user:"), None);
    }
}
