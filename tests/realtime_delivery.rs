//! Integration tests for realtime delivery.
//!
//! Domain events published on the in-process bus are routed by the
//! delivery bridge to the per-user rooms of both participants, and every
//! connection a user holds receives its own copy.

use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::broadcast::error::TryRecvError;
use tower::ServiceExt;

use assignment_chat::adapters::auth::MockSessionValidator;
use assignment_chat::adapters::memory::{InMemoryChatStore, InMemoryUserDirectory};
use assignment_chat::adapters::websocket::{
    socket_router, ChatDeliveryBridge, ClientId, RoomManager, ServerMessage, SocketState,
    SOCKET_PATH,
};
use assignment_chat::adapters::InProcessEventBus;
use assignment_chat::application::{ChatAccess, MarkReadHandler};
use assignment_chat::domain::conversation::{
    ConversationStarted, Message, MessageSent, MessagesRead, ParticipantPair,
};
use assignment_chat::domain::foundation::{
    ConversationId, EventId, MessageId, SerializableDomainEvent, Timestamp, UserId,
};
use assignment_chat::ports::{ChatUpdateType, EventPublisher};

fn uid(s: &str) -> UserId {
    UserId::new(s).unwrap()
}

struct Harness {
    bus: Arc<InProcessEventBus>,
    rooms: Arc<RoomManager>,
}

impl Harness {
    fn new() -> Self {
        let rooms = Arc::new(RoomManager::new(16));
        let bus = Arc::new(InProcessEventBus::new());
        ChatDeliveryBridge::new_shared(rooms.clone()).register(bus.as_ref());
        Self { bus, rooms }
    }

    async fn publish<E: SerializableDomainEvent>(&self, event: &E) {
        let envelope = event.to_envelope().unwrap().with_correlation_id("req-rt");
        self.bus.publish(envelope).await.unwrap();
    }
}

fn pair() -> ParticipantPair {
    ParticipantPair::new(uid("student-1"), uid("admin-1")).unwrap()
}

// ════════════════════════════════════════════════════════════════════════════
// Event routing
// ════════════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn message_sent_reaches_every_connection_of_both_participants() {
    let h = Harness::new();
    let mut student_phone = h.rooms.join(&uid("student-1"), ClientId::new()).await;
    let mut student_laptop = h.rooms.join(&uid("student-1"), ClientId::new()).await;
    let mut admin = h.rooms.join(&uid("admin-1"), ClientId::new()).await;
    let mut bystander = h.rooms.join(&uid("student-2"), ClientId::new()).await;

    let conversation_id = ConversationId::new();
    let message = Message::text(conversation_id, uid("student-1"), uid("admin-1"), "hi", 100)
        .unwrap();
    h.publish(&MessageSent::new(pair(), message.clone())).await;

    for rx in [&mut student_phone, &mut student_laptop, &mut admin] {
        let update = rx.try_recv().unwrap();
        assert_eq!(update.update_type, ChatUpdateType::MessageCreated);
        assert_eq!(update.data["conversationId"], conversation_id.to_string());
        assert_eq!(update.data["message"]["content"], "hi");
        assert_eq!(update.correlation_id.as_deref(), Some("req-rt"));
    }
    assert!(matches!(bystander.try_recv(), Err(TryRecvError::Empty)));
}

#[tokio::test]
async fn conversation_started_carries_participants_and_starter() {
    let h = Harness::new();
    let mut admin = h.rooms.join(&uid("admin-1"), ClientId::new()).await;

    let event = ConversationStarted {
        event_id: EventId::new(),
        conversation_id: ConversationId::new(),
        participants: pair(),
        started_by: uid("student-1"),
        started_at: Timestamp::now(),
    };
    h.publish(&event).await;

    let update = admin.try_recv().unwrap();
    assert_eq!(update.update_type, ChatUpdateType::ConversationStarted);
    assert_eq!(update.data["startedBy"], "student-1");
    assert_eq!(update.data["participants"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn messages_read_lists_ids_for_the_sender() {
    let h = Harness::new();
    let mut student = h.rooms.join(&uid("student-1"), ClientId::new()).await;
    let ids = vec![MessageId::new(), MessageId::new()];

    let event = MessagesRead {
        event_id: EventId::new(),
        conversation_id: ConversationId::new(),
        participants: pair(),
        reader_id: uid("admin-1"),
        message_ids: ids.clone(),
        read_at: Timestamp::now(),
    };
    h.publish(&event).await;

    let update = student.try_recv().unwrap();
    assert_eq!(update.update_type, ChatUpdateType::MessagesRead);
    assert_eq!(update.data["readerId"], "admin-1");
    assert_eq!(update.data["messageIds"].as_array().unwrap().len(), ids.len());
}

#[tokio::test]
async fn departed_connection_stops_receiving() {
    let h = Harness::new();
    let client = ClientId::new();
    let _rx = h.rooms.join(&uid("admin-1"), client.clone()).await;
    assert_eq!(h.rooms.client_count(&uid("admin-1")).await, 1);

    h.rooms.leave(&client).await;

    assert_eq!(h.rooms.client_count(&uid("admin-1")).await, 0);
    let message = Message::text(ConversationId::new(), uid("student-1"), uid("admin-1"), "hello", 100)
        .unwrap();
    h.publish(&MessageSent::new(pair(), message)).await;
    assert_eq!(h.rooms.total_client_count().await, 0);
}

#[tokio::test]
async fn update_frame_uses_chat_update_type_tag() {
    let h = Harness::new();
    let mut admin = h.rooms.join(&uid("admin-1"), ClientId::new()).await;
    let message = Message::text(ConversationId::new(), uid("student-1"), uid("admin-1"), "hi", 100)
        .unwrap();
    h.publish(&MessageSent::new(pair(), message)).await;

    let frame = ServerMessage::from(admin.try_recv().unwrap());
    let json: Value = serde_json::to_value(&frame).unwrap();

    assert_eq!(json["type"], "chat.update");
    assert_eq!(json["updateType"], "message_created");
    assert_eq!(json["correlationId"], "req-rt");
}

// ════════════════════════════════════════════════════════════════════════════
// Socket endpoint
// ════════════════════════════════════════════════════════════════════════════

fn socket_app() -> axum::Router {
    let store = Arc::new(InMemoryChatStore::new());
    let users = Arc::new(InMemoryUserDirectory::new());
    let bus = Arc::new(InProcessEventBus::new());
    let mark_read = Arc::new(MarkReadHandler::new(
        ChatAccess::new(store.clone(), users),
        store,
        bus,
    ));
    let validator = Arc::new(MockSessionValidator::new().with_test_user("good", uid("student-1")));
    socket_router(SocketState::new(
        Arc::new(RoomManager::with_default_capacity()),
        validator,
        mark_read,
    ))
}

#[tokio::test]
async fn socket_rejects_missing_token_before_upgrade() {
    let response = socket_app()
        .oneshot(Request::builder().uri(SOCKET_PATH).body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn socket_with_valid_query_token_requires_upgrade() {
    let response = socket_app()
        .oneshot(
            Request::builder()
                .uri(format!("{}?token=good", SOCKET_PATH))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UPGRADE_REQUIRED);
}
