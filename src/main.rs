use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use assignment_chat::adapters::auth::ZitadelSessionValidator;
use assignment_chat::adapters::email::{LogUploadAlert, ResendUploadAlert};
use assignment_chat::adapters::http::{app_router, ChatHandlers};
use assignment_chat::adapters::postgres::{
    PostgresConversationReader, PostgresConversationRepository, PostgresUserDirectory, MIGRATOR,
};
use assignment_chat::adapters::storage::LocalAttachmentStorage;
use assignment_chat::adapters::websocket::{
    ChatDeliveryBridge, RedisDeliveryBus, RedisRelay, RoomManager, SocketState,
};
use assignment_chat::adapters::InProcessEventBus;
use assignment_chat::application::{
    ChatAccess, ListContactsHandler, ListConversationsHandler, ListMessagesHandler,
    MarkReadHandler, OpenConversationHandler, SendMessageHandler, UploadAttachmentHandler,
};
use assignment_chat::config::{AppConfig, RedisConfig};
use assignment_chat::ports::{
    ConversationReader, ConversationRepository, DeliveryBus, EventPublisher, SessionValidator,
    UploadAlertNotifier, UserDirectory,
};

fn init_tracing(config: &AppConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.server.log_level));

    if config.is_production() {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().pretty())
            .init();
    }
}

/// Publishes to Redis and starts a relay that feeds this instance's sockets.
async fn redis_delivery(
    redis: &RedisConfig,
    rooms: Arc<RoomManager>,
) -> Result<Arc<dyn DeliveryBus>> {
    let client = redis::Client::open(redis.url.as_str()).context("invalid Redis URL")?;
    let conn = tokio::time::timeout(redis.timeout(), client.get_multiplexed_async_connection())
        .await
        .context("timed out connecting to Redis")?
        .context("failed to connect to Redis")?;

    let relay = RedisRelay::new(client, redis.channel_prefix.clone(), rooms);
    tokio::spawn(relay.run());

    info!(prefix = %redis.channel_prefix, "Realtime delivery via Redis");
    Ok(Arc::new(RedisDeliveryBus::new(conn, redis.channel_prefix.clone())))
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = AppConfig::load().context("failed to load configuration")?;
    init_tracing(&config);
    config.validate().context("invalid configuration")?;

    let addr = config.server.socket_addr()?;
    info!(
        environment = ?config.server.environment,
        %addr,
        "Starting assignment chat"
    );

    let pool = config
        .database
        .pool_options()
        .connect(&config.database.url)
        .await
        .context("failed to connect to PostgreSQL")?;
    if config.database.run_migrations {
        MIGRATOR.run(&pool).await.context("failed to run migrations")?;
        info!("Database migrations applied");
    }

    let validator: Arc<dyn SessionValidator> =
        Arc::new(ZitadelSessionValidator::new(config.auth.zitadel_config())?);

    let repository: Arc<dyn ConversationRepository> =
        Arc::new(PostgresConversationRepository::new(pool.clone()));
    let reader: Arc<dyn ConversationReader> =
        Arc::new(PostgresConversationReader::new(pool.clone()));
    let users: Arc<dyn UserDirectory> = Arc::new(PostgresUserDirectory::new(pool));

    tokio::fs::create_dir_all(&config.attachments.storage_dir)
        .await
        .with_context(|| {
            format!(
                "failed to create attachment directory {}",
                config.attachments.storage_dir.display()
            )
        })?;
    let storage = Arc::new(LocalAttachmentStorage::new(
        config.attachments.storage_dir.clone(),
        config.attachments.public_base_url.clone(),
    ));

    let alerts: Arc<dyn UploadAlertNotifier> = match &config.email {
        Some(email) => Arc::new(ResendUploadAlert::new(email.resend_config())?),
        None => {
            warn!("Email not configured; oversized uploads will only be logged");
            Arc::new(LogUploadAlert)
        }
    };

    let rooms = Arc::new(RoomManager::new(config.chat.ws_channel_capacity));
    let delivery: Arc<dyn DeliveryBus> = match &config.redis {
        Some(redis) => redis_delivery(redis, rooms.clone()).await?,
        None => {
            info!("Realtime delivery is local to this instance");
            let local: Arc<dyn DeliveryBus> = rooms.clone();
            local
        }
    };

    let event_bus = Arc::new(InProcessEventBus::new());
    ChatDeliveryBridge::new_shared(delivery).register(event_bus.as_ref());
    let publisher: Arc<dyn EventPublisher> = event_bus;

    let settings = config.chat.settings();
    let access = ChatAccess::new(repository.clone(), users.clone());
    let mark_read = Arc::new(MarkReadHandler::new(
        access.clone(),
        repository.clone(),
        publisher.clone(),
    ));

    let chat = ChatHandlers {
        open_conversation: Arc::new(OpenConversationHandler::new(
            access.clone(),
            repository.clone(),
            publisher.clone(),
            settings.clone(),
        )),
        list_conversations: Arc::new(ListConversationsHandler::new(reader.clone(), users.clone())),
        list_messages: Arc::new(ListMessagesHandler::new(access.clone(), reader)),
        send_message: Arc::new(SendMessageHandler::new(
            access.clone(),
            repository.clone(),
            publisher.clone(),
            settings.clone(),
        )),
        upload_attachment: Arc::new(UploadAttachmentHandler::new(
            access,
            repository,
            storage,
            alerts,
            publisher,
            config.attachments.policy(),
            settings,
        )),
        mark_read: mark_read.clone(),
        list_contacts: Arc::new(ListContactsHandler::new(users)),
    };
    let socket = SocketState::new(rooms, validator.clone(), mark_read);

    let app = app_router(chat, socket, validator, &config.http_settings());

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!(%addr, "Listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    info!("Shut down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "Failed to listen for shutdown signal");
    }
}
