//! PostgreSQL implementation of ConversationRepository.
//!
//! Lookup-or-create relies on the `(participant_low, participant_high)`
//! unique constraint: the insert is `ON CONFLICT DO NOTHING`, and a miss
//! falls through to a select of the row the other writer committed.

use async_trait::async_trait;
use sqlx::{PgPool, Postgres, Transaction};

use crate::domain::conversation::{Conversation, Message};
use crate::domain::foundation::{
    ConversationId, DomainError, ErrorCode, MessageId, Timestamp, UserId,
};
use crate::ports::{ConversationRepository, OpenedConversation};

use super::rows::{self, db_error};

/// PostgreSQL implementation of ConversationRepository.
#[derive(Clone)]
pub struct PostgresConversationRepository {
    pool: PgPool,
}

impl PostgresConversationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ConversationRepository for PostgresConversationRepository {
    async fn find_or_create(
        &self,
        candidate: &Conversation,
        welcome: Option<&Message>,
    ) -> Result<OpenedConversation, DomainError> {
        let pair = candidate.participants();
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(db_error("Failed to start transaction"))?;

        let inserted = sqlx::query(
            r#"
            INSERT INTO conversations (id, participant_low, participant_high, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (participant_low, participant_high) DO NOTHING
            RETURNING id
            "#,
        )
        .bind(candidate.id().as_uuid())
        .bind(pair.low().as_str())
        .bind(pair.high().as_str())
        .bind(candidate.created_at().as_datetime())
        .bind(candidate.updated_at().as_datetime())
        .fetch_optional(&mut *tx)
        .await
        .map_err(db_error("Failed to insert conversation"))?;

        if inserted.is_none() {
            let row = sqlx::query(
                r#"
                SELECT id, participant_low, participant_high, created_at, updated_at
                FROM conversations
                WHERE participant_low = $1 AND participant_high = $2
                "#,
            )
            .bind(pair.low().as_str())
            .bind(pair.high().as_str())
            .fetch_one(&mut *tx)
            .await
            .map_err(db_error("Failed to fetch existing conversation"))?;
            tx.commit()
                .await
                .map_err(db_error("Failed to commit transaction"))?;

            return Ok(OpenedConversation {
                conversation: rows::conversation(&row)?,
                created: false,
            });
        }

        let mut conversation = candidate.clone();
        if let Some(welcome) = welcome {
            insert_message(&mut tx, welcome).await?;
            touch(&mut tx, &conversation.id(), welcome.created_at).await?;
            conversation.touch(welcome.created_at);
        }

        tx.commit()
            .await
            .map_err(db_error("Failed to commit transaction"))?;

        Ok(OpenedConversation {
            conversation,
            created: true,
        })
    }

    async fn find_by_id(&self, id: &ConversationId) -> Result<Option<Conversation>, DomainError> {
        let row = sqlx::query(
            r#"
            SELECT id, participant_low, participant_high, created_at, updated_at
            FROM conversations
            WHERE id = $1
            "#,
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error("Failed to fetch conversation"))?;

        row.as_ref().map(rows::conversation).transpose()
    }

    async fn append_message(&self, message: &Message) -> Result<(), DomainError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(db_error("Failed to start transaction"))?;

        touch(&mut tx, &message.conversation_id, message.created_at).await?;
        insert_message(&mut tx, message).await?;

        tx.commit()
            .await
            .map_err(db_error("Failed to commit transaction"))?;
        Ok(())
    }

    async fn mark_read(
        &self,
        conversation_id: &ConversationId,
        reader: &UserId,
        read_at: Timestamp,
    ) -> Result<Vec<MessageId>, DomainError> {
        let marked: Vec<uuid::Uuid> = sqlx::query_scalar(
            r#"
            INSERT INTO message_reads (message_id, reader_id, read_at)
            SELECT m.id, $2, $3
            FROM messages m
            WHERE m.conversation_id = $1 AND m.receiver_id = $2
            ON CONFLICT (message_id, reader_id) DO NOTHING
            RETURNING message_id
            "#,
        )
        .bind(conversation_id.as_uuid())
        .bind(reader.as_str())
        .bind(read_at.as_datetime())
        .fetch_all(&self.pool)
        .await
        .map_err(db_error("Failed to record read receipts"))?;

        Ok(marked.into_iter().map(MessageId::from_uuid).collect())
    }
}

/// Moves `updated_at` forward to `at`; never backwards.
async fn touch(
    tx: &mut Transaction<'_, Postgres>,
    id: &ConversationId,
    at: Timestamp,
) -> Result<(), DomainError> {
    let result = sqlx::query(
        r#"
        UPDATE conversations
        SET updated_at = GREATEST(updated_at, $2)
        WHERE id = $1
        "#,
    )
    .bind(id.as_uuid())
    .bind(at.as_datetime())
    .execute(&mut **tx)
    .await
    .map_err(db_error("Failed to update conversation"))?;

    if result.rows_affected() == 0 {
        return Err(
            DomainError::new(ErrorCode::ConversationNotFound, "Conversation not found")
                .with_detail("conversation_id", id.to_string()),
        );
    }
    Ok(())
}

async fn insert_message(
    tx: &mut Transaction<'_, Postgres>,
    message: &Message,
) -> Result<(), DomainError> {
    sqlx::query(
        r#"
        INSERT INTO messages (id, conversation_id, sender_id, receiver_id, content, message_type, created_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        "#,
    )
    .bind(message.id.as_uuid())
    .bind(message.conversation_id.as_uuid())
    .bind(message.sender_id.as_str())
    .bind(message.receiver_id.as_str())
    .bind(&message.content)
    .bind(message.kind.as_str())
    .bind(message.created_at.as_datetime())
    .execute(&mut **tx)
    .await
    .map_err(db_error("Failed to insert message"))?;

    if let Some(attachment) = &message.attachment {
        let file_size = i64::try_from(attachment.file_size).map_err(|_| {
            DomainError::new(ErrorCode::ValidationFailed, "Attachment size out of range")
        })?;
        sqlx::query(
            r#"
            INSERT INTO message_attachments (id, message_id, file_name, file_url, file_type, file_size, checksum)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(attachment.id.as_uuid())
        .bind(message.id.as_uuid())
        .bind(&attachment.file_name)
        .bind(&attachment.file_url)
        .bind(&attachment.file_type)
        .bind(file_size)
        .bind(&attachment.checksum)
        .execute(&mut **tx)
        .await
        .map_err(db_error("Failed to insert attachment"))?;
    }

    Ok(())
}
