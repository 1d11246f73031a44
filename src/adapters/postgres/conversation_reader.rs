//! PostgreSQL implementation of ConversationReader.
//!
//! The conversation list is one query: the newest message comes from a
//! LATERAL join and the unread count from a correlated count over receipts.

use async_trait::async_trait;
use sqlx::PgPool;
use std::collections::HashMap;

use crate::domain::conversation::ReadReceipt;
use crate::domain::foundation::{ConversationId, DomainError, MessageId, UserId};
use crate::ports::{ConversationReader, ConversationSummary, LastMessage, MessagePage};

use super::rows::{self, db_error, get};

/// PostgreSQL implementation of ConversationReader.
#[derive(Clone)]
pub struct PostgresConversationReader {
    pool: PgPool,
}

impl PostgresConversationReader {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ConversationReader for PostgresConversationReader {
    async fn list_for_user(&self, user: &UserId) -> Result<Vec<ConversationSummary>, DomainError> {
        let records = sqlx::query(
            r#"
            SELECT c.id, c.participant_low, c.participant_high, c.created_at, c.updated_at,
                   lm.id AS last_id, lm.sender_id AS last_sender_id, lm.content AS last_content,
                   lm.message_type AS last_message_type, lm.created_at AS last_created_at,
                   (
                       SELECT COUNT(*)
                       FROM messages u
                       WHERE u.conversation_id = c.id
                         AND u.receiver_id = $1
                         AND NOT EXISTS (
                             SELECT 1 FROM message_reads r
                             WHERE r.message_id = u.id AND r.reader_id = $1
                         )
                   ) AS unread_count
            FROM conversations c
            LEFT JOIN LATERAL (
                SELECT m.id, m.sender_id, m.content, m.message_type, m.created_at
                FROM messages m
                WHERE m.conversation_id = c.id
                ORDER BY m.created_at DESC, m.id DESC
                LIMIT 1
            ) lm ON TRUE
            WHERE c.participant_low = $1 OR c.participant_high = $1
            ORDER BY c.updated_at DESC, c.id
            "#,
        )
        .bind(user.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(db_error("Failed to list conversations"))?;

        let mut summaries = Vec::with_capacity(records.len());
        for row in &records {
            let conversation = rows::conversation(row)?;
            let Some(counterpart_id) = conversation.counterpart_of(user).cloned() else {
                continue;
            };

            let last_id: Option<uuid::Uuid> = get(row, "last_id")?;
            let last_message = match last_id {
                Some(id) => Some(LastMessage {
                    id: MessageId::from_uuid(id),
                    sender_id: rows::user_id(row, "last_sender_id")?,
                    content: get(row, "last_content")?,
                    kind: rows::message_kind(row, "last_message_type")?,
                    created_at: rows::timestamp(row, "last_created_at")?,
                }),
                None => None,
            };
            let unread: i64 = get(row, "unread_count")?;

            summaries.push(ConversationSummary {
                id: conversation.id(),
                counterpart_id,
                last_message,
                unread_count: u32::try_from(unread).unwrap_or(u32::MAX),
                created_at: conversation.created_at(),
                updated_at: conversation.updated_at(),
            });
        }
        Ok(summaries)
    }

    async fn messages(
        &self,
        conversation_id: &ConversationId,
        offset: u32,
        limit: u32,
    ) -> Result<MessagePage, DomainError> {
        let total: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM messages WHERE conversation_id = $1")
                .bind(conversation_id.as_uuid())
                .fetch_one(&self.pool)
                .await
                .map_err(db_error("Failed to count messages"))?;

        let records = sqlx::query(
            r#"
            SELECT m.id, m.conversation_id, m.sender_id, m.receiver_id, m.content,
                   m.message_type, m.created_at,
                   a.id AS attachment_id, a.file_name AS attachment_file_name,
                   a.file_url AS attachment_file_url, a.file_type AS attachment_file_type,
                   a.file_size AS attachment_file_size, a.checksum AS attachment_checksum
            FROM messages m
            LEFT JOIN message_attachments a ON a.message_id = m.id
            WHERE m.conversation_id = $1
            ORDER BY m.created_at ASC, m.id ASC
            OFFSET $2
            LIMIT $3
            "#,
        )
        .bind(conversation_id.as_uuid())
        .bind(i64::from(offset))
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await
        .map_err(db_error("Failed to fetch messages"))?;

        let mut items = records
            .iter()
            .map(rows::message)
            .collect::<Result<Vec<_>, _>>()?;

        let ids: Vec<uuid::Uuid> = items.iter().map(|m| *m.id.as_uuid()).collect();
        let mut receipts = self.receipts_for(&ids).await?;
        for message in &mut items {
            if let Some(found) = receipts.remove(&message.id) {
                message.read_receipts = found;
            }
        }

        Ok(MessagePage {
            items,
            total: u32::try_from(total).unwrap_or(u32::MAX),
            offset,
            limit,
        })
    }
}

impl PostgresConversationReader {
    async fn receipts_for(
        &self,
        message_ids: &[uuid::Uuid],
    ) -> Result<HashMap<MessageId, Vec<ReadReceipt>>, DomainError> {
        if message_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let records = sqlx::query(
            r#"
            SELECT message_id, reader_id, read_at
            FROM message_reads
            WHERE message_id = ANY($1)
            ORDER BY read_at ASC
            "#,
        )
        .bind(message_ids)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error("Failed to fetch read receipts"))?;

        let mut by_message: HashMap<MessageId, Vec<ReadReceipt>> = HashMap::new();
        for row in &records {
            let message_id = MessageId::from_uuid(get(row, "message_id")?);
            by_message.entry(message_id).or_default().push(ReadReceipt {
                message_id,
                reader_id: rows::user_id(row, "reader_id")?,
                read_at: rows::timestamp(row, "read_at")?,
            });
        }
        Ok(by_message)
    }
}
