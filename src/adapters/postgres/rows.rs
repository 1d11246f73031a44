//! Row decoding shared by the Postgres chat adapters.

use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::Row;

use crate::domain::conversation::{Attachment, Conversation, Message, MessageKind, ParticipantPair};
use crate::domain::foundation::{
    AttachmentId, ConversationId, DomainError, ErrorCode, MessageId, Timestamp, UserId,
};

pub(super) fn db_error(context: &'static str) -> impl Fn(sqlx::Error) -> DomainError {
    move |e| DomainError::new(ErrorCode::DatabaseError, format!("{}: {}", context, e))
}

fn corrupt(column: &str, reason: impl std::fmt::Display) -> DomainError {
    DomainError::new(
        ErrorCode::DatabaseError,
        format!("Invalid value in column '{}': {}", column, reason),
    )
}

pub(super) fn get<'r, T>(row: &'r PgRow, column: &'static str) -> Result<T, DomainError>
where
    T: sqlx::Decode<'r, sqlx::Postgres> + sqlx::Type<sqlx::Postgres>,
{
    row.try_get(column).map_err(|e| corrupt(column, e))
}

pub(super) fn timestamp(row: &PgRow, column: &'static str) -> Result<Timestamp, DomainError> {
    let value: DateTime<Utc> = get(row, column)?;
    Ok(Timestamp::from_datetime(value))
}

pub(super) fn user_id(row: &PgRow, column: &'static str) -> Result<UserId, DomainError> {
    let value: String = get(row, column)?;
    UserId::new(value).map_err(|e| corrupt(column, e))
}

pub(super) fn message_kind(row: &PgRow, column: &'static str) -> Result<MessageKind, DomainError> {
    let value: String = get(row, column)?;
    value.parse().map_err(|e| corrupt(column, e))
}

/// Expects `id, participant_low, participant_high, created_at, updated_at`.
pub(super) fn conversation(row: &PgRow) -> Result<Conversation, DomainError> {
    let id: uuid::Uuid = get(row, "id")?;
    let participants = ParticipantPair::new(
        user_id(row, "participant_low")?,
        user_id(row, "participant_high")?,
    )
    .map_err(|e| corrupt("participant_low", e))?;

    Ok(Conversation::reconstitute(
        ConversationId::from_uuid(id),
        participants,
        timestamp(row, "created_at")?,
        timestamp(row, "updated_at")?,
    ))
}

/// Expects the message columns plus the LEFT JOINed `attachment_*` columns.
/// Read receipts are attached separately.
pub(super) fn message(row: &PgRow) -> Result<Message, DomainError> {
    let id: uuid::Uuid = get(row, "id")?;
    let conversation_id: uuid::Uuid = get(row, "conversation_id")?;

    let attachment_id: Option<uuid::Uuid> = get(row, "attachment_id")?;
    let attachment = match attachment_id {
        Some(attachment_id) => {
            let file_size: i64 = get(row, "attachment_file_size")?;
            Some(Attachment {
                id: AttachmentId::from_uuid(attachment_id),
                file_name: get(row, "attachment_file_name")?,
                file_url: get(row, "attachment_file_url")?,
                file_type: get(row, "attachment_file_type")?,
                file_size: u64::try_from(file_size)
                    .map_err(|e| corrupt("attachment_file_size", e))?,
                checksum: get(row, "attachment_checksum")?,
            })
        }
        None => None,
    };

    Ok(Message {
        id: MessageId::from_uuid(id),
        conversation_id: ConversationId::from_uuid(conversation_id),
        sender_id: user_id(row, "sender_id")?,
        receiver_id: user_id(row, "receiver_id")?,
        content: get(row, "content")?,
        kind: message_kind(row, "message_type")?,
        created_at: timestamp(row, "created_at")?,
        attachment,
        read_receipts: Vec::new(),
    })
}
