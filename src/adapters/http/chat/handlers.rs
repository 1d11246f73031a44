//! HTTP handlers for chat endpoints.

use std::sync::Arc;

use axum::{
    extract::{
        multipart::{Field, MultipartError},
        Multipart, Path, Query, State,
    },
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};

use crate::adapters::http::middleware::RequireAuth;
use crate::application::handlers::{
    ListContactsHandler, ListContactsQuery, ListConversationsHandler, ListConversationsQuery,
    ListMessagesHandler, ListMessagesQuery, MarkReadCommand, MarkReadHandler,
    OpenConversationCommand, OpenConversationHandler, RejectOversizedCommand, SendMessageCommand,
    SendMessageHandler, UploadAttachmentCommand, UploadAttachmentHandler,
};
use crate::domain::conversation::ChatError;
use crate::domain::foundation::{AuthenticatedUser, CommandMetadata, ConversationId, UserId};

use super::dto::{
    ContactResponse, ConversationResponse, ConversationSummaryResponse, ErrorResponse,
    MarkReadResponse, MessageHistoryParams, MessagePageResponse, OpenConversationRequest,
    SendMessageRequest,
};

/// Header set by the request-id layer.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Allowance shared by the non-file fields of an upload form.
const MAX_FORM_TEXT_BYTES: usize = 64 * 1024;

// ════════════════════════════════════════════════════════════════════════════
// Handler state
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone)]
pub struct ChatHandlers {
    pub open_conversation: Arc<OpenConversationHandler>,
    pub list_conversations: Arc<ListConversationsHandler>,
    pub list_messages: Arc<ListMessagesHandler>,
    pub send_message: Arc<SendMessageHandler>,
    pub upload_attachment: Arc<UploadAttachmentHandler>,
    pub mark_read: Arc<MarkReadHandler>,
    pub list_contacts: Arc<ListContactsHandler>,
}

fn metadata(user: &AuthenticatedUser, headers: &HeaderMap) -> CommandMetadata {
    let metadata = CommandMetadata::new(user.id.clone()).with_source("api");
    match headers.get(REQUEST_ID_HEADER).and_then(|v| v.to_str().ok()) {
        Some(request_id) => metadata.with_correlation_id(request_id),
        None => metadata,
    }
}

fn parse_conversation_id(raw: &str) -> Result<ConversationId, Response> {
    raw.parse().map_err(|_| {
        (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse::bad_request("Invalid conversation ID")),
        )
            .into_response()
    })
}

fn parse_user_id(field: &str, raw: String) -> Result<UserId, Response> {
    UserId::new(raw).map_err(|_| {
        (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse::bad_request(format!("{} is required", field))),
        )
            .into_response()
    })
}

// ════════════════════════════════════════════════════════════════════════════
// Conversations
// ════════════════════════════════════════════════════════════════════════════

/// GET /api/conversations - The caller's conversations, newest activity first
pub async fn list_conversations(
    State(handlers): State<ChatHandlers>,
    RequireAuth(user): RequireAuth,
) -> Response {
    let query = ListConversationsQuery { user_id: user.id };

    match handlers.list_conversations.handle(query).await {
        Ok(items) => {
            let response: Vec<ConversationSummaryResponse> =
                items.into_iter().map(Into::into).collect();
            (StatusCode::OK, Json(response)).into_response()
        }
        Err(e) => handle_chat_error(e),
    }
}

/// POST /api/conversations - Find or create the conversation with another user
pub async fn open_conversation(
    State(handlers): State<ChatHandlers>,
    RequireAuth(user): RequireAuth,
    headers: HeaderMap,
    Json(req): Json<OpenConversationRequest>,
) -> Response {
    let other_user_id = match parse_user_id("otherUserId", req.other_user_id) {
        Ok(id) => id,
        Err(response) => return response,
    };

    let cmd = OpenConversationCommand { other_user_id };
    match handlers
        .open_conversation
        .handle(cmd, metadata(&user, &headers))
        .await
    {
        Ok(result) => {
            let status = if result.created {
                StatusCode::CREATED
            } else {
                StatusCode::OK
            };
            (status, Json(ConversationResponse::from(result))).into_response()
        }
        Err(e) => handle_chat_error(e),
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Messages
// ════════════════════════════════════════════════════════════════════════════

/// GET /api/conversations/:id/messages - Message history, oldest first
pub async fn list_messages(
    State(handlers): State<ChatHandlers>,
    RequireAuth(user): RequireAuth,
    Path(conversation_id): Path<String>,
    Query(params): Query<MessageHistoryParams>,
) -> Response {
    let conversation_id = match parse_conversation_id(&conversation_id) {
        Ok(id) => id,
        Err(response) => return response,
    };

    let query = ListMessagesQuery {
        conversation_id,
        user_id: user.id,
        offset: params.offset,
        limit: params.limit,
    };

    match handlers.list_messages.handle(query).await {
        Ok(page) => (StatusCode::OK, Json(MessagePageResponse::from(page))).into_response(),
        Err(e) => handle_chat_error(e),
    }
}

/// POST /api/conversations/:id/messages - Send a text message
pub async fn send_message(
    State(handlers): State<ChatHandlers>,
    RequireAuth(user): RequireAuth,
    headers: HeaderMap,
    Path(conversation_id): Path<String>,
    Json(req): Json<SendMessageRequest>,
) -> Response {
    let conversation_id = match parse_conversation_id(&conversation_id) {
        Ok(id) => id,
        Err(response) => return response,
    };
    let receiver_id = match req.receiver_id {
        Some(raw) => match parse_user_id("receiverId", raw) {
            Ok(id) => Some(id),
            Err(response) => return response,
        },
        None => None,
    };

    let cmd = SendMessageCommand {
        conversation_id,
        receiver_id,
        content: req.content,
    };
    match handlers
        .send_message
        .handle(cmd, metadata(&user, &headers))
        .await
    {
        Ok(message) => (StatusCode::CREATED, Json(message)).into_response(),
        Err(e) => handle_chat_error(e),
    }
}

/// POST /api/conversations/:id/attachments - Upload a file as a message
///
/// Multipart fields: `file` (required), `content` (caption), `receiverId`.
/// The route has no framework body limit; the file is streamed and abandoned
/// as soon as it passes the attachment limit.
pub async fn upload_attachment(
    State(handlers): State<ChatHandlers>,
    RequireAuth(user): RequireAuth,
    headers: HeaderMap,
    Path(conversation_id): Path<String>,
    multipart: Multipart,
) -> Response {
    let conversation_id = match parse_conversation_id(&conversation_id) {
        Ok(id) => id,
        Err(response) => return response,
    };

    let max_file_bytes = handlers.upload_attachment.policy().max_bytes();
    let form = match read_upload_form(multipart, max_file_bytes).await {
        Ok(form) => form,
        Err(response) => return response,
    };
    let Some(file) = form.file else {
        return (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse::bad_request("file is required")),
        )
            .into_response();
    };
    let receiver_id = match form.receiver_id {
        Some(raw) => match parse_user_id("receiverId", raw) {
            Ok(id) => Some(id),
            Err(response) => return response,
        },
        None => None,
    };

    if file.truncated {
        let cmd = RejectOversizedCommand {
            conversation_id,
            file_name: file.file_name,
            content_type: file.content_type,
            received_bytes: file.bytes.len() as u64,
        };
        let error = handlers
            .upload_attachment
            .reject_oversized(cmd, metadata(&user, &headers))
            .await;
        return handle_chat_error(error);
    }

    let cmd = UploadAttachmentCommand {
        conversation_id,
        receiver_id,
        file_name: file.file_name,
        content_type: file.content_type,
        bytes: file.bytes,
        caption: form.caption,
    };
    match handlers
        .upload_attachment
        .handle(cmd, metadata(&user, &headers))
        .await
    {
        Ok(message) => (StatusCode::CREATED, Json(message)).into_response(),
        Err(e) => handle_chat_error(e),
    }
}

struct UploadedFile {
    file_name: String,
    content_type: String,
    bytes: Vec<u8>,
    /// Reading stopped once the limit was passed.
    truncated: bool,
}

#[derive(Default)]
struct UploadForm {
    file: Option<UploadedFile>,
    caption: Option<String>,
    receiver_id: Option<String>,
}

fn multipart_rejection(e: MultipartError) -> Response {
    let status = e.status();
    let body = if status == StatusCode::PAYLOAD_TOO_LARGE {
        ErrorResponse::payload_too_large(e.body_text())
    } else {
        ErrorResponse::bad_request(e.body_text())
    };
    (status, Json(body)).into_response()
}

async fn read_upload_form(
    mut multipart: Multipart,
    max_file_bytes: u64,
) -> Result<UploadForm, Response> {
    let mut form = UploadForm::default();
    let mut text_budget = MAX_FORM_TEXT_BYTES;

    while let Some(mut field) = multipart.next_field().await.map_err(multipart_rejection)? {
        let name = field.name().unwrap_or_default().to_string();
        if name == "file" {
            let file = read_file_field(field, max_file_bytes).await?;
            let truncated = file.truncated;
            form.file = Some(file);
            if truncated {
                break;
            }
            continue;
        }

        let text = read_text_field(&mut field, &mut text_budget).await?;
        match name.as_str() {
            "content" => form.caption = Some(text).filter(|t| !t.trim().is_empty()),
            "receiverId" => form.receiver_id = Some(text).filter(|t| !t.trim().is_empty()),
            other => {
                tracing::debug!(field = other, "Ignoring unknown upload field");
            }
        }
    }
    Ok(form)
}

async fn read_file_field(
    mut field: Field<'_>,
    max_file_bytes: u64,
) -> Result<UploadedFile, Response> {
    let file_name = field.file_name().unwrap_or_default().to_string();
    let content_type = field
        .content_type()
        .unwrap_or("application/octet-stream")
        .to_string();

    let mut bytes = Vec::new();
    let mut truncated = false;
    while let Some(chunk) = field.chunk().await.map_err(multipart_rejection)? {
        bytes.extend_from_slice(&chunk);
        if bytes.len() as u64 > max_file_bytes {
            truncated = true;
            break;
        }
    }

    Ok(UploadedFile {
        file_name,
        content_type,
        bytes,
        truncated,
    })
}

async fn read_text_field(field: &mut Field<'_>, budget: &mut usize) -> Result<String, Response> {
    let mut buf = Vec::new();
    while let Some(chunk) = field.chunk().await.map_err(multipart_rejection)? {
        if chunk.len() > *budget {
            return Err((
                StatusCode::PAYLOAD_TOO_LARGE,
                Json(ErrorResponse::payload_too_large("Upload form fields are too large")),
            )
                .into_response());
        }
        *budget -= chunk.len();
        buf.extend_from_slice(&chunk);
    }
    String::from_utf8(buf).map_err(|_| {
        (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse::bad_request("Form fields must be UTF-8 text")),
        )
            .into_response()
    })
}

/// POST /api/conversations/:id/read - Mark every message addressed to the caller as read
pub async fn mark_read(
    State(handlers): State<ChatHandlers>,
    RequireAuth(user): RequireAuth,
    headers: HeaderMap,
    Path(conversation_id): Path<String>,
) -> Response {
    let conversation_id = match parse_conversation_id(&conversation_id) {
        Ok(id) => id,
        Err(response) => return response,
    };

    let cmd = MarkReadCommand { conversation_id };
    match handlers.mark_read.handle(cmd, metadata(&user, &headers)).await {
        Ok(result) => (StatusCode::OK, Json(MarkReadResponse::from(result))).into_response(),
        Err(e) => handle_chat_error(e),
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Contacts
// ════════════════════════════════════════════════════════════════════════════

/// GET /api/contacts - Verified users the caller may chat with
pub async fn list_contacts(
    State(handlers): State<ChatHandlers>,
    RequireAuth(user): RequireAuth,
) -> Response {
    let query = ListContactsQuery { user_id: user.id };

    match handlers.list_contacts.handle(query).await {
        Ok(users) => {
            let response: Vec<ContactResponse> = users.into_iter().map(Into::into).collect();
            (StatusCode::OK, Json(response)).into_response()
        }
        Err(e) => handle_chat_error(e),
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Error handling
// ════════════════════════════════════════════════════════════════════════════

/// Maps a chat error to its status and body. Infrastructure causes are
/// logged and replaced by a generic message.
pub fn chat_error_body(error: ChatError) -> (StatusCode, ErrorResponse) {
    match error {
        ChatError::NotFound(id) => (
            StatusCode::NOT_FOUND,
            ErrorResponse::not_found("Conversation", &id.to_string()),
        ),
        ChatError::UserNotFound(id) => (
            StatusCode::NOT_FOUND,
            ErrorResponse::not_found("User", id.as_str()),
        ),
        ChatError::Forbidden(reason) => (StatusCode::FORBIDDEN, ErrorResponse::forbidden(reason)),
        ChatError::Validation { field, message } => (
            StatusCode::BAD_REQUEST,
            ErrorResponse::bad_request(message)
                .with_details(serde_json::json!({ "field": field })),
        ),
        ChatError::AttachmentRejected(rejection) => (
            StatusCode::BAD_REQUEST,
            ErrorResponse::bad_request(rejection.to_string())
                .with_details(serde_json::json!({ "field": "file" })),
        ),
        ChatError::Infrastructure(cause) => {
            tracing::error!(error = %cause, "Chat request failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorResponse::internal("An unexpected error occurred"),
            )
        }
    }
}

fn handle_chat_error(error: ChatError) -> Response {
    let (status, body) = chat_error_body(error);
    (status, Json(body)).into_response()
}
