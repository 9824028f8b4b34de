use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::{get, post},
};
use uuid::Uuid;

use crate::{
    dto::chat::{ConversationList, MessageList, OpenConversationRequest, SendMessageRequest},
    error::AppResult,
    middleware::auth::AuthUser,
    models::{Conversation, Message},
    response::ApiResponse,
    routes::params::{MessagesQuery, Pagination},
    services::chat_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/conversations", post(open_conversation))
        .route("/conversations", get(list_conversations))
        .route("/conversations/{id}/messages", get(list_messages))
        .route("/conversations/{id}/messages", post(send_message))
}

#[utoipa::path(
    post,
    path = "/api/chat/conversations",
    request_body = OpenConversationRequest,
    responses(
        (status = 200, description = "Conversation opened or found", body = ApiResponse<Conversation>),
        (status = 400, description = "Own product"),
        (status = 404, description = "Product not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Chat"
)]
pub async fn open_conversation(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<OpenConversationRequest>,
) -> AppResult<Json<ApiResponse<Conversation>>> {
    let resp = chat_service::open_conversation(&state, &user, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/chat/conversations",
    params(
        ("page" = Option<i64>, Query, description = "Page number, default 1"),
        ("per_page" = Option<i64>, Query, description = "Items per page, default 20"),
    ),
    responses(
        (status = 200, description = "My threads, newest activity first", body = ApiResponse<ConversationList>),
        (status = 401, description = "Unauthorized"),
    ),
    security(("bearer_auth" = [])),
    tag = "Chat"
)]
pub async fn list_conversations(
    State(state): State<AppState>,
    user: AuthUser,
    Query(pagination): Query<Pagination>,
) -> AppResult<Json<ApiResponse<ConversationList>>> {
    let resp = chat_service::list_conversations(&state, &user, pagination).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/chat/conversations/{id}/messages",
    params(
        ("id" = Uuid, Path, description = "Conversation ID"),
        ("after" = Option<Uuid>, Query, description = "Return only messages newer than this id"),
    ),
    responses(
        (status = 200, description = "Messages, oldest first; marks incoming as read", body = ApiResponse<MessageList>),
        (status = 404, description = "Not a participant"),
    ),
    security(("bearer_auth" = [])),
    tag = "Chat"
)]
pub async fn list_messages(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Query(query): Query<MessagesQuery>,
) -> AppResult<Json<ApiResponse<MessageList>>> {
    let resp = chat_service::list_messages(&state, &user, id, query).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/chat/conversations/{id}/messages",
    params(
        ("id" = Uuid, Path, description = "Conversation ID")
    ),
    request_body = SendMessageRequest,
    responses(
        (status = 200, description = "Message sent", body = ApiResponse<Message>),
        (status = 400, description = "Empty body"),
        (status = 404, description = "Not a participant"),
    ),
    security(("bearer_auth" = [])),
    tag = "Chat"
)]
pub async fn send_message(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<SendMessageRequest>,
) -> AppResult<Json<ApiResponse<Message>>> {
    let resp = chat_service::send_message(&state, &user, id, payload).await?;
    Ok(Json(resp))
}
