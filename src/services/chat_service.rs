use chrono::{DateTime, Utc};
use sea_orm::ActiveValue::NotSet;
use sea_orm::{ActiveModelTrait, ColumnTrait, Condition, EntityTrait, QueryFilter, Set, TransactionTrait};
use sqlx::FromRow;
use uuid::Uuid;

use crate::{
    dto::chat::{
        ConversationList, ConversationSummary, MessageList, OpenConversationRequest,
        SendMessageRequest,
    },
    entity::{
        conversations::{
            ActiveModel as ConversationActive, Column as ConvCol, Entity as Conversations,
            Model as ConversationModel,
        },
        messages::ActiveModel as MessageActive,
        products::{Column as ProdCol, Entity as Products},
    },
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::{Conversation, Message},
    response::{ApiResponse, Meta},
    routes::params::{MessagesQuery, Pagination},
    state::AppState,
};

pub async fn open_conversation(
    state: &AppState,
    user: &AuthUser,
    payload: OpenConversationRequest,
) -> AppResult<ApiResponse<Conversation>> {
    let product = Products::find()
        .filter(
            Condition::all()
                .add(ProdCol::Id.eq(payload.product_id))
                .add(ProdCol::IsApproved.eq(true))
                .add(ProdCol::IsActive.eq(true)),
        )
        .one(&state.orm)
        .await?;
    let product = match product {
        Some(p) => p,
        None => return Err(AppError::NotFound),
    };

    if product.seller_id == user.user_id {
        return Err(AppError::BadRequest(
            "Cannot open a conversation about your own product".into(),
        ));
    }

    let existing = Conversations::find()
        .filter(
            Condition::all()
                .add(ConvCol::BuyerId.eq(user.user_id))
                .add(ConvCol::SellerId.eq(product.seller_id))
                .add(ConvCol::ProductId.eq(product.id)),
        )
        .one(&state.orm)
        .await?;

    let conversation = match existing {
        Some(c) => c,
        None => {
            ConversationActive {
                id: Set(Uuid::new_v4()),
                buyer_id: Set(user.user_id),
                seller_id: Set(product.seller_id),
                product_id: Set(product.id),
                created_at: NotSet,
                last_message_at: NotSet,
            }
            .insert(&state.orm)
            .await?
        }
    };

    Ok(ApiResponse::success(
        "Conversation",
        conversation_from_entity(conversation),
        Some(Meta::empty()),
    ))
}

#[derive(FromRow)]
struct ConversationRow {
    id: Uuid,
    buyer_id: Uuid,
    seller_id: Uuid,
    product_id: Uuid,
    product_name: String,
    last_message_at: DateTime<Utc>,
    unread_count: i64,
}

pub async fn list_conversations(
    state: &AppState,
    user: &AuthUser,
    pagination: Pagination,
) -> AppResult<ApiResponse<ConversationList>> {
    let (page, limit, offset) = pagination.normalize();

    let rows = sqlx::query_as::<_, ConversationRow>(
        r#"
        SELECT c.id, c.buyer_id, c.seller_id, c.product_id,
               p.name AS product_name,
               c.last_message_at,
               (SELECT COUNT(*) FROM messages m
                 WHERE m.conversation_id = c.id
                   AND m.sender_id <> $1
                   AND m.is_read = FALSE) AS unread_count
        FROM conversations c
        JOIN products p ON p.id = c.product_id
        WHERE c.buyer_id = $1 OR c.seller_id = $1
        ORDER BY c.last_message_at DESC
        LIMIT $2 OFFSET $3
        "#,
    )
    .bind(user.user_id)
    .bind(limit)
    .bind(offset)
    .fetch_all(&state.pool)
    .await?;

    let total: (i64,) =
        sqlx::query_as("SELECT COUNT(*) FROM conversations WHERE buyer_id = $1 OR seller_id = $1")
            .bind(user.user_id)
            .fetch_one(&state.pool)
            .await?;

    let items = rows
        .into_iter()
        .map(|r| ConversationSummary {
            id: r.id,
            buyer_id: r.buyer_id,
            seller_id: r.seller_id,
            product_id: r.product_id,
            product_name: r.product_name,
            last_message_at: r.last_message_at,
            unread_count: r.unread_count,
        })
        .collect();

    let meta = Meta::new(page, limit, total.0);
    Ok(ApiResponse::success(
        "Conversations",
        ConversationList { items },
        Some(meta),
    ))
}

#[derive(FromRow)]
struct MessageRow {
    id: Uuid,
    conversation_id: Uuid,
    sender_id: Uuid,
    body: String,
    is_read: bool,
    created_at: DateTime<Utc>,
}

pub async fn list_messages(
    state: &AppState,
    user: &AuthUser,
    conversation_id: Uuid,
    query: MessagesQuery,
) -> AppResult<ApiResponse<MessageList>> {
    require_participant(state, user, conversation_id).await?;

    // Viewing the thread is what marks the counterpart's messages read.
    sqlx::query(
        r#"
        UPDATE messages SET is_read = TRUE
        WHERE conversation_id = $1 AND sender_id <> $2 AND is_read = FALSE
        "#,
    )
    .bind(conversation_id)
    .bind(user.user_id)
    .execute(&state.pool)
    .await?;

    let rows = match query.after {
        Some(after) => {
            sqlx::query_as::<_, MessageRow>(
                r#"
                SELECT m.id, m.conversation_id, m.sender_id, m.body, m.is_read, m.created_at
                FROM messages m
                WHERE m.conversation_id = $1
                  AND (m.created_at, m.id) >
                      (SELECT m2.created_at, m2.id FROM messages m2 WHERE m2.id = $2)
                ORDER BY m.created_at ASC, m.id ASC
                "#,
            )
            .bind(conversation_id)
            .bind(after)
            .fetch_all(&state.pool)
            .await?
        }
        None => {
            sqlx::query_as::<_, MessageRow>(
                r#"
                SELECT m.id, m.conversation_id, m.sender_id, m.body, m.is_read, m.created_at
                FROM messages m
                WHERE m.conversation_id = $1
                ORDER BY m.created_at ASC, m.id ASC
                "#,
            )
            .bind(conversation_id)
            .fetch_all(&state.pool)
            .await?
        }
    };

    let items = rows
        .into_iter()
        .map(|r| Message {
            id: r.id,
            conversation_id: r.conversation_id,
            sender_id: r.sender_id,
            body: r.body,
            is_read: r.is_read,
            created_at: r.created_at,
        })
        .collect();

    Ok(ApiResponse::success(
        "Messages",
        MessageList { items },
        Some(Meta::empty()),
    ))
}

pub async fn send_message(
    state: &AppState,
    user: &AuthUser,
    conversation_id: Uuid,
    payload: SendMessageRequest,
) -> AppResult<ApiResponse<Message>> {
    if payload.body.trim().is_empty() {
        return Err(AppError::BadRequest("Message body is required".into()));
    }

    let conversation = require_participant(state, user, conversation_id).await?;

    let txn = state.orm.begin().await?;

    let message = MessageActive {
        id: Set(Uuid::new_v4()),
        conversation_id: Set(conversation.id),
        sender_id: Set(user.user_id),
        body: Set(payload.body),
        is_read: Set(false),
        created_at: NotSet,
    }
    .insert(&txn)
    .await?;

    let mut active: ConversationActive = conversation.into();
    active.last_message_at = Set(message.created_at);
    active.update(&txn).await?;

    txn.commit().await?;

    Ok(ApiResponse::success(
        "Message sent",
        Message {
            id: message.id,
            conversation_id: message.conversation_id,
            sender_id: message.sender_id,
            body: message.body,
            is_read: message.is_read,
            created_at: message.created_at.with_timezone(&Utc),
        },
        Some(Meta::empty()),
    ))
}

/// Membership check shared by the message endpoints. Outsiders get the
/// same 404 an unknown conversation id would.
async fn require_participant(
    state: &AppState,
    user: &AuthUser,
    conversation_id: Uuid,
) -> AppResult<ConversationModel> {
    let conversation = Conversations::find_by_id(conversation_id)
        .one(&state.orm)
        .await?;
    let conversation = match conversation {
        Some(c) => c,
        None => return Err(AppError::NotFound),
    };
    if conversation.buyer_id != user.user_id && conversation.seller_id != user.user_id {
        return Err(AppError::NotFound);
    }
    Ok(conversation)
}

fn conversation_from_entity(model: ConversationModel) -> Conversation {
    Conversation {
        id: model.id,
        buyer_id: model.buyer_id,
        seller_id: model.seller_id,
        product_id: model.product_id,
        created_at: model.created_at.with_timezone(&Utc),
        last_message_at: model.last_message_at.with_timezone(&Utc),
    }
}
