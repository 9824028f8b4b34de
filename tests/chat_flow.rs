use bozor_api::{
    db::{create_orm_conn, create_pool},
    dto::chat::{OpenConversationRequest, SendMessageRequest},
    entity::products::ActiveModel as ProductActive,
    entity::users::ActiveModel as UserActive,
    error::AppError,
    middleware::auth::AuthUser,
    notify::Notifier,
    routes::params::{MessagesQuery, Pagination},
    services::chat_service,
    state::AppState,
};
use sea_orm::ActiveValue::NotSet;
use sea_orm::{ActiveModelTrait, Set};
use uuid::Uuid;

// Buyer-seller thread: get-or-create, read marking and the incremental
// cursor, with outsiders kept out.
#[tokio::test]
async fn conversation_flow() -> anyhow::Result<()> {
    // Allow skipping when no DB is configured in the environment.
    let database_url =
        match std::env::var("TEST_DATABASE_URL").or_else(|_| std::env::var("DATABASE_URL")) {
            Ok(url) => url,
            Err(_) => {
                eprintln!(
                    "Skipping test: set TEST_DATABASE_URL or DATABASE_URL to run integration flow tests."
                );
                return Ok(());
            }
        };

    let state = setup_state(&database_url).await?;

    let seller_id = create_user(&state, "seller@test.uz", true).await?;
    let buyer_id = create_user(&state, "buyer@test.uz", false).await?;
    let outsider_id = create_user(&state, "outsider@test.uz", false).await?;

    let seller = AuthUser { user_id: seller_id };
    let buyer = AuthUser { user_id: buyer_id };
    let outsider = AuthUser {
        user_id: outsider_id,
    };

    let product_id = create_product(&state, seller_id).await?;

    // Opening twice yields the same thread.
    let conversation = chat_service::open_conversation(
        &state,
        &buyer,
        OpenConversationRequest { product_id },
    )
    .await?
    .data
    .unwrap();
    let again = chat_service::open_conversation(
        &state,
        &buyer,
        OpenConversationRequest { product_id },
    )
    .await?
    .data
    .unwrap();
    assert_eq!(conversation.id, again.id);

    // Sellers do not chat with themselves about their own listing.
    let err = chat_service::open_conversation(
        &state,
        &seller,
        OpenConversationRequest { product_id },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::BadRequest(_)));

    // An exchange.
    chat_service::send_message(
        &state,
        &buyer,
        conversation.id,
        SendMessageRequest {
            body: "Salom! Mahsulot bormi?".into(),
        },
    )
    .await?;
    let reply = chat_service::send_message(
        &state,
        &seller,
        conversation.id,
        SendMessageRequest {
            body: "Salom! Bor, marhamat.".into(),
        },
    )
    .await?
    .data
    .unwrap();

    let err = chat_service::send_message(
        &state,
        &buyer,
        conversation.id,
        SendMessageRequest { body: "   ".into() },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::BadRequest(_)));

    // The buyer has one unread message until they open the thread.
    let inbox = chat_service::list_conversations(&state, &buyer, pagination())
        .await?
        .data
        .unwrap();
    assert_eq!(inbox.items.len(), 1);
    assert_eq!(inbox.items[0].unread_count, 1);
    assert_eq!(inbox.items[0].product_name, "Atlas ko'ylak");

    let thread = chat_service::list_messages(
        &state,
        &buyer,
        conversation.id,
        MessagesQuery { after: None },
    )
    .await?
    .data
    .unwrap();
    assert_eq!(thread.items.len(), 2);

    let inbox = chat_service::list_conversations(&state, &buyer, pagination())
        .await?
        .data
        .unwrap();
    assert_eq!(inbox.items[0].unread_count, 0);

    // The seller still sees the buyer's first message as unread.
    let seller_inbox = chat_service::list_conversations(&state, &seller, pagination())
        .await?
        .data
        .unwrap();
    assert_eq!(seller_inbox.items[0].unread_count, 1);

    // The cursor returns only messages newer than the given id.
    chat_service::send_message(
        &state,
        &buyer,
        conversation.id,
        SendMessageRequest {
            body: "Narxi qancha?".into(),
        },
    )
    .await?;
    let newer = chat_service::list_messages(
        &state,
        &buyer,
        conversation.id,
        MessagesQuery {
            after: Some(reply.id),
        },
    )
    .await?
    .data
    .unwrap();
    assert_eq!(newer.items.len(), 1);
    assert_eq!(newer.items[0].body, "Narxi qancha?");

    // Outsiders get the same 404 an unknown thread would give.
    let err = chat_service::list_messages(
        &state,
        &outsider,
        conversation.id,
        MessagesQuery { after: None },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::NotFound));

    Ok(())
}

async fn setup_state(database_url: &str) -> anyhow::Result<AppState> {
    let pool = create_pool(database_url).await?;
    sqlx::migrate!("./migrations").run(&pool).await?;

    // Clean tables between runs.
    sqlx::query(
        "TRUNCATE TABLE messages, conversations, reviews, favorites, orders, products, \
         seller_applications, contact_messages, contact_requests, ads, audit_logs, users CASCADE",
    )
    .execute(&pool)
    .await?;

    let orm = create_orm_conn(database_url).await?;
    Ok(AppState {
        pool,
        orm,
        notifier: Notifier::disabled(),
    })
}

fn pagination() -> Pagination {
    Pagination {
        page: None,
        per_page: None,
    }
}

async fn create_user(state: &AppState, email: &str, seller: bool) -> anyhow::Result<Uuid> {
    let user = UserActive {
        id: Set(Uuid::new_v4()),
        email: Set(Some(email.to_string())),
        password_hash: Set(Some("dummy".into())),
        full_name: Set("Test User".into()),
        phone: Set(None),
        address: Set(None),
        telegram_id: Set(None),
        is_admin: Set(false),
        is_seller: Set(seller),
        is_verified_seller: Set(seller),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await?;
    Ok(user.id)
}

async fn create_product(state: &AppState, seller_id: Uuid) -> anyhow::Result<Uuid> {
    let product = ProductActive {
        id: Set(Uuid::new_v4()),
        seller_id: Set(seller_id),
        name: Set("Atlas ko'ylak".into()),
        description: Set(None),
        category: Set(Some("Kiyim".into())),
        price: Set(120_000),
        stock: Set(10),
        image_url: Set(None),
        is_approved: Set(true),
        is_active: Set(true),
        view_count: Set(0),
        like_count: Set(0),
        order_count: Set(0),
        average_rating: Set(0.0),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&state.orm)
    .await?;
    Ok(product.id)
}
