use bozor_api::{
    db::{create_orm_conn, create_pool},
    dto::orders::{PlaceOrderRequest, UpdateOrderStatusRequest},
    entity::products::{ActiveModel as ProductActive, Entity as Products},
    entity::users::ActiveModel as UserActive,
    error::AppError,
    middleware::auth::AuthUser,
    notify::Notifier,
    routes::params::{OrderListQuery, Pagination},
    services::{admin_service, order_service, seller_service},
    state::AppState,
};
use sea_orm::ActiveValue::NotSet;
use sea_orm::{ActiveModelTrait, EntityTrait, Set};
use uuid::Uuid;

// Integration flow: buyer checks out -> stock moves -> admin walks the order
// through the lifecycle; sellers only see their own orders.
#[tokio::test]
async fn checkout_and_lifecycle_flow() -> anyhow::Result<()> {
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

    let seller_id = create_user(&state, "seller@test.uz", false, true).await?;
    let rival_id = create_user(&state, "rival@test.uz", false, true).await?;
    let buyer_id = create_user(&state, "buyer@test.uz", false, false).await?;
    let admin_id = create_user(&state, "admin@test.uz", true, false).await?;

    let product_id = create_product(&state, seller_id, "Atlas ko'ylak", 120_000, 10).await?;

    let buyer = AuthUser { user_id: buyer_id };
    let admin = AuthUser { user_id: admin_id };
    let seller = AuthUser { user_id: seller_id };
    let rival = AuthUser { user_id: rival_id };

    // Buyer checkout: total is computed server-side from the locked price.
    let placed = order_service::place_order(&state, Some(&buyer), order_request(product_id, 2))
        .await?
        .data
        .unwrap();
    assert_eq!(placed.status, "pending");
    assert_eq!(placed.total_amount, 240_000);
    assert_eq!(placed.buyer_id, Some(buyer_id));
    assert_eq!(placed.seller_id, seller_id);

    let product = Products::find_by_id(product_id)
        .one(&state.orm)
        .await?
        .unwrap();
    assert_eq!(product.stock, 8);
    assert_eq!(product.order_count, 1);

    // More than the remaining stock is refused.
    let err = order_service::place_order(&state, Some(&buyer), order_request(product_id, 100))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::BadRequest(_)));

    // Anonymous checkout carries only the contact snapshot.
    let anon = order_service::place_order(&state, None, order_request(product_id, 1))
        .await?
        .data
        .unwrap();
    assert_eq!(anon.buyer_id, None);

    // Public tracking works without auth.
    let tracked = order_service::track_order(&state, placed.id)
        .await?
        .data
        .unwrap();
    assert_eq!(tracked.product_name, "Atlas ko'ylak");
    assert_eq!(tracked.status, "pending");

    // The buyer sees their own order and not the anonymous one.
    let mine = order_service::list_my_orders(&state, &buyer, order_list_query())
        .await?
        .data
        .unwrap();
    assert_eq!(mine.items.len(), 1);
    assert_eq!(mine.items[0].id, placed.id);

    // Admin walks the order through the whole lifecycle.
    for status in ["confirmed", "processing", "shipped", "delivered", "completed"] {
        let updated = set_status_as_admin(&state, &admin, placed.id, status).await?;
        assert_eq!(updated.status, status);
    }

    // Terminal orders cannot move again.
    let err = admin_service::update_order_status(
        &state,
        &admin,
        placed.id,
        UpdateOrderStatusRequest {
            status: "pending".into(),
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::BadRequest(_)));

    // Skipping a stage is rejected too.
    let err = set_status_as_admin(&state, &admin, anon.id, "shipped")
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::BadRequest(_)));

    // A pending order can still be cancelled.
    let cancelled = set_status_as_admin(&state, &admin, anon.id, "cancelled").await?;
    assert_eq!(cancelled.status, "cancelled");

    // Another seller neither sees nor moves this seller's orders.
    let scoped = order_service::place_order(&state, Some(&buyer), order_request(product_id, 1))
        .await?
        .data
        .unwrap();
    let err = seller_service::update_order_status(
        &state,
        &rival,
        scoped.id,
        UpdateOrderStatusRequest {
            status: "confirmed".into(),
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::NotFound));

    let confirmed = seller_service::update_order_status(
        &state,
        &seller,
        scoped.id,
        UpdateOrderStatusRequest {
            status: "confirmed".into(),
        },
    )
    .await?
    .data
    .unwrap();
    assert_eq!(confirmed.status, "confirmed");

    // Sale history blocks product deletion.
    let err = seller_service::delete_product(&state, &seller, product_id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::BadRequest(_)));

    // The order operations left an audit trail.
    let (audits,): (i64,) =
        sqlx::query_as("SELECT COUNT(*) FROM audit_logs WHERE action = 'order_status_update'")
            .fetch_one(&state.pool)
            .await?;
    assert!(audits >= 7, "expected audit rows for status updates");

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

async fn create_user(
    state: &AppState,
    email: &str,
    is_admin: bool,
    verified_seller: bool,
) -> anyhow::Result<Uuid> {
    let user = UserActive {
        id: Set(Uuid::new_v4()),
        email: Set(Some(email.to_string())),
        password_hash: Set(Some("dummy".into())),
        full_name: Set("Test User".into()),
        phone: Set(None),
        address: Set(None),
        telegram_id: Set(None),
        is_admin: Set(is_admin),
        is_seller: Set(verified_seller),
        is_verified_seller: Set(verified_seller),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await?;
    Ok(user.id)
}

async fn create_product(
    state: &AppState,
    seller_id: Uuid,
    name: &str,
    price: i64,
    stock: i32,
) -> anyhow::Result<Uuid> {
    let product = ProductActive {
        id: Set(Uuid::new_v4()),
        seller_id: Set(seller_id),
        name: Set(name.into()),
        description: Set(None),
        category: Set(Some("Kiyim".into())),
        price: Set(price),
        stock: Set(stock),
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

fn order_request(product_id: Uuid, quantity: i32) -> PlaceOrderRequest {
    PlaceOrderRequest {
        product_id,
        quantity,
        customer_name: "Nodira Azimova".into(),
        customer_phone: "+998901234567".into(),
        customer_address: "Toshkent, Chilonzor 5".into(),
    }
}

fn order_list_query() -> OrderListQuery {
    OrderListQuery {
        pagination: Pagination {
            page: None,
            per_page: None,
        },
        status: None,
        sort_order: None,
    }
}

async fn set_status_as_admin(
    state: &AppState,
    admin: &AuthUser,
    order_id: Uuid,
    status: &str,
) -> Result<bozor_api::models::Order, AppError> {
    admin_service::update_order_status(
        state,
        admin,
        order_id,
        UpdateOrderStatusRequest {
            status: status.into(),
        },
    )
    .await
    .map(|resp| resp.data.unwrap())
}
