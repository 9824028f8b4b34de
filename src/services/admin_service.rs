use chrono::{DateTime, Utc};
use sea_orm::sea_query::Expr;
use sea_orm::sea_query::extension::postgres::PgExpr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, Set,
};
use sqlx::FromRow;
use uuid::Uuid;

use crate::{
    audit::log_audit,
    csv,
    dto::orders::{OrderList, UpdateOrderStatusRequest},
    dto::products::{ModerateProductRequest, ProductList},
    dto::users::{UpdateUserFlagsRequest, UserList},
    entity::{
        orders::{Column as OrderCol, Entity as Orders},
        products::{ActiveModel as ProductActive, Column as ProdCol, Entity as Products},
        users::{ActiveModel as UserActive, Column as UserCol, Entity as Users},
    },
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, require_admin},
    models::{Order, Product, User},
    response::{ApiResponse, Meta},
    routes::params::{AdminProductQuery, OrderExportQuery, OrderListQuery, SortOrder, UserQuery},
    services::auth_service::user_from_entity,
    services::order_service::{order_from_entity, transition_order},
    services::product_service::product_from_entity,
    state::AppState,
    status::OrderStatus,
};

pub async fn list_users(
    state: &AppState,
    user: &AuthUser,
    query: UserQuery,
) -> AppResult<ApiResponse<UserList>> {
    require_admin(state, user).await?;

    let (page, limit, offset) = query.pagination.normalize();
    let mut condition = Condition::all();
    if let Some(search) = query.q.as_ref().filter(|s| !s.is_empty()) {
        let pattern = format!("%{}%", search);
        condition = condition.add(
            Condition::any()
                .add(Expr::col(UserCol::FullName).ilike(pattern.clone()))
                .add(Expr::col(UserCol::Email).ilike(pattern.clone()))
                .add(Expr::col(UserCol::Phone).ilike(pattern)),
        );
    }

    let finder = Users::find()
        .filter(condition)
        .order_by_desc(UserCol::CreatedAt);

    let total = finder.clone().count(&state.orm).await? as i64;

    let items = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(user_from_entity)
        .collect();

    let meta = Meta::new(page, limit, total);
    Ok(ApiResponse::success("Users", UserList { items }, Some(meta)))
}

pub async fn update_user_flags(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateUserFlagsRequest,
) -> AppResult<ApiResponse<User>> {
    require_admin(state, user).await?;

    if id == user.user_id && payload.is_admin == Some(false) {
        return Err(AppError::BadRequest(
            "Cannot remove your own admin flag".into(),
        ));
    }

    let target = Users::find_by_id(id).one(&state.orm).await?;
    let target = match target {
        Some(u) => u,
        None => return Err(AppError::NotFound),
    };

    let mut active: UserActive = target.into();
    if let Some(is_admin) = payload.is_admin {
        active.is_admin = Set(is_admin);
    }
    if let Some(is_verified_seller) = payload.is_verified_seller {
        active.is_verified_seller = Set(is_verified_seller);
    }
    let target = active.update(&state.orm).await?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "user_flags_update",
        "users",
        Some(serde_json::json!({
            "user_id": target.id,
            "is_admin": target.is_admin,
            "is_verified_seller": target.is_verified_seller,
        })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Flags updated",
        user_from_entity(target),
        Some(Meta::empty()),
    ))
}

pub async fn list_all_products(
    state: &AppState,
    user: &AuthUser,
    query: AdminProductQuery,
) -> AppResult<ApiResponse<ProductList>> {
    require_admin(state, user).await?;

    let (page, limit, offset) = query.pagination.normalize();
    let mut condition = Condition::all();
    if let Some(approved) = query.approved {
        condition = condition.add(ProdCol::IsApproved.eq(approved));
    }

    let finder = Products::find()
        .filter(condition)
        .order_by_desc(ProdCol::CreatedAt);

    let total = finder.clone().count(&state.orm).await? as i64;

    let items = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(product_from_entity)
        .collect();

    let meta = Meta::new(page, limit, total);
    Ok(ApiResponse::success(
        "Products",
        ProductList { items },
        Some(meta),
    ))
}

pub async fn moderate_product(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: ModerateProductRequest,
) -> AppResult<ApiResponse<Product>> {
    require_admin(state, user).await?;

    let existing = Products::find_by_id(id).one(&state.orm).await?;
    let existing = match existing {
        Some(p) => p,
        None => return Err(AppError::NotFound),
    };

    let mut active: ProductActive = existing.into();
    if let Some(is_approved) = payload.is_approved {
        active.is_approved = Set(is_approved);
    }
    if let Some(is_active) = payload.is_active {
        active.is_active = Set(is_active);
    }
    active.updated_at = Set(Utc::now().into());
    let product = active.update(&state.orm).await?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "product_moderate",
        "products",
        Some(serde_json::json!({
            "product_id": product.id,
            "is_approved": product.is_approved,
            "is_active": product.is_active,
        })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Moderation updated",
        product_from_entity(product),
        Some(Meta::empty()),
    ))
}

pub async fn delete_product(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    require_admin(state, user).await?;

    let order_count = Orders::find()
        .filter(OrderCol::ProductId.eq(id))
        .count(&state.orm)
        .await?;
    if order_count > 0 {
        return Err(AppError::BadRequest(
            "Product has orders; deactivate it instead".into(),
        ));
    }

    let result = Products::delete_by_id(id).exec(&state.orm).await?;
    if result.rows_affected == 0 {
        return Err(AppError::NotFound);
    }

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "product_delete",
        "products",
        Some(serde_json::json!({ "product_id": id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Deleted",
        serde_json::json!({}),
        Some(Meta::empty()),
    ))
}

pub async fn list_all_orders(
    state: &AppState,
    user: &AuthUser,
    query: OrderListQuery,
) -> AppResult<ApiResponse<OrderList>> {
    require_admin(state, user).await?;

    let (page, limit, offset) = query.pagination.normalize();
    let mut condition = Condition::all();
    if let Some(status) = query.status.as_ref().filter(|s| !s.is_empty()) {
        condition = condition.add(OrderCol::Status.eq(status.clone()));
    }

    let sort_order = query.sort_order.unwrap_or(SortOrder::Desc);
    let mut finder = Orders::find().filter(condition);
    finder = match sort_order {
        SortOrder::Asc => finder.order_by_asc(OrderCol::CreatedAt),
        SortOrder::Desc => finder.order_by_desc(OrderCol::CreatedAt),
    };

    let total = finder.clone().count(&state.orm).await? as i64;

    let orders = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(order_from_entity)
        .collect();

    let meta = Meta::new(page, limit, total);
    Ok(ApiResponse::success(
        "Orders",
        OrderList { items: orders },
        Some(meta),
    ))
}

pub async fn get_order(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<Order>> {
    require_admin(state, user).await?;

    let order = Orders::find_by_id(id).one(&state.orm).await?;
    let order = match order {
        Some(o) => o,
        None => return Err(AppError::NotFound),
    };

    Ok(ApiResponse::success(
        "Order",
        order_from_entity(order),
        Some(Meta::empty()),
    ))
}

pub async fn update_order_status(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateOrderStatusRequest,
) -> AppResult<ApiResponse<Order>> {
    require_admin(state, user).await?;

    let to = OrderStatus::parse(&payload.status)
        .ok_or_else(|| AppError::BadRequest("Invalid order status".into()))?;

    let order = transition_order(state, Some(user.user_id), None, id, to).await?;

    Ok(ApiResponse::success(
        "Order updated",
        order,
        Some(Meta::empty()),
    ))
}

#[derive(FromRow)]
struct OrderExportRow {
    id: Uuid,
    created_at: DateTime<Utc>,
    status: String,
    product_name: String,
    quantity: i32,
    total_amount: i64,
    customer_name: String,
    customer_phone: String,
    customer_address: String,
}

pub async fn export_orders_csv(
    state: &AppState,
    user: &AuthUser,
    query: OrderExportQuery,
) -> AppResult<String> {
    require_admin(state, user).await?;

    let rows = sqlx::query_as::<_, OrderExportRow>(
        r#"
        SELECT o.id, o.created_at, o.status,
               p.name AS product_name,
               o.quantity, o.total_amount,
               o.customer_name, o.customer_phone, o.customer_address
        FROM orders o
        JOIN products p ON p.id = o.product_id
        WHERE ($1::TEXT IS NULL OR o.status = $1)
        ORDER BY o.created_at DESC
        "#,
    )
    .bind(query.status.as_deref().filter(|s| !s.is_empty()))
    .fetch_all(&state.pool)
    .await?;

    let mut out = String::new();
    csv::push_row(
        &mut out,
        [
            "id",
            "created_at",
            "status",
            "product",
            "quantity",
            "total_amount",
            "customer_name",
            "customer_phone",
            "customer_address",
        ],
    );
    for row in rows {
        csv::push_row(
            &mut out,
            [
                row.id.to_string(),
                row.created_at.to_rfc3339(),
                row.status,
                row.product_name,
                row.quantity.to_string(),
                row.total_amount.to_string(),
                row.customer_name,
                row.customer_phone,
                row.customer_address,
            ],
        );
    }

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "orders_export",
        "orders",
        None,
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(out)
}

#[derive(FromRow)]
struct UserExportRow {
    id: Uuid,
    email: Option<String>,
    full_name: String,
    phone: Option<String>,
    telegram_id: Option<i64>,
    is_admin: bool,
    is_seller: bool,
    is_verified_seller: bool,
    created_at: DateTime<Utc>,
}

pub async fn export_users_csv(state: &AppState, user: &AuthUser) -> AppResult<String> {
    require_admin(state, user).await?;

    let rows = sqlx::query_as::<_, UserExportRow>(
        r#"
        SELECT id, email, full_name, phone, telegram_id,
               is_admin, is_seller, is_verified_seller, created_at
        FROM users
        ORDER BY created_at DESC
        "#,
    )
    .fetch_all(&state.pool)
    .await?;

    let mut out = String::new();
    csv::push_row(
        &mut out,
        [
            "id",
            "email",
            "full_name",
            "phone",
            "telegram_id",
            "is_admin",
            "is_seller",
            "is_verified_seller",
            "created_at",
        ],
    );
    for row in rows {
        csv::push_row(
            &mut out,
            [
                row.id.to_string(),
                row.email.unwrap_or_default(),
                row.full_name,
                row.phone.unwrap_or_default(),
                row.telegram_id.map(|v| v.to_string()).unwrap_or_default(),
                row.is_admin.to_string(),
                row.is_seller.to_string(),
                row.is_verified_seller.to_string(),
                row.created_at.to_rfc3339(),
            ],
        );
    }

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "users_export",
        "users",
        None,
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(out)
}
