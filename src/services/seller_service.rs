use chrono::Utc;
use sea_orm::ActiveValue::NotSet;
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
    dto::orders::{OrderList, UpdateOrderStatusRequest},
    dto::products::{CreateProductRequest, ProductList, UpdateProductRequest},
    dto::sellers::{SellerAnalytics, SellerCustomer, SellerCustomerList, StatusCount},
    entity::{
        orders::{Column as OrderCol, Entity as Orders},
        products::{ActiveModel as ProductActive, Column as ProdCol, Entity as Products},
    },
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, require_verified_seller},
    models::{Order, Product},
    response::{ApiResponse, Meta},
    routes::params::{OrderListQuery, Pagination, ProductQuery, ProductSortBy, SortOrder},
    services::order_service::{order_from_entity, transition_order},
    services::product_service::product_from_entity,
    state::AppState,
    status::OrderStatus,
};

pub async fn list_my_products(
    state: &AppState,
    user: &AuthUser,
    query: ProductQuery,
) -> AppResult<ApiResponse<ProductList>> {
    require_verified_seller(state, user).await?;

    let (page, limit, offset) = query.pagination.normalize();
    let mut condition = Condition::all().add(ProdCol::SellerId.eq(user.user_id));

    if let Some(search) = query.q.as_ref().filter(|s| !s.is_empty()) {
        let pattern = format!("%{}%", search);
        condition = condition.add(Expr::col(ProdCol::Name).ilike(pattern));
    }
    if let Some(category) = query.category.as_ref().filter(|s| !s.is_empty()) {
        condition = condition.add(ProdCol::Category.eq(category.clone()));
    }
    if let Some(min_price) = query.min_price {
        condition = condition.add(ProdCol::Price.gte(min_price));
    }
    if let Some(max_price) = query.max_price {
        condition = condition.add(ProdCol::Price.lte(max_price));
    }

    let sort_by = query.sort_by.unwrap_or(ProductSortBy::CreatedAt);
    let sort_order = query.sort_order.unwrap_or(SortOrder::Desc);
    let sort_col = match sort_by {
        ProductSortBy::CreatedAt => ProdCol::CreatedAt,
        ProductSortBy::Price => ProdCol::Price,
        ProductSortBy::Name => ProdCol::Name,
    };

    let mut finder = Products::find().filter(condition);
    finder = match sort_order {
        SortOrder::Asc => finder.order_by_asc(sort_col),
        SortOrder::Desc => finder.order_by_desc(sort_col),
    };

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

pub async fn create_product(
    state: &AppState,
    user: &AuthUser,
    payload: CreateProductRequest,
) -> AppResult<ApiResponse<Product>> {
    require_verified_seller(state, user).await?;
    validate_listing(&payload.name, payload.price, payload.stock)?;

    let product = ProductActive {
        id: Set(Uuid::new_v4()),
        seller_id: Set(user.user_id),
        name: Set(payload.name),
        description: Set(payload.description),
        category: Set(payload.category),
        price: Set(payload.price),
        stock: Set(payload.stock),
        image_url: Set(payload.image_url),
        // New listings wait for admin moderation before the storefront
        // shows them.
        is_approved: Set(false),
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

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "product_create",
        "products",
        Some(serde_json::json!({ "product_id": product.id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Product created",
        product_from_entity(product),
        Some(Meta::empty()),
    ))
}

pub async fn update_product(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateProductRequest,
) -> AppResult<ApiResponse<Product>> {
    require_verified_seller(state, user).await?;

    // Ownership is part of the lookup: another seller's product is a 404,
    // not a forbidden hint that it exists.
    let existing = Products::find()
        .filter(
            Condition::all()
                .add(ProdCol::Id.eq(id))
                .add(ProdCol::SellerId.eq(user.user_id)),
        )
        .one(&state.orm)
        .await?;
    let existing = match existing {
        Some(p) => p,
        None => return Err(AppError::NotFound),
    };

    let mut active: ProductActive = existing.into();
    if let Some(name) = payload.name {
        if name.trim().is_empty() {
            return Err(AppError::BadRequest("Name is required".into()));
        }
        active.name = Set(name);
    }
    if let Some(description) = payload.description {
        active.description = Set(Some(description));
    }
    if let Some(category) = payload.category {
        active.category = Set(Some(category));
    }
    if let Some(price) = payload.price {
        if price <= 0 {
            return Err(AppError::BadRequest("Price must be positive".into()));
        }
        active.price = Set(price);
    }
    if let Some(stock) = payload.stock {
        if stock < 0 {
            return Err(AppError::BadRequest("Stock cannot be negative".into()));
        }
        active.stock = Set(stock);
    }
    if let Some(image_url) = payload.image_url {
        active.image_url = Set(Some(image_url));
    }
    if let Some(is_active) = payload.is_active {
        active.is_active = Set(is_active);
    }
    active.updated_at = Set(Utc::now().into());

    let product = active.update(&state.orm).await?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "product_update",
        "products",
        Some(serde_json::json!({ "product_id": product.id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Updated",
        product_from_entity(product),
        Some(Meta::empty()),
    ))
}

pub async fn delete_product(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    require_verified_seller(state, user).await?;

    let existing = Products::find()
        .filter(
            Condition::all()
                .add(ProdCol::Id.eq(id))
                .add(ProdCol::SellerId.eq(user.user_id)),
        )
        .one(&state.orm)
        .await?;
    if existing.is_none() {
        return Err(AppError::NotFound);
    }

    // Order rows keep their product reference, so a product with history
    // is retired via is_active instead of deleted.
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

pub async fn list_orders(
    state: &AppState,
    user: &AuthUser,
    query: OrderListQuery,
) -> AppResult<ApiResponse<OrderList>> {
    require_verified_seller(state, user).await?;

    let (page, limit, offset) = query.pagination.normalize();
    let mut condition = Condition::all().add(OrderCol::SellerId.eq(user.user_id));
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

pub async fn update_order_status(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateOrderStatusRequest,
) -> AppResult<ApiResponse<Order>> {
    require_verified_seller(state, user).await?;

    let to = OrderStatus::parse(&payload.status)
        .ok_or_else(|| AppError::BadRequest("Invalid order status".into()))?;

    let order = transition_order(state, Some(user.user_id), Some(user.user_id), id, to).await?;

    Ok(ApiResponse::success(
        "Order updated",
        order,
        Some(Meta::empty()),
    ))
}

#[derive(FromRow)]
struct CustomerRow {
    customer_name: String,
    customer_phone: String,
    orders_count: i64,
    total_spent: i64,
}

pub async fn list_customers(
    state: &AppState,
    user: &AuthUser,
    pagination: Pagination,
) -> AppResult<ApiResponse<SellerCustomerList>> {
    require_verified_seller(state, user).await?;

    let (page, limit, offset) = pagination.normalize();

    let rows = sqlx::query_as::<_, CustomerRow>(
        r#"
        SELECT MAX(customer_name) AS customer_name,
               customer_phone,
               COUNT(*) AS orders_count,
               CAST(COALESCE(SUM(total_amount), 0) AS BIGINT) AS total_spent
        FROM orders
        WHERE seller_id = $1 AND status <> 'cancelled'
        GROUP BY customer_phone
        ORDER BY total_spent DESC
        LIMIT $2 OFFSET $3
        "#,
    )
    .bind(user.user_id)
    .bind(limit)
    .bind(offset)
    .fetch_all(&state.pool)
    .await?;

    let total: (i64,) = sqlx::query_as(
        "SELECT COUNT(DISTINCT customer_phone) FROM orders WHERE seller_id = $1 AND status <> 'cancelled'",
    )
    .bind(user.user_id)
    .fetch_one(&state.pool)
    .await?;

    let items = rows
        .into_iter()
        .map(|r| SellerCustomer {
            customer_name: r.customer_name,
            customer_phone: r.customer_phone,
            orders_count: r.orders_count,
            total_spent: r.total_spent,
        })
        .collect();

    let meta = Meta::new(page, limit, total.0);
    Ok(ApiResponse::success(
        "Customers",
        SellerCustomerList { items },
        Some(meta),
    ))
}

pub async fn analytics(
    state: &AppState,
    user: &AuthUser,
) -> AppResult<ApiResponse<SellerAnalytics>> {
    require_verified_seller(state, user).await?;

    let product_totals: (i64, i64, i64) = sqlx::query_as(
        r#"
        SELECT COUNT(*),
               CAST(COALESCE(SUM(view_count), 0) AS BIGINT),
               CAST(COALESCE(SUM(like_count), 0) AS BIGINT)
        FROM products
        WHERE seller_id = $1
        "#,
    )
    .bind(user.user_id)
    .fetch_one(&state.pool)
    .await?;

    let orders_count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM orders WHERE seller_id = $1")
        .bind(user.user_id)
        .fetch_one(&state.pool)
        .await?;

    let by_status: Vec<(String, i64)> = sqlx::query_as(
        "SELECT status, COUNT(*) FROM orders WHERE seller_id = $1 GROUP BY status ORDER BY status",
    )
    .bind(user.user_id)
    .fetch_all(&state.pool)
    .await?;

    let revenue: (i64,) = sqlx::query_as(
        r#"
        SELECT CAST(COALESCE(SUM(total_amount), 0) AS BIGINT)
        FROM orders
        WHERE seller_id = $1 AND status IN ('delivered', 'completed')
        "#,
    )
    .bind(user.user_id)
    .fetch_one(&state.pool)
    .await?;

    let data = SellerAnalytics {
        products_count: product_totals.0,
        total_views: product_totals.1,
        total_likes: product_totals.2,
        orders_count: orders_count.0,
        orders_by_status: by_status
            .into_iter()
            .map(|(status, count)| StatusCount { status, count })
            .collect(),
        revenue: revenue.0,
    };

    Ok(ApiResponse::success("Analytics", data, Some(Meta::empty())))
}

fn validate_listing(name: &str, price: i64, stock: i32) -> Result<(), AppError> {
    if name.trim().is_empty() {
        return Err(AppError::BadRequest("Name is required".into()));
    }
    if price <= 0 {
        return Err(AppError::BadRequest("Price must be positive".into()));
    }
    if stock < 0 {
        return Err(AppError::BadRequest("Stock cannot be negative".into()));
    }
    Ok(())
}
