use chrono::Utc;
use sea_orm::ActiveValue::NotSet;
use sea_orm::sea_query::{Expr, LockType};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, Set, TransactionTrait,
};
use uuid::Uuid;

use crate::{
    audit::log_audit,
    dto::orders::{OrderList, OrderTracking, PlaceOrderRequest},
    entity::{
        orders::{ActiveModel as OrderActive, Column as OrderCol, Entity as Orders, Model as OrderModel},
        products::{Column as ProdCol, Entity as Products},
        users::Entity as Users,
    },
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, require_user},
    models::Order,
    response::{ApiResponse, Meta},
    routes::params::{OrderListQuery, SortOrder},
    state::AppState,
    status::{OrderStatus, transition_allowed},
};

pub async fn place_order(
    state: &AppState,
    user: Option<&AuthUser>,
    payload: PlaceOrderRequest,
) -> AppResult<ApiResponse<Order>> {
    if payload.quantity < 1 {
        return Err(AppError::BadRequest("Quantity must be at least 1".into()));
    }
    if payload.customer_name.trim().is_empty()
        || payload.customer_phone.trim().is_empty()
        || payload.customer_address.trim().is_empty()
    {
        return Err(AppError::BadRequest(
            "Name, phone and address are required".into(),
        ));
    }

    let buyer = match user {
        Some(u) => Some(require_user(state, u).await?),
        None => None,
    };

    let txn = state.orm.begin().await?;

    let product = Products::find()
        .filter(
            Condition::all()
                .add(ProdCol::Id.eq(payload.product_id))
                .add(ProdCol::IsApproved.eq(true))
                .add(ProdCol::IsActive.eq(true)),
        )
        .lock(LockType::Update)
        .one(&txn)
        .await?;
    let product = match product {
        Some(p) => p,
        None => return Err(AppError::NotFound),
    };

    if product.stock < payload.quantity {
        return Err(AppError::BadRequest("Insufficient stock".into()));
    }

    // Price is read under the row lock; the client never sends a total.
    let total_amount = product.price * i64::from(payload.quantity);

    Products::update_many()
        .col_expr(ProdCol::Stock, Expr::col(ProdCol::Stock).sub(payload.quantity))
        .col_expr(ProdCol::OrderCount, Expr::col(ProdCol::OrderCount).add(1))
        .filter(ProdCol::Id.eq(product.id))
        .exec(&txn)
        .await?;

    let order = OrderActive {
        id: Set(Uuid::new_v4()),
        buyer_id: Set(buyer.as_ref().map(|b| b.id)),
        product_id: Set(product.id),
        seller_id: Set(product.seller_id),
        quantity: Set(payload.quantity),
        total_amount: Set(total_amount),
        status: Set(OrderStatus::Pending.as_str().to_string()),
        customer_name: Set(payload.customer_name),
        customer_phone: Set(payload.customer_phone),
        customer_address: Set(payload.customer_address),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&txn)
    .await?;

    txn.commit().await?;

    if let Err(err) = log_audit(
        &state.pool,
        buyer.as_ref().map(|b| b.id),
        "order_place",
        "orders",
        Some(serde_json::json!({ "order_id": order.id, "product_id": product.id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    let order = order_from_entity(order);
    state.notifier.order_created(
        &order,
        &product.name,
        buyer.as_ref().and_then(|b| b.telegram_id),
    );

    Ok(ApiResponse::success(
        "Order placed",
        order,
        Some(Meta::empty()),
    ))
}

pub async fn list_my_orders(
    state: &AppState,
    user: &AuthUser,
    query: OrderListQuery,
) -> AppResult<ApiResponse<OrderList>> {
    let (page, limit, offset) = query.pagination.normalize();
    let mut condition = Condition::all().add(OrderCol::BuyerId.eq(user.user_id));
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

pub async fn get_my_order(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<Order>> {
    let order = Orders::find()
        .filter(
            Condition::all()
                .add(OrderCol::BuyerId.eq(user.user_id))
                .add(OrderCol::Id.eq(id)),
        )
        .one(&state.orm)
        .await?;
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

/// Public tracking by order id. This backs the Telegram deep link, so it
/// carries no auth and exposes only what the buyer already knows.
pub async fn track_order(state: &AppState, id: Uuid) -> AppResult<ApiResponse<OrderTracking>> {
    let order = Orders::find_by_id(id).one(&state.orm).await?;
    let order = match order {
        Some(o) => o,
        None => return Err(AppError::NotFound),
    };

    let product_name = Products::find_by_id(order.product_id)
        .one(&state.orm)
        .await?
        .map(|p| p.name)
        .unwrap_or_default();

    let tracking = OrderTracking {
        id: order.id,
        product_name,
        quantity: order.quantity,
        total_amount: order.total_amount,
        status: order.status,
        created_at: order.created_at.with_timezone(&Utc),
        updated_at: order.updated_at.with_timezone(&Utc),
    };

    Ok(ApiResponse::success("Order", tracking, None))
}

/// The single status-mutation path. Admin routes, seller routes and the
/// bot all funnel through here: row lock, transition check against
/// [`OrderStatus::next`], audit row, buyer notification.
///
/// `seller_scope` restricts the lookup to that seller's orders; outside
/// the scope the order simply does not exist.
pub async fn transition_order(
    state: &AppState,
    actor: Option<Uuid>,
    seller_scope: Option<Uuid>,
    id: Uuid,
    to: OrderStatus,
) -> AppResult<Order> {
    let txn = state.orm.begin().await?;

    let mut condition = Condition::all().add(OrderCol::Id.eq(id));
    if let Some(seller_id) = seller_scope {
        condition = condition.add(OrderCol::SellerId.eq(seller_id));
    }

    let order = Orders::find()
        .filter(condition)
        .lock(LockType::Update)
        .one(&txn)
        .await?;
    let order = match order {
        Some(o) => o,
        None => return Err(AppError::NotFound),
    };

    if !transition_allowed(&order.status, to) {
        return Err(AppError::BadRequest(format!(
            "Cannot move order from {} to {}",
            order.status,
            to.as_str()
        )));
    }

    let mut active: OrderActive = order.into();
    active.status = Set(to.as_str().to_string());
    active.updated_at = Set(Utc::now().into());
    let order = active.update(&txn).await?;

    txn.commit().await?;

    if let Err(err) = log_audit(
        &state.pool,
        actor,
        "order_status_update",
        "orders",
        Some(serde_json::json!({ "order_id": order.id, "status": order.status })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    let order = order_from_entity(order);
    match notification_context(state, &order).await {
        Ok((product_name, buyer_telegram)) => {
            state
                .notifier
                .order_status_changed(&order, &product_name, buyer_telegram);
        }
        Err(err) => tracing::warn!(error = %err, "notification context fetch failed"),
    }

    Ok(order)
}

async fn notification_context(
    state: &AppState,
    order: &Order,
) -> AppResult<(String, Option<i64>)> {
    let product_name = Products::find_by_id(order.product_id)
        .one(&state.orm)
        .await?
        .map(|p| p.name)
        .unwrap_or_default();
    let buyer_telegram = match order.buyer_id {
        Some(buyer_id) => Users::find_by_id(buyer_id)
            .one(&state.orm)
            .await?
            .and_then(|u| u.telegram_id),
        None => None,
    };
    Ok((product_name, buyer_telegram))
}

pub(crate) fn order_from_entity(model: OrderModel) -> Order {
    Order {
        id: model.id,
        buyer_id: model.buyer_id,
        product_id: model.product_id,
        seller_id: model.seller_id,
        quantity: model.quantity,
        total_amount: model.total_amount,
        status: model.status,
        customer_name: model.customer_name,
        customer_phone: model.customer_phone,
        customer_address: model.customer_address,
        created_at: model.created_at.with_timezone(&Utc),
        updated_at: model.updated_at.with_timezone(&Utc),
    }
}
