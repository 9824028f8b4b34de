use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::header,
    response::IntoResponse,
    routing::{delete, get, patch, post, put},
};
use uuid::Uuid;

use crate::{
    dto::ads::{AdList, CreateAdRequest, UpdateAdRequest},
    dto::applications::{
        ApplicationDecisionRequest, ContactMessageList, ContactRequestList, SellerApplicationList,
    },
    dto::orders::{OrderList, UpdateOrderStatusRequest},
    dto::products::{ModerateProductRequest, ProductList},
    dto::users::{UpdateUserFlagsRequest, UserList},
    error::AppResult,
    middleware::auth::AuthUser,
    models::{Ad, ContactMessage, ContactRequest, Order, Product, SellerApplication, User},
    response::ApiResponse,
    routes::params::{
        AdminProductQuery, ApplicationQuery, OrderExportQuery, OrderListQuery, Pagination,
        UserQuery,
    },
    services::{ad_service, admin_service, application_service},
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/users", get(list_users))
        .route("/users/export", get(export_users))
        .route("/users/{id}/flags", patch(update_user_flags))
        .route("/products", get(list_products))
        .route("/products/{id}/moderation", patch(moderate_product))
        .route("/products/{id}", delete(delete_product))
        .route("/orders", get(list_orders))
        .route("/orders/export", get(export_orders))
        .route("/orders/{id}", get(get_order))
        .route("/orders/{id}/status", patch(update_order_status))
        .route("/ads", get(list_ads))
        .route("/ads", post(create_ad))
        .route("/ads/{id}", put(update_ad))
        .route("/ads/{id}", delete(delete_ad))
        .route("/applications/sellers", get(list_seller_applications))
        .route("/applications/sellers/{id}", patch(decide_seller_application))
        .route("/applications/contacts", get(list_contact_messages))
        .route("/applications/contacts/{id}", patch(decide_contact_message))
        .route("/applications/complaints", get(list_complaints))
        .route("/applications/complaints/{id}", patch(decide_complaint))
}

#[utoipa::path(
    get,
    path = "/api/admin/users",
    params(
        ("page" = Option<i64>, Query, description = "Page number, default 1"),
        ("per_page" = Option<i64>, Query, description = "Items per page, default 20"),
        ("q" = Option<String>, Query, description = "Name, email or phone contains"),
    ),
    responses(
        (status = 200, description = "All users", body = ApiResponse<UserList>),
        (status = 403, description = "Forbidden"),
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn list_users(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<UserQuery>,
) -> AppResult<Json<ApiResponse<UserList>>> {
    let resp = admin_service::list_users(&state, &user, query).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    patch,
    path = "/api/admin/users/{id}/flags",
    params(
        ("id" = Uuid, Path, description = "User ID")
    ),
    request_body = UpdateUserFlagsRequest,
    responses(
        (status = 200, description = "Flags updated", body = ApiResponse<User>),
        (status = 400, description = "Cannot remove own admin flag"),
        (status = 404, description = "Not Found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn update_user_flags(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateUserFlagsRequest>,
) -> AppResult<Json<ApiResponse<User>>> {
    let resp = admin_service::update_user_flags(&state, &user, id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/admin/users/export",
    responses(
        (status = 200, description = "CSV of all users", content_type = "text/csv"),
        (status = 403, description = "Forbidden"),
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn export_users(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<impl IntoResponse> {
    let csv = admin_service::export_users_csv(&state, &user).await?;
    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"users.csv\"",
            ),
        ],
        csv,
    ))
}

#[utoipa::path(
    get,
    path = "/api/admin/products",
    params(
        ("page" = Option<i64>, Query, description = "Page number, default 1"),
        ("per_page" = Option<i64>, Query, description = "Items per page, default 20"),
        ("approved" = Option<bool>, Query, description = "Filter by moderation state"),
    ),
    responses(
        (status = 200, description = "All products, including unapproved", body = ApiResponse<ProductList>),
        (status = 403, description = "Forbidden"),
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn list_products(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<AdminProductQuery>,
) -> AppResult<Json<ApiResponse<ProductList>>> {
    let resp = admin_service::list_all_products(&state, &user, query).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    patch,
    path = "/api/admin/products/{id}/moderation",
    params(
        ("id" = Uuid, Path, description = "Product ID")
    ),
    request_body = ModerateProductRequest,
    responses(
        (status = 200, description = "Moderation updated", body = ApiResponse<Product>),
        (status = 404, description = "Not Found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn moderate_product(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<ModerateProductRequest>,
) -> AppResult<Json<ApiResponse<Product>>> {
    let resp = admin_service::moderate_product(&state, &user, id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    delete,
    path = "/api/admin/products/{id}",
    params(
        ("id" = Uuid, Path, description = "Product ID")
    ),
    responses(
        (status = 200, description = "Deleted"),
        (status = 400, description = "Product has orders"),
        (status = 404, description = "Not Found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn delete_product(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    let resp = admin_service::delete_product(&state, &user, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/admin/orders",
    params(
        ("page" = Option<i64>, Query, description = "Page number, default 1"),
        ("per_page" = Option<i64>, Query, description = "Items per page, default 20"),
        ("status" = Option<String>, Query, description = "Filter by status"),
        ("sort_order" = Option<String>, Query, description = "Sort order: asc, desc"),
    ),
    responses(
        (status = 200, description = "All orders", body = ApiResponse<OrderList>),
        (status = 403, description = "Forbidden"),
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn list_orders(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<OrderListQuery>,
) -> AppResult<Json<ApiResponse<OrderList>>> {
    let resp = admin_service::list_all_orders(&state, &user, query).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/admin/orders/export",
    params(
        ("status" = Option<String>, Query, description = "Filter by status"),
    ),
    responses(
        (status = 200, description = "CSV of the filtered orders", content_type = "text/csv"),
        (status = 403, description = "Forbidden"),
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn export_orders(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<OrderExportQuery>,
) -> AppResult<impl IntoResponse> {
    let csv = admin_service::export_orders_csv(&state, &user, query).await?;
    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"orders.csv\"",
            ),
        ],
        csv,
    ))
}

#[utoipa::path(
    get,
    path = "/api/admin/orders/{id}",
    params(
        ("id" = Uuid, Path, description = "Order ID")
    ),
    responses(
        (status = 200, description = "Any order", body = ApiResponse<Order>),
        (status = 404, description = "Not Found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn get_order(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Order>>> {
    let resp = admin_service::get_order(&state, &user, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    patch,
    path = "/api/admin/orders/{id}/status",
    params(
        ("id" = Uuid, Path, description = "Order ID")
    ),
    request_body = UpdateOrderStatusRequest,
    responses(
        (status = 200, description = "Order updated", body = ApiResponse<Order>),
        (status = 400, description = "Illegal transition"),
        (status = 404, description = "Not Found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn update_order_status(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateOrderStatusRequest>,
) -> AppResult<Json<ApiResponse<Order>>> {
    let resp = admin_service::update_order_status(&state, &user, id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/admin/ads",
    params(
        ("page" = Option<i64>, Query, description = "Page number, default 1"),
        ("per_page" = Option<i64>, Query, description = "Items per page, default 20"),
    ),
    responses(
        (status = 200, description = "All ads", body = ApiResponse<AdList>),
        (status = 403, description = "Forbidden"),
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn list_ads(
    State(state): State<AppState>,
    user: AuthUser,
    Query(pagination): Query<Pagination>,
) -> AppResult<Json<ApiResponse<AdList>>> {
    let resp = ad_service::list_all_ads(&state, &user, pagination).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/admin/ads",
    request_body = CreateAdRequest,
    responses(
        (status = 200, description = "Ad created", body = ApiResponse<Ad>),
        (status = 400, description = "Missing title or image"),
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn create_ad(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<CreateAdRequest>,
) -> AppResult<Json<ApiResponse<Ad>>> {
    let resp = ad_service::create_ad(&state, &user, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    put,
    path = "/api/admin/ads/{id}",
    params(
        ("id" = Uuid, Path, description = "Ad ID")
    ),
    request_body = UpdateAdRequest,
    responses(
        (status = 200, description = "Ad updated", body = ApiResponse<Ad>),
        (status = 404, description = "Not Found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn update_ad(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateAdRequest>,
) -> AppResult<Json<ApiResponse<Ad>>> {
    let resp = ad_service::update_ad(&state, &user, id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    delete,
    path = "/api/admin/ads/{id}",
    params(
        ("id" = Uuid, Path, description = "Ad ID")
    ),
    responses(
        (status = 200, description = "Deleted"),
        (status = 404, description = "Not Found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn delete_ad(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    let resp = ad_service::delete_ad(&state, &user, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/admin/applications/sellers",
    params(
        ("page" = Option<i64>, Query, description = "Page number, default 1"),
        ("per_page" = Option<i64>, Query, description = "Items per page, default 20"),
        ("status" = Option<String>, Query, description = "Filter: pending, approved, rejected"),
    ),
    responses(
        (status = 200, description = "Seller applications", body = ApiResponse<SellerApplicationList>),
        (status = 403, description = "Forbidden"),
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn list_seller_applications(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<ApplicationQuery>,
) -> AppResult<Json<ApiResponse<SellerApplicationList>>> {
    let resp = application_service::list_seller_applications(&state, &user, query).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    patch,
    path = "/api/admin/applications/sellers/{id}",
    params(
        ("id" = Uuid, Path, description = "Application ID")
    ),
    request_body = ApplicationDecisionRequest,
    responses(
        (status = 200, description = "Application decided", body = ApiResponse<SellerApplication>),
        (status = 400, description = "Already decided or invalid status"),
        (status = 404, description = "Not Found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn decide_seller_application(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<ApplicationDecisionRequest>,
) -> AppResult<Json<ApiResponse<SellerApplication>>> {
    let resp = application_service::decide_seller_application(&state, &user, id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/admin/applications/contacts",
    params(
        ("page" = Option<i64>, Query, description = "Page number, default 1"),
        ("per_page" = Option<i64>, Query, description = "Items per page, default 20"),
        ("status" = Option<String>, Query, description = "Filter: pending, responded"),
    ),
    responses(
        (status = 200, description = "Contact form messages", body = ApiResponse<ContactMessageList>),
        (status = 403, description = "Forbidden"),
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn list_contact_messages(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<ApplicationQuery>,
) -> AppResult<Json<ApiResponse<ContactMessageList>>> {
    let resp = application_service::list_contact_messages(&state, &user, query).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    patch,
    path = "/api/admin/applications/contacts/{id}",
    params(
        ("id" = Uuid, Path, description = "Message ID")
    ),
    request_body = ApplicationDecisionRequest,
    responses(
        (status = 200, description = "Message handled", body = ApiResponse<ContactMessage>),
        (status = 400, description = "Already handled or invalid status"),
        (status = 404, description = "Not Found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn decide_contact_message(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<ApplicationDecisionRequest>,
) -> AppResult<Json<ApiResponse<ContactMessage>>> {
    let resp = application_service::decide_contact_message(&state, &user, id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/admin/applications/complaints",
    params(
        ("page" = Option<i64>, Query, description = "Page number, default 1"),
        ("per_page" = Option<i64>, Query, description = "Items per page, default 20"),
        ("status" = Option<String>, Query, description = "Filter: pending, responded, rejected"),
    ),
    responses(
        (status = 200, description = "Complaints", body = ApiResponse<ContactRequestList>),
        (status = 403, description = "Forbidden"),
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn list_complaints(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<ApplicationQuery>,
) -> AppResult<Json<ApiResponse<ContactRequestList>>> {
    let resp = application_service::list_complaints(&state, &user, query).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    patch,
    path = "/api/admin/applications/complaints/{id}",
    params(
        ("id" = Uuid, Path, description = "Complaint ID")
    ),
    request_body = ApplicationDecisionRequest,
    responses(
        (status = 200, description = "Complaint handled", body = ApiResponse<ContactRequest>),
        (status = 400, description = "Already handled or invalid status"),
        (status = 404, description = "Not Found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn decide_complaint(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<ApplicationDecisionRequest>,
) -> AppResult<Json<ApiResponse<ContactRequest>>> {
    let resp = application_service::decide_complaint(&state, &user, id, payload).await?;
    Ok(Json(resp))
}
