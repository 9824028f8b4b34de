use axum::{Json, Router, extract::State, routing::post};

use crate::{
    dto::applications::{ComplaintRequest, ContactMessageRequest, SellerApplicationRequest},
    error::AppResult,
    middleware::auth::{AuthUser, OptionalAuthUser},
    models::{ContactMessage, ContactRequest, SellerApplication},
    response::ApiResponse,
    services::application_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/seller", post(submit_seller_application))
        .route("/contact", post(submit_contact_message))
        .route("/complaint", post(submit_complaint))
}

#[utoipa::path(
    post,
    path = "/api/applications/seller",
    request_body = SellerApplicationRequest,
    responses(
        (status = 200, description = "Application submitted", body = ApiResponse<SellerApplication>),
        (status = 400, description = "Already pending or already verified"),
        (status = 401, description = "Unauthorized"),
    ),
    security(("bearer_auth" = [])),
    tag = "Applications"
)]
pub async fn submit_seller_application(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<SellerApplicationRequest>,
) -> AppResult<Json<ApiResponse<SellerApplication>>> {
    let resp = application_service::submit_seller_application(&state, &user, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/applications/contact",
    request_body = ContactMessageRequest,
    responses(
        (status = 200, description = "Message received", body = ApiResponse<ContactMessage>),
        (status = 400, description = "Missing fields"),
    ),
    tag = "Applications"
)]
pub async fn submit_contact_message(
    State(state): State<AppState>,
    Json(payload): Json<ContactMessageRequest>,
) -> AppResult<Json<ApiResponse<ContactMessage>>> {
    let resp = application_service::submit_contact_message(&state, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/applications/complaint",
    request_body = ComplaintRequest,
    responses(
        (status = 200, description = "Complaint received", body = ApiResponse<ContactRequest>),
        (status = 400, description = "Missing fields"),
    ),
    tag = "Applications"
)]
pub async fn submit_complaint(
    State(state): State<AppState>,
    OptionalAuthUser(user): OptionalAuthUser,
    Json(payload): Json<ComplaintRequest>,
) -> AppResult<Json<ApiResponse<ContactRequest>>> {
    let resp = application_service::submit_complaint(&state, user.as_ref(), payload).await?;
    Ok(Json(resp))
}
