use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{get, post},
};
use uuid::Uuid;

use crate::{
    dto::ads::AdList, error::AppResult, response::ApiResponse, services::ad_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_ads))
        .route("/{id}/click", post(click_ad))
}

#[utoipa::path(
    get,
    path = "/api/ads",
    responses(
        (status = 200, description = "Active, unexpired banners", body = ApiResponse<AdList>)
    ),
    tag = "Ads"
)]
pub async fn list_ads(State(state): State<AppState>) -> AppResult<Json<ApiResponse<AdList>>> {
    let resp = ad_service::list_active_ads(&state).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/ads/{id}/click",
    params(
        ("id" = Uuid, Path, description = "Ad ID")
    ),
    responses(
        (status = 200, description = "Click recorded"),
        (status = 404, description = "Ad not found or inactive"),
    ),
    tag = "Ads"
)]
pub async fn click_ad(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    let resp = ad_service::click_ad(&state, id).await?;
    Ok(Json(resp))
}
