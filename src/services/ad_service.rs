use chrono::Utc;
use sea_orm::ActiveValue::NotSet;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, Set,
};
use uuid::Uuid;

use crate::{
    audit::log_audit,
    dto::ads::{AdList, CreateAdRequest, UpdateAdRequest},
    entity::ads::{ActiveModel as AdActive, Column as AdCol, Entity as Ads, Model as AdModel},
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, require_admin},
    models::Ad,
    response::{ApiResponse, Meta},
    routes::params::Pagination,
    state::AppState,
};

/// Banners the storefront may show right now.
pub async fn list_active_ads(state: &AppState) -> AppResult<ApiResponse<AdList>> {
    let now = Utc::now();
    let condition = Condition::all().add(AdCol::IsActive.eq(true)).add(
        Condition::any()
            .add(AdCol::ExpiresAt.is_null())
            .add(AdCol::ExpiresAt.gt(now)),
    );

    let items = Ads::find()
        .filter(condition)
        .order_by_desc(AdCol::CreatedAt)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(ad_from_entity)
        .collect();

    Ok(ApiResponse::success("Ads", AdList { items }, None))
}

pub async fn click_ad(state: &AppState, id: Uuid) -> AppResult<ApiResponse<serde_json::Value>> {
    let result = Ads::update_many()
        .col_expr(AdCol::ClickCount, Expr::col(AdCol::ClickCount).add(1))
        .filter(
            Condition::all()
                .add(AdCol::Id.eq(id))
                .add(AdCol::IsActive.eq(true)),
        )
        .exec(&state.orm)
        .await?;

    if result.rows_affected == 0 {
        return Err(AppError::NotFound);
    }

    Ok(ApiResponse::success(
        "Click recorded",
        serde_json::json!({}),
        Some(Meta::empty()),
    ))
}

pub async fn list_all_ads(
    state: &AppState,
    user: &AuthUser,
    pagination: Pagination,
) -> AppResult<ApiResponse<AdList>> {
    require_admin(state, user).await?;

    let (page, limit, offset) = pagination.normalize();
    let finder = Ads::find().order_by_desc(AdCol::CreatedAt);

    let total = finder.clone().count(&state.orm).await? as i64;
    let items = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(ad_from_entity)
        .collect();

    let meta = Meta::new(page, limit, total);
    Ok(ApiResponse::success("Ads", AdList { items }, Some(meta)))
}

pub async fn create_ad(
    state: &AppState,
    user: &AuthUser,
    payload: CreateAdRequest,
) -> AppResult<ApiResponse<Ad>> {
    require_admin(state, user).await?;

    if payload.title.trim().is_empty() || payload.image_url.trim().is_empty() {
        return Err(AppError::BadRequest("Title and image are required".into()));
    }

    let ad = AdActive {
        id: Set(Uuid::new_v4()),
        title: Set(payload.title),
        image_url: Set(payload.image_url),
        target_url: Set(payload.target_url),
        click_count: Set(0),
        is_active: Set(true),
        expires_at: Set(payload.expires_at.map(Into::into)),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "ad_create",
        "ads",
        Some(serde_json::json!({ "ad_id": ad.id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Ad created",
        ad_from_entity(ad),
        Some(Meta::empty()),
    ))
}

pub async fn update_ad(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateAdRequest,
) -> AppResult<ApiResponse<Ad>> {
    require_admin(state, user).await?;

    let existing = Ads::find_by_id(id).one(&state.orm).await?;
    let existing = match existing {
        Some(a) => a,
        None => return Err(AppError::NotFound),
    };

    let mut active: AdActive = existing.into();
    if let Some(title) = payload.title {
        active.title = Set(title);
    }
    if let Some(image_url) = payload.image_url {
        active.image_url = Set(image_url);
    }
    if let Some(target_url) = payload.target_url {
        active.target_url = Set(Some(target_url));
    }
    if let Some(is_active) = payload.is_active {
        active.is_active = Set(is_active);
    }
    if let Some(expires_at) = payload.expires_at {
        active.expires_at = Set(Some(expires_at.into()));
    }
    let ad = active.update(&state.orm).await?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "ad_update",
        "ads",
        Some(serde_json::json!({ "ad_id": ad.id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Ad updated",
        ad_from_entity(ad),
        Some(Meta::empty()),
    ))
}

pub async fn delete_ad(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    require_admin(state, user).await?;

    let result = Ads::delete_by_id(id).exec(&state.orm).await?;
    if result.rows_affected == 0 {
        return Err(AppError::NotFound);
    }

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "ad_delete",
        "ads",
        Some(serde_json::json!({ "ad_id": id })),
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

fn ad_from_entity(model: AdModel) -> Ad {
    Ad {
        id: model.id,
        title: model.title,
        image_url: model.image_url,
        target_url: model.target_url,
        click_count: model.click_count,
        is_active: model.is_active,
        expires_at: model.expires_at.map(|dt| dt.with_timezone(&Utc)),
        created_at: model.created_at.with_timezone(&Utc),
    }
}
