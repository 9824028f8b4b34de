use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::Ad;

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateAdRequest {
    pub title: String,
    pub image_url: String,
    pub target_url: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateAdRequest {
    pub title: Option<String>,
    pub image_url: Option<String>,
    pub target_url: Option<String>,
    pub is_active: Option<bool>,
    pub expires_at: Option<DateTime<Utc>>,
}

#[derive(Serialize, ToSchema)]
#[serde(transparent)]
pub struct AdList {
    #[schema(value_type = Vec<Ad>)]
    pub items: Vec<Ad>,
}
