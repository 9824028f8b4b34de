use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::{ContactMessage, ContactRequest, SellerApplication};

#[derive(Debug, Deserialize, ToSchema)]
pub struct SellerApplicationRequest {
    pub store_name: String,
    pub description: Option<String>,
    pub phone: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ContactMessageRequest {
    pub name: String,
    pub phone: String,
    pub subject: Option<String>,
    pub body: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ComplaintRequest {
    pub phone: String,
    pub subject: String,
    pub body: String,
}

/// Admin decision on any reviewed submission.
#[derive(Debug, Deserialize, ToSchema)]
pub struct ApplicationDecisionRequest {
    pub status: String,
    pub admin_notes: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SellerApplicationList {
    pub items: Vec<SellerApplication>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ContactMessageList {
    pub items: Vec<ContactMessage>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ContactRequestList {
    pub items: Vec<ContactRequest>,
}
