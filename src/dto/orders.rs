use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::Order;

#[derive(Debug, Deserialize, ToSchema)]
pub struct PlaceOrderRequest {
    pub product_id: Uuid,
    pub quantity: i32,
    pub customer_name: String,
    pub customer_phone: String,
    pub customer_address: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateOrderStatusRequest {
    pub status: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderList {
    pub items: Vec<Order>,
}

/// Public tracking view: enough for a buyer following a deep link, nothing
/// about the seller or other orders.
#[derive(Debug, Serialize, ToSchema)]
pub struct OrderTracking {
    pub id: Uuid,
    pub product_name: String,
    pub quantity: i32,
    pub total_amount: i64,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
