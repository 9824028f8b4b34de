use serde::Serialize;
use utoipa::ToSchema;

/// A customer row derived by aggregating the seller's orders.
#[derive(Debug, Serialize, ToSchema)]
pub struct SellerCustomer {
    pub customer_name: String,
    pub customer_phone: String,
    pub orders_count: i64,
    pub total_spent: i64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SellerCustomerList {
    pub items: Vec<SellerCustomer>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct StatusCount {
    pub status: String,
    pub count: i64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SellerAnalytics {
    pub products_count: i64,
    pub total_views: i64,
    pub total_likes: i64,
    pub orders_count: i64,
    pub orders_by_status: Vec<StatusCount>,
    /// Sum of totals over delivered and completed orders.
    pub revenue: i64,
}
