pub mod ad_service;
pub mod admin_service;
pub mod application_service;
pub mod auth_service;
pub mod chat_service;
pub mod order_service;
pub mod product_service;
pub mod seller_service;
