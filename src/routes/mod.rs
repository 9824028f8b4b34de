use axum::{Router, routing::get};

use crate::state::AppState;

pub mod admin;
pub mod ads;
pub mod applications;
pub mod auth;
pub mod chat;
pub mod doc;
pub mod health;
pub mod orders;
pub mod params;
pub mod products;
pub mod seller;

// Build the API router without binding state; it is provided at the top level.
pub fn create_api_router() -> Router<AppState> {
    Router::new()
        .nest("/auth", auth::router())
        .nest("/products", products::router())
        .route("/favorites", get(products::list_favorites))
        .nest("/ads", ads::router())
        .nest("/orders", orders::router())
        .nest("/seller", seller::router())
        .nest("/admin", admin::router())
        .nest("/applications", applications::router())
        .nest("/chat", chat::router())
}
