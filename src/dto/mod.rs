pub mod ads;
pub mod applications;
pub mod auth;
pub mod chat;
pub mod orders;
pub mod products;
pub mod sellers;
pub mod users;
