pub mod ads;
pub mod audit_logs;
pub mod contact_messages;
pub mod contact_requests;
pub mod conversations;
pub mod favorites;
pub mod messages;
pub mod orders;
pub mod products;
pub mod reviews;
pub mod seller_applications;
pub mod users;

pub use ads::Entity as Ads;
pub use audit_logs::Entity as AuditLogs;
pub use contact_messages::Entity as ContactMessages;
pub use contact_requests::Entity as ContactRequests;
pub use conversations::Entity as Conversations;
pub use favorites::Entity as Favorites;
pub use messages::Entity as Messages;
pub use orders::Entity as Orders;
pub use products::Entity as Products;
pub use reviews::Entity as Reviews;
pub use seller_applications::Entity as SellerApplications;
pub use users::Entity as Users;
