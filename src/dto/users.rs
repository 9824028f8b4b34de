use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::User;

#[derive(Debug, Serialize, ToSchema)]
pub struct UserList {
    pub items: Vec<User>,
}

/// Admin flag toggles; absent fields stay untouched.
#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateUserFlagsRequest {
    pub is_admin: Option<bool>,
    pub is_verified_seller: Option<bool>,
}
