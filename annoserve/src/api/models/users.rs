//! User administration payloads.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::db::handlers::users::UserRecord;

#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct UserCreate {
    pub user_name: String,
    #[serde(default)]
    pub is_admin: bool,
}

/// Response to user creation. Carries the generated plaintext password;
/// this is the only time it is ever returned.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UserCreatedResponse {
    pub user_name: String,
    pub is_admin: bool,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UserResponse {
    pub user_name: String,
    pub is_admin: bool,
}

impl From<UserRecord> for UserResponse {
    fn from(record: UserRecord) -> Self {
        Self {
            user_name: record.user_name,
            is_admin: record.is_admin,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct MembershipsRemovedResponse {
    pub user_name: String,
    pub removed: u64,
}
