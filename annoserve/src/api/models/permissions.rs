//! Document permission payloads.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::db::handlers::permissions::DocPermission;

#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct PermissionCreate {
    /// Data-root-relative path; a trailing `/` grants a whole directory.
    pub doc_path: String,
    pub group_name: String,
    #[serde(default)]
    pub can_write: bool,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PermissionResponse {
    pub doc_path: String,
    pub group_name: String,
    pub can_write: bool,
}

impl From<DocPermission> for PermissionResponse {
    fn from(permission: DocPermission) -> Self {
        Self {
            doc_path: permission.doc_path,
            group_name: permission.group_name,
            can_write: permission.can_write,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PermissionsRevokedResponse {
    pub group_name: String,
    pub revoked: u64,
}
