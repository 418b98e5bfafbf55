//! Group administration payloads.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::db::handlers::groups::GroupRecord;

#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct GroupCreate {
    pub group_name: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct GroupResponse {
    pub group_name: String,
}

impl From<GroupRecord> for GroupResponse {
    fn from(record: GroupRecord) -> Self {
        Self {
            group_name: record.group_name,
        }
    }
}
