//! API request and response data models.
//!
//! These structures define the public API contract. They are distinct from
//! the store records so the wire format and the storage schema can evolve
//! independently; in particular, password digests never appear in responses.
//! All models carry `utoipa` annotations for the generated API docs.

pub mod auth;
pub mod groups;
pub mod permissions;
pub mod users;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Generic acknowledgement body for operations without a richer response.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}
