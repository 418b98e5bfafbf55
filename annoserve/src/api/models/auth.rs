//! Login, logout, whoami and password-change payloads.

use axum::{
    http::{StatusCode, header::SET_COOKIE},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Deserialize, ToSchema)]
pub struct LoginRequest {
    pub user: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AuthSuccessResponse {
    pub user: String,
    pub message: String,
}

/// Login response body plus the session cookie it sets.
#[derive(Debug)]
pub struct LoginResponse {
    pub auth_response: AuthSuccessResponse,
    pub cookie: String,
}

impl IntoResponse for LoginResponse {
    fn into_response(self) -> Response {
        (StatusCode::OK, [(SET_COOKIE, self.cookie)], Json(self.auth_response)).into_response()
    }
}

/// Logout response body plus the expired cookie clearing the session.
#[derive(Debug)]
pub struct LogoutResponse {
    pub message: super::MessageResponse,
    pub cookie: String,
}

impl IntoResponse for LogoutResponse {
    fn into_response(self) -> Response {
        (StatusCode::OK, [(SET_COOKIE, self.cookie)], Json(self.message)).into_response()
    }
}

/// `{ "user": name }` when a session is bound, `{}` otherwise.
#[derive(Debug, Serialize, Deserialize, Default, ToSchema)]
pub struct WhoamiResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
}

#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct ChangePasswordRequest {
    /// User whose password is overwritten. Admins may name anyone; other
    /// callers only themselves.
    pub user: String,
    pub new_password: String,
}
