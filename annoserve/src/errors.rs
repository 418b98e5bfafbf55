use crate::db::errors::DbError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error as ThisError;

#[derive(ThisError, Debug)]
pub enum Error {
    /// The credential store file is missing or unreachable. Fatal for the
    /// request, never for the process.
    #[error("Credential store unavailable")]
    StoreUnavailable,

    /// Login failed. Deliberately does not distinguish "no such user" from
    /// "wrong password".
    #[error("Incorrect login and/or password")]
    InvalidCredentials,

    /// The action requires a logged-in (admin) identity that is absent
    #[error("Login required to perform \"{action}\"")]
    NotAuthorized { action: String },

    /// Identity resolved, but the rule/permission check denied the path
    #[error("Access denied")]
    AccessDenied,

    /// Administration operation on an already-existing row
    #[error("{resource} already exists")]
    Duplicate { resource: String },

    /// Requested resource not found
    #[error("{resource} \"{id}\" not found")]
    NotFound { resource: String, id: String },

    /// Archive subprocess or triplestore HTTP call failed
    #[error("Upstream failure during {operation}: {detail}")]
    Upstream { operation: String, detail: String },

    /// Invalid request data
    #[error("{message}")]
    BadRequest { message: String },

    /// Generic internal service error
    #[error("Failed to {operation}")]
    Internal { operation: String },

    /// Store operation error
    #[error(transparent)]
    Database(#[from] DbError),

    /// Unexpected error with full context chain
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl Error {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Error::StoreUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            Error::InvalidCredentials => StatusCode::UNAUTHORIZED,
            Error::NotAuthorized { .. } => StatusCode::UNAUTHORIZED,
            Error::AccessDenied => StatusCode::FORBIDDEN,
            Error::Duplicate { .. } => StatusCode::CONFLICT,
            Error::NotFound { .. } => StatusCode::NOT_FOUND,
            Error::Upstream { .. } => StatusCode::BAD_GATEWAY,
            Error::BadRequest { .. } => StatusCode::BAD_REQUEST,
            Error::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            Error::Database(db_err) => match db_err {
                DbError::NotFound => StatusCode::NOT_FOUND,
                DbError::UniqueViolation { .. } => StatusCode::CONFLICT,
                DbError::ForeignKeyViolation { .. } => StatusCode::NOT_FOUND,
                DbError::Unavailable => StatusCode::SERVICE_UNAVAILABLE,
                DbError::Other(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Error::Other(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Returns a user-safe message, without leaking internals.
    ///
    /// Authentication failures share one generic message; administrative
    /// failures distinguish "store missing" from "duplicate" where
    /// determinable, so an administrator gets something actionable.
    pub fn user_message(&self) -> String {
        match self {
            Error::StoreUnavailable => "User database not found - contact your administrator".to_string(),
            Error::InvalidCredentials => "Incorrect login and/or password".to_string(),
            Error::NotAuthorized { action } => format!("Login required to perform \"{action}\""),
            Error::AccessDenied => "Access denied".to_string(),
            Error::Duplicate { resource } => format!("{resource} already exists"),
            Error::NotFound { resource, id } => format!("{resource} \"{id}\" not found"),
            Error::Upstream { operation, .. } => format!("Upstream failure during {operation}"),
            Error::BadRequest { message } => message.clone(),
            Error::Internal { .. } => "Internal server error".to_string(),
            Error::Database(db_err) => match db_err {
                DbError::NotFound => "Resource not found".to_string(),
                DbError::UniqueViolation { table, .. } => match table.as_deref() {
                    Some("users") => "A user with this name already exists".to_string(),
                    Some("groups") => "A group with this name already exists".to_string(),
                    Some("group_memberships") => "User is already a member of this group".to_string(),
                    Some("doc_permissions") => "Permission is already set for this group".to_string(),
                    _ => "Resource already exists".to_string(),
                },
                DbError::ForeignKeyViolation { .. } => "Referenced user or group does not exist".to_string(),
                DbError::Unavailable => "User database not found - contact your administrator".to_string(),
                DbError::Other(_) => "Database error - contact your administrator".to_string(),
            },
            Error::Other(_) => "Internal server error".to_string(),
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        // Log full details for an administrator; the response body stays generic.
        match &self {
            Error::Database(DbError::Other(_)) | Error::Internal { .. } | Error::Other(_) => {
                tracing::error!("Internal service error: {:#}", self);
            }
            Error::StoreUnavailable | Error::Database(DbError::Unavailable) => {
                tracing::error!("Credential store unavailable: {}", self);
            }
            Error::Upstream { .. } => {
                tracing::error!("Upstream error: {}", self);
            }
            Error::Database(_) | Error::Duplicate { .. } => {
                tracing::warn!("Store constraint error: {}", self);
            }
            Error::InvalidCredentials | Error::NotAuthorized { .. } | Error::AccessDenied => {
                tracing::info!("Authorization error: {}", self);
            }
            Error::BadRequest { .. } | Error::NotFound { .. } => {
                tracing::debug!("Client error: {}", self);
            }
        }

        let status = self.status_code();
        (status, self.user_message()).into_response()
    }
}

/// Type alias for service operation results
pub type Result<T> = std::result::Result<T, Error>;
