use axum::{extract::State, Json};

use crate::{
    api::models::{
        MessageResponse,
        auth::{AuthSuccessResponse, ChangePasswordRequest, LoginRequest, LoginResponse, LogoutResponse, WhoamiResponse},
    },
    auth::{CurrentIdentity, password, session},
    db::handlers::{Repository, Users},
    errors::Error,
    types::SessionUser,
    AppState,
};

/// Login with user name and password
#[utoipa::path(
    post,
    path = "/authentication/login",
    request_body = LoginRequest,
    tag = "authentication",
    responses(
        (status = 200, description = "Login successful", body = AuthSuccessResponse),
        (status = 401, description = "Invalid credentials"),
        (status = 503, description = "Credential store unavailable"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn login(State(state): State<AppState>, Json(request): Json<LoginRequest>) -> Result<LoginResponse, Error> {
    let mut conn = state.store.acquire().await?;
    let mut user_repo = Users::new(&mut conn);

    // A missing user and a wrong password must be indistinguishable. The
    // lookup miss burns a verify too, so it costs the same as a mismatch.
    let user = match user_repo.get_by_name(&request.user).await? {
        Some(user) => user,
        None => {
            let _ = password::verify(&request.password, &password::digest(""));
            return Err(Error::InvalidCredentials);
        }
    };

    if !password::verify(&request.password, &user.password_hash) {
        return Err(Error::InvalidCredentials);
    }

    let session_user = SessionUser {
        user_name: user.user_name.clone(),
        is_admin: user.is_admin,
    };
    let token = session::create_session_token(&session_user, &state.config)?;
    let cookie = session::create_session_cookie(&token, &state.config);

    Ok(LoginResponse {
        auth_response: AuthSuccessResponse {
            user: user.user_name,
            message: "Hello!".to_string(),
        },
        cookie,
    })
}

/// Logout (clear session)
///
/// Clearing an absent session is not an error; logout is idempotent.
#[utoipa::path(
    post,
    path = "/authentication/logout",
    tag = "authentication",
    responses(
        (status = 200, description = "Logout successful", body = MessageResponse),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn logout(State(state): State<AppState>) -> Result<LogoutResponse, Error> {
    let cookie = session::clear_session_cookie(&state.config);

    Ok(LogoutResponse {
        message: MessageResponse {
            message: "Bye!".to_string(),
        },
        cookie,
    })
}

/// Report the identity bound to the current session
#[utoipa::path(
    get,
    path = "/authentication/whoami",
    tag = "authentication",
    responses(
        (status = 200, description = "Bound user name, or empty when anonymous", body = WhoamiResponse),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn whoami(CurrentIdentity(identity): CurrentIdentity) -> Json<WhoamiResponse> {
    Json(WhoamiResponse {
        user: identity.user_name().map(str::to_owned),
    })
}

/// Overwrite a user's password digest
#[utoipa::path(
    post,
    path = "/authentication/password-change",
    request_body = ChangePasswordRequest,
    tag = "authentication",
    responses(
        (status = 200, description = "Password changed", body = MessageResponse),
        (status = 401, description = "Not authorized to change this password"),
        (status = 404, description = "No such user"),
    ),
    security(("session_token" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn change_password(
    State(state): State<AppState>,
    CurrentIdentity(identity): CurrentIdentity,
    Json(request): Json<ChangePasswordRequest>,
) -> Result<Json<MessageResponse>, Error> {
    let actor = identity.require_user("change password")?;
    // Admins may reset anyone; everyone else only themselves.
    if !actor.is_admin && actor.user_name != request.user {
        return Err(Error::NotAuthorized {
            action: "change another user's password".to_string(),
        });
    }

    let digest = password::digest(&request.new_password);
    let mut conn = state.store.acquire().await?;
    Users::new(&mut conn)
        .set_password_hash(&request.user, &digest)
        .await
        .map_err(|e| match e {
            crate::db::errors::DbError::NotFound => Error::NotFound {
                resource: "user".to_string(),
                id: request.user.clone(),
            },
            other => Error::Database(other),
        })?;

    Ok(Json(MessageResponse {
        message: "Password changed".to_string(),
    }))
}
