use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use crate::{
    api::models::users::{MembershipsRemovedResponse, UserCreate, UserCreatedResponse, UserResponse},
    auth::{CurrentIdentity, password},
    db::handlers::{Groups, Repository, Users},
    errors::Error,
    AppState,
};

/// Create a user with a generated password
///
/// The plaintext password appears in this response and nowhere else; the
/// administrator relays it to the new user out of band.
#[utoipa::path(
    post,
    path = "/users",
    context_path = "/admin/api/v1",
    request_body = UserCreate,
    tag = "users",
    responses(
        (status = 201, description = "User created; response carries the one-time password", body = UserCreatedResponse),
        (status = 401, description = "Admin session required"),
        (status = 409, description = "User already exists"),
        (status = 503, description = "Credential store unavailable"),
    ),
    security(("session_token" = []))
)]
#[tracing::instrument(skip_all, fields(user_name = %request.user_name))]
pub async fn create_user(
    State(state): State<AppState>,
    CurrentIdentity(identity): CurrentIdentity,
    Json(request): Json<UserCreate>,
) -> Result<(StatusCode, Json<UserCreatedResponse>), Error> {
    identity.require_admin("create user")?;

    let plaintext = password::generate_password();
    let mut conn = state.store.acquire().await?;
    let created = Users::new(&mut conn)
        .create(&crate::db::handlers::users::UserCreateRequest {
            user_name: request.user_name,
            password_hash: password::digest(&plaintext),
            is_admin: request.is_admin,
        })
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(UserCreatedResponse {
            user_name: created.user_name,
            is_admin: created.is_admin,
            password: plaintext,
        }),
    ))
}

/// List all users
#[utoipa::path(
    get,
    path = "/users",
    context_path = "/admin/api/v1",
    tag = "users",
    responses(
        (status = 200, description = "All users", body = [UserResponse]),
        (status = 401, description = "Admin session required"),
    ),
    security(("session_token" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn list_users(
    State(state): State<AppState>,
    CurrentIdentity(identity): CurrentIdentity,
) -> Result<Json<Vec<UserResponse>>, Error> {
    identity.require_admin("list users")?;

    let mut conn = state.store.acquire().await?;
    let users = Users::new(&mut conn).list().await?;
    Ok(Json(users.into_iter().map(UserResponse::from).collect()))
}

/// Delete a user and their group memberships
///
/// Annotation files the user contributed to stay untouched; only the
/// credential rows go.
#[utoipa::path(
    delete,
    path = "/users/{user_name}",
    context_path = "/admin/api/v1",
    tag = "users",
    params(("user_name" = String, Path, description = "User to delete")),
    responses(
        (status = 204, description = "User deleted"),
        (status = 401, description = "Admin session required"),
        (status = 404, description = "No such user"),
    ),
    security(("session_token" = []))
)]
#[tracing::instrument(skip_all, fields(user_name = %user_name))]
pub async fn delete_user(
    State(state): State<AppState>,
    CurrentIdentity(identity): CurrentIdentity,
    Path(user_name): Path<String>,
) -> Result<StatusCode, Error> {
    identity.require_admin("delete user")?;

    let mut conn = state.store.acquire().await?;
    let deleted = Users::new(&mut conn).delete(&user_name).await?;
    if !deleted {
        return Err(Error::NotFound {
            resource: "user".to_string(),
            id: user_name,
        });
    }
    Ok(StatusCode::NO_CONTENT)
}

/// Remove a user from every group
#[utoipa::path(
    delete,
    path = "/users/{user_name}/groups",
    context_path = "/admin/api/v1",
    tag = "users",
    params(("user_name" = String, Path, description = "User whose memberships are removed")),
    responses(
        (status = 200, description = "Memberships removed", body = MembershipsRemovedResponse),
        (status = 401, description = "Admin session required"),
    ),
    security(("session_token" = []))
)]
#[tracing::instrument(skip_all, fields(user_name = %user_name))]
pub async fn remove_user_from_all_groups(
    State(state): State<AppState>,
    CurrentIdentity(identity): CurrentIdentity,
    Path(user_name): Path<String>,
) -> Result<Json<MembershipsRemovedResponse>, Error> {
    identity.require_admin("remove user from groups")?;

    let mut conn = state.store.acquire().await?;
    let removed = Groups::new(&mut conn).remove_member(&user_name).await?;
    Ok(Json(MembershipsRemovedResponse { user_name, removed }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::handlers::test_support::{admin_server, login_as, seed_admin, seed_user, test_state};
    use sqlx::SqlitePool;

    #[sqlx::test]
    async fn create_user_returns_the_password_exactly_once(pool: SqlitePool) {
        let state = test_state(pool);
        seed_admin(&state).await;
        let server = admin_server(state.clone());
        login_as(&server, "admin", "adminpw").await;

        let response = server
            .post("/admin/api/v1/users")
            .json(&serde_json::json!({"user_name": "bob"}))
            .await;
        response.assert_status(StatusCode::CREATED);
        let body: UserCreatedResponse = response.json();
        assert_eq!(body.user_name, "bob");
        assert_eq!(body.password.len(), 15);
        assert!(body.password.chars().all(|c| c.is_ascii_alphanumeric()));

        // The listing never exposes passwords or digests.
        let listing = server.get("/admin/api/v1/users").await;
        assert!(!listing.text().contains(&body.password));
        assert!(!listing.text().contains("password_hash"));

        // And the generated password actually logs in.
        login_as(&server, "bob", &body.password).await;
    }

    #[sqlx::test]
    async fn duplicate_user_is_a_conflict(pool: SqlitePool) {
        let state = test_state(pool);
        seed_admin(&state).await;
        let server = admin_server(state.clone());
        login_as(&server, "admin", "adminpw").await;

        let request = serde_json::json!({"user_name": "bob"});
        server.post("/admin/api/v1/users").json(&request).await.assert_status(StatusCode::CREATED);
        server
            .post("/admin/api/v1/users")
            .json(&request)
            .await
            .assert_status(StatusCode::CONFLICT);
    }

    #[sqlx::test]
    async fn mutations_require_an_admin_session(pool: SqlitePool) {
        let state = test_state(pool);
        seed_admin(&state).await;
        seed_user(&state, "bob", "secret123", false).await;
        let server = admin_server(state.clone());

        // Anonymous.
        server
            .post("/admin/api/v1/users")
            .json(&serde_json::json!({"user_name": "eve"}))
            .await
            .assert_status(StatusCode::UNAUTHORIZED);

        // Logged in, but not an admin.
        login_as(&server, "bob", "secret123").await;
        server
            .post("/admin/api/v1/users")
            .json(&serde_json::json!({"user_name": "eve"}))
            .await
            .assert_status(StatusCode::UNAUTHORIZED);
        server.delete("/admin/api/v1/users/bob").await.assert_status(StatusCode::UNAUTHORIZED);
        server.get("/admin/api/v1/users").await.assert_status(StatusCode::UNAUTHORIZED);
    }

    #[sqlx::test]
    async fn delete_user_drops_row_and_memberships(pool: SqlitePool) {
        let state = test_state(pool);
        seed_admin(&state).await;
        seed_user(&state, "bob", "secret123", false).await;
        {
            let mut conn = state.store.acquire().await.unwrap();
            let mut groups = Groups::new(&mut conn);
            groups
                .create(&crate::db::handlers::groups::GroupCreateRequest {
                    group_name: "annotators".to_string(),
                })
                .await
                .unwrap();
            groups.add_member("bob", "annotators").await.unwrap();
        }
        let server = admin_server(state.clone());
        login_as(&server, "admin", "adminpw").await;

        server.delete("/admin/api/v1/users/bob").await.assert_status(StatusCode::NO_CONTENT);
        server.delete("/admin/api/v1/users/bob").await.assert_status(StatusCode::NOT_FOUND);

        let mut conn = state.store.acquire().await.unwrap();
        let memberships = Groups::new(&mut conn).memberships_for_user("bob").await.unwrap();
        assert!(memberships.is_empty());
    }

    #[sqlx::test]
    async fn remove_from_all_groups_reports_the_count(pool: SqlitePool) {
        let state = test_state(pool);
        seed_admin(&state).await;
        seed_user(&state, "bob", "secret123", false).await;
        {
            let mut conn = state.store.acquire().await.unwrap();
            let mut groups = Groups::new(&mut conn);
            for name in ["annotators", "reviewers"] {
                groups
                    .create(&crate::db::handlers::groups::GroupCreateRequest {
                        group_name: name.to_string(),
                    })
                    .await
                    .unwrap();
                groups.add_member("bob", name).await.unwrap();
            }
        }
        let server = admin_server(state.clone());
        login_as(&server, "admin", "adminpw").await;

        let body: MembershipsRemovedResponse = server.delete("/admin/api/v1/users/bob/groups").await.json();
        assert_eq!(body.removed, 2);

        let body: MembershipsRemovedResponse = server.delete("/admin/api/v1/users/bob/groups").await.json();
        assert_eq!(body.removed, 0);
    }
}
