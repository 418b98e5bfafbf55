use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use crate::{
    api::models::{
        MessageResponse,
        groups::{GroupCreate, GroupResponse},
    },
    auth::CurrentIdentity,
    db::handlers::{Groups, Repository},
    errors::Error,
    AppState,
};

/// Create a group
#[utoipa::path(
    post,
    path = "/groups",
    context_path = "/admin/api/v1",
    request_body = GroupCreate,
    tag = "groups",
    responses(
        (status = 201, description = "Group created", body = GroupResponse),
        (status = 401, description = "Admin session required"),
        (status = 409, description = "Group already exists"),
    ),
    security(("session_token" = []))
)]
#[tracing::instrument(skip_all, fields(group_name = %request.group_name))]
pub async fn create_group(
    State(state): State<AppState>,
    CurrentIdentity(identity): CurrentIdentity,
    Json(request): Json<GroupCreate>,
) -> Result<(StatusCode, Json<GroupResponse>), Error> {
    identity.require_admin("create group")?;

    let mut conn = state.store.acquire().await?;
    let created = Groups::new(&mut conn)
        .create(&crate::db::handlers::groups::GroupCreateRequest {
            group_name: request.group_name,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(GroupResponse::from(created))))
}

/// List all groups
#[utoipa::path(
    get,
    path = "/groups",
    context_path = "/admin/api/v1",
    tag = "groups",
    responses(
        (status = 200, description = "All groups", body = [GroupResponse]),
        (status = 401, description = "Admin session required"),
    ),
    security(("session_token" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn list_groups(
    State(state): State<AppState>,
    CurrentIdentity(identity): CurrentIdentity,
) -> Result<Json<Vec<GroupResponse>>, Error> {
    identity.require_admin("list groups")?;

    let mut conn = state.store.acquire().await?;
    let groups = Groups::new(&mut conn).list().await?;
    Ok(Json(groups.into_iter().map(GroupResponse::from).collect()))
}

/// Delete a group, cascading memberships and permissions
#[utoipa::path(
    delete,
    path = "/groups/{group_name}",
    context_path = "/admin/api/v1",
    tag = "groups",
    params(("group_name" = String, Path, description = "Group to delete")),
    responses(
        (status = 204, description = "Group deleted"),
        (status = 401, description = "Admin session required"),
        (status = 404, description = "No such group"),
    ),
    security(("session_token" = []))
)]
#[tracing::instrument(skip_all, fields(group_name = %group_name))]
pub async fn delete_group(
    State(state): State<AppState>,
    CurrentIdentity(identity): CurrentIdentity,
    Path(group_name): Path<String>,
) -> Result<StatusCode, Error> {
    identity.require_admin("delete group")?;

    let mut conn = state.store.acquire().await?;
    let deleted = Groups::new(&mut conn).delete(&group_name).await?;
    if !deleted {
        return Err(Error::NotFound {
            resource: "group".to_string(),
            id: group_name,
        });
    }
    Ok(StatusCode::NO_CONTENT)
}

/// Add a user to a group
#[utoipa::path(
    post,
    path = "/groups/{group_name}/users/{user_name}",
    context_path = "/admin/api/v1",
    tag = "groups",
    params(
        ("group_name" = String, Path, description = "Target group"),
        ("user_name" = String, Path, description = "User to add"),
    ),
    responses(
        (status = 201, description = "Membership added", body = MessageResponse),
        (status = 401, description = "Admin session required"),
        (status = 404, description = "User or group does not exist"),
        (status = 409, description = "Already a member"),
    ),
    security(("session_token" = []))
)]
#[tracing::instrument(skip_all, fields(group_name = %group_name, user_name = %user_name))]
pub async fn add_user_to_group(
    State(state): State<AppState>,
    CurrentIdentity(identity): CurrentIdentity,
    Path((group_name, user_name)): Path<(String, String)>,
) -> Result<(StatusCode, Json<MessageResponse>), Error> {
    identity.require_admin("add user to group")?;

    let mut conn = state.store.acquire().await?;
    Groups::new(&mut conn).add_member(&user_name, &group_name).await?;

    Ok((
        StatusCode::CREATED,
        Json(MessageResponse {
            message: format!("Added {user_name} to {group_name}"),
        }),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::handlers::test_support::{admin_server, login_as, seed_admin, seed_user, test_state};
    use sqlx::SqlitePool;

    #[sqlx::test]
    async fn group_lifecycle_roundtrip(pool: SqlitePool) {
        let state = test_state(pool);
        seed_admin(&state).await;
        let server = admin_server(state);
        login_as(&server, "admin", "adminpw").await;

        let request = serde_json::json!({"group_name": "annotators"});
        server.post("/admin/api/v1/groups").json(&request).await.assert_status(StatusCode::CREATED);
        server
            .post("/admin/api/v1/groups")
            .json(&request)
            .await
            .assert_status(StatusCode::CONFLICT);

        let listing: Vec<GroupResponse> = server.get("/admin/api/v1/groups").await.json();
        assert_eq!(listing.len(), 1);
        assert_eq!(listing[0].group_name, "annotators");

        server
            .delete("/admin/api/v1/groups/annotators")
            .await
            .assert_status(StatusCode::NO_CONTENT);
        server
            .delete("/admin/api/v1/groups/annotators")
            .await
            .assert_status(StatusCode::NOT_FOUND);
    }

    #[sqlx::test]
    async fn membership_reports_duplicates_and_missing_rows(pool: SqlitePool) {
        let state = test_state(pool);
        seed_admin(&state).await;
        seed_user(&state, "bob", "secret123", false).await;
        let server = admin_server(state);
        login_as(&server, "admin", "adminpw").await;

        server
            .post("/admin/api/v1/groups")
            .json(&serde_json::json!({"group_name": "annotators"}))
            .await
            .assert_status(StatusCode::CREATED);

        server
            .post("/admin/api/v1/groups/annotators/users/bob")
            .await
            .assert_status(StatusCode::CREATED);
        // Re-adding is reported, not fatal.
        server
            .post("/admin/api/v1/groups/annotators/users/bob")
            .await
            .assert_status(StatusCode::CONFLICT);
        // Unknown user or group surfaces as a missing reference.
        server
            .post("/admin/api/v1/groups/annotators/users/ghost")
            .await
            .assert_status(StatusCode::NOT_FOUND);
        server
            .post("/admin/api/v1/groups/phantoms/users/bob")
            .await
            .assert_status(StatusCode::NOT_FOUND);
    }

    #[sqlx::test]
    async fn group_mutations_are_admin_gated(pool: SqlitePool) {
        let state = test_state(pool);
        seed_user(&state, "bob", "secret123", false).await;
        let server = admin_server(state);
        login_as(&server, "bob", "secret123").await;

        server
            .post("/admin/api/v1/groups")
            .json(&serde_json::json!({"group_name": "annotators"}))
            .await
            .assert_status(StatusCode::UNAUTHORIZED);
        server
            .delete("/admin/api/v1/groups/annotators")
            .await
            .assert_status(StatusCode::UNAUTHORIZED);
    }
}
