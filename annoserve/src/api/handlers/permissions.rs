use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use crate::{
    api::models::permissions::{PermissionCreate, PermissionResponse, PermissionsRevokedResponse},
    auth::CurrentIdentity,
    db::handlers::Permissions,
    errors::Error,
    AppState,
};

/// Grant a group access to a document path
#[utoipa::path(
    post,
    path = "/permissions",
    context_path = "/admin/api/v1",
    request_body = PermissionCreate,
    tag = "permissions",
    responses(
        (status = 201, description = "Permission granted", body = PermissionResponse),
        (status = 401, description = "Admin session required"),
        (status = 404, description = "Group does not exist"),
        (status = 409, description = "Permission already set"),
    ),
    security(("session_token" = []))
)]
#[tracing::instrument(skip_all, fields(doc_path = %request.doc_path, group_name = %request.group_name))]
pub async fn grant_permission(
    State(state): State<AppState>,
    CurrentIdentity(identity): CurrentIdentity,
    Json(request): Json<PermissionCreate>,
) -> Result<(StatusCode, Json<PermissionResponse>), Error> {
    identity.require_admin("grant document permission")?;

    let mut conn = state.store.acquire().await?;
    Permissions::new(&mut conn)
        .grant(&request.doc_path, &request.group_name, request.can_write)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(PermissionResponse {
            doc_path: request.doc_path,
            group_name: request.group_name,
            can_write: request.can_write,
        }),
    ))
}

/// Revoke every permission a group holds
#[utoipa::path(
    delete,
    path = "/groups/{group_name}/permissions",
    context_path = "/admin/api/v1",
    tag = "permissions",
    params(("group_name" = String, Path, description = "Group whose grants are revoked")),
    responses(
        (status = 200, description = "Permissions revoked", body = PermissionsRevokedResponse),
        (status = 401, description = "Admin session required"),
    ),
    security(("session_token" = []))
)]
#[tracing::instrument(skip_all, fields(group_name = %group_name))]
pub async fn revoke_group_permissions(
    State(state): State<AppState>,
    CurrentIdentity(identity): CurrentIdentity,
    Path(group_name): Path<String>,
) -> Result<Json<PermissionsRevokedResponse>, Error> {
    identity.require_admin("revoke document permissions")?;

    let mut conn = state.store.acquire().await?;
    let revoked = Permissions::new(&mut conn).revoke(&group_name).await?;
    Ok(Json(PermissionsRevokedResponse { group_name, revoked }))
}
