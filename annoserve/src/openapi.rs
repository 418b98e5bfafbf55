//! OpenAPI documentation for the service API.

use utoipa::{
    Modify, OpenApi,
    openapi::security::{ApiKey, ApiKeyValue, SecurityScheme},
};

use crate::api::{handlers, models};

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "session_token",
                SecurityScheme::ApiKey(ApiKey::Cookie(ApiKeyValue::new("annoserve_session"))),
            );
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    info(
        title = "annoserve API",
        description = "Authentication, credential administration and export API for the annotation server"
    ),
    modifiers(&SecurityAddon),
    paths(
        handlers::auth::login,
        handlers::auth::logout,
        handlers::auth::whoami,
        handlers::auth::change_password,
        handlers::users::create_user,
        handlers::users::list_users,
        handlers::users::delete_user,
        handlers::users::remove_user_from_all_groups,
        handlers::groups::create_group,
        handlers::groups::list_groups,
        handlers::groups::delete_group,
        handlers::groups::add_user_to_group,
        handlers::permissions::grant_permission,
        handlers::permissions::revoke_group_permissions,
        handlers::downloads::download_document,
        handlers::downloads::download_rdf,
        handlers::downloads::download_collection,
        handlers::downloads::upload_to_triplestore,
    ),
    components(schemas(
        models::MessageResponse,
        models::auth::LoginRequest,
        models::auth::AuthSuccessResponse,
        models::auth::WhoamiResponse,
        models::auth::ChangePasswordRequest,
        models::users::UserCreate,
        models::users::UserCreatedResponse,
        models::users::UserResponse,
        models::users::MembershipsRemovedResponse,
        models::groups::GroupCreate,
        models::groups::GroupResponse,
        models::permissions::PermissionCreate,
        models::permissions::PermissionResponse,
        models::permissions::PermissionsRevokedResponse,
    )),
    tags(
        (name = "authentication", description = "Session login and password management"),
        (name = "users", description = "User administration"),
        (name = "groups", description = "Group and membership administration"),
        (name = "permissions", description = "Per-document group permissions"),
        (name = "downloads", description = "Document, RDF and archive exports"),
    )
)]
pub struct ApiDoc;
