//! # annoserve: authentication and export layer for the annotation server
//!
//! `annoserve` is the credential, access-control and export service backing a
//! web-based text annotation tool. Annotation documents live as plain files
//! under a data directory; this service decides who may read or write them,
//! manages the users and groups those decisions are based on, and serves the
//! export paths (raw downloads, RDF renderings, collection archives, and
//! triplestore sync).
//!
//! ## Overview
//!
//! Identity is session-based: a login checks the supplied password against a
//! stored digest and binds the user name into a signed cookie. Every request
//! resolves to either a named user or the fixed anonymous principal `guest`;
//! handlers that mutate credential state require an admin session.
//!
//! Credentials and permissions live in a single SQLite file, deliberately
//! kept as a stable external schema (`users`, `groups`, `group_memberships`,
//! `doc_permissions`) so standalone administration tooling can manage the
//! same database. The file is never created implicitly: if it is missing,
//! every operation that needs it fails closed with a 503 while the rest of
//! the service keeps running.
//!
//! Read and write access to documents combines two sources. Rows in
//! `doc_permissions` are the authority: when any grant governs a path, group
//! membership decides and anonymous access is denied. With no governing rows
//! the decision falls back to a robots.txt-style rule file found in the
//! nearest directory, where absence means allow.
//!
//! ## Quick start
//!
//! ```no_run
//! use clap::Parser;
//! use annoserve::{Application, Config};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let args = annoserve::config::Args::parse();
//!     let config = Config::load(&args)?;
//!
//!     annoserve::telemetry::init_telemetry()?;
//!
//!     let app = Application::new(config).await?;
//!     app.serve(async {
//!         tokio::signal::ctrl_c().await.expect("Failed to listen for Ctrl+C");
//!     })
//!     .await?;
//!
//!     Ok(())
//! }
//! ```

pub mod access;
pub mod api;
pub mod auth;
pub mod config;
pub mod db;
pub mod errors;
pub mod export;
mod openapi;
pub mod telemetry;
pub mod types;

use axum::{
    Router,
    routing::{delete, get, post},
};
use sqlx::SqlitePool;
use tokio::net::TcpListener;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::{info, instrument, warn, Level};
use utoipa::OpenApi;
use utoipa_scalar::{Scalar, Servable};

use crate::{
    auth::password,
    db::{
        Store,
        handlers::{Repository, Users, users::UserCreateRequest},
    },
    openapi::ApiDoc,
};

pub use config::Config;

/// Application state shared across all request handlers.
#[derive(Clone)]
pub struct AppState {
    pub store: Store,
    pub config: Config,
}

/// Get the credential store migrator
pub fn migrator() -> sqlx::migrate::Migrator {
    sqlx::migrate!("./migrations")
}

/// Create the initial admin user if it doesn't exist.
///
/// Idempotent: an existing admin user keeps its row, and gets the configured
/// password re-applied when one is set. Without a configured password a
/// missing admin user is left uncreated, since every row needs a digest.
#[instrument(skip(password, pool))]
pub async fn create_initial_admin_user(user_name: &str, password: Option<&str>, pool: &SqlitePool) -> anyhow::Result<()> {
    let mut conn = pool.acquire().await?;
    let mut user_repo = Users::new(&mut conn);

    if user_repo.get_by_name(user_name).await?.is_some() {
        if let Some(password) = password {
            user_repo.set_password_hash(user_name, &password::digest(password)).await?;
            info!(user_name, "reset admin user password from configuration");
        }
        return Ok(());
    }

    let Some(password) = password else {
        warn!(user_name, "admin user missing and no admin_password configured; skipping bootstrap");
        return Ok(());
    };

    user_repo
        .create(&UserCreateRequest {
            user_name: user_name.to_string(),
            password_hash: password::digest(password),
            is_admin: true,
        })
        .await?;
    info!(user_name, "created initial admin user");

    Ok(())
}

/// Build the application router with all endpoints and middleware.
pub fn build_router(state: AppState) -> Router {
    // Session and password endpoints, at the root level.
    let auth_routes = Router::new()
        .route("/authentication/login", post(api::handlers::auth::login))
        .route("/authentication/logout", post(api::handlers::auth::logout))
        .route("/authentication/whoami", get(api::handlers::auth::whoami))
        .route("/authentication/password-change", post(api::handlers::auth::change_password));

    // Credential administration, admin-gated inside the handlers.
    let admin_routes = Router::new()
        .route("/users", get(api::handlers::users::list_users))
        .route("/users", post(api::handlers::users::create_user))
        .route("/users/{user_name}", delete(api::handlers::users::delete_user))
        .route(
            "/users/{user_name}/groups",
            delete(api::handlers::users::remove_user_from_all_groups),
        )
        .route("/groups", get(api::handlers::groups::list_groups))
        .route("/groups", post(api::handlers::groups::create_group))
        .route("/groups/{group_name}", delete(api::handlers::groups::delete_group))
        .route(
            "/groups/{group_name}/users/{user_name}",
            post(api::handlers::groups::add_user_to_group),
        )
        .route("/permissions", post(api::handlers::permissions::grant_permission))
        .route(
            "/groups/{group_name}/permissions",
            delete(api::handlers::permissions::revoke_group_permissions),
        );

    // Document and collection export paths, access-checked per request.
    let collection_routes = Router::new()
        .route(
            "/collections/{collection}/documents/{document}/download",
            get(api::handlers::downloads::download_document),
        )
        .route(
            "/collections/{collection}/documents/{document}/rdf",
            get(api::handlers::downloads::download_rdf),
        )
        .route(
            "/collections/{collection}/documents/{document}/triplestore",
            post(api::handlers::downloads::upload_to_triplestore),
        )
        .route("/collections/{collection}/archive", get(api::handlers::downloads::download_collection));

    Router::new()
        .route("/healthz", get(|| async { "OK" }))
        .merge(auth_routes)
        .merge(collection_routes)
        .nest("/admin/api/v1", admin_routes)
        .merge(Scalar::with_url("/admin/docs", ApiDoc::openapi()))
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
}

/// Main application struct that owns all resources and lifecycle.
///
/// 1. **Create**: [`Application::new`] opens the store, runs migrations when
///    the store file is present, and bootstraps the admin user
/// 2. **Serve**: [`Application::serve`] binds the TCP port and handles
///    requests until the shutdown future resolves
pub struct Application {
    router: Router,
    store: Store,
    config: Config,
}

impl Application {
    /// Create a new application instance.
    ///
    /// A missing store file is logged but not fatal: the service starts and
    /// fails the affected requests closed until an administrator provisions
    /// the database.
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        let store = Store::open(&config.database.path);

        if store.is_available() {
            migrator().run(store.pool()).await?;
            create_initial_admin_user(&config.admin_user, config.admin_password.as_deref(), store.pool()).await?;
        } else {
            warn!(
                path = %config.database.path.display(),
                "credential store file not found; requests needing it will fail until it is provisioned"
            );
        }

        let state = AppState {
            store: store.clone(),
            config: config.clone(),
        };
        let router = build_router(state);

        Ok(Self { router, store, config })
    }

    /// Start serving the application
    pub async fn serve<F>(self, shutdown: F) -> anyhow::Result<()>
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let bind_addr = self.config.bind_address();
        let listener = TcpListener::bind(&bind_addr).await?;
        info!("Annotation auth server listening on http://{bind_addr}");

        axum::serve(listener, self.router.into_make_service())
            .with_graceful_shutdown(shutdown)
            .await?;

        info!("Closing store connections...");
        self.store.pool().close().await;

        Ok(())
    }
}
