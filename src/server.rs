//! # Server Module
//!
//! HTTP server setup and route configuration for the HR administration
//! server.

use anyhow::{Context, Result};
use axum::{
    Router, middleware,
    routing::{get, post},
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::cors::{AllowOrigin, CorsLayer};

use crate::auth::{AuthMiddleware, PgUserDirectory, TokenAuthenticator, TokenService};
use crate::config::Config;
use crate::database::connection::DatabaseConnection;
use crate::routes::{auth, departments, health, hmo};

/// Application state shared across all route handlers
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DatabaseConnection>,
    pub authenticator: Arc<TokenAuthenticator>,
}

/// Starts the HR administration HTTP server.
///
/// Loads configuration, connects the database pool, wires the
/// authentication middleware and serves the routers until shutdown.
pub async fn start() -> Result<()> {
    let config = Config::from_env().context("Failed to load configuration")?;

    // Initialize database connection
    let db = Arc::new(
        DatabaseConnection::from_env()
            .await
            .context("Failed to connect to database")?,
    );

    // Token service plus directory-backed identity checks
    let authenticator = Arc::new(TokenAuthenticator::new(
        TokenService::new(&config.auth.jwt_secret),
        Arc::new(PgUserDirectory::new(db.pool().clone())),
    ));

    let app_state = AppState {
        db: db.clone(),
        authenticator: authenticator.clone(),
    };

    // Everything behind the bearer check
    let protected_routes = Router::new()
        .route("/api/v1/auth/me", get(auth::me))
        .route(
            "/api/v1/departments",
            get(departments::list).post(departments::create),
        )
        .route(
            "/api/v1/departments/{id}",
            get(departments::get_one)
                .put(departments::update)
                .delete(departments::delete),
        )
        .route(
            "/api/v1/departments/{id}/employees",
            get(departments::employees),
        )
        .route("/api/v1/hmo", get(hmo::list_plans).post(hmo::create_plan))
        .route("/api/v1/hmo/providers", get(hmo::list_providers))
        .route(
            "/api/v1/hmo/enrollments",
            get(hmo::list_enrollments).post(hmo::create_enrollment),
        )
        .route(
            "/api/v1/hmo/{id}",
            get(hmo::get_plan).put(hmo::update_plan).delete(hmo::delete_plan),
        )
        .layer(middleware::from_fn_with_state(
            authenticator.clone(),
            AuthMiddleware::require_auth,
        ));

    // Main app router
    let app = Router::new()
        .route("/ping", get(health::ping)) // Health check endpoint
        .route("/health", get(health::health)) // Database connectivity probe
        .route("/api/v1/auth/login", post(auth::login))
        .route("/api/v1/auth/logout", post(auth::logout))
        .merge(protected_routes)
        .layer(ServiceBuilder::new().layer(cors_layer(&config)))
        .with_state(app_state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {addr}"))?;

    tracing::info!("🚀 HRIS server starting...");
    tracing::info!("📡 Listening on http://{}", addr);
    tracing::info!("🏥 Health check available at http://{}/ping", addr);
    tracing::info!("🏢 Department endpoints available at http://{}/api/v1/departments", addr);
    tracing::info!("⚕️  HMO endpoints available at http://{}/api/v1/hmo", addr);
    tracing::info!("🔧 Environment: {:?}", config.env);

    axum::serve(listener, app)
        .await
        .context("Server terminated unexpectedly")?;
    Ok(())
}

/// Explicit origins from configuration get credential support; with none
/// configured the layer stays permissive, which cannot carry credentials.
fn cors_layer(config: &Config) -> CorsLayer {
    let origins: Vec<axum::http::HeaderValue> = config
        .cors_allowed_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(%origin, "ignoring unparseable CORS origin");
                None
            }
        })
        .collect();

    if origins.is_empty() {
        return CorsLayer::permissive();
    }

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([
            axum::http::Method::GET,
            axum::http::Method::POST,
            axum::http::Method::PUT,
            axum::http::Method::DELETE,
            axum::http::Method::OPTIONS,
        ])
        .allow_headers([
            axum::http::header::ORIGIN,
            axum::http::header::CONTENT_TYPE,
            axum::http::header::ACCEPT,
            axum::http::header::AUTHORIZATION,
        ])
        .allow_credentials(true)
}
