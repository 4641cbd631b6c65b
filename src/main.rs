//! # HRIS Server
//!
//! Human-resources administration backend - an HTTP API server built with
//! Rust, Axum, and Tokio for department, HMO and account management.
//!
//! ## Features
//! - Async/await HTTP server using Axum framework
//! - Hand-rolled HMAC-SHA256 bearer tokens with directory-backed revocation
//! - Structured logging with tracing
//! - Department CRUD with pagination and search
//! - HMO plan, provider and enrollment management
//!
//! ## Architecture
//! The server is organized into modules:
//! - `server`: Core server initialization and route wiring
//! - `config`: Environment variable configuration management
//! - `auth`: Token issuance, verification and request authentication
//! - `database`: Connection pooling and the HR entity models
//! - `error`: HTTP-facing error type shared by all handlers
//! - `routes`: HTTP route handlers organized by functionality
//!   - `health`: Liveness endpoint
//!   - `auth`: Login, current-user and logout endpoints
//!   - `departments`: Department management endpoints
//!   - `hmo`: HMO plan, provider and enrollment endpoints
//!
//! ## Environment Setup
//! Copy `.env.example` to `.env` and configure:
//! ```bash
//! cp .env.example .env
//! # Edit .env with your database URL and JWT secret
//! ```
//!
//! ## Running the Server
//! ```bash
//! cargo run
//! ```
//!
//! The server will start on `http://127.0.0.1:3000` by default.
//!
//! ## Health Check
//! Once running, you can verify the server is operational:
//! ```bash
//! curl http://localhost:3000/ping
//! ```

mod auth;
mod config;
mod database;
mod error;
mod routes;
mod server;

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Application entry point.
///
/// Loads `.env`, initializes the tracing subscriber and starts the HTTP
/// server. Runs until the process is terminated.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    // Initialize the tracing subscriber for structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false) // Don't show module targets for cleaner output
                .compact(), // Use compact formatting
        )
        .init();

    // Log application startup
    tracing::info!("🏁 Starting HRIS Server...");
    tracing::info!(
        "📦 Package: {} v{}",
        env!("CARGO_PKG_NAME"),
        env!("CARGO_PKG_VERSION")
    );
    tracing::info!(
        "🏗️  Build profile: {}",
        if cfg!(debug_assertions) { "debug" } else { "release" }
    );

    server::start().await
}
