//! Configuration module for environment variables and application settings

use anyhow::Result;
use std::env;
use std::fmt;

const DEV_JWT_SECRET: &str = "dev-secret-change-in-production";

/// Deployment environment, from `APP_ENV`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnv {
    Development,
    Production,
}

impl AppEnv {
    fn parse(value: Option<&str>) -> Self {
        match value.map(|v| v.trim().to_ascii_lowercase()).as_deref() {
            Some("production") | Some("prod") => AppEnv::Production,
            _ => AppEnv::Development,
        }
    }

    pub fn from_env() -> Self {
        Self::parse(env::var("APP_ENV").ok().as_deref())
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    /// Deployment environment
    pub env: AppEnv,

    /// Server configuration
    pub server: ServerConfig,

    /// Authentication configuration
    pub auth: AuthConfig,

    /// Origins allowed by CORS; empty means allow any origin
    pub cors_allowed_origins: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Clone)]
pub struct AuthConfig {
    /// Secret key for token signing
    pub jwt_secret: String,
}

impl fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthConfig")
            .field("jwt_secret", &"<redacted>")
            .finish()
    }
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// In production a missing `JWT_SECRET` is a startup error; in
    /// development it falls back to a well-known default so tokens minted
    /// across restarts stay verifiable.
    pub fn from_env() -> Result<Self> {
        let env_kind = AppEnv::from_env();
        let jwt_secret = resolve_jwt_secret(env_kind, env::var("JWT_SECRET").ok())?;

        let cors_allowed_origins = env::var("CORS_ALLOWED_ORIGINS")
            .unwrap_or_default()
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect();

        Ok(Self {
            env: env_kind,
            server: ServerConfig {
                host: env::var("SERVER_HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
                port: env::var("SERVER_PORT")
                    .unwrap_or_else(|_| "3000".to_string())
                    .parse()
                    .unwrap_or(3000),
            },
            auth: AuthConfig { jwt_secret },
            cors_allowed_origins,
        })
    }
}

/// Signing-secret policy: production refuses to start without a real
/// `JWT_SECRET`; development warns and falls back to a fixed default so
/// tokens stay verifiable across restarts. Blank values count as unset.
fn resolve_jwt_secret(env_kind: AppEnv, raw: Option<String>) -> Result<String> {
    match raw.filter(|s| !s.trim().is_empty()) {
        Some(secret) => Ok(secret),
        None if env_kind == AppEnv::Production => {
            anyhow::bail!("JWT_SECRET must be set when APP_ENV=production")
        }
        None => {
            tracing::warn!("⚠️  JWT_SECRET not set; using the development-only default");
            Ok(DEV_JWT_SECRET.to_string())
        }
    }
}
