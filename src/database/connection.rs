// Database Connection Management
//
// Handles PostgreSQL connection pooling using tokio-postgres and deadpool.
use anyhow::{Context, Result};
use deadpool_postgres::{Manager, ManagerConfig, Pool, RecyclingMethod};
use native_tls::TlsConnector;
use postgres_native_tls::MakeTlsConnector;
use std::str::FromStr;
use std::time::Duration;

/// Database configuration
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub dbname: String,
    pub max_size: usize,
    pub timeouts: deadpool_postgres::Timeouts,
}

impl DatabaseConfig {
    /// Create configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let database_url = std::env::var("DATABASE_URL")
            .context("DATABASE_URL must be set in the environment")?;

        let config = tokio_postgres::Config::from_str(&database_url)
            .context("Failed to parse DATABASE_URL")?;

        Ok(Self {
            host: config
                .get_hosts()
                .first()
                .map(|h| match h {
                    tokio_postgres::config::Host::Tcp(s) => s.clone(),
                    tokio_postgres::config::Host::Unix(s) => s.to_string_lossy().to_string(),
                })
                .unwrap_or_default(),
            port: config.get_ports().first().cloned().unwrap_or(5432),
            user: config.get_user().map(|u| u.to_string()).unwrap_or_default(),
            password: config
                .get_password()
                .map(|p| String::from_utf8_lossy(p).to_string())
                .unwrap_or_default(),
            dbname: config.get_dbname().map(|d| d.to_string()).unwrap_or_default(),
            max_size: 16,
            timeouts: deadpool_postgres::Timeouts {
                wait: Some(Duration::from_secs(30)),
                create: Some(Duration::from_secs(30)),
                recycle: Some(Duration::from_secs(30)),
            },
        })
    }
}

/// Database connection wrapper
#[derive(Debug, Clone)]
pub struct DatabaseConnection {
    pool: Pool,
}

impl DatabaseConnection {
    /// Create a new database connection with the provided configuration
    pub async fn new(config: DatabaseConfig) -> Result<Self> {
        let masked_host = format!("{}:{}/{}", config.host, config.port, config.dbname);
        tracing::info!("🔌 Connecting to database: {}", masked_host);

        let mut pg_config = tokio_postgres::Config::new();
        pg_config.host(&config.host);
        pg_config.port(config.port);
        pg_config.user(&config.user);
        pg_config.password(&config.password);
        pg_config.dbname(&config.dbname);

        // Enable SSL using native-tls
        let tls_connector = TlsConnector::builder()
            .build()
            .context("Failed to build TLS connector")?;
        let tls = MakeTlsConnector::new(tls_connector);

        let mgr_config = ManagerConfig {
            recycling_method: RecyclingMethod::Fast,
        };
        let mgr = Manager::from_config(pg_config, tls, mgr_config);

        let pool = Pool::builder(mgr)
            .max_size(config.max_size)
            .wait_timeout(config.timeouts.wait)
            .create_timeout(config.timeouts.create)
            .recycle_timeout(config.timeouts.recycle)
            .runtime(deadpool_postgres::Runtime::Tokio1)
            .build()
            .context("Failed to create database pool")?;

        // Test the connection
        let client = pool
            .get()
            .await
            .context("Failed to get connection from pool")?;

        client
            .query("SELECT 1", &[])
            .await
            .context("Failed to test database connection")?;

        tracing::info!("✅ Database connection established successfully");

        Ok(Self { pool })
    }

    /// Create configuration from the environment and connect
    pub async fn from_env() -> Result<Self> {
        let config = DatabaseConfig::from_env()?;
        Self::new(config).await
    }

    /// Get a reference to the connection pool
    pub fn pool(&self) -> &Pool {
        &self.pool
    }

    /// Check database health
    pub async fn health_check(&self) -> Result<()> {
        let client = self
            .pool
            .get()
            .await
            .context("Failed to get connection for health check")?;

        client
            .query("SELECT 1", &[])
            .await
            .context("Database health check failed")?;
        Ok(())
    }

    /// Get database connection statistics
    pub fn stats(&self) -> ConnectionStats {
        let status = self.pool.status();
        ConnectionStats {
            size: status.size as u32,
            idle: status.available,
        }
    }
}

/// Database connection statistics
#[derive(Debug)]
pub struct ConnectionStats {
    pub size: u32,
    pub idle: usize,
}
