//! User directory lookups backing identity resolution.
//!
//! A verified token is only half of authentication: the subject must still
//! exist in the directory, be flagged active, and map to exactly one role.
//! Deactivating an account therefore revokes its outstanding tokens without
//! any revocation list.

use anyhow::{Context, Result};
use async_trait::async_trait;
use deadpool_postgres::Pool;
use tokio_postgres::Row;

use crate::database::models::FromRow;

/// Directory view of an active account: proof the subject is live plus the
/// role it currently maps to. The request context itself is built from the
/// verified claims, not from this record.
#[derive(Debug, Clone)]
pub struct DirectoryRecord {
    pub user_id: i32,
    pub role_name: String,
}

impl FromRow for DirectoryRecord {
    fn from_row(row: &Row) -> Result<Self, tokio_postgres::Error> {
        Ok(Self {
            user_id: row.try_get("user_id")?,
            role_name: row.try_get("role_name")?,
        })
    }
}

/// Resolves a token subject to an active account.
///
/// `Ok(None)` means the subject is unknown, inactive, or not mapped to a
/// single role; `Err` means the lookup itself failed. Callers must treat the
/// two the same at the authentication boundary and never crash on `Err`.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    async fn resolve_active(&self, user_id: i32) -> Result<Option<DirectoryRecord>>;
}

/// Postgres-backed directory over the `users`/`roles` tables.
pub struct PgUserDirectory {
    pool: Pool,
}

impl PgUserDirectory {
    pub fn new(pool: Pool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserDirectory for PgUserDirectory {
    async fn resolve_active(&self, user_id: i32) -> Result<Option<DirectoryRecord>> {
        let client = self
            .pool
            .get()
            .await
            .context("Failed to get DB connection")?;

        // The inner join demands the single role the account is mapped to;
        // an account without one does not resolve.
        let row = client
            .query_opt(
                "SELECT u.user_id, r.role_name
                 FROM users u
                 JOIN roles r ON u.role_id = r.role_id
                 WHERE u.user_id = $1 AND u.is_active",
                &[&user_id],
            )
            .await
            .context("Failed to query user directory")?;

        row.map(|r| DirectoryRecord::from_row(&r))
            .transpose()
            .context("Failed to read user directory row")
    }
}
