//! # Database Module
//!
//! PostgreSQL integration over tokio-postgres with deadpool pooling.
//! Includes connection management and the HR entity models.

pub mod connection;
pub mod models;

pub use connection::{DatabaseConfig, DatabaseConnection};
pub use models::*;
