//! # Authentication Module
//!
//! Handles token issuance, verification, and middleware for securing API
//! endpoints. Tokens are compact three-segment credentials signed with
//! HMAC-SHA256; every authenticated request is additionally checked against
//! the live user directory so deactivating an account revokes its tokens.

pub mod directory;
pub mod middleware;
pub mod models;
pub mod token;

pub use directory::PgUserDirectory;
pub use middleware::{AuthMiddleware, TokenAuthenticator};
pub use token::TokenService;
