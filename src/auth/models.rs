//! Authentication models.
//!
//! Request/response payloads for the auth routes and the per-request
//! authenticated identity handed to route handlers.

use serde::{Deserialize, Serialize};

use crate::auth::token::{Claims, TOKEN_TTL_SECS};

/// Role names as stored in the `roles` table.
pub const ROLE_SYSTEM_ADMIN: &str = "System Admin";
pub const ROLE_HR_MANAGER: &str = "HR Manager";

/// Authenticated identity for the current request.
///
/// Built from verified token claims by the auth middleware and carried in
/// the request's extensions, never in shared state, so it lives and dies
/// with the request it belongs to.
#[derive(Debug, Clone, Serialize)]
pub struct CurrentUser {
    pub user_id: i32,
    pub employee_id: i32,
    pub username: String,
    pub role_id: i32,
    pub role_name: String,
}

impl CurrentUser {
    /// Exact, case-sensitive role check.
    pub fn has_role(&self, required: &str) -> bool {
        self.role_name == required
    }

    /// True when the role name is any of `required`.
    pub fn has_any_role(&self, required: &[&str]) -> bool {
        required.iter().any(|role| self.role_name == *role)
    }
}

impl From<Claims> for CurrentUser {
    fn from(claims: Claims) -> Self {
        Self {
            user_id: claims.user_id,
            employee_id: claims.employee_id,
            username: claims.username,
            role_id: claims.role_id,
            role_name: claims.role_name,
        }
    }
}

/// Login request payload
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Token response after successful authentication
#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: i64,
    pub user: CurrentUser,
}

impl TokenResponse {
    pub fn new(access_token: String, user: CurrentUser) -> Self {
        Self {
            access_token,
            token_type: "Bearer".to_string(),
            expires_in: TOKEN_TTL_SECS,
            user,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hr_manager() -> CurrentUser {
        CurrentUser {
            user_id: 42,
            employee_id: 17,
            username: "mreyes".to_string(),
            role_id: 3,
            role_name: "HR Manager".to_string(),
        }
    }

    #[test]
    fn has_role_is_exact_and_case_sensitive() {
        let user = hr_manager();
        assert!(user.has_role("HR Manager"));
        assert!(!user.has_role("hr manager"));
        assert!(!user.has_role("HR Manager "));
        assert!(!user.has_role("System Admin"));
    }

    #[test]
    fn has_any_role_checks_membership() {
        let user = hr_manager();
        assert!(user.has_any_role(&[ROLE_SYSTEM_ADMIN, ROLE_HR_MANAGER]));
        assert!(user.has_any_role(&["HR Manager"]));
        assert!(!user.has_any_role(&["System Admin", "Payroll Officer"]));
        assert!(!user.has_any_role(&[]));
    }
}
