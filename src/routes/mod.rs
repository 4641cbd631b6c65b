// # Routes Module
//
// - This module contains all HTTP route handlers for the HR administration
//   server.
// - Routes are organized by functionality into separate submodules.
//
//  ## Available Route Modules
// - `health`: Liveness endpoint
// - `auth`: Login, current-user and logout endpoints
// - `departments`: Department management endpoints
// - `hmo`: HMO plan, provider and enrollment endpoints
//
// - ## Adding New Routes
// - 1. Create a new file in the `routes/` directory
// - 2. Add the module declaration here with `pub mod module_name;`
// - 3. Register the routes in `server.rs` using the Router

/// Liveness endpoint
pub mod health;

/// Login, current-user and logout endpoints
pub mod auth;

/// Department management endpoints
pub mod departments;

/// HMO plan, provider and enrollment endpoints
pub mod hmo;

use crate::auth::models::{CurrentUser, ROLE_HR_MANAGER, ROLE_SYSTEM_ADMIN};
use crate::error::ApiError;
use serde_json::{Value, json};

/// Default page size for list endpoints
pub const DEFAULT_PAGE_LIMIT: i64 = 20;

/// Hard cap on page size
pub const MAX_PAGE_LIMIT: i64 = 100;

/// Normalize `page`/`limit` query values: page floors at 1, limit floors at
/// 1 and caps at [`MAX_PAGE_LIMIT`].
pub fn clamp_pagination(page: Option<i64>, limit: Option<i64>) -> (i64, i64) {
    let page = page.unwrap_or(1).max(1);
    let limit = limit.unwrap_or(DEFAULT_PAGE_LIMIT).clamp(1, MAX_PAGE_LIMIT);
    (page, limit)
}

/// Pagination block attached to list responses
pub fn pagination_meta(page: i64, limit: i64, total: i64) -> Value {
    json!({
        "page": page,
        "limit": limit,
        "total": total,
        "total_pages": (total + limit - 1) / limit,
    })
}

/// Mutations are reserved for "System Admin" and "HR Manager"; `action`
/// names the operation in the 403 message.
pub fn require_management(user: &CurrentUser, action: &str) -> Result<(), ApiError> {
    if user.has_any_role(&[ROLE_SYSTEM_ADMIN, ROLE_HR_MANAGER]) {
        Ok(())
    } else {
        Err(ApiError::forbidden(format!(
            "Insufficient permissions to {action}"
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pagination_is_clamped_to_sane_bounds() {
        assert_eq!(clamp_pagination(None, None), (1, DEFAULT_PAGE_LIMIT));
        assert_eq!(clamp_pagination(Some(3), Some(50)), (3, 50));
        assert_eq!(clamp_pagination(Some(0), Some(0)), (1, 1));
        assert_eq!(clamp_pagination(Some(-4), Some(-10)), (1, 1));
        assert_eq!(clamp_pagination(Some(2), Some(10_000)), (2, MAX_PAGE_LIMIT));

        // Page has no upper cap; the query layer saturates its OFFSET math.
        assert_eq!(clamp_pagination(Some(i64::MAX), Some(20)), (i64::MAX, 20));
    }

    #[test]
    fn pagination_meta_rounds_total_pages_up() {
        assert_eq!(pagination_meta(1, 20, 0)["total_pages"], 0);
        assert_eq!(pagination_meta(1, 20, 20)["total_pages"], 1);
        assert_eq!(pagination_meta(1, 20, 21)["total_pages"], 2);
        assert_eq!(pagination_meta(2, 20, 45)["total"], 45);
    }

    fn user_with_role(role_name: &str) -> CurrentUser {
        CurrentUser {
            user_id: 1,
            employee_id: 1,
            username: "test".to_string(),
            role_id: 1,
            role_name: role_name.to_string(),
        }
    }

    #[test]
    fn management_gate_admits_exactly_the_two_roles() {
        assert!(require_management(&user_with_role("System Admin"), "x").is_ok());
        assert!(require_management(&user_with_role("HR Manager"), "x").is_ok());

        let err = require_management(&user_with_role("Employee"), "create HMO enrollments")
            .unwrap_err();
        match err {
            ApiError::Forbidden { message } => {
                assert_eq!(message, "Insufficient permissions to create HMO enrollments");
            }
            other => panic!("expected forbidden, got {other:?}"),
        }
    }
}
