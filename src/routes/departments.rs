//! Department management routes
//!
//! CRUD over `/api/v1/departments`: paginated listing with search,
//! single-department detail with manager name and headcount, the
//! department's employee roster, and create/update/soft-delete guarded by
//! the management roles.

use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::{Value, json};

use crate::auth::models::CurrentUser;
use crate::database::models::{Department, DepartmentEmployee, DepartmentFilter, NewDepartment};
use crate::error::ApiError;
use crate::routes::{clamp_pagination, pagination_meta, require_management};
use crate::server::AppState;

#[derive(Debug, Deserialize)]
pub struct DepartmentListQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub is_active: Option<bool>,
    pub search: Option<String>,
}

/// Create/update payload. Every field is optional on the wire; validation
/// decides what is actually required so the client gets field-level errors
/// instead of a deserialization failure.
#[derive(Debug, Deserialize)]
pub struct DepartmentPayload {
    pub department_name: Option<String>,
    pub description: Option<String>,
    pub manager_id: Option<i32>,
    pub budget: Option<Decimal>,
    pub location: Option<String>,
    pub is_active: Option<bool>,
}

impl DepartmentPayload {
    fn into_validated(self) -> Result<NewDepartment, ApiError> {
        let department_name = self
            .department_name
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(str::to_string)
            .ok_or_else(|| {
                ApiError::validation(vec!["department_name is required".to_string()])
            })?;

        Ok(NewDepartment {
            department_name,
            description: self.description,
            manager_id: self.manager_id,
            budget: self.budget,
            location: self.location,
            is_active: self.is_active.unwrap_or(true),
        })
    }
}

/// `GET /api/v1/departments`
pub async fn list(
    State(state): State<AppState>,
    Query(query): Query<DepartmentListQuery>,
) -> Result<Json<Value>, ApiError> {
    let (page, limit) = clamp_pagination(query.page, query.limit);
    let filter = DepartmentFilter {
        is_active: query.is_active,
        search: query.search.filter(|s| !s.is_empty()),
    };

    let pool = state.db.pool();
    let departments = Department::fetch_page(pool, page, limit, &filter).await?;
    let total = Department::count(pool, &filter).await?;

    Ok(Json(json!({
        "data": departments,
        "pagination": pagination_meta(page, limit, total),
    })))
}

/// `GET /api/v1/departments/{id}`
pub async fn get_one(
    State(state): State<AppState>,
    Path(department_id): Path<i32>,
) -> Result<Json<Value>, ApiError> {
    let department = Department::fetch_by_id(state.db.pool(), department_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Department"))?;

    Ok(Json(json!({ "data": department })))
}

/// `GET /api/v1/departments/{id}/employees`
///
/// An unknown department id yields an empty roster rather than a 404.
pub async fn employees(
    State(state): State<AppState>,
    Path(department_id): Path<i32>,
) -> Result<Json<Value>, ApiError> {
    let employees = DepartmentEmployee::fetch_by_department(state.db.pool(), department_id).await?;

    Ok(Json(json!({ "data": employees })))
}

/// `POST /api/v1/departments`
pub async fn create(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Json(payload): Json<DepartmentPayload>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    require_management(&user, "create departments")?;
    let dept = payload.into_validated()?;

    let pool = state.db.pool();
    if Department::name_exists(pool, &dept.department_name, None).await? {
        return Err(ApiError::conflict("Department name already exists"));
    }

    let department_id = Department::insert(pool, &dept).await?;
    tracing::info!(department_id, by = user.user_id, "department created");

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "data": { "department_id": department_id },
            "message": "Department created successfully",
        })),
    ))
}

/// `PUT /api/v1/departments/{id}`
///
/// Full update: optional fields left out of the payload overwrite their
/// columns with NULL.
pub async fn update(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(department_id): Path<i32>,
    Json(payload): Json<DepartmentPayload>,
) -> Result<Json<Value>, ApiError> {
    require_management(&user, "update departments")?;
    let dept = payload.into_validated()?;

    let pool = state.db.pool();
    if Department::name_exists(pool, &dept.department_name, Some(department_id)).await? {
        return Err(ApiError::conflict("Department name already exists"));
    }

    if !Department::update(pool, department_id, &dept).await? {
        return Err(ApiError::not_found("Department"));
    }

    let department = Department::fetch_by_id(pool, department_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Department"))?;
    tracing::info!(department_id, by = user.user_id, "department updated");

    Ok(Json(json!({
        "data": department,
        "message": "Department updated successfully",
    })))
}

/// `DELETE /api/v1/departments/{id}`
///
/// Soft delete; the row survives with `is_active` off.
pub async fn delete(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(department_id): Path<i32>,
) -> Result<Json<Value>, ApiError> {
    require_management(&user, "delete departments")?;

    if !Department::soft_delete(state.db.pool(), department_id).await? {
        return Err(ApiError::not_found("Department"));
    }
    tracing::info!(department_id, by = user.user_id, "department deactivated");

    Ok(Json(json!({
        "data": Value::Null,
        "message": "Department deleted successfully",
    })))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn empty_payload() -> DepartmentPayload {
        DepartmentPayload {
            department_name: None,
            description: None,
            manager_id: None,
            budget: None,
            location: None,
            is_active: None,
        }
    }

    #[test]
    fn department_name_is_required() {
        let err = empty_payload().into_validated().unwrap_err();
        match err {
            ApiError::Validation { details } => {
                assert_eq!(details, vec!["department_name is required".to_string()]);
            }
            other => panic!("expected validation error, got {other:?}"),
        }

        let blank = DepartmentPayload {
            department_name: Some("   ".to_string()),
            ..empty_payload()
        };
        assert!(matches!(
            blank.into_validated(),
            Err(ApiError::Validation { .. })
        ));
    }

    #[test]
    fn new_departments_default_to_active() {
        let payload = DepartmentPayload {
            department_name: Some("Engineering".to_string()),
            ..empty_payload()
        };
        let dept = payload.into_validated().expect("valid payload");
        assert_eq!(dept.department_name, "Engineering");
        assert!(dept.is_active);
        assert!(dept.description.is_none());
    }
}
