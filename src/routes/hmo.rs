//! HMO management routes
//!
//! Plans, providers and employee enrollments under `/api/v1/hmo`. Plan
//! mutations and enrollment creation are limited to the management roles;
//! reads only need an authenticated caller.

use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use chrono::{Local, NaiveDate};
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::{Value, json};

use crate::auth::models::CurrentUser;
use crate::database::models::{
    EnrollmentFilter, HmoEnrollment, HmoPlan, HmoPlanFilter, HmoProvider, NewEnrollment,
    NewHmoPlan,
};
use crate::error::ApiError;
use crate::routes::{clamp_pagination, require_management};
use crate::server::AppState;

#[derive(Debug, Deserialize)]
pub struct PlanListQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub provider_id: Option<i32>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct EnrollmentListQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub employee_id: Option<i32>,
    pub status: Option<String>,
}

/// Plan create/update payload; validation reports every missing required
/// field at once.
#[derive(Debug, Deserialize)]
pub struct PlanPayload {
    pub plan_name: Option<String>,
    pub description: Option<String>,
    pub provider_id: Option<i32>,
    pub monthly_premium: Option<Decimal>,
    pub coverage_limit: Option<Decimal>,
    pub is_active: Option<bool>,
}

impl PlanPayload {
    fn into_validated(self) -> Result<NewHmoPlan, ApiError> {
        let mut errors = Vec::new();

        let plan_name = self
            .plan_name
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(str::to_string);
        if plan_name.is_none() {
            errors.push("plan_name is required".to_string());
        }
        if self.provider_id.is_none() {
            errors.push("provider_id is required".to_string());
        }
        if self.monthly_premium.is_none() {
            errors.push("monthly_premium is required".to_string());
        }

        match (plan_name, self.provider_id, self.monthly_premium) {
            (Some(plan_name), Some(provider_id), Some(monthly_premium)) => Ok(NewHmoPlan {
                plan_name,
                description: self.description,
                provider_id,
                monthly_premium,
                coverage_limit: self.coverage_limit,
                is_active: self.is_active.unwrap_or(true),
            }),
            _ => Err(ApiError::validation(errors)),
        }
    }
}

/// Enrollment create payload
#[derive(Debug, Deserialize)]
pub struct EnrollmentPayload {
    pub employee_id: Option<i32>,
    pub plan_id: Option<i32>,
    pub monthly_deduction: Option<Decimal>,
    pub enrollment_date: Option<NaiveDate>,
    pub effective_date: Option<NaiveDate>,
}

impl EnrollmentPayload {
    /// New enrollments always start `"Active"`; dates default to today.
    fn into_validated(self) -> Result<NewEnrollment, ApiError> {
        let mut errors = Vec::new();

        if self.employee_id.is_none() {
            errors.push("employee_id is required".to_string());
        }
        if self.plan_id.is_none() {
            errors.push("plan_id is required".to_string());
        }
        if self.monthly_deduction.is_none() {
            errors.push("monthly_deduction is required".to_string());
        }

        match (self.employee_id, self.plan_id, self.monthly_deduction) {
            (Some(employee_id), Some(plan_id), Some(monthly_deduction)) => {
                let today = Local::now().date_naive();
                Ok(NewEnrollment {
                    employee_id,
                    plan_id,
                    status: "Active".to_string(),
                    monthly_deduction,
                    enrollment_date: self.enrollment_date.unwrap_or(today),
                    effective_date: self.effective_date.unwrap_or(today),
                })
            }
            _ => Err(ApiError::validation(errors)),
        }
    }
}

/// `GET /api/v1/hmo`
pub async fn list_plans(
    State(state): State<AppState>,
    Query(query): Query<PlanListQuery>,
) -> Result<Json<Value>, ApiError> {
    let (page, limit) = clamp_pagination(query.page, query.limit);
    let filter = HmoPlanFilter {
        provider_id: query.provider_id,
        is_active: query.is_active,
    };

    let plans = HmoPlan::fetch_page(state.db.pool(), page, limit, &filter).await?;
    Ok(Json(json!({ "data": plans })))
}

/// `GET /api/v1/hmo/{id}`
pub async fn get_plan(
    State(state): State<AppState>,
    Path(plan_id): Path<i32>,
) -> Result<Json<Value>, ApiError> {
    let plan = HmoPlan::fetch_by_id(state.db.pool(), plan_id)
        .await?
        .ok_or_else(|| ApiError::not_found("HMO plan"))?;

    Ok(Json(json!({ "data": plan })))
}

/// `POST /api/v1/hmo`
pub async fn create_plan(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Json(payload): Json<PlanPayload>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    require_management(&user, "create HMO plans")?;
    let plan = payload.into_validated()?;

    let plan_id = HmoPlan::insert(state.db.pool(), &plan).await?;
    tracing::info!(plan_id, by = user.user_id, "HMO plan created");

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "data": { "plan_id": plan_id },
            "message": "HMO plan created successfully",
        })),
    ))
}

/// `PUT /api/v1/hmo/{id}`
pub async fn update_plan(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(plan_id): Path<i32>,
    Json(payload): Json<PlanPayload>,
) -> Result<Json<Value>, ApiError> {
    require_management(&user, "update HMO plans")?;
    let plan = payload.into_validated()?;

    let pool = state.db.pool();
    if !HmoPlan::update(pool, plan_id, &plan).await? {
        return Err(ApiError::not_found("HMO plan"));
    }

    let updated = HmoPlan::fetch_by_id(pool, plan_id)
        .await?
        .ok_or_else(|| ApiError::not_found("HMO plan"))?;
    tracing::info!(plan_id, by = user.user_id, "HMO plan updated");

    Ok(Json(json!({
        "data": updated,
        "message": "HMO plan updated successfully",
    })))
}

/// `DELETE /api/v1/hmo/{id}`
pub async fn delete_plan(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(plan_id): Path<i32>,
) -> Result<Json<Value>, ApiError> {
    require_management(&user, "delete HMO plans")?;

    if !HmoPlan::soft_delete(state.db.pool(), plan_id).await? {
        return Err(ApiError::not_found("HMO plan"));
    }
    tracing::info!(plan_id, by = user.user_id, "HMO plan deactivated");

    Ok(Json(json!({
        "data": Value::Null,
        "message": "HMO plan deleted successfully",
    })))
}

/// `GET /api/v1/hmo/providers`
pub async fn list_providers(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let providers = HmoProvider::fetch_active(state.db.pool()).await?;
    Ok(Json(json!({ "data": providers })))
}

/// `GET /api/v1/hmo/enrollments`
pub async fn list_enrollments(
    State(state): State<AppState>,
    Query(query): Query<EnrollmentListQuery>,
) -> Result<Json<Value>, ApiError> {
    let (page, limit) = clamp_pagination(query.page, query.limit);
    let filter = EnrollmentFilter {
        employee_id: query.employee_id,
        status: query.status.filter(|s| !s.is_empty()),
    };

    let enrollments = HmoEnrollment::fetch_page(state.db.pool(), page, limit, &filter).await?;
    Ok(Json(json!({ "data": enrollments })))
}

/// `POST /api/v1/hmo/enrollments`
pub async fn create_enrollment(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Json(payload): Json<EnrollmentPayload>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    require_management(&user, "create HMO enrollments")?;
    let enrollment = payload.into_validated()?;

    let enrollment_id = HmoEnrollment::insert(state.db.pool(), &enrollment).await?;
    tracing::info!(
        enrollment_id,
        employee_id = enrollment.employee_id,
        by = user.user_id,
        "HMO enrollment created"
    );

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "data": {
                "enrollment_id": enrollment_id,
                "employee_id": enrollment.employee_id,
                "plan_id": enrollment.plan_id,
            },
            "message": "HMO enrollment created successfully",
        })),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plan_validation_reports_every_missing_field() {
        let payload = PlanPayload {
            plan_name: None,
            description: None,
            provider_id: None,
            monthly_premium: None,
            coverage_limit: None,
            is_active: None,
        };
        match payload.into_validated().unwrap_err() {
            ApiError::Validation { details } => {
                assert_eq!(
                    details,
                    vec![
                        "plan_name is required".to_string(),
                        "provider_id is required".to_string(),
                        "monthly_premium is required".to_string(),
                    ]
                );
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn valid_plan_defaults_to_active() {
        let payload = PlanPayload {
            plan_name: Some("Gold Family".to_string()),
            description: None,
            provider_id: Some(2),
            monthly_premium: Some(Decimal::new(250_000, 2)),
            coverage_limit: None,
            is_active: None,
        };
        let plan = payload.into_validated().expect("valid payload");
        assert_eq!(plan.plan_name, "Gold Family");
        assert_eq!(plan.provider_id, 2);
        assert!(plan.is_active);
    }

    #[test]
    fn enrollment_is_forced_active_with_todays_dates() {
        let payload = EnrollmentPayload {
            employee_id: Some(7),
            plan_id: Some(3),
            monthly_deduction: Some(Decimal::new(150_000, 2)),
            enrollment_date: None,
            effective_date: None,
        };
        let enrollment = payload.into_validated().expect("valid payload");
        let today = Local::now().date_naive();

        assert_eq!(enrollment.status, "Active");
        assert_eq!(enrollment.enrollment_date, today);
        assert_eq!(enrollment.effective_date, today);
    }

    #[test]
    fn enrollment_requires_core_fields() {
        let payload = EnrollmentPayload {
            employee_id: None,
            plan_id: Some(3),
            monthly_deduction: None,
            enrollment_date: None,
            effective_date: None,
        };
        match payload.into_validated().unwrap_err() {
            ApiError::Validation { details } => {
                assert_eq!(
                    details,
                    vec![
                        "employee_id is required".to_string(),
                        "monthly_deduction is required".to_string(),
                    ]
                );
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }
}
