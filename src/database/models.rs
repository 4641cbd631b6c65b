// Database Models
//
// Tokio-postgres compatible models for the HR administration entities:
// departments, employees, HMO plans/providers/enrollments, and the user
// accounts behind authentication. Query helpers live next to the structs
// they return and borrow a client from the shared pool per call.

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, Utc};
use deadpool_postgres::Pool;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tokio_postgres::Row;
use tokio_postgres::types::ToSql;

/// Trait for converting from tokio-postgres Row
pub trait FromRow {
    fn from_row(row: &Row) -> Result<Self, tokio_postgres::Error>
    where
        Self: Sized;
}

/// OFFSET for a 1-based page. Saturates so absurd page numbers land past
/// the end of the data and come back as an empty page instead of
/// overflowing the multiply.
fn page_offset(page: i64, limit: i64) -> i64 {
    page.saturating_sub(1).saturating_mul(limit)
}

// ============================================================================
// DEPARTMENT MODELS
// ============================================================================

/// Department row enriched with the manager's display name and the
/// active-employee headcount.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Department {
    pub department_id: i32,
    pub department_name: String,
    pub description: Option<String>,
    pub manager_id: Option<i32>,
    pub budget: Option<Decimal>,
    pub location: Option<String>,
    pub is_active: bool,
    pub created_date: Option<DateTime<Utc>>,
    pub manager_name: Option<String>,
    pub employee_count: i64,
}

impl FromRow for Department {
    fn from_row(row: &Row) -> Result<Self, tokio_postgres::Error> {
        Ok(Self {
            department_id: row.try_get("department_id")?,
            department_name: row.try_get("department_name")?,
            description: row.try_get("description")?,
            manager_id: row.try_get("manager_id")?,
            budget: row.try_get("budget")?,
            location: row.try_get("location")?,
            is_active: row.try_get("is_active")?,
            created_date: row.try_get("created_date")?,
            manager_name: row.try_get("manager_name")?,
            employee_count: row.try_get("employee_count")?,
        })
    }
}

/// List filters for departments
#[derive(Debug, Clone, Default)]
pub struct DepartmentFilter {
    pub is_active: Option<bool>,
    pub search: Option<String>,
}

/// Validated department payload for inserts and full updates
#[derive(Debug, Clone)]
pub struct NewDepartment {
    pub department_name: String,
    pub description: Option<String>,
    pub manager_id: Option<i32>,
    pub budget: Option<Decimal>,
    pub location: Option<String>,
    pub is_active: bool,
}

const DEPARTMENT_SELECT: &str = "SELECT
        d.department_id, d.department_name, d.description, d.manager_id,
        d.budget, d.location, d.is_active, d.created_date,
        m.first_name || ' ' || m.last_name AS manager_name,
        (SELECT COUNT(*) FROM employees e
          WHERE e.department_id = d.department_id AND e.is_active) AS employee_count
    FROM organizational_structure d
    LEFT JOIN employees m ON d.manager_id = m.employee_id";

impl Department {
    /// Fetch one page of departments, name-ordered
    pub async fn fetch_page(
        pool: &Pool,
        page: i64,
        limit: i64,
        filter: &DepartmentFilter,
    ) -> Result<Vec<Department>> {
        let client = pool.get().await.context("Failed to get DB connection")?;
        let offset = page_offset(page, limit);
        let search_pattern = filter.search.as_ref().map(|s| format!("%{}%", s));

        let mut sql = format!("{} WHERE 1=1", DEPARTMENT_SELECT);
        let mut params: Vec<&(dyn ToSql + Sync)> = Vec::new();

        if let Some(active) = &filter.is_active {
            params.push(active);
            sql.push_str(&format!(" AND d.is_active = ${}", params.len()));
        }
        if let Some(pattern) = &search_pattern {
            params.push(pattern);
            sql.push_str(&format!(
                " AND (d.department_name ILIKE ${n} OR d.description ILIKE ${n})",
                n = params.len()
            ));
        }

        params.push(&limit);
        sql.push_str(&format!(" ORDER BY d.department_name LIMIT ${}", params.len()));
        params.push(&offset);
        sql.push_str(&format!(" OFFSET ${}", params.len()));

        let rows = client
            .query(sql.as_str(), &params)
            .await
            .context("Failed to query departments")?;
        rows.iter()
            .map(|r| Department::from_row(r).context("Failed to map department row"))
            .collect()
    }

    /// Count departments matching the same filters as `fetch_page`
    pub async fn count(pool: &Pool, filter: &DepartmentFilter) -> Result<i64> {
        let client = pool.get().await.context("Failed to get DB connection")?;
        let search_pattern = filter.search.as_ref().map(|s| format!("%{}%", s));

        let mut sql =
            String::from("SELECT COUNT(*) FROM organizational_structure d WHERE 1=1");
        let mut params: Vec<&(dyn ToSql + Sync)> = Vec::new();

        if let Some(active) = &filter.is_active {
            params.push(active);
            sql.push_str(&format!(" AND d.is_active = ${}", params.len()));
        }
        if let Some(pattern) = &search_pattern {
            params.push(pattern);
            sql.push_str(&format!(
                " AND (d.department_name ILIKE ${n} OR d.description ILIKE ${n})",
                n = params.len()
            ));
        }

        let row = client
            .query_one(sql.as_str(), &params)
            .await
            .context("Failed to count departments")?;
        Ok(row.try_get(0)?)
    }

    /// Fetch a single department by id
    pub async fn fetch_by_id(pool: &Pool, department_id: i32) -> Result<Option<Department>> {
        let client = pool.get().await.context("Failed to get DB connection")?;
        let sql = format!("{} WHERE d.department_id = $1", DEPARTMENT_SELECT);
        let row = client
            .query_opt(sql.as_str(), &[&department_id])
            .await
            .context("Failed to query department by id")?;
        row.map(|r| Department::from_row(&r).context("Failed to map department row"))
            .transpose()
    }

    /// Insert a department and return its new id
    pub async fn insert(pool: &Pool, dept: &NewDepartment) -> Result<i32> {
        let client = pool.get().await.context("Failed to get DB connection")?;
        let row = client
            .query_one(
                "INSERT INTO organizational_structure
                    (department_name, description, manager_id, budget, location, is_active)
                 VALUES ($1, $2, $3, $4, $5, $6)
                 RETURNING department_id",
                &[
                    &dept.department_name,
                    &dept.description,
                    &dept.manager_id,
                    &dept.budget,
                    &dept.location,
                    &dept.is_active,
                ],
            )
            .await
            .context("Failed to insert department")?;
        Ok(row.try_get(0)?)
    }

    /// Full update; absent optional fields overwrite with NULL
    pub async fn update(pool: &Pool, department_id: i32, dept: &NewDepartment) -> Result<bool> {
        let client = pool.get().await.context("Failed to get DB connection")?;
        let n = client
            .execute(
                "UPDATE organizational_structure SET
                    department_name = $1,
                    description = $2,
                    manager_id = $3,
                    budget = $4,
                    location = $5,
                    is_active = $6
                 WHERE department_id = $7",
                &[
                    &dept.department_name,
                    &dept.description,
                    &dept.manager_id,
                    &dept.budget,
                    &dept.location,
                    &dept.is_active,
                    &department_id,
                ],
            )
            .await
            .context("Failed to update department")?;
        Ok(n > 0)
    }

    /// Soft delete: flips `is_active` off, the row stays
    pub async fn soft_delete(pool: &Pool, department_id: i32) -> Result<bool> {
        let client = pool.get().await.context("Failed to get DB connection")?;
        let n = client
            .execute(
                "UPDATE organizational_structure SET is_active = FALSE
                 WHERE department_id = $1",
                &[&department_id],
            )
            .await
            .context("Failed to delete department")?;
        Ok(n > 0)
    }

    /// Check if a department name is taken, optionally ignoring one row
    /// (the row being updated)
    pub async fn name_exists(
        pool: &Pool,
        department_name: &str,
        exclude_department_id: Option<i32>,
    ) -> Result<bool> {
        let client = pool.get().await.context("Failed to get DB connection")?;
        let row = match exclude_department_id {
            Some(exclude) => {
                client
                    .query_opt(
                        "SELECT department_id FROM organizational_structure
                         WHERE department_name = $1 AND department_id <> $2
                         LIMIT 1",
                        &[&department_name, &exclude],
                    )
                    .await
            }
            None => {
                client
                    .query_opt(
                        "SELECT department_id FROM organizational_structure
                         WHERE department_name = $1
                         LIMIT 1",
                        &[&department_name],
                    )
                    .await
            }
        }
        .context("Failed to check department name")?;
        Ok(row.is_some())
    }
}

// ============================================================================
// EMPLOYEE MODELS
// ============================================================================

/// Employee listing row with the linked account's username and role
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DepartmentEmployee {
    pub employee_id: i32,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub job_title: Option<String>,
    pub hire_date: Option<NaiveDate>,
    pub is_active: bool,
    pub username: Option<String>,
    pub role_name: Option<String>,
}

impl FromRow for DepartmentEmployee {
    fn from_row(row: &Row) -> Result<Self, tokio_postgres::Error> {
        Ok(Self {
            employee_id: row.try_get("employee_id")?,
            first_name: row.try_get("first_name")?,
            last_name: row.try_get("last_name")?,
            email: row.try_get("email")?,
            job_title: row.try_get("job_title")?,
            hire_date: row.try_get("hire_date")?,
            is_active: row.try_get("is_active")?,
            username: row.try_get("username")?,
            role_name: row.try_get("role_name")?,
        })
    }
}

impl DepartmentEmployee {
    /// Employees of one department, last/first name order
    pub async fn fetch_by_department(
        pool: &Pool,
        department_id: i32,
    ) -> Result<Vec<DepartmentEmployee>> {
        let client = pool.get().await.context("Failed to get DB connection")?;
        let rows = client
            .query(
                "SELECT
                    e.employee_id, e.first_name, e.last_name, e.email, e.job_title,
                    e.hire_date, e.is_active,
                    u.username, r.role_name
                 FROM employees e
                 LEFT JOIN users u ON e.employee_id = u.employee_id
                 LEFT JOIN roles r ON u.role_id = r.role_id
                 WHERE e.department_id = $1
                 ORDER BY e.last_name, e.first_name",
                &[&department_id],
            )
            .await
            .context("Failed to query department employees")?;
        rows.iter()
            .map(|r| DepartmentEmployee::from_row(r).context("Failed to map employee row"))
            .collect()
    }
}

// ============================================================================
// HMO MODELS
// ============================================================================

/// HMO plan row joined to its provider
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HmoPlan {
    pub plan_id: i32,
    pub plan_name: String,
    pub description: Option<String>,
    pub provider_id: i32,
    pub monthly_premium: Decimal,
    pub coverage_limit: Option<Decimal>,
    pub is_active: bool,
    pub created_date: Option<DateTime<Utc>>,
    pub provider_name: String,
    pub provider_contact: Option<String>,
}

impl FromRow for HmoPlan {
    fn from_row(row: &Row) -> Result<Self, tokio_postgres::Error> {
        Ok(Self {
            plan_id: row.try_get("plan_id")?,
            plan_name: row.try_get("plan_name")?,
            description: row.try_get("description")?,
            provider_id: row.try_get("provider_id")?,
            monthly_premium: row.try_get("monthly_premium")?,
            coverage_limit: row.try_get("coverage_limit")?,
            is_active: row.try_get("is_active")?,
            created_date: row.try_get("created_date")?,
            provider_name: row.try_get("provider_name")?,
            provider_contact: row.try_get("provider_contact")?,
        })
    }
}

/// List filters for HMO plans
#[derive(Debug, Clone, Default)]
pub struct HmoPlanFilter {
    pub provider_id: Option<i32>,
    pub is_active: Option<bool>,
}

/// Validated plan payload for inserts and full updates
#[derive(Debug, Clone)]
pub struct NewHmoPlan {
    pub plan_name: String,
    pub description: Option<String>,
    pub provider_id: i32,
    pub monthly_premium: Decimal,
    pub coverage_limit: Option<Decimal>,
    pub is_active: bool,
}

const HMO_PLAN_SELECT: &str = "SELECT
        hp.plan_id, hp.plan_name, hp.description, hp.provider_id,
        hp.monthly_premium, hp.coverage_limit, hp.is_active, hp.created_date,
        hpr.provider_name, hpr.provider_contact
    FROM hmo_plans hp
    JOIN hmo_providers hpr ON hp.provider_id = hpr.provider_id";

impl HmoPlan {
    /// Fetch one page of plans, name-ordered
    pub async fn fetch_page(
        pool: &Pool,
        page: i64,
        limit: i64,
        filter: &HmoPlanFilter,
    ) -> Result<Vec<HmoPlan>> {
        let client = pool.get().await.context("Failed to get DB connection")?;
        let offset = page_offset(page, limit);

        let mut sql = format!("{} WHERE 1=1", HMO_PLAN_SELECT);
        let mut params: Vec<&(dyn ToSql + Sync)> = Vec::new();

        if let Some(provider_id) = &filter.provider_id {
            params.push(provider_id);
            sql.push_str(&format!(" AND hp.provider_id = ${}", params.len()));
        }
        if let Some(active) = &filter.is_active {
            params.push(active);
            sql.push_str(&format!(" AND hp.is_active = ${}", params.len()));
        }

        params.push(&limit);
        sql.push_str(&format!(" ORDER BY hp.plan_name LIMIT ${}", params.len()));
        params.push(&offset);
        sql.push_str(&format!(" OFFSET ${}", params.len()));

        let rows = client
            .query(sql.as_str(), &params)
            .await
            .context("Failed to query HMO plans")?;
        rows.iter()
            .map(|r| HmoPlan::from_row(r).context("Failed to map HMO plan row"))
            .collect()
    }

    /// Fetch a single plan by id
    pub async fn fetch_by_id(pool: &Pool, plan_id: i32) -> Result<Option<HmoPlan>> {
        let client = pool.get().await.context("Failed to get DB connection")?;
        let sql = format!("{} WHERE hp.plan_id = $1", HMO_PLAN_SELECT);
        let row = client
            .query_opt(sql.as_str(), &[&plan_id])
            .await
            .context("Failed to query HMO plan by id")?;
        row.map(|r| HmoPlan::from_row(&r).context("Failed to map HMO plan row"))
            .transpose()
    }

    /// Insert a plan and return its new id
    pub async fn insert(pool: &Pool, plan: &NewHmoPlan) -> Result<i32> {
        let client = pool.get().await.context("Failed to get DB connection")?;
        let row = client
            .query_one(
                "INSERT INTO hmo_plans
                    (plan_name, description, provider_id, monthly_premium, coverage_limit, is_active)
                 VALUES ($1, $2, $3, $4, $5, $6)
                 RETURNING plan_id",
                &[
                    &plan.plan_name,
                    &plan.description,
                    &plan.provider_id,
                    &plan.monthly_premium,
                    &plan.coverage_limit,
                    &plan.is_active,
                ],
            )
            .await
            .context("Failed to insert HMO plan")?;
        Ok(row.try_get(0)?)
    }

    /// Full update; absent optional fields overwrite with NULL
    pub async fn update(pool: &Pool, plan_id: i32, plan: &NewHmoPlan) -> Result<bool> {
        let client = pool.get().await.context("Failed to get DB connection")?;
        let n = client
            .execute(
                "UPDATE hmo_plans SET
                    plan_name = $1,
                    description = $2,
                    provider_id = $3,
                    monthly_premium = $4,
                    coverage_limit = $5,
                    is_active = $6
                 WHERE plan_id = $7",
                &[
                    &plan.plan_name,
                    &plan.description,
                    &plan.provider_id,
                    &plan.monthly_premium,
                    &plan.coverage_limit,
                    &plan.is_active,
                    &plan_id,
                ],
            )
            .await
            .context("Failed to update HMO plan")?;
        Ok(n > 0)
    }

    /// Soft delete: flips `is_active` off, the row stays
    pub async fn soft_delete(pool: &Pool, plan_id: i32) -> Result<bool> {
        let client = pool.get().await.context("Failed to get DB connection")?;
        let n = client
            .execute(
                "UPDATE hmo_plans SET is_active = FALSE WHERE plan_id = $1",
                &[&plan_id],
            )
            .await
            .context("Failed to delete HMO plan")?;
        Ok(n > 0)
    }
}

/// HMO provider row
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HmoProvider {
    pub provider_id: i32,
    pub provider_name: String,
    pub provider_contact: Option<String>,
    pub address: Option<String>,
    pub is_active: bool,
}

impl FromRow for HmoProvider {
    fn from_row(row: &Row) -> Result<Self, tokio_postgres::Error> {
        Ok(Self {
            provider_id: row.try_get("provider_id")?,
            provider_name: row.try_get("provider_name")?,
            provider_contact: row.try_get("provider_contact")?,
            address: row.try_get("address")?,
            is_active: row.try_get("is_active")?,
        })
    }
}

impl HmoProvider {
    /// Active providers, name-ordered
    pub async fn fetch_active(pool: &Pool) -> Result<Vec<HmoProvider>> {
        let client = pool.get().await.context("Failed to get DB connection")?;
        let rows = client
            .query(
                "SELECT provider_id, provider_name, provider_contact, address, is_active
                 FROM hmo_providers
                 WHERE is_active
                 ORDER BY provider_name",
                &[],
            )
            .await
            .context("Failed to query HMO providers")?;
        rows.iter()
            .map(|r| HmoProvider::from_row(r).context("Failed to map HMO provider row"))
            .collect()
    }
}

/// Enrollment row joined to employee, plan and provider
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HmoEnrollment {
    pub enrollment_id: i32,
    pub employee_id: i32,
    pub plan_id: i32,
    pub status: String,
    pub monthly_deduction: Decimal,
    pub enrollment_date: NaiveDate,
    pub effective_date: Option<NaiveDate>,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub plan_name: String,
    pub provider_name: String,
}

impl FromRow for HmoEnrollment {
    fn from_row(row: &Row) -> Result<Self, tokio_postgres::Error> {
        Ok(Self {
            enrollment_id: row.try_get("enrollment_id")?,
            employee_id: row.try_get("employee_id")?,
            plan_id: row.try_get("plan_id")?,
            status: row.try_get("status")?,
            monthly_deduction: row.try_get("monthly_deduction")?,
            enrollment_date: row.try_get("enrollment_date")?,
            effective_date: row.try_get("effective_date")?,
            first_name: row.try_get("first_name")?,
            last_name: row.try_get("last_name")?,
            email: row.try_get("email")?,
            plan_name: row.try_get("plan_name")?,
            provider_name: row.try_get("provider_name")?,
        })
    }
}

/// List filters for enrollments
#[derive(Debug, Clone, Default)]
pub struct EnrollmentFilter {
    pub employee_id: Option<i32>,
    pub status: Option<String>,
}

/// Validated enrollment payload for inserts
#[derive(Debug, Clone)]
pub struct NewEnrollment {
    pub employee_id: i32,
    pub plan_id: i32,
    pub status: String,
    pub monthly_deduction: Decimal,
    pub enrollment_date: NaiveDate,
    pub effective_date: NaiveDate,
}

impl HmoEnrollment {
    /// Fetch one page of enrollments, newest first
    pub async fn fetch_page(
        pool: &Pool,
        page: i64,
        limit: i64,
        filter: &EnrollmentFilter,
    ) -> Result<Vec<HmoEnrollment>> {
        let client = pool.get().await.context("Failed to get DB connection")?;
        let offset = page_offset(page, limit);

        let mut sql = String::from(
            "SELECT
                eh.enrollment_id, eh.employee_id, eh.plan_id, eh.status,
                eh.monthly_deduction, eh.enrollment_date, eh.effective_date,
                e.first_name, e.last_name, e.email,
                hp.plan_name, hpr.provider_name
             FROM employee_hmo_enrollments eh
             JOIN employees e ON eh.employee_id = e.employee_id
             JOIN hmo_plans hp ON eh.plan_id = hp.plan_id
             JOIN hmo_providers hpr ON hp.provider_id = hpr.provider_id
             WHERE 1=1",
        );
        let mut params: Vec<&(dyn ToSql + Sync)> = Vec::new();

        if let Some(employee_id) = &filter.employee_id {
            params.push(employee_id);
            sql.push_str(&format!(" AND eh.employee_id = ${}", params.len()));
        }
        if let Some(status) = &filter.status {
            params.push(status);
            sql.push_str(&format!(" AND eh.status = ${}", params.len()));
        }

        params.push(&limit);
        sql.push_str(&format!(
            " ORDER BY eh.enrollment_date DESC LIMIT ${}",
            params.len()
        ));
        params.push(&offset);
        sql.push_str(&format!(" OFFSET ${}", params.len()));

        let rows = client
            .query(sql.as_str(), &params)
            .await
            .context("Failed to query HMO enrollments")?;
        rows.iter()
            .map(|r| HmoEnrollment::from_row(r).context("Failed to map enrollment row"))
            .collect()
    }

    /// Insert an enrollment and return its new id
    pub async fn insert(pool: &Pool, enrollment: &NewEnrollment) -> Result<i32> {
        let client = pool.get().await.context("Failed to get DB connection")?;
        let row = client
            .query_one(
                "INSERT INTO employee_hmo_enrollments
                    (employee_id, plan_id, status, monthly_deduction, enrollment_date, effective_date)
                 VALUES ($1, $2, $3, $4, $5, $6)
                 RETURNING enrollment_id",
                &[
                    &enrollment.employee_id,
                    &enrollment.plan_id,
                    &enrollment.status,
                    &enrollment.monthly_deduction,
                    &enrollment.enrollment_date,
                    &enrollment.effective_date,
                ],
            )
            .await
            .context("Failed to insert HMO enrollment")?;
        Ok(row.try_get(0)?)
    }
}

// ============================================================================
// USER & AUTH MODELS
// ============================================================================

/// Account row used at login; carries the password hash, so it never
/// leaves the database layer.
#[derive(Debug, Clone)]
pub struct UserAccount {
    pub user_id: i32,
    pub employee_id: i32,
    pub username: String,
    pub password_hash: String,
    pub role_id: i32,
    pub role_name: String,
}

impl FromRow for UserAccount {
    fn from_row(row: &Row) -> Result<Self, tokio_postgres::Error> {
        Ok(Self {
            user_id: row.try_get("user_id")?,
            employee_id: row.try_get("employee_id")?,
            username: row.try_get("username")?,
            password_hash: row.try_get("password_hash")?,
            role_id: row.try_get("role_id")?,
            role_name: row.try_get("role_name")?,
        })
    }
}

impl UserAccount {
    /// Look up an active account by username, role attached
    pub async fn fetch_active_by_username(
        pool: &Pool,
        username: &str,
    ) -> Result<Option<UserAccount>> {
        let client = pool.get().await.context("Failed to get DB connection")?;
        let row = client
            .query_opt(
                "SELECT u.user_id, u.employee_id, u.username, u.password_hash,
                        u.role_id, r.role_name
                 FROM users u
                 JOIN roles r ON u.role_id = r.role_id
                 WHERE u.username = $1 AND u.is_active",
                &[&username],
            )
            .await
            .context("Failed to query user account")?;
        row.map(|r| UserAccount::from_row(&r).context("Failed to map user account row"))
            .transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_offset_saturates_at_the_i64_boundary() {
        assert_eq!(page_offset(1, 20), 0);
        assert_eq!(page_offset(2, 20), 20);
        assert_eq!(page_offset(3, 50), 100);

        // A page number at the integer ceiling must still produce a valid,
        // non-negative OFFSET; the query then just returns an empty page.
        assert_eq!(page_offset(i64::MAX, 20), i64::MAX);
        assert_eq!(page_offset(i64::MAX, 100), i64::MAX);
        assert!(page_offset(i64::MAX - 1, 100) >= 0);
    }
}
