use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use sqlx::PgPool;
use tracing::{info, instrument};

use crate::auth::{normalize_email, password::{hash_password, validate_password}};
use crate::dtos::employee::{CreateEmployeeRequest, EmployeeResponse, UpdateEmployeeRequest};
use crate::error::{map_foreign_key_violation, map_unique_violation, AppError};
use crate::middleware::auth::AuthContext;
use crate::models::employee::Employee;
use crate::state::AppState;

pub(crate) const EMPLOYEE_SELECT: &str = "
    SELECT e.id, e.name, e.role_id, r.title AS role_title, e.is_admin, l.email, e.created_at
    FROM employees e
    LEFT JOIN roles r ON r.id = e.role_id
    LEFT JOIN login_info l ON l.employee_id = e.id";

pub(crate) async fn fetch_employee(db_pool: &PgPool, id: i64) -> Result<Employee, AppError> {
    sqlx::query_as::<_, Employee>(&format!("{EMPLOYEE_SELECT} WHERE e.id = $1"))
        .bind(id)
        .fetch_optional(db_pool)
        .await?
        .ok_or_else(|| AppError::not_found("Employee not found"))
}

// GET /employees - Admins first, then by name
#[instrument(skip(db_pool))]
pub async fn list_employees(
    State(AppState { db_pool, .. }): State<AppState>,
) -> Result<Json<Vec<EmployeeResponse>>, AppError> {
    let employees = sqlx::query_as::<_, Employee>(&format!(
        "{EMPLOYEE_SELECT} ORDER BY e.is_admin DESC, e.name ASC"
    ))
    .fetch_all(&db_pool)
    .await?;

    Ok(Json(employees.into_iter().map(EmployeeResponse::from).collect()))
}

// GET /employees/{id}
#[instrument(skip(db_pool))]
pub async fn get_employee(
    State(AppState { db_pool, .. }): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<EmployeeResponse>, AppError> {
    fetch_employee(&db_pool, id).await.map(EmployeeResponse::from).map(Json)
}

// POST /employees - Admin only
#[instrument(skip(db_pool, auth, req))]
pub async fn create_employee(
    State(AppState { db_pool, .. }): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(req): Json<CreateEmployeeRequest>,
) -> Result<(StatusCode, Json<EmployeeResponse>), AppError> {
    auth.require_admin()?;

    let name = req.name.trim();
    if name.is_empty() {
        return Err(AppError::validation("Employee name is required"));
    }

    let credentials = match (req.email.as_deref(), req.password.as_deref()) {
        (Some(email), Some(password)) => {
            let email = normalize_email(email)?;
            validate_password(password)?;
            Some((email, hash_password(password)?))
        }
        (None, None) => None,
        _ => return Err(AppError::validation("Email and password must be provided together")),
    };

    let mut tx = db_pool.begin().await?;

    let employee_id: i64 = sqlx::query_scalar(
        "INSERT INTO employees (name, role_id, is_admin) VALUES ($1, $2, $3) RETURNING id",
    )
    .bind(name)
    .bind(req.role_id)
    .bind(req.is_admin.unwrap_or(false))
    .fetch_one(&mut *tx)
    .await
    .map_err(|e| map_foreign_key_violation(e, "Role not found"))?;

    if let Some((email, password_hash)) = credentials {
        sqlx::query("INSERT INTO login_info (employee_id, email, password_hash) VALUES ($1, $2, $3)")
            .bind(employee_id)
            .bind(&email)
            .bind(&password_hash)
            .execute(&mut *tx)
            .await
            .map_err(|e| map_unique_violation(e, "Email already in use"))?;
    }

    tx.commit().await?;

    info!(employee_id, created_by = auth.employee_id, "Employee created");
    let employee = fetch_employee(&db_pool, employee_id).await?;
    Ok((StatusCode::CREATED, Json(EmployeeResponse::from(employee))))
}

// PUT /employees/{id} - Admin only
#[instrument(skip(db_pool, auth, req))]
pub async fn update_employee(
    State(AppState { db_pool, .. }): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<i64>,
    Json(req): Json<UpdateEmployeeRequest>,
) -> Result<Json<EmployeeResponse>, AppError> {
    auth.require_admin()?;

    if req.name.as_deref().is_some_and(|n| n.trim().is_empty()) {
        return Err(AppError::validation("Employee name cannot be empty"));
    }
    if id == auth.employee_id && req.is_admin == Some(false) {
        return Err(AppError::validation("Admins cannot revoke their own admin rights"));
    }

    let updated: Option<i64> = sqlx::query_scalar(
        "UPDATE employees SET
         name = COALESCE($1, name),
         role_id = COALESCE($2, role_id),
         is_admin = COALESCE($3, is_admin)
         WHERE id = $4
         RETURNING id",
    )
    .bind(req.name.as_deref().map(str::trim))
    .bind(req.role_id)
    .bind(req.is_admin)
    .bind(id)
    .fetch_optional(&db_pool)
    .await
    .map_err(|e| map_foreign_key_violation(e, "Role not found"))?;

    updated.ok_or_else(|| AppError::not_found("Employee not found"))?;

    let employee = fetch_employee(&db_pool, id).await?;
    Ok(Json(EmployeeResponse::from(employee)))
}

// DELETE /employees/{id} - Admin only
#[instrument(skip(db_pool, auth))]
pub async fn delete_employee(
    State(AppState { db_pool, .. }): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    auth.require_admin()?;

    if id == auth.employee_id {
        return Err(AppError::validation("Admins cannot delete their own account"));
    }

    let result = sqlx::query("DELETE FROM employees WHERE id = $1")
        .bind(id)
        .execute(&db_pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::not_found("Employee not found"));
    }

    info!(employee_id = id, deleted_by = auth.employee_id, "Employee deleted");
    Ok(StatusCode::NO_CONTENT)
}
