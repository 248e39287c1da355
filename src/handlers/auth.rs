use axum::{extract::State, http::StatusCode, Extension, Json};
use tracing::{info, instrument, warn};

use crate::auth::jwt::{role_for, sign_token};
use crate::auth::normalize_email;
use crate::auth::password::{hash_password, validate_password, verify_password};
use crate::dtos::auth::{LoginRequest, LoginResponse, RegisterRequest, UpdateProfileRequest};
use crate::dtos::employee::EmployeeResponse;
use crate::error::{map_foreign_key_violation, map_unique_violation, AppError};
use crate::handlers::employee::fetch_employee;
use crate::middleware::auth::AuthContext;
use crate::models::employee::Credentials;
use crate::state::AppState;

fn issue_token(state: &AppState, employee_id: i64, is_admin: bool, email: &str) -> Result<(String, i64), AppError> {
    let hours = state.config.jwt_expiry_hours;
    let token = sign_token(employee_id, role_for(is_admin), email, &state.config.jwt_secret, hours)?;
    Ok((token, hours * 60 * 60))
}

// POST /auth/register - Self sign-up; never grants admin
#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<LoginResponse>), AppError> {
    let name = payload.name.trim();
    if name.is_empty() {
        return Err(AppError::validation("Name is required"));
    }
    let email = normalize_email(&payload.email)?;
    validate_password(&payload.password)?;

    let password_hash = hash_password(&payload.password)?;

    let mut tx = state.db_pool.begin().await?;

    let employee_id: i64 = sqlx::query_scalar(
        "INSERT INTO employees (name, role_id, is_admin) VALUES ($1, $2, FALSE) RETURNING id",
    )
    .bind(name)
    .bind(payload.role_id)
    .fetch_one(&mut *tx)
    .await
    .map_err(|e| map_foreign_key_violation(e, "Role not found"))?;

    sqlx::query("INSERT INTO login_info (employee_id, email, password_hash) VALUES ($1, $2, $3)")
        .bind(employee_id)
        .bind(&email)
        .bind(&password_hash)
        .execute(&mut *tx)
        .await
        .map_err(|e| map_unique_violation(e, "User already exists"))?;

    tx.commit().await?;
    info!(employee_id, "Employee registered");

    let (access_token, expires_in_seconds) = issue_token(&state, employee_id, false, &email)?;
    let user = fetch_employee(&state.db_pool, employee_id).await?;

    Ok((
        StatusCode::CREATED,
        Json(LoginResponse {
            access_token,
            token_type: "Bearer",
            expires_in_seconds,
            user: EmployeeResponse::from(user),
        }),
    ))
}

// POST /auth/login
#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, AppError> {
    if payload.email.trim().is_empty() {
        return Err(AppError::validation("Email required"));
    }
    if payload.password.is_empty() {
        return Err(AppError::validation("Password required"));
    }
    let email = payload.email.trim().to_lowercase();

    let creds = sqlx::query_as::<_, Credentials>(
        "SELECT l.employee_id, l.email, l.password_hash, e.is_admin
         FROM login_info l
         JOIN employees e ON e.id = l.employee_id
         WHERE l.email = $1",
    )
    .bind(&email)
    .fetch_optional(&state.db_pool)
    .await?
    .ok_or_else(|| AppError::unauthorized("Invalid credentials"))?;

    if !verify_password(&payload.password, &creds.password_hash)? {
        warn!(employee_id = creds.employee_id, "Failed login attempt");
        return Err(AppError::unauthorized("Invalid credentials"));
    }

    let (access_token, expires_in_seconds) =
        issue_token(&state, creds.employee_id, creds.is_admin, &creds.email)?;
    let user = fetch_employee(&state.db_pool, creds.employee_id).await?;

    Ok(Json(LoginResponse {
        access_token,
        token_type: "Bearer",
        expires_in_seconds,
        user: EmployeeResponse::from(user),
    }))
}

// GET /auth/me
#[instrument(skip(state, auth))]
pub async fn me(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> Result<Json<EmployeeResponse>, AppError> {
    let employee = fetch_employee(&state.db_pool, auth.employee_id).await?;
    Ok(Json(EmployeeResponse::from(employee)))
}

// PUT /auth/profile - Change own name, email or password
#[instrument(skip(state, auth, payload))]
pub async fn update_profile(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(payload): Json<UpdateProfileRequest>,
) -> Result<Json<EmployeeResponse>, AppError> {
    let name = payload.name.as_deref().map(str::trim);
    if name.is_some_and(str::is_empty) {
        return Err(AppError::validation("Name cannot be empty"));
    }
    let email = payload.email.as_deref().map(normalize_email).transpose()?;

    let new_hash = match (payload.current_password.as_deref(), payload.new_password.as_deref()) {
        (Some(current), Some(new)) => {
            validate_password(new)?;
            Some((current, hash_password(new)?))
        }
        (None, None) => None,
        _ => {
            return Err(AppError::validation(
                "Both current_password and new_password are required to change password",
            ))
        }
    };

    let mut tx = state.db_pool.begin().await?;

    if let Some(name) = name {
        sqlx::query("UPDATE employees SET name = $1 WHERE id = $2")
            .bind(name)
            .bind(auth.employee_id)
            .execute(&mut *tx)
            .await?;
    }

    if let Some(email) = &email {
        let taken: Option<i64> = sqlx::query_scalar(
            "SELECT employee_id FROM login_info WHERE email = $1 AND employee_id <> $2",
        )
        .bind(email)
        .bind(auth.employee_id)
        .fetch_optional(&mut *tx)
        .await?;
        if taken.is_some() {
            return Err(AppError::conflict("Email already in use"));
        }

        let result = sqlx::query("UPDATE login_info SET email = $1 WHERE employee_id = $2")
            .bind(email)
            .bind(auth.employee_id)
            .execute(&mut *tx)
            .await
            .map_err(|e| map_unique_violation(e, "Email already in use"))?;
        if result.rows_affected() == 0 {
            return Err(AppError::not_found("User not found"));
        }
    }

    if let Some((current, new_hash)) = new_hash {
        let stored: String = sqlx::query_scalar("SELECT password_hash FROM login_info WHERE employee_id = $1")
            .bind(auth.employee_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| AppError::not_found("User not found"))?;

        if !verify_password(current, &stored)? {
            return Err(AppError::unauthorized("Current password is incorrect"));
        }

        sqlx::query("UPDATE login_info SET password_hash = $1 WHERE employee_id = $2")
            .bind(&new_hash)
            .bind(auth.employee_id)
            .execute(&mut *tx)
            .await?;
    }

    tx.commit().await?;
    info!(employee_id = auth.employee_id, email = %auth.email, "Profile updated");

    let employee = fetch_employee(&state.db_pool, auth.employee_id).await?;
    Ok(Json(EmployeeResponse::from(employee)))
}
