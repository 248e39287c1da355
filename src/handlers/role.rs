use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use tracing::instrument;

use crate::dtos::role::{RoleRequest, RoleResponse};
use crate::error::{map_unique_violation, AppError};
use crate::middleware::auth::AuthContext;
use crate::models::role::Role;
use crate::state::AppState;

fn validate_title(req: &RoleRequest) -> Result<&str, AppError> {
    let title = req.title.trim();
    if title.is_empty() {
        return Err(AppError::validation("Role title is required"));
    }
    Ok(title)
}

#[instrument(skip(db_pool))]
pub async fn list_roles(
    State(AppState { db_pool, .. }): State<AppState>,
) -> Result<Json<Vec<RoleResponse>>, AppError> {
    let roles = sqlx::query_as::<_, Role>("SELECT id, title, created_at FROM roles ORDER BY title")
        .fetch_all(&db_pool)
        .await?;

    Ok(Json(roles.into_iter().map(RoleResponse::from).collect()))
}

#[instrument(skip(db_pool))]
pub async fn get_role(
    State(AppState { db_pool, .. }): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<RoleResponse>, AppError> {
    let role = sqlx::query_as::<_, Role>("SELECT id, title, created_at FROM roles WHERE id = $1")
        .bind(id)
        .fetch_optional(&db_pool)
        .await?
        .ok_or_else(|| AppError::not_found("Role not found"))?;

    Ok(Json(RoleResponse::from(role)))
}

#[instrument(skip(db_pool, auth, req))]
pub async fn create_role(
    State(AppState { db_pool, .. }): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(req): Json<RoleRequest>,
) -> Result<(StatusCode, Json<RoleResponse>), AppError> {
    auth.require_admin()?;
    let title = validate_title(&req)?;

    let role = sqlx::query_as::<_, Role>(
        "INSERT INTO roles (title) VALUES ($1) RETURNING id, title, created_at",
    )
    .bind(title)
    .fetch_one(&db_pool)
    .await
    .map_err(|e| map_unique_violation(e, "Role title already exists"))?;

    Ok((StatusCode::CREATED, Json(RoleResponse::from(role))))
}

#[instrument(skip(db_pool, auth, req))]
pub async fn update_role(
    State(AppState { db_pool, .. }): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<i64>,
    Json(req): Json<RoleRequest>,
) -> Result<Json<RoleResponse>, AppError> {
    auth.require_admin()?;
    let title = validate_title(&req)?;

    let role = sqlx::query_as::<_, Role>(
        "UPDATE roles SET title = $1 WHERE id = $2 RETURNING id, title, created_at",
    )
    .bind(title)
    .bind(id)
    .fetch_optional(&db_pool)
    .await
    .map_err(|e| map_unique_violation(e, "Role title already exists"))?
    .ok_or_else(|| AppError::not_found("Role not found"))?;

    Ok(Json(RoleResponse::from(role)))
}

#[instrument(skip(db_pool, auth))]
pub async fn delete_role(
    State(AppState { db_pool, .. }): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    auth.require_admin()?;

    let result = sqlx::query("DELETE FROM roles WHERE id = $1")
        .bind(id)
        .execute(&db_pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::not_found("Role not found"));
    }

    Ok(StatusCode::NO_CONTENT)
}
