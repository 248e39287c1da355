use sqlx::PgPool;
use tracing::info;

use super::{normalize_email, password::{hash_password, validate_password}};
use crate::config::AdminBootstrap;
use crate::error::AppError;

/// Creates the configured admin account unless a login with that email already exists.
pub async fn ensure_admin(pool: &PgPool, admin: &AdminBootstrap) -> Result<(), AppError> {
    let email = normalize_email(&admin.email)?;
    validate_password(&admin.password)?;

    let exists: Option<i64> = sqlx::query_scalar("SELECT employee_id FROM login_info WHERE email = $1")
        .bind(&email)
        .fetch_optional(pool)
        .await?;

    if exists.is_some() {
        return Ok(());
    }

    let password_hash = hash_password(&admin.password)?;

    let mut tx = pool.begin().await?;
    let employee_id: i64 = sqlx::query_scalar(
        "INSERT INTO employees (name, is_admin) VALUES ($1, TRUE) RETURNING id",
    )
    .bind(admin.name.trim())
    .fetch_one(&mut *tx)
    .await?;

    sqlx::query("INSERT INTO login_info (employee_id, email, password_hash) VALUES ($1, $2, $3)")
        .bind(employee_id)
        .bind(&email)
        .bind(&password_hash)
        .execute(&mut *tx)
        .await?;
    tx.commit().await?;

    info!(employee_id, %email, "Created bootstrap admin account");
    Ok(())
}
