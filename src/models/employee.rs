use chrono::{DateTime, Utc};
use sqlx::FromRow;

#[derive(Debug, FromRow)]
pub struct Employee {
    pub id: i64,
    pub name: String,
    pub role_id: Option<i64>,
    pub role_title: Option<String>,
    pub is_admin: bool,
    pub email: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Row used to check a login attempt.
#[derive(Debug, FromRow)]
pub struct Credentials {
    pub employee_id: i64,
    pub email: String,
    pub password_hash: String,
    pub is_admin: bool,
}
