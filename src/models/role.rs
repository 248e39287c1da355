use chrono::{DateTime, Utc};
use sqlx::FromRow;

#[derive(Debug, FromRow)]
pub struct Role {
    pub id: i64,
    pub title: String,
    pub created_at: DateTime<Utc>,
}
