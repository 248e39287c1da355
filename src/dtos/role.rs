use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::role::Role;

#[derive(Deserialize)]
pub struct RoleRequest {
    pub title: String,
}

#[derive(Serialize)]
pub struct RoleResponse {
    pub id: i64,
    pub title: String,
    pub created_at: DateTime<Utc>,
}

impl From<Role> for RoleResponse {
    fn from(role: Role) -> Self {
        Self {
            id: role.id,
            title: role.title,
            created_at: role.created_at,
        }
    }
}
