use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::employee::Employee;

#[derive(Deserialize)]
pub struct CreateEmployeeRequest {
    pub name: String,
    pub role_id: Option<i64>,
    pub is_admin: Option<bool>,
    /// Login credentials; both or neither.
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Deserialize)]
pub struct UpdateEmployeeRequest {
    pub name: Option<String>,
    pub role_id: Option<i64>,
    pub is_admin: Option<bool>,
}

#[derive(Serialize)]
pub struct EmployeeResponse {
    pub id: i64,
    pub name: String,
    pub role_id: Option<i64>,
    pub role_title: Option<String>,
    pub is_admin: bool,
    pub email: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<Employee> for EmployeeResponse {
    fn from(e: Employee) -> Self {
        Self {
            id: e.id,
            name: e.name,
            role_id: e.role_id,
            role_title: e.role_title,
            is_admin: e.is_admin,
            email: e.email,
            created_at: e.created_at,
        }
    }
}
