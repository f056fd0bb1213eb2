use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::model::role::Role;

/// A login account together with its employee profile.
#[derive(Debug, Clone)]
pub struct User {
    pub id: u64,
    pub employee_code: String,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
    pub department_id: Option<u64>,
    pub designation_id: Option<u64>,
    pub phone: Option<String>,
    pub joined_on: NaiveDate,
    pub is_active: bool,
    pub created_at: NaiveDateTime,
}

/// Insert/upsert payload. Upserts key on `email` and never rewrite the
/// password of an existing account.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub employee_code: String,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
    pub department_id: Option<u64>,
    pub designation_id: Option<u64>,
    pub phone: Option<String>,
    pub joined_on: NaiveDate,
}

/// Public view of a user; never carries the password hash.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
#[schema(example = json!({
    "id": 3,
    "employeeCode": "EMP-003",
    "name": "Priya Sharma",
    "email": "priya@hrm.local",
    "role": "employee",
    "departmentId": 1,
    "designationId": 2,
    "phone": null,
    "joinedOn": "2024-04-01",
    "isActive": true
}))]
pub struct Profile {
    pub id: u64,
    pub employee_code: String,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub department_id: Option<u64>,
    pub designation_id: Option<u64>,
    pub phone: Option<String>,
    #[schema(value_type = String, format = "date")]
    pub joined_on: NaiveDate,
    pub is_active: bool,
}

impl From<User> for Profile {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            employee_code: user.employee_code,
            name: user.name,
            email: user.email,
            role: user.role,
            department_id: user.department_id,
            designation_id: user.designation_id,
            phone: user.phone,
            joined_on: user.joined_on,
            is_active: user.is_active,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct UserFilter {
    pub department_id: Option<u64>,
    pub role: Option<Role>,
    /// Case-insensitive match on name, email or employee code.
    pub search: Option<String>,
}
