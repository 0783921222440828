use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};
use utoipa::ToSchema;

#[derive(
    Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize, ToSchema, Display, EnumString, AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum UserRole {
    Admin,
    Manager,
    Employee,
}

impl UserRole {
    pub fn can_review_leave(self) -> bool {
        matches!(self, UserRole::Admin | UserRole::Manager)
    }
}

/// A login identity. Linked to an employee record when the user is staff.
#[derive(Debug, Clone, PartialEq)]
pub struct Profile {
    pub id: u64,
    pub email: String,
    pub password_hash: String,
    pub role: UserRole,
    pub employee_id: Option<u64>,
    pub is_active: bool,
}
