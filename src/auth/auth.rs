use actix_web::{FromRequest, HttpMessage, HttpRequest, dev::Payload};
use futures::future::{Ready, ready};

use crate::error::AppError;
use crate::model::UserRole;

/// The authenticated caller, placed in request extensions by the auth middleware.
#[derive(Debug, Clone, PartialEq)]
pub struct AuthUser {
    pub user_id: u64,
    pub email: String,
    pub role: UserRole,

    /// Present only if this user is linked to an employee record
    pub employee_id: Option<u64>,
}

impl FromRequest for AuthUser {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        ready(
            req.extensions()
                .get::<AuthUser>()
                .cloned()
                .ok_or_else(|| AppError::Unauthorized("Unauthorized".to_string())),
        )
    }
}

impl AuthUser {
    pub fn require_admin(&self) -> Result<(), AppError> {
        if self.role == UserRole::Admin {
            Ok(())
        } else {
            Err(AppError::Forbidden("Admin access required".to_string()))
        }
    }

    pub fn require_reviewer(&self) -> Result<(), AppError> {
        if self.role.can_review_leave() {
            Ok(())
        } else {
            Err(AppError::Forbidden("Manager/Admin only".to_string()))
        }
    }

    /// Staff see their own records; managers and admins see everyone's.
    pub fn can_access_employee(&self, employee_id: u64) -> bool {
        self.role.can_review_leave() || self.employee_id == Some(employee_id)
    }

    pub fn require_employee_access(&self, employee_id: u64) -> Result<(), AppError> {
        if self.can_access_employee(employee_id) {
            Ok(())
        } else {
            Err(AppError::Forbidden(
                "Not allowed to access another employee's records".to_string(),
            ))
        }
    }
}
