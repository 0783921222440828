use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::leave_request::BalanceKind;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
#[schema(
    example = json!({
        "id": 1,
        "first_name": "John",
        "last_name": "Doe",
        "email": "john.doe@company.com",
        "vacation_days_remaining": 15.0,
        "vacation_days_entitled": 15.0,
        "sick_days_remaining": 10.0,
        "sick_days_entitled": 10.0
    })
)]
pub struct Employee {
    #[schema(example = 1)]
    pub id: u64,

    #[schema(example = "John")]
    pub first_name: String,

    #[schema(example = "Doe")]
    pub last_name: String,

    #[schema(example = "john.doe@company.com")]
    pub email: String,

    pub vacation_days_remaining: f64,
    pub vacation_days_entitled: f64,
    pub sick_days_remaining: f64,
    pub sick_days_entitled: f64,
}

impl Employee {
    pub fn remaining(&self, kind: BalanceKind) -> f64 {
        match kind {
            BalanceKind::Vacation => self.vacation_days_remaining,
            BalanceKind::Sick => self.sick_days_remaining,
        }
    }

    /// Adds `delta` (negative to deduct) to the remaining counter. No floor is applied.
    pub fn adjust(&mut self, kind: BalanceKind, delta: f64) {
        match kind {
            BalanceKind::Vacation => self.vacation_days_remaining += delta,
            BalanceKind::Sick => self.sick_days_remaining += delta,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct LeaveBalance {
    pub employee_id: u64,
    pub vacation_remaining: f64,
    pub vacation_entitled: f64,
    pub sick_remaining: f64,
    pub sick_entitled: f64,
}

impl From<&Employee> for LeaveBalance {
    fn from(employee: &Employee) -> Self {
        Self {
            employee_id: employee.id,
            vacation_remaining: employee.vacation_days_remaining,
            vacation_entitled: employee.vacation_days_entitled,
            sick_remaining: employee.sick_days_remaining,
            sick_entitled: employee.sick_days_entitled,
        }
    }
}
