use actix_web::{HttpResponse, web};

use crate::auth::auth::AuthUser;
use crate::error::AppError;
use crate::leave::LeaveService;
use crate::model::LeaveBalance;

/// Remaining and entitled leave days for one employee
#[utoipa::path(
    get,
    path = "/api/employee/{id}/balance",
    params(("id" = u64, Path, description = "Employee id")),
    responses(
        (status = 200, description = "Leave balance", body = LeaveBalance, example = json!({
            "employee_id": 1,
            "vacation_remaining": 13.0,
            "vacation_entitled": 15.0,
            "sick_remaining": 7.0,
            "sick_entitled": 10.0
        })),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Employee not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Employee"
)]
pub async fn get_balance(
    auth: AuthUser,
    path: web::Path<u64>,
    leave: web::Data<LeaveService>,
) -> Result<HttpResponse, AppError> {
    let employee_id = path.into_inner();
    auth.require_employee_access(employee_id)?;

    let balance = leave.balance(employee_id).await?;
    Ok(HttpResponse::Ok().json(balance))
}
