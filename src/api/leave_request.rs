use actix_web::{HttpResponse, web};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::auth::auth::AuthUser;
use crate::error::AppError;
use crate::leave::{AutoApprovePolicy, LeaveService, SubmitLeave};
use crate::model::{LeaveRequest, LeaveStatus, LeaveType};
use crate::settings::SettingsReader;
use crate::store::LeaveQuery;

#[derive(Deserialize, ToSchema)]
pub struct CreateLeave {
    #[schema(example = "sick")]
    pub leave_type: LeaveType,
    #[schema(example = "2026-01-05", format = "date", value_type = String)]
    pub start_date: NaiveDate,
    #[schema(example = "2026-01-07", format = "date", value_type = String)]
    pub end_date: NaiveDate,
    #[serde(default)]
    #[schema(example = "Flu")]
    pub reason: String,
    /// Managers and admins may file on behalf of another employee
    pub employee_id: Option<u64>,
}

#[derive(Deserialize, Default, ToSchema)]
pub struct ReviewLeave {
    #[schema(example = "Enjoy the time off")]
    pub note: Option<String>,
}

#[derive(Deserialize, IntoParams, ToSchema)]
pub struct LeaveFilter {
    #[schema(example = 123)]
    /// Filter by employee ID
    pub employee_id: Option<u64>,
    /// Filter by leave status
    pub status: Option<LeaveStatus>,
    #[schema(example = 1)]
    /// Pagination page number (start with 1)
    pub page: Option<u64>,
    #[schema(example = 10)]
    /// Pagination per page number
    pub per_page: Option<u64>,
}

#[derive(Serialize, ToSchema)]
pub struct LeaveListResponse {
    pub data: Vec<LeaveRequest>,
    #[schema(example = 1)]
    pub page: u64,
    #[schema(example = 10)]
    pub per_page: u64,
    #[schema(example = 1)]
    pub total: i64,
}

/// Submit a leave request
///
/// Sick and personal leave inside the company thresholds is approved immediately.
#[utoipa::path(
    post,
    path = "/api/leave",
    request_body(content = CreateLeave, description = "Leave request payload", content_type = "application/json"),
    responses(
        (status = 201, description = "Leave request created", body = LeaveRequest),
        (status = 400, description = "End date before start date", body = Object, example = json!({
            "message": "end date before start date"
        })),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "No employee profile"),
        (status = 404, description = "Employee not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Leave"
)]
pub async fn create_leave(
    auth: AuthUser,
    payload: web::Json<CreateLeave>,
    leave: web::Data<LeaveService>,
    settings: web::Data<SettingsReader>,
) -> Result<HttpResponse, AppError> {
    let payload = payload.into_inner();

    let employee_id = match (payload.employee_id, auth.employee_id) {
        (Some(target), own) if own != Some(target) => {
            auth.require_reviewer()?;
            target
        }
        (_, Some(own)) => own,
        (_, None) => return Err(AppError::Forbidden("No employee profile".to_string())),
    };

    let policy = AutoApprovePolicy::from_settings(&settings.current().await?);
    let created = leave
        .submit(
            SubmitLeave {
                employee_id,
                leave_type: payload.leave_type,
                start_date: payload.start_date,
                end_date: payload.end_date,
                reason: payload.reason,
            },
            &policy,
        )
        .await?;

    Ok(HttpResponse::Created().json(created))
}

/// for getting leave applications endpoint
#[utoipa::path(
    get,
    path = "/api/leave",
    params(LeaveFilter),
    responses(
        (status = 200, description = "Paginated leave list", body = LeaveListResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Leave"
)]
pub async fn leave_list(
    auth: AuthUser,
    query: web::Query<LeaveFilter>,
    leave: web::Data<LeaveService>,
) -> Result<HttpResponse, AppError> {
    let per_page = query.per_page.unwrap_or(10).clamp(1, 100);
    let page = query.page.unwrap_or(1).max(1);

    // staff only ever list their own requests
    let employee_id = if auth.role.can_review_leave() {
        query.employee_id
    } else {
        let own = auth
            .employee_id
            .ok_or_else(|| AppError::Forbidden("No employee profile".to_string()))?;
        auth.require_employee_access(query.employee_id.unwrap_or(own))?;
        Some(own)
    };

    let (data, total) = leave
        .list(&LeaveQuery {
            employee_id,
            status: query.status,
            limit: per_page,
            offset: (page - 1).saturating_mul(per_page),
        })
        .await?;

    Ok(HttpResponse::Ok().json(LeaveListResponse {
        data,
        page,
        per_page,
        total,
    }))
}

/// for getting a leave application details endpoint
#[utoipa::path(
    get,
    path = "/api/leave/{leave_id}",
    params(("leave_id" = u64, Path, description = "ID of the leave request to fetch")),
    responses(
        (status = 200, description = "Leave request found", body = LeaveRequest),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Leave request not found", body = Object, example = json!({
            "message": "leave request 7 not found"
        }))
    ),
    security(("bearer_auth" = [])),
    tag = "Leave"
)]
pub async fn get_leave(
    auth: AuthUser,
    path: web::Path<u64>,
    leave: web::Data<LeaveService>,
) -> Result<HttpResponse, AppError> {
    let request = leave.get(path.into_inner()).await?;
    auth.require_employee_access(request.employee_id)?;

    Ok(HttpResponse::Ok().json(request))
}

/// Approve a pending request (Manager/Admin)
#[utoipa::path(
    put,
    path = "/api/leave/{leave_id}/approve",
    params(("leave_id" = u64, Path, description = "ID of the leave request to approve")),
    request_body(content = ReviewLeave, description = "Optional review note", content_type = "application/json"),
    responses(
        (status = 200, description = "Leave approved", body = LeaveRequest),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Leave request not found"),
        (status = 409, description = "Leave request already processed", body = Object, example = json!({
            "message": "leave request 7 is approved; only pending requests can be approved"
        }))
    ),
    security(("bearer_auth" = [])),
    tag = "Leave"
)]
pub async fn approve_leave(
    auth: AuthUser,
    path: web::Path<u64>,
    body: Option<web::Json<ReviewLeave>>,
    leave: web::Data<LeaveService>,
) -> Result<HttpResponse, AppError> {
    auth.require_reviewer()?;

    let note = body.and_then(|b| b.into_inner().note);
    let approved = leave.approve(path.into_inner(), auth.user_id, note).await?;

    Ok(HttpResponse::Ok().json(approved))
}

/// Deny a pending request (Manager/Admin)
#[utoipa::path(
    put,
    path = "/api/leave/{leave_id}/deny",
    params(("leave_id" = u64, Path, description = "ID of the leave request to deny")),
    request_body(content = ReviewLeave, description = "Optional review note", content_type = "application/json"),
    responses(
        (status = 200, description = "Leave denied", body = LeaveRequest),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Leave request not found"),
        (status = 409, description = "Leave request already processed")
    ),
    security(("bearer_auth" = [])),
    tag = "Leave"
)]
pub async fn deny_leave(
    auth: AuthUser,
    path: web::Path<u64>,
    body: Option<web::Json<ReviewLeave>>,
    leave: web::Data<LeaveService>,
) -> Result<HttpResponse, AppError> {
    auth.require_reviewer()?;

    let note = body.and_then(|b| b.into_inner().note);
    let denied = leave.deny(path.into_inner(), auth.user_id, note).await?;

    Ok(HttpResponse::Ok().json(denied))
}

/// Cancel a pending or approved request (owner, Manager or Admin)
#[utoipa::path(
    put,
    path = "/api/leave/{leave_id}/cancel",
    params(("leave_id" = u64, Path, description = "ID of the leave request to cancel")),
    responses(
        (status = 200, description = "Leave cancelled", body = LeaveRequest),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Leave request not found"),
        (status = 409, description = "Leave request already closed")
    ),
    security(("bearer_auth" = [])),
    tag = "Leave"
)]
pub async fn cancel_leave(
    auth: AuthUser,
    path: web::Path<u64>,
    leave: web::Data<LeaveService>,
) -> Result<HttpResponse, AppError> {
    let request_id = path.into_inner();
    let request = leave.get(request_id).await?;
    auth.require_employee_access(request.employee_id)?;

    let cancelled = leave.cancel(request_id).await?;

    Ok(HttpResponse::Ok().json(cancelled))
}
