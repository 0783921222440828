use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use tracing::info;

use super::calendar::business_days;
use super::policy::{AutoApprovePolicy, Decision};
use crate::error::AppError;
use crate::model::{LeaveBalance, LeaveRequest, LeaveStatus, LeaveType};
use crate::store::{BalanceEffect, LeaveQuery, NewLeaveRequest, Review, Store, Transition};

#[derive(Debug, Clone, PartialEq)]
pub struct SubmitLeave {
    pub employee_id: u64,
    pub leave_type: LeaveType,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub reason: String,
}

/// Leave request lifecycle: submit, approve, deny, cancel.
///
/// Every operation is one store call, so the status change and its balance effect land
/// together or not at all.
#[derive(Clone)]
pub struct LeaveService {
    store: Arc<dyn Store>,
    restore_on_cancel: bool,
}

fn deduction(leave_type: LeaveType, days: u32) -> BalanceEffect {
    match leave_type.balance_kind() {
        Some(kind) => BalanceEffect::Deduct {
            kind,
            days: f64::from(days),
        },
        None => BalanceEffect::None,
    }
}

impl LeaveService {
    pub fn new(store: Arc<dyn Store>, restore_on_cancel: bool) -> Self {
        Self {
            store,
            restore_on_cancel,
        }
    }

    pub async fn submit(
        &self,
        request: SubmitLeave,
        policy: &AutoApprovePolicy,
    ) -> Result<LeaveRequest, AppError> {
        if request.end_date < request.start_date {
            return Err(AppError::Validation("end date before start date".to_string()));
        }

        if self.store.find_employee(request.employee_id).await?.is_none() {
            return Err(AppError::NotFound(format!(
                "employee {} not found",
                request.employee_id
            )));
        }

        let days = business_days(request.start_date, request.end_date);
        let decision = policy.decide(request.leave_type, days);

        let (status, reviewed_at, effect) = match decision {
            Decision::AutoApprove => (
                LeaveStatus::AutoApproved,
                Some(Utc::now()),
                deduction(request.leave_type, days),
            ),
            Decision::NeedsReview => (LeaveStatus::Pending, None, BalanceEffect::None),
        };

        let created = self
            .store
            .create_leave_request(
                NewLeaveRequest {
                    employee_id: request.employee_id,
                    leave_type: request.leave_type,
                    start_date: request.start_date,
                    end_date: request.end_date,
                    reason: request.reason.trim().to_string(),
                    status,
                    is_auto_approved: decision == Decision::AutoApprove,
                    reviewed_at,
                },
                effect,
            )
            .await?;

        info!(
            leave_request_id = created.id,
            employee_id = created.employee_id,
            leave_type = %created.leave_type,
            business_days = days,
            status = %created.status,
            "Leave request submitted"
        );
        Ok(created)
    }

    pub async fn get(&self, request_id: u64) -> Result<LeaveRequest, AppError> {
        self.store
            .find_leave_request(request_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("leave request {request_id} not found")))
    }

    pub async fn list(&self, query: &LeaveQuery) -> Result<(Vec<LeaveRequest>, i64), AppError> {
        Ok(self.store.list_leave_requests(query).await?)
    }

    pub async fn balance(&self, employee_id: u64) -> Result<LeaveBalance, AppError> {
        let employee = self
            .store
            .find_employee(employee_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("employee {employee_id} not found")))?;
        Ok(LeaveBalance::from(&employee))
    }

    /// Deducts the business days of the stored range from the matching balance.
    pub async fn approve(
        &self,
        request_id: u64,
        reviewer_id: u64,
        note: Option<String>,
    ) -> Result<LeaveRequest, AppError> {
        let current = self.reviewable(request_id, "approved").await?;
        let days = business_days(current.start_date, current.end_date);

        let approved = self
            .store
            .transition_leave_request(Transition {
                request_id,
                from: LeaveStatus::REVIEWABLE,
                to: LeaveStatus::Approved,
                review: Some(review(reviewer_id, note)),
                effect: deduction(current.leave_type, days),
            })
            .await?;

        info!(leave_request_id = request_id, reviewer_id, business_days = days, "Leave request approved");
        Ok(approved)
    }

    pub async fn deny(
        &self,
        request_id: u64,
        reviewer_id: u64,
        note: Option<String>,
    ) -> Result<LeaveRequest, AppError> {
        self.reviewable(request_id, "denied").await?;

        let denied = self
            .store
            .transition_leave_request(Transition {
                request_id,
                from: LeaveStatus::REVIEWABLE,
                to: LeaveStatus::Denied,
                review: Some(review(reviewer_id, note)),
                effect: BalanceEffect::None,
            })
            .await?;

        info!(leave_request_id = request_id, reviewer_id, "Leave request denied");
        Ok(denied)
    }

    pub async fn cancel(&self, request_id: u64) -> Result<LeaveRequest, AppError> {
        let effect = if self.restore_on_cancel {
            BalanceEffect::RestoreDeduction
        } else {
            BalanceEffect::None
        };

        let cancelled = self
            .store
            .transition_leave_request(Transition {
                request_id,
                from: LeaveStatus::CANCELLABLE,
                to: LeaveStatus::Cancelled,
                review: None,
                effect,
            })
            .await?;

        info!(
            leave_request_id = request_id,
            restored = self.restore_on_cancel,
            "Leave request cancelled"
        );
        Ok(cancelled)
    }

    async fn reviewable(&self, request_id: u64, outcome: &str) -> Result<LeaveRequest, AppError> {
        let current = self.get(request_id).await?;
        if current.status != LeaveStatus::Pending {
            return Err(AppError::Conflict(format!(
                "leave request {request_id} is {}; only pending requests can be {outcome}",
                current.status
            )));
        }
        Ok(current)
    }
}

fn review(reviewer_id: u64, note: Option<String>) -> Review {
    Review {
        reviewer_id,
        reviewed_at: Utc::now(),
        note: note.map(|n| n.trim().to_string()).filter(|n| !n.is_empty()),
    }
}
