//! Persistence seam shared by the leave engine and the configuration import.
//!
//! Every method is a complete unit of work: implementations commit all of its writes or
//! none of them.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};

use crate::import::resolve::CodeIndex;
use crate::model::reference::{ReferenceBatch, ReferenceTable};
use crate::model::{
    AutoApprovalUpdate, BalanceEntry, BalanceKind, CompanyProfile, CompanySettings, Employee,
    LeaveRequest, LeaveStatus, LeaveType, Profile,
};

pub mod memory;
pub mod mysql;

pub use memory::MemoryStore;
pub use mysql::MySqlStore;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("{0} not found")]
    NotFound(String),

    /// The row was not in the state the caller expected, or the write would repeat a
    /// ledger entry that already exists.
    #[error("conflict: {0}")]
    Conflict(String),

    #[error("invalid stored value: {0}")]
    Corrupt(String),

    #[error("store unavailable: {0}")]
    Unavailable(String),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewLeaveRequest {
    pub employee_id: u64,
    pub leave_type: LeaveType,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub reason: String,
    pub status: LeaveStatus,
    pub is_auto_approved: bool,
    pub reviewed_at: Option<DateTime<Utc>>,
}

/// What a write does to the employee's leave balance, applied in the same transaction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BalanceEffect {
    None,
    /// Record a deduction ledger entry and subtract `days`.
    Deduct { kind: BalanceKind, days: f64 },
    /// Reverse the request's deduction entry, if it has one.
    RestoreDeduction,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Review {
    pub reviewer_id: u64,
    pub reviewed_at: DateTime<Utc>,
    pub note: Option<String>,
}

/// A guarded status change: it only applies while the stored status is one of `from`.
#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    pub request_id: u64,
    pub from: &'static [LeaveStatus],
    pub to: LeaveStatus,
    pub review: Option<Review>,
    pub effect: BalanceEffect,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct LeaveQuery {
    pub employee_id: Option<u64>,
    pub status: Option<LeaveStatus>,
    pub limit: u64,
    pub offset: u64,
}

#[async_trait]
pub trait Store: Send + Sync {
    async fn find_profile(&self, user_id: u64) -> Result<Option<Profile>, StoreError>;

    async fn find_profile_by_email(&self, email: &str) -> Result<Option<Profile>, StoreError>;

    async fn find_employee(&self, employee_id: u64) -> Result<Option<Employee>, StoreError>;

    async fn company_settings(&self) -> Result<CompanySettings, StoreError>;

    async fn update_auto_approval(
        &self,
        update: &AutoApprovalUpdate,
    ) -> Result<CompanySettings, StoreError>;

    async fn update_company_profile(&self, profile: &CompanyProfile) -> Result<(), StoreError>;

    async fn find_leave_request(&self, request_id: u64)
    -> Result<Option<LeaveRequest>, StoreError>;

    /// Matching requests, newest first, plus the total match count.
    async fn list_leave_requests(
        &self,
        query: &LeaveQuery,
    ) -> Result<(Vec<LeaveRequest>, i64), StoreError>;

    async fn create_leave_request(
        &self,
        request: NewLeaveRequest,
        effect: BalanceEffect,
    ) -> Result<LeaveRequest, StoreError>;

    /// Fails with [`StoreError::Conflict`] when the stored status is not in `from`.
    async fn transition_leave_request(
        &self,
        transition: Transition,
    ) -> Result<LeaveRequest, StoreError>;

    async fn balance_entries(&self, request_id: u64) -> Result<Vec<BalanceEntry>, StoreError>;

    /// All `{code -> id}` pairs of a reference table.
    async fn code_index(&self, table: ReferenceTable) -> Result<CodeIndex, StoreError>;

    /// Writes one import section; returns the number of rows written.
    async fn write_batch(&self, batch: ReferenceBatch) -> Result<u64, StoreError>;
}
