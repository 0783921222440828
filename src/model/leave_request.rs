use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumIter, EnumString};
use utoipa::ToSchema;

/// Kinds of leave an employee can request.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    ToSchema,
    Display,
    EnumString,
    AsRefStr,
    EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum LeaveType {
    Vacation,
    Sick,
    Personal,
    Bereavement,
    Parental,
    Unpaid,
}

impl LeaveType {
    /// Static table of the leave types that may skip human review.
    pub fn is_auto_approvable(self) -> bool {
        matches!(self, LeaveType::Sick | LeaveType::Personal)
    }

    /// The tracked balance this leave type draws from, if any.
    pub fn balance_kind(self) -> Option<BalanceKind> {
        match self {
            LeaveType::Vacation => Some(BalanceKind::Vacation),
            LeaveType::Sick => Some(BalanceKind::Sick),
            LeaveType::Personal
            | LeaveType::Bereavement
            | LeaveType::Parental
            | LeaveType::Unpaid => None,
        }
    }
}

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    ToSchema,
    Display,
    EnumString,
    AsRefStr,
    EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum LeaveStatus {
    Pending,
    Approved,
    Denied,
    Cancelled,
    AutoApproved,
}

impl LeaveStatus {
    pub const CANCELLABLE: &'static [LeaveStatus] = &[
        LeaveStatus::Pending,
        LeaveStatus::Approved,
        LeaveStatus::AutoApproved,
    ];

    pub const REVIEWABLE: &'static [LeaveStatus] = &[LeaveStatus::Pending];
}

/// Employee counters that approved leave is deducted from.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema, Display, EnumString, AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum BalanceKind {
    Vacation,
    Sick,
}

impl BalanceKind {
    pub fn remaining_column(self) -> &'static str {
        match self {
            BalanceKind::Vacation => "vacation_days_remaining",
            BalanceKind::Sick => "sick_days_remaining",
        }
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema, Display, EnumString, AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum EntryKind {
    Deduction,
    Restoration,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct LeaveRequest {
    #[schema(example = 1)]
    pub id: u64,
    #[schema(example = 1000)]
    pub employee_id: u64,
    pub leave_type: LeaveType,
    #[schema(example = "2026-01-05", format = "date", value_type = String)]
    pub start_date: NaiveDate,
    #[schema(example = "2026-01-07", format = "date", value_type = String)]
    pub end_date: NaiveDate,
    pub reason: String,
    pub status: LeaveStatus,
    pub is_auto_approved: bool,
    /// profile id of the reviewer
    pub reviewed_by: Option<u64>,
    #[schema(format = "date-time", value_type = Option<String>)]
    pub reviewed_at: Option<DateTime<Utc>>,
    pub review_note: Option<String>,
    #[schema(format = "date-time", value_type = String)]
    pub created_at: DateTime<Utc>,
}

/// One row of the balance ledger. At most one entry of each kind exists per request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct BalanceEntry {
    pub leave_request_id: u64,
    pub employee_id: u64,
    pub balance_kind: BalanceKind,
    pub entry_kind: EntryKind,
    pub days: f64,
    #[schema(format = "date-time", value_type = String)]
    pub created_at: DateTime<Utc>,
}
