pub mod company;
pub mod employee;
pub mod leave_request;
pub mod profile;
pub mod reference;

pub use company::{AutoApprovalUpdate, CompanyProfile, CompanySettings};
pub use employee::{Employee, LeaveBalance};
pub use leave_request::{BalanceEntry, BalanceKind, EntryKind, LeaveRequest, LeaveStatus, LeaveType};
pub use profile::{Profile, UserRole};
