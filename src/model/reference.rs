//! Storage-side rows of the company reference-data graph.
//!
//! Every table carries a business code that acts as its natural key. Foreign keys hold
//! internal ids that the import pipeline resolves from codes before writing.

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use strum_macros::{AsRefStr, Display, EnumIter};

use crate::utils::db_utils::SqlValue;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, AsRefStr, EnumIter)]
#[strum(serialize_all = "snake_case")]
pub enum ReferenceTable {
    Sites,
    Departments,
    JobRoles,
    SystemRoles,
    RolePermissions,
    PtoTypes,
    PtoPolicies,
    PtoApprovalRules,
    Holidays,
    CalendarEvents,
    TrainingCourses,
    TrainingRequirements,
    Integrations,
}

impl ReferenceTable {
    pub fn table_name(self) -> &'static str {
        match self {
            ReferenceTable::Sites => "sites",
            ReferenceTable::Departments => "departments",
            ReferenceTable::JobRoles => "job_roles",
            ReferenceTable::SystemRoles => "system_roles",
            ReferenceTable::RolePermissions => "role_permissions",
            ReferenceTable::PtoTypes => "pto_types",
            ReferenceTable::PtoPolicies => "pto_policies",
            ReferenceTable::PtoApprovalRules => "pto_approval_rules",
            ReferenceTable::Holidays => "holidays",
            ReferenceTable::CalendarEvents => "calendar_events",
            ReferenceTable::TrainingCourses => "training_courses",
            ReferenceTable::TrainingRequirements => "training_requirements",
            ReferenceTable::Integrations => "integrations",
        }
    }

    /// Column holding the business code. Unique everywhere except `role_permissions`,
    /// whose rows are owned by their role and replaced as a set.
    pub fn code_column(self) -> &'static str {
        match self {
            ReferenceTable::Sites => "site_code",
            ReferenceTable::Departments => "dept_code",
            ReferenceTable::JobRoles => "job_code",
            ReferenceTable::SystemRoles => "role_code",
            ReferenceTable::RolePermissions => "permission_code",
            ReferenceTable::PtoTypes => "pto_type_code",
            ReferenceTable::PtoPolicies => "policy_code",
            ReferenceTable::PtoApprovalRules => "rule_code",
            ReferenceTable::Holidays => "holiday_code",
            ReferenceTable::CalendarEvents => "event_key",
            ReferenceTable::TrainingCourses => "training_code",
            ReferenceTable::TrainingRequirements => "requirement_key",
            ReferenceTable::Integrations => "integration_code",
        }
    }
}

pub trait ReferenceRecord: Clone + Serialize + DeserializeOwned + Send + Sync + 'static {
    const TABLE: ReferenceTable;
    /// Insert column order, matching [`ReferenceRecord::values`].
    const COLUMNS: &'static [&'static str];

    fn code(&self) -> &str;
    fn values(&self) -> Vec<SqlValue>;
}

macro_rules! reference_record {
    ($ty:ident, $table:expr, key = $key:ident, [$($field:ident),* $(,)?]) => {
        impl ReferenceRecord for $ty {
            const TABLE: ReferenceTable = $table;
            const COLUMNS: &'static [&'static str] = &[$(stringify!($field)),*];

            fn code(&self) -> &str {
                &self.$key
            }

            fn values(&self) -> Vec<SqlValue> {
                vec![$(SqlValue::from(self.$field.clone())),*]
            }
        }
    };
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SiteRecord {
    pub site_code: String,
    pub site_name: String,
    pub address_line1: String,
    pub city: String,
    pub region_state: String,
    pub postal_code: String,
    pub country: String,
    pub time_zone: String,
    pub is_active: bool,
}

reference_record!(SiteRecord, ReferenceTable::Sites, key = site_code, [
    site_code, site_name, address_line1, city, region_state, postal_code, country, time_zone, is_active,
]);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DepartmentRecord {
    pub dept_code: String,
    pub dept_name: String,
    pub site_id: Option<u64>,
    pub cost_center_code: String,
    pub is_active: bool,
}

reference_record!(DepartmentRecord, ReferenceTable::Departments, key = dept_code, [
    dept_code, dept_name, site_id, cost_center_code, is_active,
]);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobRoleRecord {
    pub job_code: String,
    pub job_title: String,
    pub job_level: String,
    pub employment_type_default: String,
    pub compensation_type_default: String,
    pub exempt_status: String,
    pub department_id: Option<u64>,
    pub is_active: bool,
}

reference_record!(JobRoleRecord, ReferenceTable::JobRoles, key = job_code, [
    job_code,
    job_title,
    job_level,
    employment_type_default,
    compensation_type_default,
    exempt_status,
    department_id,
    is_active,
]);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemRoleRecord {
    pub role_code: String,
    pub role_name: String,
    pub role_description: String,
    pub data_scope_default: String,
    pub can_view_paystubs_self_only: bool,
    pub is_active: bool,
}

reference_record!(SystemRoleRecord, ReferenceTable::SystemRoles, key = role_code, [
    role_code, role_name, role_description, data_scope_default, can_view_paystubs_self_only, is_active,
]);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RolePermissionRecord {
    pub role_id: u64,
    pub permission_code: String,
    pub allowed: bool,
    pub scope: String,
    pub notes: String,
}

reference_record!(RolePermissionRecord, ReferenceTable::RolePermissions, key = permission_code, [
    role_id, permission_code, allowed, scope, notes,
]);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PtoTypeRecord {
    pub pto_type_code: String,
    pub pto_type_name: String,
    pub is_payable_on_termination: bool,
    pub counts_toward_liability: bool,
    pub is_active: bool,
}

reference_record!(PtoTypeRecord, ReferenceTable::PtoTypes, key = pto_type_code, [
    pto_type_code, pto_type_name, is_payable_on_termination, counts_toward_liability, is_active,
]);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PtoPolicyRecord {
    pub policy_code: String,
    pub policy_name: String,
    pub pto_type_id: Option<u64>,
    pub applies_to_role_id: Option<u64>,
    pub accrual_method: String,
    pub annual_entitlement_hours: f64,
    pub accrual_rate_hours_per_payperiod: f64,
    pub carryover_cap_hours: f64,
    pub balance_cap_hours: f64,
    pub waiting_period_days: i64,
    pub allow_negative_balance: bool,
}

reference_record!(PtoPolicyRecord, ReferenceTable::PtoPolicies, key = policy_code, [
    policy_code,
    policy_name,
    pto_type_id,
    applies_to_role_id,
    accrual_method,
    annual_entitlement_hours,
    accrual_rate_hours_per_payperiod,
    carryover_cap_hours,
    balance_cap_hours,
    waiting_period_days,
    allow_negative_balance,
]);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PtoApprovalRuleRecord {
    pub rule_code: String,
    pub pto_type_id: Option<u64>,
    pub approver_type: String,
    pub approver_identifier: String,
    pub backup_approver_identifier: String,
    pub sla_hours: i64,
    pub notes: String,
}

reference_record!(PtoApprovalRuleRecord, ReferenceTable::PtoApprovalRules, key = rule_code, [
    rule_code,
    pto_type_id,
    approver_type,
    approver_identifier,
    backup_approver_identifier,
    sla_hours,
    notes,
]);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HolidayRecord {
    pub holiday_code: String,
    pub holiday_name: String,
    pub date: NaiveDate,
    pub country: String,
    pub region_state: String,
    pub site_id: Option<u64>,
    pub is_paid: bool,
    pub notes: String,
}

reference_record!(HolidayRecord, ReferenceTable::Holidays, key = holiday_code, [
    holiday_code, holiday_name, date, country, region_state, site_id, is_paid, notes,
]);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalendarEventRecord {
    /// derived from the defining fields; see `import::transform::natural_key`
    pub event_key: String,
    pub event_type: String,
    pub title: String,
    pub date_ts: NaiveDateTime,
    pub scope: String,
    pub site_id: Option<u64>,
    pub description: String,
}

reference_record!(CalendarEventRecord, ReferenceTable::CalendarEvents, key = event_key, [
    event_key, event_type, title, date_ts, scope, site_id, description,
]);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingCourseRecord {
    pub training_code: String,
    pub training_name: String,
    pub category: String,
    pub default_expiry_months: Option<i64>,
    pub delivery_method: String,
    pub is_mandatory_possible: bool,
    pub is_active: bool,
}

reference_record!(TrainingCourseRecord, ReferenceTable::TrainingCourses, key = training_code, [
    training_code,
    training_name,
    category,
    default_expiry_months,
    delivery_method,
    is_mandatory_possible,
    is_active,
]);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingRequirementRecord {
    pub requirement_key: String,
    pub training_course_id: Option<u64>,
    pub applies_to_role_id: Option<u64>,
    pub site_id: Option<u64>,
    pub required_by_days_from_hire: Option<i64>,
    pub expiry_months_override: Option<i64>,
    pub block_work_if_incomplete: bool,
    pub notes: String,
}

reference_record!(TrainingRequirementRecord, ReferenceTable::TrainingRequirements, key = requirement_key, [
    requirement_key,
    training_course_id,
    applies_to_role_id,
    site_id,
    required_by_days_from_hire,
    expiry_months_override,
    block_work_if_incomplete,
    notes,
]);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntegrationRecord {
    pub integration_code: String,
    pub system_name: String,
    pub integration_type: String,
    pub direction: String,
    pub enabled: bool,
    pub owner_email: String,
    pub frequency: String,
    pub notes: String,
}

reference_record!(IntegrationRecord, ReferenceTable::Integrations, key = integration_code, [
    integration_code, system_name, integration_type, direction, enabled, owner_email, frequency, notes,
]);

/// One section's worth of rows, ready to be written.
#[derive(Debug, Clone)]
pub enum ReferenceBatch {
    Sites(Vec<SiteRecord>),
    Departments(Vec<DepartmentRecord>),
    JobRoles(Vec<JobRoleRecord>),
    SystemRoles(Vec<SystemRoleRecord>),
    /// Replaces every permission of `role_ids` with `rows`.
    RolePermissions {
        role_ids: Vec<u64>,
        rows: Vec<RolePermissionRecord>,
    },
    PtoTypes(Vec<PtoTypeRecord>),
    PtoPolicies(Vec<PtoPolicyRecord>),
    PtoApprovalRules(Vec<PtoApprovalRuleRecord>),
    Holidays(Vec<HolidayRecord>),
    CalendarEvents(Vec<CalendarEventRecord>),
    TrainingCourses(Vec<TrainingCourseRecord>),
    TrainingRequirements(Vec<TrainingRequirementRecord>),
    Integrations(Vec<IntegrationRecord>),
}

impl ReferenceBatch {
    pub fn table(&self) -> ReferenceTable {
        match self {
            ReferenceBatch::Sites(_) => ReferenceTable::Sites,
            ReferenceBatch::Departments(_) => ReferenceTable::Departments,
            ReferenceBatch::JobRoles(_) => ReferenceTable::JobRoles,
            ReferenceBatch::SystemRoles(_) => ReferenceTable::SystemRoles,
            ReferenceBatch::RolePermissions { .. } => ReferenceTable::RolePermissions,
            ReferenceBatch::PtoTypes(_) => ReferenceTable::PtoTypes,
            ReferenceBatch::PtoPolicies(_) => ReferenceTable::PtoPolicies,
            ReferenceBatch::PtoApprovalRules(_) => ReferenceTable::PtoApprovalRules,
            ReferenceBatch::Holidays(_) => ReferenceTable::Holidays,
            ReferenceBatch::CalendarEvents(_) => ReferenceTable::CalendarEvents,
            ReferenceBatch::TrainingCourses(_) => ReferenceTable::TrainingCourses,
            ReferenceBatch::TrainingRequirements(_) => ReferenceTable::TrainingRequirements,
            ReferenceBatch::Integrations(_) => ReferenceTable::Integrations,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            ReferenceBatch::Sites(rows) => rows.len(),
            ReferenceBatch::Departments(rows) => rows.len(),
            ReferenceBatch::JobRoles(rows) => rows.len(),
            ReferenceBatch::SystemRoles(rows) => rows.len(),
            ReferenceBatch::RolePermissions { rows, .. } => rows.len(),
            ReferenceBatch::PtoTypes(rows) => rows.len(),
            ReferenceBatch::PtoPolicies(rows) => rows.len(),
            ReferenceBatch::PtoApprovalRules(rows) => rows.len(),
            ReferenceBatch::Holidays(rows) => rows.len(),
            ReferenceBatch::CalendarEvents(rows) => rows.len(),
            ReferenceBatch::TrainingCourses(rows) => rows.len(),
            ReferenceBatch::TrainingRequirements(rows) => rows.len(),
            ReferenceBatch::Integrations(rows) => rows.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Business codes of the rows in this batch.
    pub fn codes(&self) -> Vec<&str> {
        fn of<T: ReferenceRecord>(rows: &[T]) -> Vec<&str> {
            rows.iter().map(ReferenceRecord::code).collect()
        }

        match self {
            ReferenceBatch::Sites(rows) => of(rows),
            ReferenceBatch::Departments(rows) => of(rows),
            ReferenceBatch::JobRoles(rows) => of(rows),
            ReferenceBatch::SystemRoles(rows) => of(rows),
            ReferenceBatch::RolePermissions { rows, .. } => of(rows),
            ReferenceBatch::PtoTypes(rows) => of(rows),
            ReferenceBatch::PtoPolicies(rows) => of(rows),
            ReferenceBatch::PtoApprovalRules(rows) => of(rows),
            ReferenceBatch::Holidays(rows) => of(rows),
            ReferenceBatch::CalendarEvents(rows) => of(rows),
            ReferenceBatch::TrainingCourses(rows) => of(rows),
            ReferenceBatch::TrainingRequirements(rows) => of(rows),
            ReferenceBatch::Integrations(rows) => of(rows),
        }
    }
}
