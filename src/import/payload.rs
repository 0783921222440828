//! Wire shape of a configuration import upload.
//!
//! Sections stay as raw JSON until they are processed so that a malformed section, or a
//! malformed row inside one, only fails that section or row.

use serde::{Deserialize, Deserializer};
use serde_json::Value;
use strum_macros::{AsRefStr, Display, EnumIter};
use utoipa::ToSchema;

/// Payload sections in processing order. Later sections reference earlier ones by code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, AsRefStr, EnumIter)]
#[strum(serialize_all = "snake_case")]
pub enum Section {
    Company,
    Sites,
    Departments,
    JobsRoles,
    Roles,
    RolePermissions,
    PtoTypes,
    PtoPolicies,
    PtoApprovalRules,
    Holidays,
    Events,
    TrainingCourses,
    TrainingRequirements,
    Integrations,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
#[schema(example = json!({
    "dry_run": true,
    "import_id": "2026-q1-setup",
    "company": { "legal_name": "Maple Works Inc.", "country": "CA" },
    "sites": [{ "site_id": "TOR", "site_name": "Toronto HQ", "is_active": "Y" }],
    "departments": [{ "dept_id": "ENG", "dept_name": "Engineering", "site_id": "TOR", "is_active": "Y" }]
}))]
pub struct ImportPayload {
    /// only a literal `true` enables dry run
    #[serde(default)]
    #[schema(value_type = Option<bool>)]
    pub dry_run: Option<Value>,
    /// echoed back untouched
    #[serde(default)]
    #[schema(value_type = Option<String>)]
    pub import_id: Option<Value>,

    #[schema(value_type = Option<Object>)]
    pub company: Option<Value>,
    #[schema(value_type = Option<Vec<Object>>)]
    pub sites: Option<Value>,
    #[schema(value_type = Option<Vec<Object>>)]
    pub departments: Option<Value>,
    #[schema(value_type = Option<Vec<Object>>)]
    pub jobs_roles: Option<Value>,
    #[schema(value_type = Option<Vec<Object>>)]
    pub roles: Option<Value>,
    #[schema(value_type = Option<Vec<Object>>)]
    pub role_permissions: Option<Value>,
    #[schema(value_type = Option<Vec<Object>>)]
    pub pto_types: Option<Value>,
    #[schema(value_type = Option<Vec<Object>>)]
    pub pto_policies: Option<Value>,
    #[schema(value_type = Option<Vec<Object>>)]
    pub pto_approval_rules: Option<Value>,
    #[schema(value_type = Option<Vec<Object>>)]
    pub holidays: Option<Value>,
    #[schema(value_type = Option<Vec<Object>>)]
    pub events: Option<Value>,
    #[schema(value_type = Option<Vec<Object>>)]
    pub training_courses: Option<Value>,
    #[schema(value_type = Option<Vec<Object>>)]
    pub training_requirements: Option<Value>,
    #[schema(value_type = Option<Vec<Object>>)]
    pub integrations: Option<Value>,
}

impl ImportPayload {
    pub fn is_dry_run(&self) -> bool {
        matches!(self.dry_run, Some(Value::Bool(true)))
    }

    /// Takes a section out of the payload. `null` and empty arrays count as absent.
    pub fn take(&mut self, section: Section) -> Option<Value> {
        let slot = match section {
            Section::Company => &mut self.company,
            Section::Sites => &mut self.sites,
            Section::Departments => &mut self.departments,
            Section::JobsRoles => &mut self.jobs_roles,
            Section::Roles => &mut self.roles,
            Section::RolePermissions => &mut self.role_permissions,
            Section::PtoTypes => &mut self.pto_types,
            Section::PtoPolicies => &mut self.pto_policies,
            Section::PtoApprovalRules => &mut self.pto_approval_rules,
            Section::Holidays => &mut self.holidays,
            Section::Events => &mut self.events,
            Section::TrainingCourses => &mut self.training_courses,
            Section::TrainingRequirements => &mut self.training_requirements,
            Section::Integrations => &mut self.integrations,
        };

        match slot.take() {
            None | Some(Value::Null) => None,
            Some(Value::Array(rows)) if rows.is_empty() => None,
            Some(value) => Some(value),
        }
    }
}

/// A `Y`/`N` spreadsheet flag. JSON booleans are accepted too; anything else is `false`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Flag(pub bool);

impl<'de> Deserialize<'de> for Flag {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Ok(Flag(match value {
            Value::Bool(b) => b,
            Value::String(s) => s.trim().eq_ignore_ascii_case("y"),
            _ => false,
        }))
    }
}

impl From<Flag> for bool {
    fn from(flag: Flag) -> Self {
        flag.0
    }
}

/// Accepts a JSON number or a numeric string; `null` and `""` are absent.
fn lenient_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<f64>, D::Error> {
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => Ok(n.as_f64()),
        Some(Value::String(s)) if s.trim().is_empty() => Ok(None),
        Some(Value::String(s)) => s
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| serde::de::Error::custom(format!("expected a number, got {s:?}"))),
        Some(other) => Err(serde::de::Error::custom(format!(
            "expected a number, got {other}"
        ))),
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct CompanyInput {
    pub legal_name: Option<String>,
    pub operating_name: Option<String>,
    pub country: Option<String>,
    pub time_zone: Option<String>,
    pub currency: Option<String>,
    pub week_starts_on: Option<String>,
    pub default_language: Option<String>,
    pub hr_contact_email: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct SiteInput {
    pub site_id: Option<String>,
    pub site_name: Option<String>,
    pub address_line1: Option<String>,
    pub city: Option<String>,
    pub region_state: Option<String>,
    pub postal_code: Option<String>,
    pub country: Option<String>,
    pub time_zone_override: Option<String>,
    #[serde(default)]
    pub is_active: Flag,
}

#[derive(Debug, Default, Deserialize)]
pub struct DepartmentInput {
    pub dept_id: Option<String>,
    pub dept_name: Option<String>,
    pub site_id: Option<String>,
    pub cost_center_code: Option<String>,
    #[serde(default)]
    pub is_active: Flag,
}

#[derive(Debug, Default, Deserialize)]
pub struct JobRoleInput {
    pub job_code: Option<String>,
    pub job_title: Option<String>,
    pub job_level: Option<String>,
    pub employment_type_default: Option<String>,
    pub exempt_status: Option<String>,
    pub dept_id_default: Option<String>,
    #[serde(default)]
    pub is_active: Flag,
}

#[derive(Debug, Default, Deserialize)]
pub struct SystemRoleInput {
    pub role_code: Option<String>,
    pub role_name: Option<String>,
    pub role_description: Option<String>,
    pub data_scope_default: Option<String>,
    #[serde(default)]
    pub can_view_paystubs_self_only: Flag,
    #[serde(default)]
    pub is_active: Flag,
}

#[derive(Debug, Default, Deserialize)]
pub struct RolePermissionInput {
    pub role_code: Option<String>,
    pub permission_code: Option<String>,
    #[serde(default)]
    pub allowed: Flag,
    pub scope: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct PtoTypeInput {
    pub pto_type_code: Option<String>,
    pub pto_type_name: Option<String>,
    #[serde(default)]
    pub is_payable_on_termination: Flag,
    #[serde(default)]
    pub counts_toward_liability: Flag,
    #[serde(default)]
    pub is_active: Flag,
}

#[derive(Debug, Default, Deserialize)]
pub struct PtoPolicyInput {
    pub policy_id: Option<String>,
    pub policy_name: Option<String>,
    pub pto_type_code: Option<String>,
    pub applies_to_role_code: Option<String>,
    pub accrual_method: Option<String>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub annual_entitlement_hours: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub accrual_rate_hours_per_payperiod: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub carryover_cap_hours: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub balance_cap_hours: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub waiting_period_days: Option<f64>,
    #[serde(default)]
    pub allow_negative_balance: Flag,
}

#[derive(Debug, Default, Deserialize)]
pub struct ApprovalRuleInput {
    pub rule_id: Option<String>,
    pub pto_type_code: Option<String>,
    pub approver_type: Option<String>,
    pub approver_identifier: Option<String>,
    pub backup_approver_identifier: Option<String>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub sla_hours: Option<f64>,
    pub notes: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct HolidayInput {
    pub holiday_id: Option<String>,
    pub holiday_name: Option<String>,
    pub date: Option<String>,
    pub country: Option<String>,
    pub region_state: Option<String>,
    pub site_id: Option<String>,
    #[serde(default)]
    pub is_paid: Flag,
    pub notes: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct EventInput {
    pub event_type: Option<String>,
    pub title: Option<String>,
    pub date_ts: Option<String>,
    pub scope: Option<String>,
    pub site_id: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct TrainingCourseInput {
    pub training_code: Option<String>,
    pub training_name: Option<String>,
    pub category: Option<String>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub default_expiry_months: Option<f64>,
    pub delivery_method: Option<String>,
    #[serde(default)]
    pub is_mandatory_possible: Flag,
    #[serde(default)]
    pub is_active: Flag,
}

#[derive(Debug, Default, Deserialize)]
pub struct TrainingRequirementInput {
    pub training_code: Option<String>,
    pub applies_to_role_code: Option<String>,
    pub site_id: Option<String>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub required_by_days_from_hire: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub expiry_months_override: Option<f64>,
    #[serde(default)]
    pub block_work_if_incomplete: Flag,
    pub notes: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct IntegrationInput {
    pub integration_id: Option<String>,
    pub system_name: Option<String>,
    pub integration_type: Option<String>,
    pub direction: Option<String>,
    #[serde(default)]
    pub enabled: Flag,
    pub owner_email: Option<String>,
    pub frequency: Option<String>,
    pub notes: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use strum::IntoEnumIterator;

    #[test]
    fn sections_run_in_dependency_order() {
        let names: Vec<String> = Section::iter().map(|s| s.to_string()).collect();
        assert_eq!(names.first().map(String::as_str), Some("company"));
        assert_eq!(names[3], "jobs_roles");
        let position = |name: &str| names.iter().position(|n| n == name);
        assert!(position("sites") < position("departments"));
        assert!(position("roles") < position("role_permissions"));
        assert!(position("pto_types") < position("pto_policies"));
        assert!(position("training_courses") < position("training_requirements"));
    }

    #[test]
    fn empty_and_null_sections_are_absent() {
        let mut payload: ImportPayload = serde_json::from_value(json!({
            "sites": [],
            "departments": null,
            "roles": [{ "role_code": "MGR" }]
        }))
        .unwrap();
        assert_eq!(payload.take(Section::Sites), None);
        assert_eq!(payload.take(Section::Departments), None);
        assert_eq!(payload.take(Section::Holidays), None);
        assert!(payload.take(Section::Roles).is_some());
    }

    #[test]
    fn only_literal_true_enables_dry_run() {
        let payload: ImportPayload = serde_json::from_value(json!({ "dry_run": "true" })).unwrap();
        assert!(!payload.is_dry_run());
        let payload: ImportPayload = serde_json::from_value(json!({ "dry_run": true })).unwrap();
        assert!(payload.is_dry_run());
    }

    #[test]
    fn flags_and_numbers_are_lenient() {
        let policy: PtoPolicyInput = serde_json::from_value(json!({
            "policy_id": "VAC-FT",
            "annual_entitlement_hours": "120",
            "carryover_cap_hours": 40,
            "balance_cap_hours": "",
            "allow_negative_balance": "Y"
        }))
        .unwrap();
        assert_eq!(policy.annual_entitlement_hours, Some(120.0));
        assert_eq!(policy.carryover_cap_hours, Some(40.0));
        assert_eq!(policy.balance_cap_hours, None);
        assert!(bool::from(policy.allow_negative_balance));

        let site: SiteInput = serde_json::from_value(json!({ "site_id": "TOR", "is_active": "N" })).unwrap();
        assert_eq!(site.is_active, Flag(false));
    }
}
