//! Payload row -> storage row mapping, including defaults and code resolution.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::de::DeserializeOwned;
use serde_json::Value;
use uuid::Uuid;

use super::payload::*;
use super::resolve::CodeIndex;
use crate::model::CompanyProfile;
use crate::model::reference::*;

/// Rows that mapped cleanly plus one message per rejected row.
#[derive(Debug)]
pub struct Parsed<T> {
    pub rows: Vec<T>,
    pub errors: Vec<String>,
}

/// Decodes and maps each row independently; failures are reported as `section[index]: ...`.
pub fn parse_rows<I, T, F>(section: Section, rows: Vec<Value>, mut map: F) -> Parsed<T>
where
    I: DeserializeOwned,
    F: FnMut(I) -> Result<T, String>,
{
    let mut parsed = Parsed {
        rows: Vec::with_capacity(rows.len()),
        errors: Vec::new(),
    };

    for (index, row) in rows.into_iter().enumerate() {
        let mapped = serde_json::from_value::<I>(row)
            .map_err(|e| e.to_string())
            .and_then(&mut map);
        match mapped {
            Ok(row) => parsed.rows.push(row),
            Err(msg) => parsed.errors.push(format!("{section}[{index}]: {msg}")),
        }
    }

    parsed
}

/// Blank strings count as absent.
fn text(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn or(value: Option<String>, default: &str) -> String {
    text(value).unwrap_or_else(|| default.to_string())
}

fn required(value: Option<String>, field: &str) -> Result<String, String> {
    text(value).ok_or_else(|| format!("missing {field}"))
}

/// Fractions and values outside `i64` are row errors.
fn whole(value: Option<f64>, field: &str) -> Result<Option<i64>, String> {
    match value {
        None => Ok(None),
        Some(v) if v.fract() == 0.0 && v >= i64::MIN as f64 && v < i64::MAX as f64 => {
            Ok(Some(v as i64))
        }
        Some(v) => Err(format!("{field} must be a whole number, got {v}")),
    }
}

/// Zero and absent both mean "not set".
fn positive(value: Option<f64>, field: &str) -> Result<Option<i64>, String> {
    Ok(whole(value, field)?.filter(|v| *v != 0))
}

/// Deterministic key for rows whose payload carries no business code.
pub fn natural_key(kind: &str, parts: &[&str]) -> String {
    let name = std::iter::once(kind)
        .chain(parts.iter().copied())
        .collect::<Vec<_>>()
        .join("\u{1f}");
    Uuid::new_v5(&Uuid::NAMESPACE_OID, name.as_bytes()).to_string()
}

/// RFC 3339, a naive `YYYY-MM-DD[T ]HH:MM:SS`, or a bare date at midnight.
fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.naive_utc());
    }
    ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

pub fn company(input: CompanyInput) -> Result<CompanyProfile, String> {
    Ok(CompanyProfile {
        company_name: required(input.legal_name, "legal_name")?,
        operating_name: or(input.operating_name, ""),
        country: or(input.country, "CA"),
        time_zone: or(input.time_zone, "America/Toronto"),
        currency: or(input.currency, "CAD"),
        week_starts_on: or(input.week_starts_on, "Mon"),
        default_language: or(input.default_language, "en-CA"),
        hr_contact_email: or(input.hr_contact_email, ""),
    })
}

pub fn site(input: SiteInput) -> Result<SiteRecord, String> {
    Ok(SiteRecord {
        site_code: required(input.site_id, "site_id")?,
        site_name: or(input.site_name, ""),
        address_line1: or(input.address_line1, ""),
        city: or(input.city, ""),
        region_state: or(input.region_state, ""),
        postal_code: or(input.postal_code, ""),
        country: or(input.country, "CA"),
        time_zone: or(input.time_zone_override, "America/Toronto"),
        is_active: input.is_active.into(),
    })
}

pub fn department(input: DepartmentInput, sites: &CodeIndex) -> Result<DepartmentRecord, String> {
    Ok(DepartmentRecord {
        dept_code: required(input.dept_id, "dept_id")?,
        dept_name: or(input.dept_name, ""),
        site_id: sites.resolve(input.site_id.as_deref()),
        cost_center_code: or(input.cost_center_code, ""),
        is_active: input.is_active.into(),
    })
}

pub fn job_role(input: JobRoleInput, departments: &CodeIndex) -> Result<JobRoleRecord, String> {
    let pay_basis = text(input.employment_type_default);
    let employment_type = match pay_basis.as_deref() {
        Some("hourly") => "part_time",
        _ => "full_time",
    };

    Ok(JobRoleRecord {
        job_code: required(input.job_code, "job_code")?,
        job_title: or(input.job_title, ""),
        job_level: or(input.job_level, ""),
        employment_type_default: employment_type.to_string(),
        compensation_type_default: pay_basis.unwrap_or_else(|| "hourly".to_string()),
        exempt_status: or(input.exempt_status, "non_exempt"),
        department_id: departments.resolve(input.dept_id_default.as_deref()),
        is_active: input.is_active.into(),
    })
}

pub fn system_role(input: SystemRoleInput) -> Result<SystemRoleRecord, String> {
    Ok(SystemRoleRecord {
        role_code: required(input.role_code, "role_code")?,
        role_name: or(input.role_name, ""),
        role_description: or(input.role_description, ""),
        data_scope_default: or(input.data_scope_default, "self"),
        can_view_paystubs_self_only: input.can_view_paystubs_self_only.into(),
        is_active: input.is_active.into(),
    })
}

/// `Ok(None)` when the role code does not resolve: such a row has no owner to attach to.
pub fn role_permission(
    input: RolePermissionInput,
    roles: &CodeIndex,
) -> Result<Option<RolePermissionRecord>, String> {
    let role_code = required(input.role_code, "role_code")?;
    let permission_code = required(input.permission_code, "permission_code")?;

    Ok(roles.resolve(Some(&role_code)).map(|role_id| RolePermissionRecord {
        role_id,
        permission_code,
        allowed: input.allowed.into(),
        scope: or(input.scope, "self"),
        notes: or(input.notes, ""),
    }))
}

pub fn pto_type(input: PtoTypeInput) -> Result<PtoTypeRecord, String> {
    Ok(PtoTypeRecord {
        pto_type_code: required(input.pto_type_code, "pto_type_code")?,
        pto_type_name: or(input.pto_type_name, ""),
        is_payable_on_termination: input.is_payable_on_termination.into(),
        counts_toward_liability: input.counts_toward_liability.into(),
        is_active: input.is_active.into(),
    })
}

pub fn pto_policy(
    input: PtoPolicyInput,
    pto_types: &CodeIndex,
    roles: &CodeIndex,
) -> Result<PtoPolicyRecord, String> {
    Ok(PtoPolicyRecord {
        policy_code: required(input.policy_id, "policy_id")?,
        policy_name: or(input.policy_name, ""),
        pto_type_id: pto_types.resolve(input.pto_type_code.as_deref()),
        applies_to_role_id: roles.resolve(input.applies_to_role_code.as_deref()),
        accrual_method: or(input.accrual_method, "entitlement"),
        annual_entitlement_hours: input.annual_entitlement_hours.unwrap_or(0.0),
        accrual_rate_hours_per_payperiod: input.accrual_rate_hours_per_payperiod.unwrap_or(0.0),
        carryover_cap_hours: input.carryover_cap_hours.unwrap_or(0.0),
        balance_cap_hours: input.balance_cap_hours.unwrap_or(0.0),
        waiting_period_days: whole(input.waiting_period_days, "waiting_period_days")?.unwrap_or(0),
        allow_negative_balance: input.allow_negative_balance.into(),
    })
}

pub fn approval_rule(
    input: ApprovalRuleInput,
    pto_types: &CodeIndex,
) -> Result<PtoApprovalRuleRecord, String> {
    Ok(PtoApprovalRuleRecord {
        rule_code: required(input.rule_id, "rule_id")?,
        pto_type_id: pto_types.resolve(input.pto_type_code.as_deref()),
        approver_type: or(input.approver_type, "manager"),
        approver_identifier: or(input.approver_identifier, ""),
        backup_approver_identifier: or(input.backup_approver_identifier, ""),
        sla_hours: positive(input.sla_hours, "sla_hours")?.unwrap_or(48),
        notes: or(input.notes, ""),
    })
}

pub fn holiday(input: HolidayInput, sites: &CodeIndex) -> Result<HolidayRecord, String> {
    let holiday_code = required(input.holiday_id, "holiday_id")?;
    let raw_date = required(input.date, "date")?;
    let date = NaiveDate::parse_from_str(&raw_date, "%Y-%m-%d")
        .map_err(|_| format!("invalid date {raw_date:?}"))?;

    Ok(HolidayRecord {
        holiday_code,
        holiday_name: or(input.holiday_name, ""),
        date,
        country: or(input.country, "CA"),
        region_state: or(input.region_state, ""),
        site_id: sites.resolve(input.site_id.as_deref()),
        is_paid: input.is_paid.into(),
        notes: or(input.notes, ""),
    })
}

pub fn event(input: EventInput, sites: &CodeIndex) -> Result<CalendarEventRecord, String> {
    let event_type = required(input.event_type, "event_type")?;
    let title = required(input.title, "title")?;
    let raw_ts = required(input.date_ts, "date_ts")?;
    let date_ts = parse_timestamp(&raw_ts).ok_or_else(|| format!("invalid date_ts {raw_ts:?}"))?;
    let scope = or(input.scope, "company");
    let site_code = text(input.site_id);

    let normalized_ts = date_ts.format("%Y-%m-%dT%H:%M:%S").to_string();
    let event_key = natural_key(
        "event",
        &[
            event_type.as_str(),
            title.as_str(),
            normalized_ts.as_str(),
            scope.as_str(),
            site_code.as_deref().unwrap_or(""),
        ],
    );

    Ok(CalendarEventRecord {
        event_key,
        site_id: sites.resolve(site_code.as_deref()),
        event_type,
        title,
        date_ts,
        scope,
        description: or(input.notes, ""),
    })
}

pub fn training_course(input: TrainingCourseInput) -> Result<TrainingCourseRecord, String> {
    Ok(TrainingCourseRecord {
        training_code: required(input.training_code, "training_code")?,
        training_name: or(input.training_name, ""),
        category: or(input.category, ""),
        default_expiry_months: positive(input.default_expiry_months, "default_expiry_months")?,
        delivery_method: or(input.delivery_method, "in_person"),
        is_mandatory_possible: input.is_mandatory_possible.into(),
        is_active: input.is_active.into(),
    })
}

pub fn training_requirement(
    input: TrainingRequirementInput,
    courses: &CodeIndex,
    roles: &CodeIndex,
    sites: &CodeIndex,
) -> Result<TrainingRequirementRecord, String> {
    let training_code = required(input.training_code, "training_code")?;
    let role_code = text(input.applies_to_role_code);
    let site_code = text(input.site_id);

    let requirement_key = natural_key(
        "training_requirement",
        &[
            training_code.as_str(),
            role_code.as_deref().unwrap_or(""),
            site_code.as_deref().unwrap_or(""),
        ],
    );

    Ok(TrainingRequirementRecord {
        requirement_key,
        training_course_id: courses.resolve(Some(&training_code)),
        applies_to_role_id: roles.resolve(role_code.as_deref()),
        site_id: sites.resolve(site_code.as_deref()),
        required_by_days_from_hire: positive(
            input.required_by_days_from_hire,
            "required_by_days_from_hire",
        )?,
        expiry_months_override: positive(input.expiry_months_override, "expiry_months_override")?,
        block_work_if_incomplete: input.block_work_if_incomplete.into(),
        notes: or(input.notes, ""),
    })
}

pub fn integration(input: IntegrationInput) -> Result<IntegrationRecord, String> {
    Ok(IntegrationRecord {
        integration_code: required(input.integration_id, "integration_id")?,
        system_name: or(input.system_name, ""),
        integration_type: or(input.integration_type, ""),
        direction: or(input.direction, "inbound"),
        enabled: input.enabled.into(),
        owner_email: or(input.owner_email, ""),
        frequency: or(input.frequency, "on_demand"),
        notes: or(input.notes, ""),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn site_defaults_fill_blank_fields() {
        let record = site(SiteInput {
            site_id: Some("TOR".into()),
            site_name: Some("Toronto HQ".into()),
            city: Some("".into()),
            is_active: Flag(true),
            ..SiteInput::default()
        })
        .unwrap();

        assert_eq!(record.site_code, "TOR");
        assert_eq!(record.city, "");
        assert_eq!(record.country, "CA");
        assert_eq!(record.time_zone, "America/Toronto");
        assert!(record.is_active);
    }

    #[test]
    fn hourly_jobs_become_part_time() {
        let departments = CodeIndex::from_pairs([("ENG", 7_u64)]);
        let hourly = job_role(
            JobRoleInput {
                job_code: Some("TECH1".into()),
                employment_type_default: Some("hourly".into()),
                dept_id_default: Some("ENG".into()),
                ..JobRoleInput::default()
            },
            &departments,
        )
        .unwrap();
        assert_eq!(hourly.employment_type_default, "part_time");
        assert_eq!(hourly.compensation_type_default, "hourly");
        assert_eq!(hourly.department_id, Some(7));

        let salaried = job_role(
            JobRoleInput {
                job_code: Some("ENG2".into()),
                employment_type_default: Some("salary".into()),
                dept_id_default: Some("OPS".into()),
                ..JobRoleInput::default()
            },
            &departments,
        )
        .unwrap();
        assert_eq!(salaried.employment_type_default, "full_time");
        assert_eq!(salaried.compensation_type_default, "salary");
        assert_eq!(salaried.exempt_status, "non_exempt");
        assert_eq!(salaried.department_id, None);
    }

    #[test]
    fn missing_code_rejects_only_that_row() {
        let parsed = parse_rows(
            Section::Sites,
            vec![
                json!({ "site_id": "TOR", "site_name": "Toronto" }),
                json!({ "site_name": "Nowhere" }),
                json!({ "site_id": "VAN", "is_active": "Y" }),
            ],
            site,
        );
        assert_eq!(parsed.rows.len(), 2);
        assert_eq!(parsed.errors, vec!["sites[1]: missing site_id".to_string()]);
    }

    #[test]
    fn malformed_row_is_a_row_error() {
        let parsed = parse_rows(Section::Sites, vec![json!("TOR")], site);
        assert!(parsed.rows.is_empty());
        assert_eq!(parsed.errors.len(), 1);
        assert!(parsed.errors[0].starts_with("sites[0]: "));
    }

    #[test]
    fn unresolved_role_drops_permission() {
        let roles = CodeIndex::from_pairs([("MGR", 3_u64)]);
        let kept = role_permission(
            RolePermissionInput {
                role_code: Some("MGR".into()),
                permission_code: Some("pto.approve".into()),
                allowed: Flag(true),
                scope: Some("department".into()),
                notes: None,
            },
            &roles,
        )
        .unwrap()
        .unwrap();
        assert_eq!(kept.role_id, 3);
        assert_eq!(kept.scope, "department");

        let dropped = role_permission(
            RolePermissionInput {
                role_code: Some("CEO".into()),
                permission_code: Some("pto.approve".into()),
                ..RolePermissionInput::default()
            },
            &roles,
        )
        .unwrap();
        assert_eq!(dropped, None);
    }

    #[test]
    fn zero_expiry_means_none_and_zero_sla_means_default() {
        let course = training_course(TrainingCourseInput {
            training_code: Some("WHMIS".into()),
            default_expiry_months: Some(0.0),
            ..TrainingCourseInput::default()
        })
        .unwrap();
        assert_eq!(course.default_expiry_months, None);
        assert_eq!(course.delivery_method, "in_person");

        let rule = approval_rule(
            ApprovalRuleInput {
                rule_id: Some("R1".into()),
                sla_hours: Some(0.0),
                ..ApprovalRuleInput::default()
            },
            &CodeIndex::default(),
        )
        .unwrap();
        assert_eq!(rule.sla_hours, 48);
        assert_eq!(rule.approver_type, "manager");
    }

    #[test]
    fn fractional_counts_are_row_errors() {
        let none = CodeIndex::default();
        let rule = |sla: f64| {
            approval_rule(
                ApprovalRuleInput {
                    rule_id: Some("R1".into()),
                    sla_hours: Some(sla),
                    ..ApprovalRuleInput::default()
                },
                &none,
            )
        };
        assert_eq!(rule(36.0).unwrap().sla_hours, 36);
        assert_eq!(
            rule(36.5).unwrap_err(),
            "sla_hours must be a whole number, got 36.5"
        );
        assert!(rule(1e30).is_err());

        let policy = pto_policy(
            PtoPolicyInput {
                policy_id: Some("VAC".into()),
                waiting_period_days: Some(2.25),
                ..PtoPolicyInput::default()
            },
            &none,
            &none,
        );
        assert!(policy.unwrap_err().starts_with("waiting_period_days"));

        let parsed = parse_rows(
            Section::TrainingCourses,
            vec![
                json!({ "training_code": "WHMIS", "default_expiry_months": "12" }),
                json!({ "training_code": "FIRST-AID", "default_expiry_months": 1.5 }),
            ],
            training_course,
        );
        assert_eq!(parsed.rows.len(), 1);
        assert_eq!(parsed.rows[0].default_expiry_months, Some(12));
        assert_eq!(
            parsed.errors,
            vec!["training_courses[1]: default_expiry_months must be a whole number, got 1.5".to_string()]
        );
    }

    #[test]
    fn event_key_is_stable_across_timestamp_spellings() {
        let sites = CodeIndex::default();
        let input = |ts: &str| EventInput {
            event_type: Some("townhall".into()),
            title: Some("Q1 Town Hall".into()),
            date_ts: Some(ts.into()),
            ..EventInput::default()
        };
        let a = event(input("2026-03-02T15:00:00Z"), &sites).unwrap();
        let b = event(input("2026-03-02 15:00:00"), &sites).unwrap();
        assert_eq!(a.event_key, b.event_key);
        assert_eq!(a.scope, "company");

        let other = event(input("2026-03-03"), &sites).unwrap();
        assert_ne!(a.event_key, other.event_key);

        let err = event(input("next tuesday"), &sites).unwrap_err();
        assert!(err.contains("invalid date_ts"));
    }

    #[test]
    fn requirement_key_follows_defining_codes() {
        let none = CodeIndex::default();
        let make = |role: Option<&str>| {
            training_requirement(
                TrainingRequirementInput {
                    training_code: Some("WHMIS".into()),
                    applies_to_role_code: role.map(String::from),
                    ..TrainingRequirementInput::default()
                },
                &none,
                &none,
                &none,
            )
            .unwrap()
        };
        assert_eq!(make(Some("MGR")).requirement_key, make(Some("MGR")).requirement_key);
        assert_ne!(make(Some("MGR")).requirement_key, make(None).requirement_key);
        assert_eq!(make(None).training_course_id, None);
    }

    #[test]
    fn holiday_requires_a_parseable_date() {
        let sites = CodeIndex::from_pairs([("TOR", 1_u64)]);
        let ok = holiday(
            HolidayInput {
                holiday_id: Some("CANADA-DAY".into()),
                date: Some("2026-07-01".into()),
                site_id: Some("TOR".into()),
                ..HolidayInput::default()
            },
            &sites,
        )
        .unwrap();
        assert_eq!(ok.site_id, Some(1));
        assert_eq!(ok.date, NaiveDate::from_ymd_opt(2026, 7, 1).unwrap());

        let bad = holiday(
            HolidayInput {
                holiday_id: Some("X".into()),
                date: Some("07/01/2026".into()),
                ..HolidayInput::default()
            },
            &sites,
        );
        assert!(bad.is_err());
    }
}
