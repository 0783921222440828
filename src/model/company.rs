use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// The singleton `company_settings` row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct CompanySettings {
    pub company_name: String,
    pub operating_name: String,
    pub country: String,
    pub time_zone: String,
    pub currency: String,
    pub week_starts_on: String,
    pub default_language: String,
    pub hr_contact_email: String,
    pub auto_approve_enabled: bool,
    /// unset means the built-in default applies
    pub auto_approve_sick_threshold: Option<i32>,
    pub auto_approve_personal_threshold: Option<i32>,
}

impl Default for CompanySettings {
    fn default() -> Self {
        Self {
            company_name: String::new(),
            operating_name: String::new(),
            country: "CA".to_string(),
            time_zone: "America/Toronto".to_string(),
            currency: "CAD".to_string(),
            week_starts_on: "Mon".to_string(),
            default_language: "en-CA".to_string(),
            hr_contact_email: String::new(),
            auto_approve_enabled: false,
            auto_approve_sick_threshold: None,
            auto_approve_personal_threshold: None,
        }
    }
}

/// Company identity fields written by the configuration import.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompanyProfile {
    pub company_name: String,
    pub operating_name: String,
    pub country: String,
    pub time_zone: String,
    pub currency: String,
    pub week_starts_on: String,
    pub default_language: String,
    pub hr_contact_email: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct AutoApprovalUpdate {
    #[schema(example = true)]
    pub auto_approve_enabled: bool,
    #[schema(example = 3)]
    pub auto_approve_sick_threshold: Option<i32>,
    #[schema(example = 1)]
    pub auto_approve_personal_threshold: Option<i32>,
}
