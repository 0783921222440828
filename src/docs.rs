use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi, openapi};

use crate::api::leave_request::{CreateLeave, LeaveFilter, LeaveListResponse, ReviewLeave};
use crate::import::{ImportPayload, ImportReport, SectionResult};
use crate::model::{
    AutoApprovalUpdate, CompanySettings, LeaveBalance, LeaveRequest, LeaveStatus, LeaveType,
};
use crate::models::{LoginReqDto, LoginResponse};

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    info(
        title = "HRIS Core API",
        version = "1.0.0",
        description = r#"
## HR Information System core

### Key Features
- **Leave Management**
  - Submit leave, automatic approval for short sick/personal leave, approve/deny/cancel
- **Leave Balances**
  - Vacation and sick day counters, deducted once per approved request
- **Company Settings**
  - Auto-approval switch and thresholds
- **Configuration Import**
  - Bulk upload of sites, departments, roles, permissions, PTO, holidays, events,
    training and integrations, with dry run and per-section error reporting

### Security
Endpoints under `/api` require a **JWT Bearer** token from `/auth/login`.
"#,
    ),
    paths(
        crate::auth::handlers::login,

        crate::api::leave_request::create_leave,
        crate::api::leave_request::leave_list,
        crate::api::leave_request::get_leave,
        crate::api::leave_request::approve_leave,
        crate::api::leave_request::deny_leave,
        crate::api::leave_request::cancel_leave,

        crate::api::employee::get_balance,

        crate::api::company::get_company_settings,
        crate::api::company::update_auto_approval,

        crate::api::import::import_config
    ),
    components(
        schemas(
            LoginReqDto,
            LoginResponse,
            CreateLeave,
            ReviewLeave,
            LeaveFilter,
            LeaveListResponse,
            LeaveRequest,
            LeaveStatus,
            LeaveType,
            LeaveBalance,
            CompanySettings,
            AutoApprovalUpdate,
            ImportPayload,
            ImportReport,
            SectionResult
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Auth", description = "Login"),
        (name = "Leave", description = "Leave management APIs"),
        (name = "Employee", description = "Employee balance APIs"),
        (name = "Settings", description = "Company settings APIs"),
        (name = "Import", description = "Configuration import APIs"),
    )
)]
pub struct ApiDoc;
