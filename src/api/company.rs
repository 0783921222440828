use actix_web::{HttpResponse, web};
use tracing::info;

use crate::auth::auth::AuthUser;
use crate::error::AppError;
use crate::model::{AutoApprovalUpdate, CompanySettings};
use crate::settings::SettingsReader;
use crate::store::Store;

/// Current company settings, including the auto-approval policy
#[utoipa::path(
    get,
    path = "/api/settings/company",
    responses(
        (status = 200, description = "Company settings", body = CompanySettings),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Settings"
)]
pub async fn get_company_settings(
    _auth: AuthUser,
    settings: web::Data<SettingsReader>,
) -> Result<HttpResponse, AppError> {
    Ok(HttpResponse::Ok().json(settings.current().await?))
}

/// Update the auto-approval switch and thresholds (Admin)
#[utoipa::path(
    put,
    path = "/api/settings/auto-approval",
    request_body = AutoApprovalUpdate,
    responses(
        (status = 200, description = "Updated settings", body = CompanySettings),
        (status = 400, description = "Negative threshold"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Admin access required")
    ),
    security(("bearer_auth" = [])),
    tag = "Settings"
)]
pub async fn update_auto_approval(
    auth: AuthUser,
    payload: web::Json<AutoApprovalUpdate>,
    store: web::Data<dyn Store>,
    settings: web::Data<SettingsReader>,
) -> Result<HttpResponse, AppError> {
    auth.require_admin()?;

    let negative = [
        payload.auto_approve_sick_threshold,
        payload.auto_approve_personal_threshold,
    ]
    .into_iter()
    .flatten()
    .any(|t| t < 0);
    if negative {
        return Err(AppError::Validation(
            "thresholds must not be negative".to_string(),
        ));
    }

    let updated = store.update_auto_approval(&payload).await?;
    settings.invalidate().await;

    info!(
        user_id = auth.user_id,
        enabled = updated.auto_approve_enabled,
        "Auto-approval policy updated"
    );
    Ok(HttpResponse::Ok().json(updated))
}
