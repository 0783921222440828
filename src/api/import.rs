use actix_web::{HttpResponse, web};
use tracing::{info, warn};

use crate::auth::auth::AuthUser;
use crate::error::AppError;
use crate::import::{ConfigImporter, ImportPayload, ImportReport};
use crate::model::UserRole;
use crate::store::Store;

/// Bulk import of company configuration (Admin)
///
/// Sections are processed in dependency order. A failing section is reported in its own
/// `errors` list and the response status becomes 207; other sections still run.
#[utoipa::path(
    post,
    path = "/api/import-config",
    request_body(content = ImportPayload, description = "Configuration import payload", content_type = "application/json"),
    responses(
        (status = 200, description = "All sections imported", body = ImportReport),
        (status = 207, description = "At least one section reported errors", body = ImportReport),
        (status = 400, description = "Body is not a JSON object"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Admin access required", body = Object, example = json!({
            "message": "Admin access required"
        })),
        (status = 500, description = "Unexpected failure", body = Object, example = json!({
            "message": "Internal Server Error"
        }))
    ),
    security(("bearer_auth" = [])),
    tag = "Import"
)]
pub async fn import_config(
    auth: AuthUser,
    body: web::Bytes,
    store: web::Data<dyn Store>,
    importer: web::Data<ConfigImporter>,
) -> Result<HttpResponse, AppError> {
    // the stored profile decides, not the token's role claim
    let profile = store.find_profile(auth.user_id).await?;
    if !matches!(profile, Some(ref p) if p.role == UserRole::Admin && p.is_active) {
        warn!(user_id = auth.user_id, "Import rejected: caller is not an admin");
        return Err(AppError::Forbidden("Admin access required".to_string()));
    }

    let payload: ImportPayload = serde_json::from_slice(&body)
        .map_err(|e| AppError::Validation(format!("invalid import payload: {e}")))?;

    info!(user_id = auth.user_id, dry_run = payload.is_dry_run(), "Configuration import started");
    let report = importer.run(payload).await;

    Ok(HttpResponse::build(report.status_code()).json(&report))
}
