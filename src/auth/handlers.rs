use actix_web::{HttpResponse, web};
use tracing::{debug, error, info, instrument};

use crate::{
    auth::{jwt::generate_access_token, password::verify_password},
    config::Config,
    error::AppError,
    models::{LoginReqDto, LoginResponse},
    store::Store,
};

/// Exchange email and password for a bearer token
#[utoipa::path(
    post,
    path = "/auth/login",
    request_body = LoginReqDto,
    responses(
        (status = 200, description = "Login successful", body = LoginResponse),
        (status = 400, description = "Email or password missing"),
        (status = 401, description = "Invalid credentials")
    ),
    tag = "Auth"
)]
#[instrument(name = "auth_login", skip(store, config, user), fields(email = %user.email))]
pub async fn login(
    user: web::Json<LoginReqDto>,
    store: web::Data<dyn Store>,
    config: web::Data<Config>,
) -> Result<HttpResponse, AppError> {
    info!("Login request received");

    if user.email.trim().is_empty() || user.password.is_empty() {
        return Err(AppError::Validation("Email or password required".to_string()));
    }

    let profile = match store.find_profile_by_email(user.email.trim()).await? {
        Some(profile) if profile.is_active => profile,
        Some(_) => {
            info!("Invalid credentials: profile inactive");
            return Err(AppError::Unauthorized("Invalid credentials".to_string()));
        }
        None => {
            info!("Invalid credentials: profile not found");
            return Err(AppError::Unauthorized("Invalid credentials".to_string()));
        }
    };

    debug!(user_id = profile.id, "Verifying password");
    if let Err(e) = verify_password(&user.password, &profile.password_hash) {
        info!(error = %e, "Invalid credentials: password mismatch");
        return Err(AppError::Unauthorized("Invalid credentials".to_string()));
    }

    let access_token = generate_access_token(&profile, &config.jwt_secret, config.access_token_ttl)
        .map_err(|e| {
            error!(error = %e, "Failed to sign access token");
            AppError::Internal("token signing failed".to_string())
        })?;

    info!(user_id = profile.id, "Login successful");

    Ok(HttpResponse::Ok().json(LoginResponse {
        access_token,
        token_type: "Bearer".to_string(),
        expires_in: config.access_token_ttl,
    }))
}
