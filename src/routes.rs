use actix_governor::{
    Governor, GovernorConfigBuilder, PeerIpKeyExtractor, governor::middleware::NoOpMiddleware,
};
use actix_web::{
    middleware::{Condition, from_fn},
    web,
};

use crate::{
    AppServices,
    api::{company, employee, import, leave_request},
    auth::{handlers, middleware::auth_middleware},
    config::Config,
};

// Helper to build per-route limiter; a rate of 0 disables it
fn build_limiter(requests_per_min: u32) -> Condition<Governor<PeerIpKeyExtractor, NoOpMiddleware>> {
    let per_ms = 60_000 / u64::from(requests_per_min.max(1));
    let cfg = GovernorConfigBuilder::default()
        .per_millisecond(per_ms)
        .burst_size(requests_per_min.max(1))
        .key_extractor(PeerIpKeyExtractor)
        .finish()
        .unwrap_or_default();
    Condition::new(requests_per_min > 0, Governor::new(&cfg))
}

pub fn configure(cfg: &mut web::ServiceConfig, config: &Config, services: &AppServices) {
    cfg.app_data(web::Data::new(config.clone()))
        .app_data(web::Data::from(services.store.clone()))
        .app_data(web::Data::new(services.settings.clone()))
        .app_data(web::Data::new(services.leave.clone()))
        .app_data(web::Data::new(services.importer.clone()));

    // Public routes
    cfg.service(
        web::scope("/auth").service(
            web::resource("/login")
                .wrap(build_limiter(config.rate_login_per_min))
                .route(web::post().to(handlers::login)),
        ),
    );

    // Protected routes
    cfg.service(
        web::scope(&config.api_prefix)
            .wrap(from_fn(auth_middleware)) // authentication
            .wrap(build_limiter(config.rate_protected_per_min)) // rate limiting
            .service(
                web::scope("/leave")
                    // /leave
                    .service(
                        web::resource("")
                            .route(web::get().to(leave_request::leave_list))
                            .route(web::post().to(leave_request::create_leave)),
                    )
                    // /leave/{id}
                    .service(web::resource("/{id}").route(web::get().to(leave_request::get_leave)))
                    .service(
                        web::resource("/{id}/approve")
                            .route(web::put().to(leave_request::approve_leave)),
                    )
                    .service(
                        web::resource("/{id}/deny").route(web::put().to(leave_request::deny_leave)),
                    )
                    .service(
                        web::resource("/{id}/cancel")
                            .route(web::put().to(leave_request::cancel_leave)),
                    ),
            )
            .service(
                web::resource("/employee/{id}/balance").route(web::get().to(employee::get_balance)),
            )
            .service(
                web::scope("/settings")
                    .service(
                        web::resource("/company")
                            .route(web::get().to(company::get_company_settings)),
                    )
                    .service(
                        web::resource("/auto-approval")
                            .route(web::put().to(company::update_auto_approval)),
                    ),
            )
            .service(
                web::resource("/import-config")
                    .app_data(web::PayloadConfig::new(config.import_max_bytes))
                    .wrap(build_limiter(config.rate_import_per_min))
                    .route(web::post().to(import::import_config)),
            ),
    );
}
