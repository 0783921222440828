#![allow(dead_code, unused_macros)]

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use hris::AppServices;
use hris::auth::jwt::generate_access_token;
use hris::auth::password::hash_password;
use hris::config::Config;
use hris::model::{CompanySettings, Employee, Profile, UserRole};
use hris::store::Store;
use hris::store::memory::MemoryStore;

pub const PASSWORD: &str = "correct horse";

static NEXT_EMAIL: AtomicU64 = AtomicU64::new(1);

fn unique() -> u64 {
    NEXT_EMAIL.fetch_add(1, Ordering::Relaxed)
}

/// Builds the full route table over `$ctx`'s in-memory store.
macro_rules! app {
    ($ctx:expr) => {
        actix_web::test::init_service(actix_web::App::new().configure(|cfg| {
            hris::routes::configure(cfg, &$ctx.config, &$ctx.services)
        }))
        .await
    };
}

pub fn config() -> Config {
    Config {
        database_url: String::new(),
        jwt_secret: "test-secret".to_string(),
        server_addr: "127.0.0.1:0".to_string(),
        access_token_ttl: 900,
        rate_login_per_min: 0,
        rate_protected_per_min: 0,
        rate_import_per_min: 0,
        api_prefix: "/api".to_string(),
        log_dir: "logs".to_string(),
        log_level: "debug".to_string(),
        settings_cache_ttl_secs: 60,
        leave_restore_on_cancel: false,
        import_max_bytes: 2 * 1024 * 1024,
    }
}

pub struct TestContext {
    pub store: Arc<MemoryStore>,
    pub config: Config,
    pub services: AppServices,
}

impl TestContext {
    pub fn new() -> Self {
        Self::with_config(config())
    }

    pub fn with_config(config: Config) -> Self {
        let store = Arc::new(MemoryStore::new());
        let services = AppServices::new(store.clone(), &config);
        Self {
            store,
            config,
            services,
        }
    }

    pub fn employee(&self, vacation_days: f64, sick_days: f64) -> Employee {
        self.store
            .insert_employee(Employee {
                id: 0,
                first_name: "Jane".to_string(),
                last_name: "Doe".to_string(),
                email: format!("jane{}@company.com", unique()),
                vacation_days_remaining: vacation_days,
                vacation_days_entitled: vacation_days,
                sick_days_remaining: sick_days,
                sick_days_entitled: sick_days,
            })
            .unwrap()
    }

    pub fn profile(&self, role: UserRole, employee_id: Option<u64>) -> Profile {
        self.store
            .insert_profile(Profile {
                id: 0,
                email: format!("{role}{}@company.com", unique()),
                password_hash: hash_password(PASSWORD).unwrap(),
                role,
                employee_id,
                is_active: true,
            })
            .unwrap()
    }

    pub fn token(&self, profile: &Profile) -> String {
        let token = generate_access_token(profile, &self.config.jwt_secret, 900).unwrap();
        format!("Bearer {token}")
    }

    /// Staff member with an employee record; returns the employee and a bearer header.
    pub fn staff(&self, vacation_days: f64, sick_days: f64) -> (Employee, String) {
        let employee = self.employee(vacation_days, sick_days);
        let profile = self.profile(UserRole::Employee, Some(employee.id));
        (employee, self.token(&profile))
    }

    pub fn admin(&self) -> String {
        let profile = self.profile(UserRole::Admin, None);
        self.token(&profile)
    }

    pub fn manager(&self) -> String {
        let profile = self.profile(UserRole::Manager, None);
        self.token(&profile)
    }

    pub fn enable_auto_approval(&self) {
        self.store
            .set_company_settings(CompanySettings {
                auto_approve_enabled: true,
                auto_approve_sick_threshold: Some(3),
                auto_approve_personal_threshold: Some(1),
                ..CompanySettings::default()
            })
            .unwrap();
    }

    pub async fn stored_employee(&self, employee_id: u64) -> Employee {
        self.store.find_employee(employee_id).await.unwrap().unwrap()
    }
}
