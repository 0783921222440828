use std::sync::Arc;
use std::time::Duration;

pub mod api;
pub mod auth;
pub mod config;
pub mod db;
pub mod docs;
pub mod error;
pub mod import;
pub mod leave;
pub mod model;
pub mod models;
pub mod routes;
pub mod settings;
pub mod store;
pub mod utils;

use config::Config;
use import::ConfigImporter;
use leave::LeaveService;
use settings::SettingsReader;
use store::Store;

/// Everything the HTTP layer shares between workers.
#[derive(Clone)]
pub struct AppServices {
    pub store: Arc<dyn Store>,
    pub settings: SettingsReader,
    pub leave: LeaveService,
    pub importer: ConfigImporter,
}

impl AppServices {
    pub fn new(store: Arc<dyn Store>, config: &Config) -> Self {
        let settings = SettingsReader::new(
            store.clone(),
            Duration::from_secs(config.settings_cache_ttl_secs),
        );
        Self {
            leave: LeaveService::new(store.clone(), config.leave_restore_on_cancel),
            importer: ConfigImporter::new(store.clone(), settings.clone()),
            settings,
            store,
        }
    }
}
