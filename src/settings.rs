use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;

use crate::model::CompanySettings;
use crate::store::{Store, StoreError};

/// Cached reader for the singleton company settings row.
///
/// Writers must call [`SettingsReader::invalidate`] after changing settings; otherwise
/// readers see the old row until the TTL expires.
#[derive(Clone)]
pub struct SettingsReader {
    store: Arc<dyn Store>,
    cache: Cache<(), CompanySettings>,
}

impl SettingsReader {
    pub fn new(store: Arc<dyn Store>, ttl: Duration) -> Self {
        let cache = Cache::builder().max_capacity(1).time_to_live(ttl).build();
        Self { store, cache }
    }

    pub async fn current(&self) -> Result<CompanySettings, StoreError> {
        if let Some(settings) = self.cache.get(&()).await {
            return Ok(settings);
        }

        let settings = self.store.company_settings().await?;
        self.cache.insert((), settings.clone()).await;
        Ok(settings)
    }

    pub async fn invalidate(&self) {
        self.cache.invalidate(&()).await;
        tracing::debug!("Company settings cache invalidated");
    }
}
