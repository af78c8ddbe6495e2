use std::sync::Arc;

use chrono::Utc;
use tracing::{info, warn};

use shared_config::AppConfig;

use crate::change_feed::ChangeFeed;
use crate::memory::InMemoryStore;
use crate::seed::{demo_records, SeedRecords};
use crate::store::ClinicStore;
use crate::supabase_store::SupabaseStore;

/// Shared handler state: configuration, the injected store and the change feed.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub store: Arc<dyn ClinicStore>,
    pub feed: ChangeFeed,
}

impl AppState {
    pub fn new(config: AppConfig, store: Arc<dyn ClinicStore>, feed: ChangeFeed) -> Self {
        Self {
            config: Arc::new(config),
            store,
            feed,
        }
    }

    /// Hosted store when configured, otherwise the seeded in-memory demo store.
    pub fn from_config(config: AppConfig) -> Self {
        let store: Arc<dyn ClinicStore> = if config.is_configured() {
            info!("Using Supabase store at {}", config.supabase_url);
            Arc::new(SupabaseStore::new(&config))
        } else {
            warn!("Supabase not configured, serving the in-memory demo clinic");
            let today = Utc::now().date_naive();
            match InMemoryStore::with_records(demo_records(today)) {
                Ok(store) => Arc::new(store),
                Err(e) => {
                    warn!("Demo data rejected ({}), starting with an empty store", e);
                    Arc::new(InMemoryStore::new())
                }
            }
        };

        Self::new(config, store, ChangeFeed::default())
    }

    /// In-memory state preloaded with `records`.
    pub fn in_memory(config: AppConfig, records: SeedRecords) -> crate::store::StoreResult<Self> {
        let store = InMemoryStore::with_records(records)?;
        Ok(Self::new(config, Arc::new(store), ChangeFeed::default()))
    }
}
