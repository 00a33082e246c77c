use std::sync::Arc;

use crate::clients::TmdbClient;
use crate::config::Config;
use crate::db::{CacheRepository, FileStore, KeyValueStore};
use crate::services::{CatalogueService, DetailsService, GenreService};

/// Services shared by every command, built once from the loaded config.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,

    pub catalogue: CatalogueService,

    pub genres: GenreService,

    pub details: DetailsService,
}

impl AppState {
    pub fn new(config: Config) -> anyhow::Result<Self> {
        let store = FileStore::open(&config.general.cache_dir)?;
        Self::with_store(config, Arc::new(store))
    }

    /// Builds the services over an explicit store, used by tests.
    pub fn with_store(config: Config, store: Arc<dyn KeyValueStore>) -> anyhow::Result<Self> {
        let client = TmdbClient::from_config(&config.tmdb, &config.retry)?;
        Ok(Self::from_parts(config, client, store))
    }

    #[must_use]
    pub fn from_parts(config: Config, client: TmdbClient, store: Arc<dyn KeyValueStore>) -> Self {
        let cache = CacheRepository::new(store).with_ttl(config.catalogue.cache_ttl());

        let catalogue = CatalogueService::new(client.clone(), cache.clone(), &config.catalogue);
        let genres = GenreService::new(client.clone(), cache);
        let details = DetailsService::new(client, catalogue.clone());

        Self {
            config: Arc::new(config),
            catalogue,
            genres,
            details,
        }
    }
}
