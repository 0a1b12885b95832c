//! Entry point wiring a provider and a configuration into the services.

use std::sync::Arc;

use crate::batch::BatchOrchestrator;
use crate::fetch::ObjectFetcher;
use crate::listing::ListingService;
use crate::providers::StoreProvider;
use crate::EngineConfig;

/// Cloneable handle to the retrieval services of one provider.
///
/// The provider and configuration are shared immutably by every service.
#[derive(Debug, Clone)]
pub struct ObjectEngine {
    config: Arc<EngineConfig>,
    fetcher: ObjectFetcher,
    listing: ListingService,
    batch: BatchOrchestrator,
}

impl ObjectEngine {
    /// Create an engine for `provider`.
    pub fn new(provider: impl StoreProvider, config: EngineConfig) -> Self {
        Self::from_shared(Arc::new(provider), Arc::new(config))
    }

    /// Create an engine from an already shared provider and configuration.
    pub fn from_shared(provider: Arc<dyn StoreProvider>, config: Arc<EngineConfig>) -> Self {
        let fetcher = ObjectFetcher::new(provider.clone(), config.clone());
        let listing = ListingService::new(provider, config.clone());
        let batch = BatchOrchestrator::new(fetcher.clone(), listing.clone(), config.clone());
        Self {
            config,
            fetcher,
            listing,
            batch,
        }
    }

    #[inline]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    #[inline]
    pub fn fetcher(&self) -> &ObjectFetcher {
        &self.fetcher
    }

    #[inline]
    pub fn listing(&self) -> &ListingService {
        &self.listing
    }

    #[inline]
    pub fn batch(&self) -> &BatchOrchestrator {
        &self.batch
    }
}
