use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use shopsync_core::api::MarketplaceApi;
use shopsync_core::notify::Notifier;
use shopsync_core::scrape::DeclarationScraper;
use shopsync_shared::{Order, ProviderKind};

use crate::manager::{Baseline, CarrierManager, DummyManager, PickupManager, ProviderManager};

/// Selects and caches the provider manager for an order's delivery method.
///
/// Managers are memoized per delivery-provider id for the lifetime of the
/// run: a carrier manager owns a stateful portal session, so two orders on
/// the same provider must share one instance. Dispatch is deterministic —
/// the same provider id always yields the same manager variant.
pub struct Director {
    api: Arc<dyn MarketplaceApi>,
    notifier: Arc<dyn Notifier>,
    scrapers: HashMap<ProviderKind, Arc<dyn DeclarationScraper>>,
    managers: Mutex<HashMap<i64, Arc<dyn ProviderManager>>>,
}

impl Director {
    pub fn new(
        api: Arc<dyn MarketplaceApi>,
        notifier: Arc<dyn Notifier>,
        scrapers: HashMap<ProviderKind, Arc<dyn DeclarationScraper>>,
    ) -> Self {
        Self {
            api,
            notifier,
            scrapers,
            managers: Mutex::new(HashMap::new()),
        }
    }

    pub fn assign(&self, order: &Order) -> Arc<dyn ProviderManager> {
        let provider_id = order.delivery_option.id;
        let mut managers = self.managers.lock().expect("manager cache poisoned");
        if let Some(manager) = managers.get(&provider_id) {
            return manager.clone();
        }

        let manager = self.build(order.delivery_option.kind());
        managers.insert(provider_id, manager.clone());
        manager
    }

    fn build(&self, kind: Option<ProviderKind>) -> Arc<dyn ProviderManager> {
        let base = Baseline::new(self.api.clone(), self.notifier.clone());
        match kind {
            Some(ProviderKind::Pickup) => Arc::new(PickupManager::new(base)),
            Some(kind) => match self.scrapers.get(&kind) {
                Some(scraper) => Arc::new(CarrierManager::new(base, scraper.clone(), kind)),
                // Known carrier without a configured portal session: treat
                // it as disabled and fall back to the no-op manager.
                None => Arc::new(DummyManager::new(base)),
            },
            None => Arc::new(DummyManager::new(base)),
        }
    }
}
