use async_trait::async_trait;

use shopsync_shared::{Declaration, Order};

/// Errors a carrier portal scraper can raise. Each variant drives a
/// different recovery path, so they must stay distinguishable:
/// cookie rejection aborts the whole run, a missing field schedules a
/// retry, a warehouse rejection escalates to the admins.
#[derive(Debug, thiserror::Error)]
pub enum ScrapeError {
    #[error("portal rejected the session cookies")]
    OutdatedCookies,

    #[error("portal response is missing required field `{0}`")]
    MissingField(String),

    #[error("carrier refused the shipment: {0}")]
    WarehouseRejected(String),

    #[error("portal request failed: {0}")]
    Transport(String),
}

/// One carrier portal's declaration generator. A scraper owns a stateful
/// cookie/CSRF session shared across its calls, which is why managers are
/// memoized per provider and calls are never issued concurrently.
#[async_trait]
pub trait DeclarationScraper: Send + Sync {
    async fn generate_declaration(&self, order: &Order) -> Result<Declaration, ScrapeError>;
}
