pub mod api;
pub mod notify;
pub mod scrape;
pub mod store;

pub use api::{ApiError, MarketplaceApi};
pub use notify::{NoopNotifier, Notifier, NotifyError};
pub use scrape::{DeclarationScraper, ScrapeError};
pub use store::{StoreError, TrackingStore, TrackingTables};
