pub mod app_config;
pub mod chat;
pub mod market;
pub mod portal;
pub mod snapshot;

pub use app_config::Config;
pub use chat::ChatNotifier;
pub use market::MarketplaceClient;
pub use portal::{
    MeestScraper, NovaPoshtaScraper, PortalSession, RozetkaScraper, UkrPoshtaScraper,
};
pub use snapshot::JsonFileStore;
