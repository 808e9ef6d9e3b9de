use serde::Deserialize;
use std::env;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub marketplace: MarketplaceConfig,
    #[serde(default)]
    pub portal: PortalConfig,
    #[serde(default)]
    pub chat: Option<ChatConfig>,
    pub tracking: TrackingConfig,
    #[serde(default)]
    pub run: RunConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct MarketplaceConfig {
    #[serde(default = "default_marketplace_url")]
    pub base_url: String,
    pub token: String,
}

fn default_marketplace_url() -> String {
    "https://my.prom.ua/api/v1/".to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct PortalConfig {
    #[serde(default = "default_portal_url")]
    pub base_url: String,
    /// Base64-encoded cookie bundle exported from an authenticated browser
    /// session. Absent cookies disable every declaration-generating
    /// carrier manager.
    #[serde(default)]
    pub cookies: Option<String>,
}

impl Default for PortalConfig {
    fn default() -> Self {
        Self {
            base_url: default_portal_url(),
            cookies: None,
        }
    }
}

fn default_portal_url() -> String {
    "https://my.prom.ua/".to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct ChatConfig {
    pub service_url: String,
    pub phone_number: String,
    pub group_id: String,
    /// Contacts tagged on delivery-provider escalations.
    #[serde(default)]
    pub admins: Vec<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct TrackingConfig {
    /// Path of the JSON snapshot document holding both tracking tables.
    pub path: String,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct RunConfig {
    /// Optional cursor narrowing the received-status listing.
    #[serde(default)]
    pub received_cursor: Option<String>,
}

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let s = config::Config::builder()
            .add_source(config::File::with_name("config/default"))
            .add_source(config::File::with_name(&format!("config/{}", run_mode)).required(false))
            .add_source(config::File::with_name("config/local").required(false))
            .add_source(config::Environment::with_prefix("SHOPSYNC").separator("__"))
            .build()?;

        s.try_deserialize()
    }
}
