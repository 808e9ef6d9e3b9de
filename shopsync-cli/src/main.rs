use std::collections::HashMap;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use shopsync_core::{DeclarationScraper, NoopNotifier, Notifier};
use shopsync_engine::{report, Coordinator, Director, OrderEngine, RunError};
use shopsync_remote::{
    ChatNotifier, Config, JsonFileStore, MarketplaceClient, MeestScraper, NovaPoshtaScraper,
    PortalSession, RozetkaScraper, UkrPoshtaScraper,
};
use shopsync_shared::ProviderKind;

#[derive(Parser)]
#[command(name = "shopsync", about = "Marketplace order reconciliation bot")]
struct Cli {
    /// Restrict the run to these order ids and re-process them even when
    /// already tracked (comma-separated).
    #[arg(long = "orders", value_delimiter = ',')]
    orders: Vec<i64>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "shopsync=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let config = Config::load().context("failed to load configuration")?;

    let api = Arc::new(
        MarketplaceClient::new(&config.marketplace.base_url, &config.marketplace.token)
            .context("failed to build marketplace client")?,
    );

    let notifier: Arc<dyn Notifier> = match &config.chat {
        Some(chat) => Arc::new(
            ChatNotifier::new(&chat.service_url, &chat.phone_number, &chat.group_id)
                .context("failed to build chat notifier")?,
        ),
        None => {
            tracing::warn!("chat channel not configured, notifications are dropped");
            Arc::new(NoopNotifier)
        }
    };
    let admins = config
        .chat
        .as_ref()
        .map(|chat| chat.admins.clone())
        .unwrap_or_default();

    let mut scrapers: HashMap<ProviderKind, Arc<dyn DeclarationScraper>> = HashMap::new();
    match &config.portal.cookies {
        Some(cookies) => {
            let session = Arc::new(
                PortalSession::new(&config.portal.base_url, cookies)
                    .context("failed to open portal session")?,
            );
            scrapers.insert(
                ProviderKind::NovaPoshta,
                Arc::new(NovaPoshtaScraper::new(session.clone())),
            );
            scrapers.insert(
                ProviderKind::UkrPoshta,
                Arc::new(UkrPoshtaScraper::new(session.clone())),
            );
            scrapers.insert(
                ProviderKind::Rozetka,
                Arc::new(RozetkaScraper::new(session.clone())),
            );
            scrapers.insert(ProviderKind::Meest, Arc::new(MeestScraper::new(session)));
        }
        None => {
            tracing::warn!("portal cookies not configured, declaration generation is disabled");
        }
    }

    let store = Arc::new(JsonFileStore::new(&config.tracking.path));
    let engine = OrderEngine::new(Director::new(api.clone(), notifier.clone(), scrapers));
    let coordinator = Coordinator::new(
        api,
        engine,
        notifier.clone(),
        store,
        admins.clone(),
        config.run.received_cursor.clone(),
    );

    match coordinator.refresh_shop(&cli.orders).await {
        Ok(summary) => {
            tracing::info!(
                refreshed = summary.refreshed,
                blocked = summary.blocked,
                retried = summary.retried,
                escalated = summary.escalated,
                carried = summary.carried,
                "run complete"
            );
            Ok(())
        }
        Err(RunError::CredentialsExpired) => {
            // The whole run is dead without fresh cookies or an API token;
            // page the admins directly.
            if let Err(err) = notifier.send(&report::credentials_expired(), &admins).await {
                tracing::error!("failed to deliver the credentials alert: {err}");
            }
            anyhow::bail!("session credentials expired, rerun after refreshing them")
        }
        Err(err) => Err(err.into()),
    }
}
