//! Hand-rolled mocks and fixtures shared by the engine test modules.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{Duration, Utc};

use shopsync_core::api::{ApiError, MarketplaceApi};
use shopsync_core::notify::{Notifier, NotifyError};
use shopsync_core::scrape::{DeclarationScraper, ScrapeError};
use shopsync_core::store::{StoreError, TrackingStore, TrackingTables};
use shopsync_shared::{
    CancellationReason, Client, Declaration, DeliveryProvider, DeliveryProviderData,
    DeliveryStatus, Order, OrderStatus, PaymentData, PaymentOption, PaymentStatus, TrackedStatus,
    TrackingTable,
};

/// Builds order snapshots with sensible defaults: a fresh pending Nova
/// Poshta order without payment metadata.
pub struct OrderFixture {
    id: i64,
    status: OrderStatus,
    age_days: i64,
    modified_days: i64,
    provider_id: i64,
    payment_option_id: Option<i64>,
    unified_status: Option<DeliveryStatus>,
    payment_status: Option<PaymentStatus>,
    provider_data: Option<DeliveryProviderData>,
}

impl OrderFixture {
    pub fn new(id: i64) -> Self {
        Self {
            id,
            status: OrderStatus::Pending,
            age_days: 1,
            modified_days: 0,
            provider_id: 9_062_118,
            payment_option_id: None,
            unified_status: None,
            payment_status: None,
            provider_data: None,
        }
    }

    pub fn status(mut self, status: OrderStatus) -> Self {
        self.status = status;
        self
    }

    pub fn age_days(mut self, days: i64) -> Self {
        self.age_days = days;
        self
    }

    pub fn modified_days_ago(mut self, days: i64) -> Self {
        self.modified_days = days;
        self
    }

    pub fn provider_id(mut self, id: i64) -> Self {
        self.provider_id = id;
        self
    }

    pub fn payment_option_id(mut self, id: i64) -> Self {
        self.payment_option_id = Some(id);
        self
    }

    pub fn unified_status(mut self, status: DeliveryStatus) -> Self {
        self.unified_status = Some(status);
        self
    }

    pub fn payment_status(mut self, status: PaymentStatus) -> Self {
        self.payment_status = Some(status);
        self
    }

    pub fn provider_data(mut self, data: DeliveryProviderData) -> Self {
        self.provider_data = Some(data);
        self
    }

    pub fn build(self) -> Order {
        let now = Utc::now();
        let provider_data = self.provider_data.or_else(|| {
            self.unified_status.map(|status| DeliveryProviderData {
                unified_status: Some(status),
                ..Default::default()
            })
        });
        Order {
            id: self.id,
            status: self.status,
            price: "500.00".to_string(),
            date_created: now - Duration::days(self.age_days),
            date_modified: now - Duration::days(self.modified_days),
            delivery_address: "Kyiv, branch 17".to_string(),
            delivery_option: DeliveryProvider {
                id: self.provider_id,
                name: format!("provider-{}", self.provider_id),
                kind_raw: None,
                comment: None,
                enabled: Some(true),
            },
            payment_option: self.payment_option_id.map(|id| PaymentOption {
                id,
                name: format!("option-{id}"),
                description: None,
            }),
            client: Client {
                id: 1,
                first_name: Some("Olha".to_string()),
                last_name: Some("K".to_string()),
                phone: Some("+380000000000".to_string()),
            },
            client_notes: None,
            delivery_provider_data: provider_data,
            payment_data: self.payment_status.map(|status| PaymentData {
                kind: None,
                status: Some(status),
                status_modified: None,
            }),
        }
    }
}

/// Marketplace mock: canned listings per status, recorded mutations,
/// optional auth failure injection.
#[derive(Default)]
pub struct MockApi {
    listings: Mutex<HashMap<OrderStatus, Vec<Order>>>,
    mutations: Mutex<Vec<(i64, OrderStatus, Option<CancellationReason>)>>,
    fail_listing_auth: Mutex<HashMap<OrderStatus, bool>>,
}

impl MockApi {
    pub fn set_listing(&self, status: OrderStatus, orders: Vec<Order>) {
        self.listings.lock().unwrap().insert(status, orders);
    }

    pub fn fail_listing_with_auth(&self, status: OrderStatus) {
        self.fail_listing_auth.lock().unwrap().insert(status, true);
    }

    pub fn mutations(&self) -> Vec<(i64, OrderStatus)> {
        self.mutations
            .lock()
            .unwrap()
            .iter()
            .map(|(id, status, _)| (*id, *status))
            .collect()
    }

    pub fn cancellation_reasons(&self) -> Vec<CancellationReason> {
        self.mutations
            .lock()
            .unwrap()
            .iter()
            .filter_map(|(_, _, reason)| *reason)
            .collect()
    }
}

#[async_trait]
impl MarketplaceApi for MockApi {
    async fn list_orders(
        &self,
        status: OrderStatus,
        _cursor: Option<&str>,
    ) -> Result<Vec<Order>, ApiError> {
        if self
            .fail_listing_auth
            .lock()
            .unwrap()
            .get(&status)
            .copied()
            .unwrap_or(false)
        {
            return Err(ApiError::Unauthorized);
        }
        Ok(self
            .listings
            .lock()
            .unwrap()
            .get(&status)
            .cloned()
            .unwrap_or_default())
    }

    async fn set_order_status(
        &self,
        order: &Order,
        status: OrderStatus,
        reason: Option<CancellationReason>,
        _text: Option<&str>,
    ) -> Result<(), ApiError> {
        self.mutations
            .lock()
            .unwrap()
            .push((order.id, status, reason));
        Ok(())
    }
}

/// Notifier mock that records every message with its mentions.
#[derive(Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<(String, Vec<String>)>>,
}

impl RecordingNotifier {
    pub fn sent(&self) -> Vec<(String, Vec<String>)> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send(&self, text: &str, mentions: &[String]) -> Result<(), NotifyError> {
        self.sent
            .lock()
            .unwrap()
            .push((text.to_string(), mentions.to_vec()));
        Ok(())
    }
}

enum StubScrape {
    Ok(Declaration),
    MissingField(String),
    Warehouse(String),
    OutdatedCookies,
}

/// Scraper stub with a fixed behavior per instance.
pub struct StubScraper {
    behavior: StubScrape,
}

impl StubScraper {
    pub fn ok(number: &str, cost: Option<f64>) -> Self {
        Self {
            behavior: StubScrape::Ok(Declaration {
                id: None,
                number: number.to_string(),
                cost,
            }),
        }
    }

    pub fn missing_field(field: &str) -> Self {
        Self {
            behavior: StubScrape::MissingField(field.to_string()),
        }
    }

    pub fn warehouse_rejected(detail: &str) -> Self {
        Self {
            behavior: StubScrape::Warehouse(detail.to_string()),
        }
    }

    pub fn outdated_cookies() -> Self {
        Self {
            behavior: StubScrape::OutdatedCookies,
        }
    }
}

#[async_trait]
impl DeclarationScraper for StubScraper {
    async fn generate_declaration(&self, _order: &Order) -> Result<Declaration, ScrapeError> {
        match &self.behavior {
            StubScrape::Ok(declaration) => Ok(declaration.clone()),
            StubScrape::MissingField(field) => Err(ScrapeError::MissingField(field.clone())),
            StubScrape::Warehouse(detail) => Err(ScrapeError::WarehouseRejected(detail.clone())),
            StubScrape::OutdatedCookies => Err(ScrapeError::OutdatedCookies),
        }
    }
}

/// In-memory snapshot store recording every replacement.
#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<TrackingTables>,
    replacements: Mutex<Vec<TrackedStatus>>,
}

impl MemoryStore {
    pub fn table(&self, status: TrackedStatus) -> TrackingTable {
        self.tables.lock().unwrap().table(status).clone()
    }

    pub fn replacements(&self) -> Vec<TrackedStatus> {
        self.replacements.lock().unwrap().clone()
    }
}

#[async_trait]
impl TrackingStore for MemoryStore {
    async fn load(&self) -> Result<TrackingTables, StoreError> {
        Ok(self.tables.lock().unwrap().clone())
    }

    async fn replace(
        &self,
        status: TrackedStatus,
        table: &TrackingTable,
    ) -> Result<(), StoreError> {
        self.tables.lock().unwrap().set(status, table.clone());
        self.replacements.lock().unwrap().push(status);
        Ok(())
    }
}
