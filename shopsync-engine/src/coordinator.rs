use std::collections::HashSet;
use std::sync::Arc;

use chrono::Utc;

use shopsync_core::api::MarketplaceApi;
use shopsync_core::notify::Notifier;
use shopsync_core::store::TrackingStore;
use shopsync_shared::{Order, OrderStatus, TrackedStatus, TrackingRecord, TrackingTable};

use crate::engine::OrderEngine;
use crate::outcome::{Blocker, RefreshOutcome, RunError};
use crate::report;

/// Per-run counters, mostly for the closing log line.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub refreshed: usize,
    pub blocked: usize,
    pub retried: usize,
    pub escalated: usize,
    pub carried: usize,
}

/// Run-level loop: pulls each status listing, applies the order engine with
/// the notification-suppression and retry rules, and replaces the persisted
/// tracking snapshots.
pub struct Coordinator {
    api: Arc<dyn MarketplaceApi>,
    engine: OrderEngine,
    notifier: Arc<dyn Notifier>,
    store: Arc<dyn TrackingStore>,
    admins: Vec<String>,
    received_cursor: Option<String>,
}

impl Coordinator {
    pub fn new(
        api: Arc<dyn MarketplaceApi>,
        engine: OrderEngine,
        notifier: Arc<dyn Notifier>,
        store: Arc<dyn TrackingStore>,
        admins: Vec<String>,
        received_cursor: Option<String>,
    ) -> Self {
        Self {
            api,
            engine,
            notifier,
            store,
            admins,
            received_cursor,
        }
    }

    /// One full reconciliation pass. A non-empty `allowlist` restricts the
    /// run to those order ids and re-selects them even when already
    /// tracked (manual re-run mode).
    ///
    /// On a fatal error the in-progress status category is discarded;
    /// categories persisted earlier in the same run stay persisted.
    pub async fn refresh_shop(&self, allowlist: &[i64]) -> Result<RunSummary, RunError> {
        tracing::info!("refreshing shop data");
        let mut tables = self.store.load().await?;
        let mut summary = RunSummary::default();

        // Received orders are reconciled but never remembered: the pass
        // exists to finalize or cancel shipments already in flight.
        let listing = self
            .api
            .list_orders(OrderStatus::Received, self.received_cursor.as_deref())
            .await?;
        self.process_listing(listing, &TrackingTable::new(), allowlist, &mut summary)
            .await?;

        for status in [TrackedStatus::Paid, TrackedStatus::Pending] {
            let listing = self.api.list_orders(status.order_status(), None).await?;
            let next = self
                .process_listing(listing, tables.table(status), allowlist, &mut summary)
                .await?;
            // Whole-snapshot replacement, only after the category finished.
            self.store.replace(status, &next).await?;
            tables.set(status, next);
        }

        tracing::info!(
            refreshed = summary.refreshed,
            blocked = summary.blocked,
            retried = summary.retried,
            escalated = summary.escalated,
            carried = summary.carried,
            "shop refresh finished"
        );
        Ok(summary)
    }

    async fn process_listing(
        &self,
        listing: Vec<Order>,
        prior: &TrackingTable,
        allowlist: &[i64],
        summary: &mut RunSummary,
    ) -> Result<TrackingTable, RunError> {
        let mut next = TrackingTable::new();
        let mut retry: HashSet<String> = HashSet::new();

        for order in listing {
            if !allowlist.is_empty() && !allowlist.contains(&order.id) {
                continue;
            }

            let key = order.id.to_string();
            let known = prior.get(&key);
            let reselected = allowlist.contains(&order.id);
            let record = TrackingRecord::from_order(&order, Utc::now());

            if let Some(previous) = known {
                if !reselected {
                    // Already reported or resolved on an earlier run; keep
                    // the snapshot fresh but the attempt timestamp intact.
                    next.insert(key, record.with_ts(previous.ts));
                    summary.carried += 1;
                    continue;
                }
            }

            let initial = known.is_none();
            match self.engine.refresh_order(order, initial).await? {
                RefreshOutcome::Refreshed(order) => {
                    summary.refreshed += 1;
                    tracing::debug!(order = order.id, status = %order.status, "order refreshed");
                }
                RefreshOutcome::Blocked { order, blocker } => {
                    summary.blocked += 1;
                    match blocker {
                        Blocker::Stale => {
                            tracing::info!(order = order.id, "ignoring stale order");
                        }
                        Blocker::UnknownFinalization => {
                            tracing::error!(
                                order = order.id,
                                "no known finalization path for received order"
                            );
                        }
                        _ => {
                            tracing::info!(
                                order = order.id,
                                reason = blocker.reason(),
                                "order blocked"
                            );
                        }
                    }
                    if initial && blocker.notifies() {
                        self.notify(&report::blocked(&order, blocker), &[]).await;
                    }
                }
                RefreshOutcome::RetryDeclaration { order, detail } => {
                    summary.retried += 1;
                    retry.insert(order.id.to_string());
                    tracing::warn!(
                        order = order.id,
                        %detail,
                        "declaration generation failed; order will be retried next run"
                    );
                    if initial {
                        self.notify(&report::declaration_failed(&order), &[]).await;
                    }
                }
                RefreshOutcome::Escalate { order, detail } => {
                    summary.escalated += 1;
                    tracing::warn!(order = order.id, %detail, "carrier refused the shipment");
                    if initial {
                        self.notify(&report::escalation(&order, &detail), &self.admins)
                            .await;
                    }
                }
            }

            next.insert(key, record);
        }

        // Retried orders are kept out of the snapshot so the next run sees
        // them as fresh and attempts them again.
        next.retain(|key, _| !retry.contains(key));
        Ok(next)
    }

    async fn notify(&self, text: &str, mentions: &[String]) {
        tracing::info!("sending message to the chat:\n{text}");
        if let Err(err) = self.notifier.send(text, mentions).await {
            tracing::warn!(%err, "notification delivery failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::director::Director;
    use crate::testutil::{MemoryStore, MockApi, OrderFixture, RecordingNotifier, StubScraper};
    use shopsync_core::scrape::DeclarationScraper;
    use shopsync_shared::{DeliveryStatus, ProviderKind};
    use std::collections::HashMap;

    struct Harness {
        api: Arc<MockApi>,
        notifier: Arc<RecordingNotifier>,
        store: Arc<MemoryStore>,
        coordinator: Coordinator,
    }

    fn harness(scraper: StubScraper) -> Harness {
        let api = Arc::new(MockApi::default());
        let notifier = Arc::new(RecordingNotifier::default());
        let store = Arc::new(MemoryStore::default());
        let mut scrapers: HashMap<ProviderKind, Arc<dyn DeclarationScraper>> = HashMap::new();
        scrapers.insert(ProviderKind::NovaPoshta, Arc::new(scraper));
        let engine = OrderEngine::new(Director::new(api.clone(), notifier.clone(), scrapers));
        let coordinator = Coordinator::new(
            api.clone(),
            engine,
            notifier.clone(),
            store.clone(),
            vec!["+380111111111".to_string()],
            None,
        );
        Harness {
            api,
            notifier,
            store,
            coordinator,
        }
    }

    fn pending_installments_order(id: i64) -> shopsync_shared::Order {
        OrderFixture::new(id)
            .status(OrderStatus::Pending)
            .age_days(10)
            .payment_option_id(10_061_095)
            .build()
    }

    #[tokio::test]
    async fn blocked_order_notifies_once_and_keeps_ts_on_repeat() {
        let h = harness(StubScraper::ok("1", None));
        h.api
            .set_listing(OrderStatus::Pending, vec![pending_installments_order(200)]);

        h.coordinator.refresh_shop(&[]).await.unwrap();
        assert_eq!(h.notifier.sent().len(), 1);
        let first_ts = h.store.table(TrackedStatus::Pending)["200"].ts;

        // Same upstream state, second run: no new notification, ts intact.
        h.api
            .set_listing(OrderStatus::Pending, vec![pending_installments_order(200)]);
        h.coordinator.refresh_shop(&[]).await.unwrap();
        assert_eq!(h.notifier.sent().len(), 1);
        assert_eq!(h.store.table(TrackedStatus::Pending)["200"].ts, first_ts);
    }

    #[tokio::test]
    async fn two_identical_runs_produce_identical_tables() {
        let h = harness(StubScraper::ok("1", None));
        let orders = vec![
            pending_installments_order(1),
            pending_installments_order(2),
        ];
        h.api.set_listing(OrderStatus::Pending, orders.clone());

        h.coordinator.refresh_shop(&[]).await.unwrap();
        let first = h.store.table(TrackedStatus::Pending);

        h.api.set_listing(OrderStatus::Pending, orders);
        h.coordinator.refresh_shop(&[]).await.unwrap();
        let second = h.store.table(TrackedStatus::Pending);

        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn declaration_failure_is_retried_as_fresh_next_run() {
        let h = harness(StubScraper::missing_field("city_ref"));
        let order = OrderFixture::new(300)
            .status(OrderStatus::Paid)
            .payment_option_id(8_768_054)
            .build();
        h.api.set_listing(OrderStatus::Paid, vec![order.clone()]);

        h.coordinator.refresh_shop(&[]).await.unwrap();
        // Quarantined: absent from the snapshot, failure announced once.
        assert!(!h.store.table(TrackedStatus::Paid).contains_key("300"));
        assert_eq!(h.notifier.sent().len(), 1);

        // Next run recomputes initial = true and re-sends the notification.
        h.api.set_listing(OrderStatus::Paid, vec![order]);
        h.coordinator.refresh_shop(&[]).await.unwrap();
        assert_eq!(h.notifier.sent().len(), 2);
    }

    #[tokio::test]
    async fn stale_orders_are_logged_but_never_notified() {
        let h = harness(StubScraper::ok("1", None));
        let order = OrderFixture::new(400)
            .status(OrderStatus::Paid)
            .age_days(20)
            .modified_days_ago(9)
            .build();
        h.api.set_listing(OrderStatus::Paid, vec![order]);

        h.coordinator.refresh_shop(&[]).await.unwrap();
        assert!(h.notifier.sent().is_empty());
        // Still tracked: it stays visible upstream until it ages out.
        assert!(h.store.table(TrackedStatus::Paid).contains_key("400"));
    }

    #[tokio::test]
    async fn unknown_finalization_is_logged_without_notification() {
        let h = harness(StubScraper::ok("1", None));
        // Delivered via a carrier whose plain "delivered" is not trusted:
        // no finalization branch applies.
        let order = OrderFixture::new(600)
            .status(OrderStatus::Received)
            .provider_id(15_330_563)
            .payment_option_id(5_001_721)
            .unified_status(DeliveryStatus::Delivered)
            .build();
        h.api.set_listing(OrderStatus::Received, vec![order]);

        h.coordinator.refresh_shop(&[]).await.unwrap();
        assert!(h.notifier.sent().is_empty());
        assert!(h.api.mutations().is_empty());
    }

    #[tokio::test]
    async fn escalation_goes_to_the_admins() {
        let h = harness(StubScraper::warehouse_rejected("warehouse not permitted"));
        let order = OrderFixture::new(500)
            .status(OrderStatus::Pending)
            .payment_option_id(8_768_054)
            .build();
        h.api.set_listing(OrderStatus::Pending, vec![order]);

        h.coordinator.refresh_shop(&[]).await.unwrap();
        let sent = h.notifier.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].1, vec!["+380111111111".to_string()]);
        assert!(sent[0].0.contains("warehouse not permitted"));
    }

    #[tokio::test]
    async fn finalized_cod_order_notifies_with_delivered_status() {
        let h = harness(StubScraper::ok("1", None));
        let order = OrderFixture::new(100)
            .status(OrderStatus::Received)
            .payment_option_id(8_768_054)
            .unified_status(DeliveryStatus::DeliveredCashSettled)
            .build();
        h.api.set_listing(OrderStatus::Received, vec![order]);

        h.coordinator.refresh_shop(&[]).await.unwrap();
        assert_eq!(h.api.mutations(), vec![(100, OrderStatus::Delivered)]);
        let sent = h.notifier.sent();
        assert_eq!(sent.len(), 1);
        assert!(sent[0].0.contains("delivered"));
    }

    #[tokio::test]
    async fn auth_failure_aborts_without_persisting_the_unfinished_status() {
        let h = harness(StubScraper::ok("1", None));
        h.api
            .set_listing(OrderStatus::Paid, vec![pending_installments_order(1)]);
        h.api.fail_listing_with_auth(OrderStatus::Pending);

        let err = h.coordinator.refresh_shop(&[]).await.unwrap_err();
        assert!(matches!(err, RunError::CredentialsExpired));
        // The paid pass finished and was persisted; pending was not.
        assert_eq!(h.store.replacements(), vec![TrackedStatus::Paid]);
    }

    #[tokio::test]
    async fn allowlist_reselects_known_orders_without_renotifying() {
        let h = harness(StubScraper::ok("1", None));
        h.api
            .set_listing(OrderStatus::Pending, vec![pending_installments_order(200)]);
        h.coordinator.refresh_shop(&[]).await.unwrap();
        assert_eq!(h.notifier.sent().len(), 1);

        // Manual re-run of a tracked order: processed again, but initial is
        // false so the blocking condition stays quiet.
        h.api
            .set_listing(OrderStatus::Pending, vec![pending_installments_order(200)]);
        h.coordinator.refresh_shop(&[200]).await.unwrap();
        assert_eq!(h.notifier.sent().len(), 1);
    }
}
