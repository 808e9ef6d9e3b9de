//! Provider managers: one capability trait, a shared baseline, and a closed
//! set of variants composed on top of it. The baseline owns the
//! cancellation hook every variant runs first; carrier variants add the
//! declaration-generation continuation.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Duration, Utc};

use shopsync_core::api::MarketplaceApi;
use shopsync_core::notify::Notifier;
use shopsync_core::scrape::DeclarationScraper;
use shopsync_shared::{
    CancellationReason, Declaration, DeliveryStatus, Order, OrderStatus, PaymentOptionKind,
    PaymentStatus, ProviderKind,
};

use crate::outcome::{Blocker, ProcessError};
use crate::report;

/// Orders older than this with a dead-end delivery or payment state get
/// canceled remotely.
const CANCELLATION_AGE_DAYS: i64 = 60;

/// Orders untouched by the marketplace for longer than this are considered
/// stale and silently dropped from automatic processing.
const STALE_AGE_DAYS: i64 = 7;

/// Fulfillment capability of one delivery provider.
#[async_trait]
pub trait ProviderManager: Send + Sync {
    /// Drive the order one step forward. `initial` is true the first time
    /// this run's status pass observes the order.
    async fn process_order(&self, order: Order, initial: bool) -> Result<Order, ProcessError>;

    /// Fallback managers make no carrier progress; the engine surfaces a
    /// first sighting of one as an unsupported delivery provider.
    fn is_fallback(&self) -> bool {
        false
    }
}

/// Shared baseline behavior: remote status mutations, success
/// notifications, and the cancellation hook.
#[derive(Clone)]
pub struct Baseline {
    api: Arc<dyn MarketplaceApi>,
    notifier: Arc<dyn Notifier>,
}

impl Baseline {
    pub fn new(api: Arc<dyn MarketplaceApi>, notifier: Arc<dyn Notifier>) -> Self {
        Self { api, notifier }
    }

    /// Announce a successful transition. Best-effort: delivery failures are
    /// logged and never abort processing.
    pub async fn notify(&self, order: &Order, declaration: Option<&Declaration>) {
        let text = report::refreshed(order, declaration);
        tracing::info!(order = order.id, "sending message to the chat");
        if let Err(err) = self.notifier.send(&text, &[]).await {
            tracing::warn!(order = order.id, %err, "notification delivery failed");
        }
    }

    /// Accept the order remotely. Pending and paid orders move to
    /// "received"; anything else passes through untouched.
    pub async fn receive(&self, order: Order) -> Result<Order, ProcessError> {
        if !matches!(order.status, OrderStatus::Pending | OrderStatus::Paid) {
            return Ok(order);
        }
        self.api
            .set_order_status(&order, OrderStatus::Received, None, None)
            .await?;
        Ok(order.with_status(OrderStatus::Received))
    }

    pub async fn cancel(
        &self,
        order: Order,
        reason: CancellationReason,
        text: Option<&str>,
    ) -> Result<Order, ProcessError> {
        self.api
            .set_order_status(&order, OrderStatus::Canceled, Some(reason), text)
            .await?;
        Ok(order.with_status(OrderStatus::Canceled))
    }

    pub async fn finalize(&self, order: Order) -> Result<Order, ProcessError> {
        self.api
            .set_order_status(&order, OrderStatus::Delivered, None, None)
            .await?;
        Ok(order.with_status(OrderStatus::Delivered))
    }

    /// The shared per-order state machine every manager runs before its own
    /// logic. Either terminates the order (cancel/finalize), blocks it, or
    /// passes it through unchanged for the carrier continuation.
    pub async fn cancellation_hook(&self, order: Order) -> Result<Order, ProcessError> {
        tracing::debug!(order = order.id, "checking if order can be canceled");
        let now = Utc::now();

        if order.status.is_terminal() {
            return Err(ProcessError::Blocked(Blocker::NotAllowedStatus));
        }

        let past_cancellation_age = order.age(now) > Duration::days(CANCELLATION_AGE_DAYS);

        if past_cancellation_age {
            if let Some(
                status @ (DeliveryStatus::Returned | DeliveryStatus::Rejected),
            ) = order.unified_status()
            {
                let order = self
                    .cancel(order, CancellationReason::Another, Some(status.title()))
                    .await?;
                self.notify(&order, None).await;
                return Ok(order);
            }

            if order.payment_status() == Some(PaymentStatus::Refunded) {
                let order = self
                    .cancel(
                        order,
                        CancellationReason::Another,
                        Some(PaymentStatus::Refunded.title()),
                    )
                    .await?;
                self.notify(&order, None).await;
                return Ok(order);
            }
        }

        if order.status == OrderStatus::Pending
            && order
                .payment_option
                .as_ref()
                .is_some_and(|option| option.is_deferred())
        {
            if past_cancellation_age {
                let order = self
                    .cancel(order, CancellationReason::PaymentNotReceived, None)
                    .await?;
                self.notify(&order, None).await;
                return Ok(order);
            }
            return Err(ProcessError::Blocked(Blocker::IncompletePayment));
        }

        if order.status == OrderStatus::Received && finalizable(&order) {
            let order = self.finalize(order).await?;
            self.notify(&order, None).await;
            return Ok(order);
        }

        if order.modified_age(now) > Duration::days(STALE_AGE_DAYS) {
            return Err(ProcessError::Blocked(Blocker::Stale));
        }

        if order.status == OrderStatus::Received {
            return Err(ProcessError::Blocked(Blocker::UnknownFinalization));
        }

        Ok(order)
    }
}

/// A received order can be finalized when its payment does not hinge on a
/// pending carrier COD confirmation and the carrier reported the parcel as
/// handed over (cash collected, or plain delivered via a carrier whose
/// delivered status is trustworthy).
fn finalizable(order: &Order) -> bool {
    let payment_settled = match &order.payment_option {
        None => true,
        Some(option) => matches!(
            option.kind(),
            Some(
                PaymentOptionKind::Cash
                    | PaymentOptionKind::CashOnDelivery
                    | PaymentOptionKind::CashOnDeliveryLegacy
                    | PaymentOptionKind::CashOnDeliveryCarrier
                    | PaymentOptionKind::Card
                    | PaymentOptionKind::NonCashWithVat
            )
        ),
    };
    if !payment_settled {
        return false;
    }

    let Some(status) = order.unified_status() else {
        return false;
    };

    status.cash_collected()
        || (status == DeliveryStatus::Delivered
            && order
                .delivery_option
                .kind()
                .is_some_and(|kind| kind.confirms_delivery()))
}

/// No-op fallback for unrecognized or disabled delivery providers. Runs the
/// baseline only.
pub struct DummyManager {
    base: Baseline,
}

impl DummyManager {
    pub fn new(base: Baseline) -> Self {
        Self { base }
    }
}

#[async_trait]
impl ProviderManager for DummyManager {
    async fn process_order(&self, order: Order, _initial: bool) -> Result<Order, ProcessError> {
        tracing::info!(order = order.id, "fallback manager is processing order");
        self.base.cancellation_hook(order).await
    }

    fn is_fallback(&self) -> bool {
        true
    }
}

/// Self-pickup: no carrier, no declaration, no payment-option requirement.
/// Accepts the order and announces it.
pub struct PickupManager {
    base: Baseline,
}

impl PickupManager {
    pub fn new(base: Baseline) -> Self {
        Self { base }
    }
}

#[async_trait]
impl ProviderManager for PickupManager {
    async fn process_order(&self, order: Order, _initial: bool) -> Result<Order, ProcessError> {
        tracing::info!(order = order.id, "pickup manager is processing order");
        let order = self.base.cancellation_hook(order).await?;
        if order.status.is_terminal() {
            return Ok(order);
        }
        let order = self.base.receive(order).await?;
        self.base.notify(&order, None).await;
        Ok(order)
    }
}

/// Declaration-generating variant shared by every carrier with a portal
/// scraper (Nova Poshta, Ukrposhta, Rozetka, Meest).
pub struct CarrierManager {
    base: Baseline,
    scraper: Arc<dyn DeclarationScraper>,
    provider: ProviderKind,
}

impl CarrierManager {
    pub fn new(base: Baseline, scraper: Arc<dyn DeclarationScraper>, provider: ProviderKind) -> Self {
        Self {
            base,
            scraper,
            provider,
        }
    }
}

#[async_trait]
impl ProviderManager for CarrierManager {
    async fn process_order(&self, order: Order, _initial: bool) -> Result<Order, ProcessError> {
        tracing::info!(
            order = order.id,
            provider = self.provider.as_str(),
            "carrier manager is processing order"
        );
        let order = self.base.cancellation_hook(order).await?;
        if order.status.is_terminal() {
            return Ok(order);
        }

        if !order
            .payment_option
            .as_ref()
            .is_some_and(|option| option.is_cash_on_delivery())
        {
            return Err(ProcessError::Blocked(Blocker::PaymentOptionDisabled));
        }

        // Regenerating a declaration is unsafe: one already on the order
        // means it is waiting for physical dispatch, not for us.
        if order.declaration_number().is_some() {
            return Err(ProcessError::Blocked(Blocker::ReadyForDelivery));
        }

        tracing::info!(
            order = order.id,
            provider = self.provider.as_str(),
            "generating declaration"
        );
        let declaration = self.scraper.generate_declaration(&order).await?;

        let order = self.base.receive(order).await?;
        self.base.notify(&order, Some(&declaration)).await;
        Ok(order)
    }
}
