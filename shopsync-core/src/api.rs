use async_trait::async_trait;

use shopsync_shared::{CancellationReason, Order, OrderStatus};

/// Errors surfaced by the marketplace API. Transport and auth failures are
/// kept distinct from an empty listing, and decode failures are kept
/// distinct from transport: a payload that no longer fits the snapshot
/// schema must kill the run, not hide behind a retry.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("marketplace rejected the API credentials")]
    Unauthorized,

    #[error("marketplace request failed: {0}")]
    Transport(String),

    #[error("marketplace payload did not match the order schema: {0}")]
    Decode(String),
}

/// Marketplace REST surface the engine depends on.
#[async_trait]
pub trait MarketplaceApi: Send + Sync {
    /// List all orders currently sitting in `status`. The optional cursor
    /// narrows the listing (used by the received-status pass); `None` means
    /// the full page window.
    async fn list_orders(
        &self,
        status: OrderStatus,
        cursor: Option<&str>,
    ) -> Result<Vec<Order>, ApiError>;

    /// Mutate an order's remote status. Cancellations carry a reason code
    /// and an optional free-text explanation.
    async fn set_order_status(
        &self,
        order: &Order,
        status: OrderStatus,
        reason: Option<CancellationReason>,
        text: Option<&str>,
    ) -> Result<(), ApiError>;
}

/// Deep link into the marketplace seller console, appended to every
/// notification so an operator can jump straight to the order.
pub fn order_console_url(order_id: i64) -> String {
    format!("https://my.prom.ua/cms/order/edit/{order_id}")
}
