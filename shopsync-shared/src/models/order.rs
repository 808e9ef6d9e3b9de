use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::models::client::Client;
use crate::models::delivery::{DeliveryProvider, DeliveryProviderData, DeliveryStatus};
use crate::models::payment::{PaymentData, PaymentOption, PaymentStatus};
use crate::models::status::OrderStatus;

/// One marketplace order at the moment it was fetched. Treated as an entity
/// reference: two snapshots are equal iff their ids match, whatever the rest
/// of the fields say. Managers never mutate a snapshot in place; they return
/// an updated copy via [`Order::with_status`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: i64,
    pub status: OrderStatus,
    pub price: String,
    pub date_created: DateTime<Utc>,
    pub date_modified: DateTime<Utc>,
    #[serde(default)]
    pub delivery_address: String,
    pub delivery_option: DeliveryProvider,
    #[serde(default)]
    pub payment_option: Option<PaymentOption>,
    pub client: Client,
    #[serde(default)]
    pub client_notes: Option<String>,
    #[serde(default)]
    pub delivery_provider_data: Option<DeliveryProviderData>,
    #[serde(default)]
    pub payment_data: Option<PaymentData>,
}

impl Order {
    /// Age of the order itself, from creation.
    pub fn age(&self, now: DateTime<Utc>) -> Duration {
        now - self.date_created
    }

    /// Time since the marketplace last touched the order. Staleness is
    /// judged against this, not against creation.
    pub fn modified_age(&self, now: DateTime<Utc>) -> Duration {
        now - self.date_modified
    }

    pub fn with_status(mut self, status: OrderStatus) -> Self {
        self.status = status;
        self
    }

    pub fn declaration_number(&self) -> Option<&str> {
        self.delivery_provider_data
            .as_ref()
            .and_then(|data| data.declaration_number.as_deref())
    }

    pub fn unified_status(&self) -> Option<DeliveryStatus> {
        self.delivery_provider_data
            .as_ref()
            .and_then(|data| data.unified_status)
    }

    pub fn payment_status(&self) -> Option<PaymentStatus> {
        self.payment_data.as_ref().and_then(|data| data.status)
    }

    /// Short human-readable reference used as the first line of every
    /// notification.
    pub fn summary(&self) -> String {
        format!(
            "{} ({}): {} from {}",
            self.id,
            self.date_created.date_naive(),
            self.price,
            self.client,
        )
    }
}

impl PartialEq for Order {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Order {}

impl std::fmt::Display for Order {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.summary())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample_json() -> serde_json::Value {
        serde_json::json!({
            "id": 100,
            "status": "received",
            "price": "1250.00",
            "date_created": "2026-08-01T10:00:00Z",
            "date_modified": "2026-08-20T10:00:00Z",
            "delivery_address": "Kyiv, branch 17",
            "delivery_option": {"id": 9062118, "name": "Nova Poshta"},
            "payment_option": {"id": 8768054, "name": "Cash on delivery"},
            "client": {"id": 7, "first_name": "Olha", "last_name": "K", "phone": "+380000000000"},
            "client_notes": "call ahead",
            "delivery_provider_data": {
                "provider": "nova_poshta",
                "declaration_number": "2040",
                "unified_status": "delivered_cash_received"
            },
            "payment_data": {"type": "cod", "status": "paid"}
        })
    }

    #[test]
    fn decodes_full_listing_entry() {
        let order: Order = serde_json::from_value(sample_json()).unwrap();
        assert_eq!(order.id, 100);
        assert_eq!(order.status, OrderStatus::Received);
        assert_eq!(order.declaration_number(), Some("2040"));
        assert_eq!(
            order.unified_status(),
            Some(DeliveryStatus::DeliveredCashSettled)
        );
        assert!(order.payment_option.unwrap().is_cash_on_delivery());
    }

    #[test]
    fn decode_fails_on_unknown_status_code() {
        let mut payload = sample_json();
        payload["status"] = serde_json::json!("quarantined");
        assert!(serde_json::from_value::<Order>(payload).is_err());
    }

    #[test]
    fn orders_are_equal_by_id_only() {
        let a: Order = serde_json::from_value(sample_json()).unwrap();
        let mut b = a.clone();
        b.price = "999.00".to_string();
        b.status = OrderStatus::Canceled;
        assert_eq!(a, b);
    }

    #[test]
    fn ages_derive_from_the_right_timestamps() {
        let order: Order = serde_json::from_value(sample_json()).unwrap();
        let now = Utc.with_ymd_and_hms(2026, 8, 29, 10, 0, 0).unwrap();
        assert_eq!(order.age(now).num_days(), 28);
        assert_eq!(order.modified_age(now).num_days(), 9);
    }
}
