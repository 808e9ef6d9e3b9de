use serde::{Deserialize, Serialize};

/// Delivery option attached to an order. Like payment options these are
/// shop-scoped marketplace records identified by id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliveryProvider {
    pub id: i64,
    pub name: String,
    #[serde(rename = "type", default)]
    pub kind_raw: Option<String>,
    #[serde(default)]
    pub comment: Option<String>,
    #[serde(default)]
    pub enabled: Option<bool>,
}

impl PartialEq for DeliveryProvider {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for DeliveryProvider {}

impl std::fmt::Display for DeliveryProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.name)
    }
}

/// Carriers the dispatch layer knows how to drive. Justin is kept in the
/// lookup although its portal integration was never enabled; it dispatches
/// to the fallback manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderKind {
    NovaPoshta,
    Pickup,
    UkrPoshta,
    Rozetka,
    Meest,
    Justin,
}

impl ProviderKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::NovaPoshta => "nova_poshta",
            ProviderKind::Pickup => "pickup",
            ProviderKind::UkrPoshta => "ukrposhta",
            ProviderKind::Rozetka => "rozetka_delivery",
            ProviderKind::Meest => "meest",
            ProviderKind::Justin => "justin",
        }
    }

    /// Carriers whose plain "delivered" status is trustworthy enough to
    /// finalize an order without a cash-collection confirmation.
    pub fn confirms_delivery(&self) -> bool {
        matches!(
            self,
            ProviderKind::Meest | ProviderKind::UkrPoshta | ProviderKind::NovaPoshta
        )
    }
}

impl DeliveryProvider {
    pub fn kind(&self) -> Option<ProviderKind> {
        match self.id {
            9_062_118 => Some(ProviderKind::NovaPoshta),
            9_062_114 => Some(ProviderKind::Pickup),
            9_776_215 => Some(ProviderKind::UkrPoshta),
            15_330_563 => Some(ProviderKind::Rozetka),
            12_799_845 => Some(ProviderKind::Meest),
            12_799_844 => Some(ProviderKind::Justin),
            _ => None,
        }
    }
}

/// Carrier-agnostic delivery status normalized by the marketplace. The wire
/// codes come from the carrier bridge; anything unrecognized passes through
/// as `Other` and never matches a finalization branch.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryStatus {
    Delivered,
    /// Delivered, cash transfer still on its way to the seller.
    #[serde(rename = "delivered_cash_cruise")]
    DeliveredCashPending,
    /// Delivered, cash transfer handed out.
    #[serde(rename = "delivered_cash_received")]
    DeliveredCashSettled,
    Rejected,
    Returned,
    InTransit,
    #[serde(other)]
    Other,
}

impl DeliveryStatus {
    pub fn title(&self) -> &'static str {
        match self {
            DeliveryStatus::Delivered => "Delivered",
            DeliveryStatus::DeliveredCashPending => "Delivered, cash transfer pending",
            DeliveryStatus::DeliveredCashSettled => "Delivered, cash transfer settled",
            DeliveryStatus::Rejected => "Recipient refused the parcel",
            DeliveryStatus::Returned => "Returned to sender",
            DeliveryStatus::InTransit => "In transit",
            DeliveryStatus::Other => "Unknown",
        }
    }

    pub fn cash_collected(&self) -> bool {
        matches!(
            self,
            DeliveryStatus::DeliveredCashPending | DeliveryStatus::DeliveredCashSettled
        )
    }
}

impl std::fmt::Display for DeliveryStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.title())
    }
}

/// Carrier-specific sub-record the marketplace attaches once a shipment
/// exists or the carrier bridge reported progress.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct DeliveryProviderData {
    #[serde(default)]
    pub provider: Option<String>,
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub sender_warehouse_id: Option<String>,
    #[serde(default)]
    pub recipient_warehouse_id: Option<String>,
    #[serde(default)]
    pub declaration_number: Option<String>,
    #[serde(default)]
    pub unified_status: Option<DeliveryStatus>,
}

/// Carrier-issued shipment document. Its existence marks the order as ready
/// for physical dispatch; regenerating one is unsafe.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Declaration {
    pub id: Option<String>,
    pub number: String,
    pub cost: Option<f64>,
}
