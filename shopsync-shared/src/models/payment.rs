use serde::{Deserialize, Serialize};

/// Payment option attached to an order. Options are shop-scoped marketplace
/// records; the fixed id lookup in [`PaymentOption::kind`] classifies the
/// ones the fulfillment logic branches on.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentOption {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

impl PartialEq for PaymentOption {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for PaymentOption {}

impl std::fmt::Display for PaymentOption {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.name)
    }
}

/// Classified payment option. Ids are the shop's live marketplace option
/// records; three distinct cash-on-delivery ids survive from earlier shop
/// configurations and all qualify as COD.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentOptionKind {
    /// Marketplace escrow ("prom" payment): funds held until delivery.
    Escrow,
    /// Bank installments: funds arrive only after the plan is approved.
    Installments,
    CashOnDelivery,
    CashOnDeliveryLegacy,
    CashOnDeliveryCarrier,
    Cash,
    Card,
    NonCashWithVat,
}

impl PaymentOption {
    pub fn kind(&self) -> Option<PaymentOptionKind> {
        match self.id {
            6_943_219 => Some(PaymentOptionKind::Escrow),
            10_061_095 => Some(PaymentOptionKind::Installments),
            8_768_054 => Some(PaymentOptionKind::CashOnDelivery),
            5_001_723 => Some(PaymentOptionKind::CashOnDeliveryLegacy),
            6_146_097 => Some(PaymentOptionKind::CashOnDeliveryCarrier),
            5_001_721 => Some(PaymentOptionKind::Cash),
            5_001_722 => Some(PaymentOptionKind::Card),
            5_018_050 => Some(PaymentOptionKind::NonCashWithVat),
            _ => None,
        }
    }

    /// Deferred options park the order in "pending" until the marketplace
    /// confirms the money actually arrived.
    pub fn is_deferred(&self) -> bool {
        matches!(
            self.kind(),
            Some(PaymentOptionKind::Escrow | PaymentOptionKind::Installments)
        )
    }

    pub fn is_cash_on_delivery(&self) -> bool {
        matches!(
            self.kind(),
            Some(
                PaymentOptionKind::CashOnDelivery
                    | PaymentOptionKind::CashOnDeliveryLegacy
                    | PaymentOptionKind::CashOnDeliveryCarrier
            )
        )
    }
}

/// Unified payment status reported by the marketplace. Codes the lookup does
/// not know collapse to `Undefined` rather than failing the run: payment
/// status is advisory except for the refund branch.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Unpaid,
    Paid,
    PaidOut,
    Refunded,
    #[serde(other)]
    Undefined,
}

impl PaymentStatus {
    pub fn title(&self) -> &'static str {
        match self {
            PaymentStatus::Unpaid => "awaiting payment",
            PaymentStatus::Paid => "paid",
            PaymentStatus::PaidOut => "paid out",
            PaymentStatus::Refunded => "refunded",
            PaymentStatus::Undefined => "undefined",
        }
    }
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.title())
    }
}

/// Payment sub-record present when the order went through an online option.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PaymentData {
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub status: Option<PaymentStatus>,
    #[serde(default)]
    pub status_modified: Option<String>,
}
