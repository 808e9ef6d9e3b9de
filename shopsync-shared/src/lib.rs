pub mod models;
pub mod tracking;

pub use models::client::Client;
pub use models::delivery::{
    Declaration, DeliveryProvider, DeliveryProviderData, DeliveryStatus, ProviderKind,
};
pub use models::order::Order;
pub use models::payment::{PaymentData, PaymentOption, PaymentOptionKind, PaymentStatus};
pub use models::status::{CancellationReason, OrderStatus};
pub use tracking::{TrackedStatus, TrackingRecord, TrackingTable};
