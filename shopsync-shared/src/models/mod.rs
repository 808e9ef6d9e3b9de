pub mod client;
pub mod delivery;
pub mod order;
pub mod payment;
pub mod status;
