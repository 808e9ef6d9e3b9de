pub mod coordinator;
pub mod director;
pub mod engine;
pub mod manager;
pub mod outcome;
pub mod report;

pub use coordinator::{Coordinator, RunSummary};
pub use director::Director;
pub use engine::OrderEngine;
pub use manager::{Baseline, CarrierManager, DummyManager, PickupManager, ProviderManager};
pub use outcome::{Blocker, ProcessError, RefreshOutcome, RunError};

#[cfg(test)]
pub(crate) mod testutil;
