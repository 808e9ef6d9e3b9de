use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use shopsync_shared::{TrackedStatus, TrackingTable};

#[derive(Debug, thiserror::Error)]
#[error("tracking store failure: {0}")]
pub struct StoreError(pub String);

/// Both persisted tables, loaded together at the start of a run.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct TrackingTables {
    #[serde(default)]
    pub paid: TrackingTable,
    #[serde(default)]
    pub pending: TrackingTable,
}

impl TrackingTables {
    pub fn table(&self, status: TrackedStatus) -> &TrackingTable {
        match status {
            TrackedStatus::Paid => &self.paid,
            TrackedStatus::Pending => &self.pending,
        }
    }

    pub fn set(&mut self, status: TrackedStatus, table: TrackingTable) {
        match status {
            TrackedStatus::Paid => self.paid = table,
            TrackedStatus::Pending => self.pending = table,
        }
    }
}

/// Snapshot persistence for the two tracking tables. Replacement is
/// all-or-nothing per status category; there are no partial-record updates.
#[async_trait]
pub trait TrackingStore: Send + Sync {
    async fn load(&self) -> Result<TrackingTables, StoreError>;

    async fn replace(
        &self,
        status: TrackedStatus,
        table: &TrackingTable,
    ) -> Result<(), StoreError>;
}
