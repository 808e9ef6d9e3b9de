use std::path::{Path, PathBuf};

use async_trait::async_trait;

use shopsync_core::store::{StoreError, TrackingStore, TrackingTables};
use shopsync_shared::{TrackedStatus, TrackingTable};

/// Tracking-table persistence as a single pretty-printed JSON document.
/// Writes go through a sibling temp file and a rename so a crash mid-write
/// never leaves a truncated snapshot behind.
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self.path.file_name().unwrap_or_default().to_os_string();
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    async fn read_tables(path: &Path) -> Result<TrackingTables, StoreError> {
        match tokio::fs::read(path).await {
            Ok(bytes) => serde_json::from_slice(&bytes)
                .map_err(|err| StoreError(format!("snapshot is not valid JSON: {err}"))),
            // First run: no snapshot yet.
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                Ok(TrackingTables::default())
            }
            Err(err) => Err(StoreError(format!("failed to read snapshot: {err}"))),
        }
    }

    async fn write_tables(&self, tables: &TrackingTables) -> Result<(), StoreError> {
        let body = serde_json::to_vec_pretty(tables)
            .map_err(|err| StoreError(format!("failed to encode snapshot: {err}")))?;
        let temp = self.temp_path();
        tokio::fs::write(&temp, body)
            .await
            .map_err(|err| StoreError(format!("failed to write snapshot: {err}")))?;
        tokio::fs::rename(&temp, &self.path)
            .await
            .map_err(|err| StoreError(format!("failed to move snapshot into place: {err}")))
    }
}

#[async_trait]
impl TrackingStore for JsonFileStore {
    async fn load(&self) -> Result<TrackingTables, StoreError> {
        Self::read_tables(&self.path).await
    }

    async fn replace(
        &self,
        status: TrackedStatus,
        table: &TrackingTable,
    ) -> Result<(), StoreError> {
        let mut tables = Self::read_tables(&self.path).await?;
        tables.set(status, table.clone());
        self.write_tables(&tables).await
    }
}
