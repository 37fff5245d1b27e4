//! In-memory record table for tests and embedded use.

use std::collections::BTreeMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::error::StoreError;
use crate::store::RecordTable;

/// A [`RecordTable`](crate::store::RecordTable) held entirely in memory.
///
/// Keys iterate in sorted order, which keeps test assertions stable.
#[derive(Debug, Default)]
pub struct MemoryTable {
    entries: RwLock<BTreeMap<String, String>>,
}

#[async_trait]
impl RecordTable for MemoryTable {
    async fn get_raw(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn set_raw(&self, key: &str, value: String) -> Result<(), StoreError> {
        self.entries.write().await.insert(key.to_string(), value);
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<bool, StoreError> {
        Ok(self.entries.write().await.remove(key).is_some())
    }

    async fn contains(&self, key: &str) -> Result<bool, StoreError> {
        Ok(self.entries.read().await.contains_key(key))
    }

    async fn entries_raw(&self) -> Result<Vec<(String, String)>, StoreError> {
        Ok(self
            .entries
            .read()
            .await
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect())
    }
}
