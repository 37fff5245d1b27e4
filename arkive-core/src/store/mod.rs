//! Record-table abstraction over a namespaced key-value space.
//!
//! Each logical table (`h:users`, `h:invites`, ...) is a mapping from a
//! string key to a JSON record. The [`RecordTable`] trait keeps the store
//! swappable and mockable; [`RedisTable`] is the production implementation
//! and [`MemoryTable`] backs tests.
//!
//! The trait deliberately exposes only get/set/delete/iterate/contains.
//! There is no conditional-write primitive, so uniqueness checks built on
//! top of it are check-then-act (see the concurrency notes in the crate
//! docs).

mod memory;
mod redis;

pub use self::memory::MemoryTable;
pub use self::redis::{RedisTable, connect};

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Serialize, de::DeserializeOwned};

use crate::error::StoreError;

/// A mapping-like record table keyed by string identifiers.
///
/// Values are raw JSON documents; the [`Table`] wrapper handles typed
/// (de)serialization.
#[async_trait]
pub trait RecordTable: Send + Sync {
    /// Fetch the raw record stored under `key`.
    async fn get_raw(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Store `value` under `key`, overwriting any prior record.
    async fn set_raw(&self, key: &str, value: String) -> Result<(), StoreError>;

    /// Remove the record under `key`; returns whether anything was removed.
    async fn remove(&self, key: &str) -> Result<bool, StoreError>;

    /// Whether a record exists under `key`.
    async fn contains(&self, key: &str) -> Result<bool, StoreError>;

    /// All `(key, raw record)` pairs in the table.
    async fn entries_raw(&self) -> Result<Vec<(String, String)>, StoreError>;
}

/// Typed wrapper over a [`RecordTable`].
#[derive(Clone)]
pub struct Table {
    inner: Arc<dyn RecordTable>,
}

impl fmt::Debug for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Table").finish_non_exhaustive()
    }
}

impl Table {
    /// Wrap a record table.
    pub fn new(inner: Arc<dyn RecordTable>) -> Self {
        Self { inner }
    }

    /// Fetch and deserialize the record under `key`.
    pub async fn get<T: DeserializeOwned>(
        &self,
        key: &str,
    ) -> Result<Option<T>, StoreError> {
        match self.inner.get_raw(key).await? {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    /// Serialize and store `value` under `key`.
    pub async fn set<T: Serialize>(
        &self,
        key: &str,
        value: &T,
    ) -> Result<(), StoreError> {
        let raw = serde_json::to_string(value)?;
        self.inner.set_raw(key, raw).await
    }

    /// Fetch the raw record under `key` without deserializing.
    pub async fn get_raw(&self, key: &str) -> Result<Option<String>, StoreError> {
        self.inner.get_raw(key).await
    }

    /// Store a raw record under `key`.
    pub async fn set_raw(&self, key: &str, value: String) -> Result<(), StoreError> {
        self.inner.set_raw(key, value).await
    }

    /// Remove the record under `key`; returns whether anything was removed.
    pub async fn remove(&self, key: &str) -> Result<bool, StoreError> {
        self.inner.remove(key).await
    }

    /// Whether a record exists under `key`.
    pub async fn contains(&self, key: &str) -> Result<bool, StoreError> {
        self.inner.contains(key).await
    }

    /// All `(key, record)` pairs, deserialized.
    ///
    /// Records that fail to deserialize are skipped with a warning rather
    /// than failing the whole scan.
    pub async fn entries<T: DeserializeOwned>(
        &self,
    ) -> Result<Vec<(String, T)>, StoreError> {
        let raw = self.inner.entries_raw().await?;
        let mut out = Vec::with_capacity(raw.len());
        for (key, value) in raw {
            match serde_json::from_str(&value) {
                Ok(parsed) => out.push((key, parsed)),
                Err(err) => {
                    tracing::warn!(%key, %err, "skipping undecodable record");
                }
            }
        }
        Ok(out)
    }

    /// All keys in the table.
    pub async fn keys(&self) -> Result<Vec<String>, StoreError> {
        let raw = self.inner.entries_raw().await?;
        Ok(raw.into_iter().map(|(key, _)| key).collect())
    }
}
