//! Redis-backed record tables.
//!
//! Each table is a single Redis hash; the table name is the hash key, so
//! records live under `HGET <namespace> <key>`. Connections go through a
//! shared [`ConnectionManager`], which multiplexes and reconnects on its
//! own.

use async_trait::async_trait;
use redis::{AsyncCommands, aio::ConnectionManager};
use std::fmt;
use tracing::info;

use crate::error::StoreError;
use crate::store::RecordTable;

/// Open a managed connection to the record store.
pub async fn connect(redis_url: &str) -> Result<ConnectionManager, StoreError> {
    info!("connecting to record store at {}", redis_url);

    let client = redis::Client::open(redis_url)?;
    let conn = ConnectionManager::new(client).await?;

    info!("record store connection established");
    Ok(conn)
}

/// A record table stored as one Redis hash.
#[derive(Clone)]
pub struct RedisTable {
    conn: ConnectionManager,
    namespace: String,
}

impl fmt::Debug for RedisTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RedisTable")
            .field("namespace", &self.namespace)
            .finish_non_exhaustive()
    }
}

impl RedisTable {
    /// Bind a table to a hash `namespace` (for example `h:users`).
    pub fn new(conn: ConnectionManager, namespace: impl Into<String>) -> Self {
        Self {
            conn,
            namespace: namespace.into(),
        }
    }
}

#[async_trait]
impl RecordTable for RedisTable {
    async fn get_raw(&self, key: &str) -> Result<Option<String>, StoreError> {
        let mut conn = self.conn.clone();
        let value: Option<String> = conn.hget(&self.namespace, key).await?;
        Ok(value)
    }

    async fn set_raw(&self, key: &str, value: String) -> Result<(), StoreError> {
        let mut conn = self.conn.clone();
        conn.hset::<_, _, _, ()>(&self.namespace, key, value).await?;
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<bool, StoreError> {
        let mut conn = self.conn.clone();
        let removed: i64 = conn.hdel(&self.namespace, key).await?;
        Ok(removed > 0)
    }

    async fn contains(&self, key: &str) -> Result<bool, StoreError> {
        let mut conn = self.conn.clone();
        let present: bool = conn.hexists(&self.namespace, key).await?;
        Ok(present)
    }

    async fn entries_raw(&self) -> Result<Vec<(String, String)>, StoreError> {
        let mut conn = self.conn.clone();
        let entries: Vec<(String, String)> =
            conn.hgetall(&self.namespace).await?;
        Ok(entries)
    }
}
