//! Registered-user records and their collections.
//!
//! User records live in the `h:users` table keyed by username; collections
//! live in `h:colls` keyed by `<username>:<collection id>`. Collection
//! bookkeeping here is the minimum the lifecycle flows need: starter
//! provisioning, the temp-collection transfer, and quota accounting.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::DEFAULT_MAX_SIZE;
use crate::error::StoreError;
use crate::store::Table;

/// Table holding one record per registered user.
pub const USERS_TABLE: &str = "h:users";
/// Table holding collection records, keyed by `<username>:<id>`.
pub const COLLS_TABLE: &str = "h:colls";

/// A registered user.
///
/// The username is the record key and never changes after registration.
/// The credential hash is not here; it belongs to the auth store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserRecord {
    pub username: String,
    pub email: String,
    /// Display name; may be empty.
    #[serde(default)]
    pub name: String,
    pub role: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub last_login: Option<DateTime<Utc>>,
    /// Storage quota in bytes.
    #[serde(default = "default_max_size")]
    pub max_size: u64,
}

fn default_max_size() -> u64 {
    DEFAULT_MAX_SIZE
}

/// A user-owned collection of archived material.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Collection {
    /// Slug-like identifier, unique per owner.
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub desc: String,
    #[serde(default)]
    pub public: bool,
    /// Current size in bytes.
    #[serde(default)]
    pub size: u64,
}

/// Store of registered users and their collections.
#[derive(Debug, Clone)]
pub struct UserStore {
    users: Table,
    colls: Table,
}

impl UserStore {
    /// Bind the store to its two tables.
    pub fn new(users: Table, colls: Table) -> Self {
        Self { users, colls }
    }

    /// Fetch a user record.
    pub async fn get(
        &self,
        username: &str,
    ) -> Result<Option<UserRecord>, StoreError> {
        self.users.get(username).await
    }

    /// Insert or overwrite a user record.
    pub async fn insert(&self, record: &UserRecord) -> Result<(), StoreError> {
        self.users.set(&record.username, record).await
    }

    /// Whether a record exists for `username`.
    pub async fn contains(&self, username: &str) -> Result<bool, StoreError> {
        self.users.contains(username).await
    }

    /// All registered usernames.
    pub async fn usernames(&self) -> Result<Vec<String>, StoreError> {
        self.users.keys().await
    }

    /// All registered records.
    pub async fn all(&self) -> Result<Vec<(String, UserRecord)>, StoreError> {
        self.users.entries().await
    }

    /// Email addresses of every registered user.
    pub async fn emails(&self) -> Result<Vec<String>, StoreError> {
        let entries: Vec<(String, UserRecord)> = self.users.entries().await?;
        Ok(entries.into_iter().map(|(_, rec)| rec.email).collect())
    }

    /// Whether any registered user has `email`.
    pub async fn has_user_email(&self, email: &str) -> Result<bool, StoreError> {
        Ok(self.emails().await?.iter().any(|e| e == email))
    }

    /// Email address for `username`, or empty if unknown.
    pub async fn get_user_email(
        &self,
        username: &str,
    ) -> Result<String, StoreError> {
        if username.is_empty() {
            return Ok(String::new());
        }
        Ok(self
            .get(username)
            .await?
            .map(|rec| rec.email)
            .unwrap_or_default())
    }

    /// Update the stored email for an existing user.
    pub async fn set_email(
        &self,
        username: &str,
        email: &str,
    ) -> Result<bool, StoreError> {
        match self.get(username).await? {
            Some(mut record) => {
                record.email = email.to_string();
                self.insert(&record).await?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Update the stored role for an existing user.
    pub async fn set_role(
        &self,
        username: &str,
        role: &str,
    ) -> Result<bool, StoreError> {
        match self.get(username).await? {
            Some(mut record) => {
                record.role = role.to_string();
                self.insert(&record).await?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Delete the user record and every collection the user owns.
    pub async fn delete_user_data(
        &self,
        username: &str,
    ) -> Result<bool, StoreError> {
        for coll in self.collections_for(username).await? {
            self.colls.remove(&coll_key(username, &coll.id)).await?;
        }
        self.users.remove(username).await
    }

    // Collections

    /// Create a collection owned by `username`.
    pub async fn create_collection(
        &self,
        username: &str,
        id: &str,
        title: &str,
        desc: &str,
        public: bool,
    ) -> Result<Collection, StoreError> {
        let coll = Collection {
            id: id.to_string(),
            title: title.to_string(),
            desc: desc.to_string(),
            public,
            size: 0,
        };
        self.colls.set(&coll_key(username, id), &coll).await?;
        Ok(coll)
    }

    /// Overwrite a collection record, e.g. after its size changed.
    pub async fn update_collection(
        &self,
        username: &str,
        coll: &Collection,
    ) -> Result<(), StoreError> {
        self.colls.set(&coll_key(username, &coll.id), coll).await
    }

    /// Look up a collection by its id within one user's namespace.
    pub async fn get_collection_by_name(
        &self,
        username: &str,
        name: &str,
    ) -> Result<Option<Collection>, StoreError> {
        self.colls.get(&coll_key(username, name)).await
    }

    /// All collections owned by `username`.
    pub async fn collections_for(
        &self,
        username: &str,
    ) -> Result<Vec<Collection>, StoreError> {
        let prefix = format!("{username}:");
        let entries: Vec<(String, Collection)> = self.colls.entries().await?;
        Ok(entries
            .into_iter()
            .filter(|(key, _)| key.starts_with(&prefix))
            .map(|(_, coll)| coll)
            .collect())
    }

    /// Quota left for `username`, in bytes.
    pub async fn size_remaining(&self, username: &str) -> Result<u64, StoreError> {
        let max_size = self
            .get(username)
            .await?
            .map(|rec| rec.max_size)
            .unwrap_or(DEFAULT_MAX_SIZE);
        let used: u64 = self
            .collections_for(username)
            .await?
            .iter()
            .map(|coll| coll.size)
            .sum();
        Ok(max_size.saturating_sub(used))
    }

    /// Relocate `coll` from one owner to another under a new id and title.
    pub async fn move_collection(
        &self,
        from_user: &str,
        coll: &Collection,
        to_user: &str,
        new_id: &str,
        new_title: &str,
    ) -> Result<Collection, StoreError> {
        let mut moved = coll.clone();
        moved.id = new_id.to_string();
        moved.title = new_title.to_string();

        self.colls.set(&coll_key(to_user, new_id), &moved).await?;
        self.colls.remove(&coll_key(from_user, &coll.id)).await?;
        Ok(moved)
    }
}

fn coll_key(username: &str, id: &str) -> String {
    format!("{username}:{id}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryTable;
    use std::sync::Arc;

    fn store() -> UserStore {
        UserStore::new(
            Table::new(Arc::new(MemoryTable::default())),
            Table::new(Arc::new(MemoryTable::default())),
        )
    }

    fn record(username: &str, email: &str) -> UserRecord {
        UserRecord {
            username: username.to_string(),
            email: email.to_string(),
            name: String::new(),
            role: "archivist".to_string(),
            created_at: Utc::now(),
            last_login: None,
            max_size: DEFAULT_MAX_SIZE,
        }
    }

    #[tokio::test]
    async fn email_helpers_cover_registered_users() {
        let store = store();
        store.insert(&record("alice", "alice@example.org")).await.unwrap();
        store.insert(&record("bob", "bob@example.org")).await.unwrap();

        assert!(store.has_user_email("alice@example.org").await.unwrap());
        assert!(!store.has_user_email("carol@example.org").await.unwrap());
        assert_eq!(
            store.get_user_email("bob").await.unwrap(),
            "bob@example.org"
        );
        assert_eq!(store.get_user_email("missing").await.unwrap(), "");
        assert_eq!(store.get_user_email("").await.unwrap(), "");
    }

    #[tokio::test]
    async fn delete_user_data_removes_collections_too() {
        let store = store();
        store.insert(&record("alice", "alice@example.org")).await.unwrap();
        store
            .create_collection("alice", "default", "Default", "", false)
            .await
            .unwrap();

        assert!(store.delete_user_data("alice").await.unwrap());
        assert!(!store.contains("alice").await.unwrap());
        assert!(store
            .get_collection_by_name("alice", "default")
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn quota_accounts_for_owned_collections() {
        let store = store();
        let mut rec = record("alice", "a@b.com");
        rec.max_size = 100;
        store.insert(&rec).await.unwrap();

        let coll = store
            .create_collection("alice", "c1", "One", "", false)
            .await
            .unwrap();
        assert_eq!(store.size_remaining("alice").await.unwrap(), 100);

        // Simulate recorded content.
        let mut bigger = coll.clone();
        bigger.size = 30;
        store.update_collection("alice", &bigger).await.unwrap();
        assert_eq!(store.size_remaining("alice").await.unwrap(), 70);
    }

    #[tokio::test]
    async fn move_collection_changes_owner_id_and_title() {
        let store = store();
        let temp = store
            .create_collection("temp-anon", "temp", "Temporary", "", false)
            .await
            .unwrap();

        let moved = store
            .move_collection("temp-anon", &temp, "alice", "my-coll", "My Collection")
            .await
            .unwrap();

        assert_eq!(moved.id, "my-coll");
        assert_eq!(moved.title, "My Collection");
        assert!(store
            .get_collection_by_name("temp-anon", "temp")
            .await
            .unwrap()
            .is_none());
        assert!(store
            .get_collection_by_name("alice", "my-coll")
            .await
            .unwrap()
            .is_some());
    }
}
