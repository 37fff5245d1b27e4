//! CLI wiring: shared context and the interactive flows.

pub mod create;
pub mod delete;
pub mod modify;
pub mod prompts;

use std::fmt;
use std::sync::Arc;

use anyhow::Result;

use arkive_core::auth::{
    AUTH_USERS_TABLE, AuthStore, ROLES_TABLE, RedisAuthStore,
};
use arkive_core::config::AppConfig;
use arkive_core::lifecycle::UserLifecycleManager;
use arkive_core::mailing_list::MailingListConnector;
use arkive_core::store::{RedisTable, Table, connect};
use arkive_core::users::{COLLS_TABLE, USERS_TABLE, UserStore};

/// Shared handles for every CLI flow.
pub struct Context {
    pub auth: Arc<RedisAuthStore>,
    pub users: UserStore,
    pub lifecycle: UserLifecycleManager,
    pub mailing_list: MailingListConnector,
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context").finish_non_exhaustive()
    }
}

impl Context {
    /// Load configuration, connect to the record store, and wire up the
    /// core components.
    pub async fn connect() -> Result<Self> {
        let config = Arc::new(AppConfig::from_env());
        let conn = connect(&config.redis_url).await?;

        let table = |namespace: &str| {
            Table::new(Arc::new(RedisTable::new(conn.clone(), namespace)))
        };

        let auth = Arc::new(RedisAuthStore::new(
            table(AUTH_USERS_TABLE),
            table(ROLES_TABLE),
        ));
        auth.ensure_default_roles().await?;

        let users = UserStore::new(table(USERS_TABLE), table(COLLS_TABLE));
        let mailing_list =
            MailingListConnector::new(config.mailing_list.clone());

        let auth_store: Arc<dyn AuthStore> = auth.clone();
        let lifecycle = UserLifecycleManager::new(
            config,
            auth_store,
            users.clone(),
            mailing_list.clone(),
        );

        Ok(Self {
            auth,
            users,
            lifecycle,
            mailing_list,
        })
    }
}
