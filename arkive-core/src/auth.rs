//! Credential and role management.
//!
//! [`AuthStore`] is the seam to the credential backend: the lifecycle
//! manager and the CLI only ever talk to the trait, so the backend can be
//! swapped or mocked. [`RedisAuthStore`] is the shipped implementation,
//! keeping one credential record per username in `h:auth_users` and the
//! role catalog in `h:roles`. Password hashing is delegated to Argon2id.

use argon2::{
    Argon2, PasswordHash, PasswordVerifier,
    password_hash::{PasswordHasher, SaltString, rand_core::OsRng},
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{ArkiveError, StoreError, ValidationError};
use crate::store::Table;

/// Table holding one credential record per username.
pub const AUTH_USERS_TABLE: &str = "h:auth_users";
/// Table holding the role catalog.
pub const ROLES_TABLE: &str = "h:roles";
/// Role granted to self-registered users.
pub const DEFAULT_ROLE: &str = "archivist";

/// A credential record as held by the auth backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthRecord {
    pub role: String,
    /// Opaque password hash (Argon2id PHC string).
    pub hash: String,
    pub email_addr: String,
    /// Free-form JSON blob, typically `{"name": ...}`.
    #[serde(default)]
    pub desc: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub last_login: Option<DateTime<Utc>>,
}

/// One entry in the role catalog.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoleEntry {
    pub name: String,
    pub level: i64,
}

/// Instructions for adopting a staged temporary collection at registration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MoveInfo {
    /// Anonymous account currently holding the collection.
    pub from_user: String,
    /// Collection id to create under the new owner.
    pub to_coll: String,
    /// Title for the adopted collection.
    pub to_title: String,
}

/// Everything a registration attempt carries.
#[derive(Debug, Clone)]
pub struct RegistrationPayload {
    pub username: String,
    pub email: String,
    pub name: String,
    pub password: String,
    pub move_info: Option<MoveInfo>,
}

/// Post-registration provisioning data returned by the auth backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InitInfo {
    pub email: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub move_info: Option<MoveInfo>,
}

/// Credential and role backend.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AuthStore: Send + Sync {
    /// Validate a registration and create the credential record.
    ///
    /// Returns the canonical username and the provisioning data the
    /// lifecycle manager needs. Rejections carry a displayable message.
    async fn validate_registration(
        &self,
        payload: &RegistrationPayload,
    ) -> Result<(String, InitInfo), ArkiveError>;

    /// Record a successful login for `username`.
    async fn do_login(&self, username: &str) -> Result<(), StoreError>;

    /// Verify a plaintext password against the stored credential.
    async fn verify_password(
        &self,
        username: &str,
        password: &str,
    ) -> Result<bool, StoreError>;

    /// Replace the stored credential with a hash of `password`.
    async fn update_password(
        &self,
        username: &str,
        password: &str,
    ) -> Result<(), ArkiveError>;

    /// The role catalog, highest level first.
    async fn list_roles(&self) -> Result<Vec<RoleEntry>, StoreError>;

    /// Fetch the credential record for `username`.
    async fn user(&self, username: &str)
    -> Result<Option<AuthRecord>, StoreError>;

    /// Create a credential record directly (admin flows).
    async fn create_record(
        &self,
        username: &str,
        password: &str,
        role: &str,
        email: &str,
        name: &str,
    ) -> Result<(), ArkiveError>;

    /// Change the role on an existing record.
    async fn set_role(&self, username: &str, role: &str)
    -> Result<bool, StoreError>;

    /// Change the email on an existing record.
    async fn set_email(
        &self,
        username: &str,
        email: &str,
    ) -> Result<bool, StoreError>;

    /// Remove the credential record; returns whether one existed.
    async fn delete_record(&self, username: &str) -> Result<bool, StoreError>;
}

/// Redis-backed [`AuthStore`].
#[derive(Debug, Clone)]
pub struct RedisAuthStore {
    users: Table,
    roles: Table,
}

impl RedisAuthStore {
    /// Bind the store to its credential and role tables.
    pub fn new(users: Table, roles: Table) -> Self {
        Self { users, roles }
    }

    /// Seed the role catalog if it is empty.
    pub async fn ensure_default_roles(&self) -> Result<(), StoreError> {
        if !self.roles.keys().await?.is_empty() {
            return Ok(());
        }
        for (name, level) in [
            ("admin", 100),
            ("beta-archivist", 60),
            ("archivist", 50),
            ("public", 10),
        ] {
            self.roles
                .set(
                    name,
                    &RoleEntry {
                        name: name.to_string(),
                        level,
                    },
                )
                .await?;
        }
        Ok(())
    }

    fn hash_password(password: &str) -> Result<String, ValidationError> {
        let salt = SaltString::generate(&mut OsRng);
        Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|_| {
                ValidationError::Auth("Unable to process password".to_string())
            })
    }

    fn verify_hash(hash: &str, password: &str) -> bool {
        let Ok(parsed) = PasswordHash::new(hash) else {
            warn!("stored credential hash is not a valid PHC string");
            return false;
        };
        Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok()
    }

    fn new_record(
        password: &str,
        role: &str,
        email: &str,
        name: &str,
    ) -> Result<AuthRecord, ValidationError> {
        let now = Utc::now();
        Ok(AuthRecord {
            role: role.to_string(),
            hash: Self::hash_password(password)?,
            email_addr: email.to_string(),
            desc: serde_json::json!({ "name": name }).to_string(),
            created_at: now,
            last_login: Some(now),
        })
    }
}

#[async_trait]
impl AuthStore for RedisAuthStore {
    async fn validate_registration(
        &self,
        payload: &RegistrationPayload,
    ) -> Result<(String, InitInfo), ArkiveError> {
        let username = payload.username.trim();
        if username.is_empty() {
            return Err(ValidationError::Auth(
                "A username is required".to_string(),
            )
            .into());
        }
        if payload.password.is_empty() {
            return Err(ValidationError::Auth(
                "A password is required".to_string(),
            )
            .into());
        }
        if self.users.contains(username).await? {
            return Err(ValidationError::Auth(format!(
                "Account {username} is already registered"
            ))
            .into());
        }

        let record = Self::new_record(
            &payload.password,
            DEFAULT_ROLE,
            &payload.email,
            &payload.name,
        )?;
        self.users.set(username, &record).await?;

        Ok((
            username.to_string(),
            InitInfo {
                email: payload.email.clone(),
                name: payload.name.clone(),
                move_info: payload.move_info.clone(),
            },
        ))
    }

    async fn do_login(&self, username: &str) -> Result<(), StoreError> {
        match self.users.get::<AuthRecord>(username).await? {
            Some(mut record) => {
                record.last_login = Some(Utc::now());
                self.users.set(username, &record).await
            }
            None => {
                warn!(%username, "login recorded for unknown credential");
                Ok(())
            }
        }
    }

    async fn verify_password(
        &self,
        username: &str,
        password: &str,
    ) -> Result<bool, StoreError> {
        Ok(self
            .users
            .get::<AuthRecord>(username)
            .await?
            .map(|record| Self::verify_hash(&record.hash, password))
            .unwrap_or(false))
    }

    async fn update_password(
        &self,
        username: &str,
        password: &str,
    ) -> Result<(), ArkiveError> {
        let Some(mut record) = self.users.get::<AuthRecord>(username).await?
        else {
            return Err(ValidationError::Auth(format!(
                "No account named {username}"
            ))
            .into());
        };
        record.hash = Self::hash_password(password)?;
        self.users.set(username, &record).await?;
        Ok(())
    }

    async fn list_roles(&self) -> Result<Vec<RoleEntry>, StoreError> {
        let mut roles: Vec<RoleEntry> = self
            .roles
            .entries::<RoleEntry>()
            .await?
            .into_iter()
            .map(|(_, role)| role)
            .collect();
        roles.sort_by(|a, b| b.level.cmp(&a.level));
        Ok(roles)
    }

    async fn user(
        &self,
        username: &str,
    ) -> Result<Option<AuthRecord>, StoreError> {
        self.users.get(username).await
    }

    async fn create_record(
        &self,
        username: &str,
        password: &str,
        role: &str,
        email: &str,
        name: &str,
    ) -> Result<(), ArkiveError> {
        let record = Self::new_record(password, role, email, name)?;
        self.users.set(username, &record).await?;
        Ok(())
    }

    async fn set_role(
        &self,
        username: &str,
        role: &str,
    ) -> Result<bool, StoreError> {
        match self.users.get::<AuthRecord>(username).await? {
            Some(mut record) => {
                record.role = role.to_string();
                self.users.set(username, &record).await?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn set_email(
        &self,
        username: &str,
        email: &str,
    ) -> Result<bool, StoreError> {
        match self.users.get::<AuthRecord>(username).await? {
            Some(mut record) => {
                record.email_addr = email.to_string();
                self.users.set(username, &record).await?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete_record(&self, username: &str) -> Result<bool, StoreError> {
        self.users.remove(username).await
    }
}
