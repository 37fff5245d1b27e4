//! Registration, deletion, and collection-transfer orchestration.
//!
//! [`UserLifecycleManager`] coordinates the validation engine, the user
//! store, the credential backend, and the mailing-list connector. Policy
//! failures surface as [`ValidationError`]; mailing-list trouble never
//! does.

use std::fmt;
use std::sync::Arc;

use chrono::Utc;
use tracing::{info, warn};

use crate::auth::{AuthStore, InitInfo, MoveInfo, RegistrationPayload};
use crate::config::AppConfig;
use crate::error::{ArkiveError, Result, StoreError, ValidationError};
use crate::mailing_list::MailingListConnector;
use crate::template::render_placeholders;
use crate::users::{Collection, UserRecord, UserStore};
use crate::validation;

/// Per-request session surface the lifecycle manager writes to.
///
/// The real session layer lives in the web framework; this is only the
/// slice of it registration touches.
#[derive(Debug, Clone, Default)]
pub struct Session {
    /// Authenticated username, if any.
    pub curr_user: Option<String>,
}

/// Orchestrates the user lifecycle over its collaborating stores.
#[derive(Clone)]
pub struct UserLifecycleManager {
    config: Arc<AppConfig>,
    auth: Arc<dyn AuthStore>,
    users: UserStore,
    mailing_list: MailingListConnector,
}

impl fmt::Debug for UserLifecycleManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UserLifecycleManager").finish_non_exhaustive()
    }
}

impl UserLifecycleManager {
    /// Wire up the manager.
    pub fn new(
        config: Arc<AppConfig>,
        auth: Arc<dyn AuthStore>,
        users: UserStore,
        mailing_list: MailingListConnector,
    ) -> Self {
        Self {
            config,
            auth,
            users,
            mailing_list,
        }
    }

    /// The user store this manager operates on.
    pub fn users(&self) -> &UserStore {
        &self.users
    }

    /// Register a new account.
    ///
    /// Runs the full validation battery before the credential backend is
    /// touched, then provisions the user record and first collection,
    /// subscribes to the mailing list when enabled, and logs the session
    /// in.
    pub async fn register(
        &self,
        payload: RegistrationPayload,
        session: &mut Session,
    ) -> Result<(UserRecord, Option<Collection>)> {
        let existing = self.users.usernames().await?;
        validation::validate_username(&payload.username, &existing)?;
        validation::validate_email_format(&payload.email)?;
        let emails = self.users.emails().await?;
        validation::validate_email_uniqueness(&payload.email, &emails)?;

        let (username, init_info) = self
            .auth
            .validate_registration(&payload)
            .await
            .map_err(|err| match err {
                // Credential-backend rejections surface as displayable
                // validation failures, same as policy errors.
                ArkiveError::Validation(inner) => {
                    ValidationError::Auth(inner.to_string()).into()
                }
                other => other,
            })?;

        let (user, first_coll) =
            self.create_new_user(&username, init_info).await?;

        self.auth.do_login(&user.username).await?;
        if session.curr_user.is_none() {
            session.curr_user = Some(user.username.clone());
        }

        Ok((user, first_coll))
    }

    /// Provision the record and first collection for a validated account.
    ///
    /// Shared by web registration and the admin CLI, which creates the
    /// credential record itself first.
    pub async fn create_new_user(
        &self,
        username: &str,
        init_info: InitInfo,
    ) -> Result<(UserRecord, Option<Collection>)> {
        let role = self
            .auth
            .user(username)
            .await?
            .map(|record| record.role)
            .unwrap_or_else(|| crate::auth::DEFAULT_ROLE.to_string());

        let record = UserRecord {
            username: username.to_string(),
            email: init_info.email.clone(),
            name: init_info.name.clone(),
            role,
            created_at: Utc::now(),
            last_login: None,
            max_size: crate::config::DEFAULT_MAX_SIZE,
        };
        self.users.insert(&record).await?;

        let first_coll = if let Some(move_info) = &init_info.move_info {
            self.move_temporary_collection(username, move_info).await?
        } else if let Some(default_coll) = &self.config.default_coll {
            let desc = render_placeholders(
                &default_coll.title,
                &[("username", username)],
            );
            Some(
                self.users
                    .create_collection(
                        username,
                        &default_coll.id,
                        &default_coll.title,
                        &desc,
                        false,
                    )
                    .await?,
            )
        } else {
            None
        };

        if self.mailing_list.is_enabled() {
            self.mailing_list
                .subscribe(username, &init_info.email, &init_info.name, None)
                .await;
        }

        info!(%username, "provisioned new user");
        Ok((record, first_coll))
    }

    /// Change a user's password after verifying the current one.
    pub async fn update_password(
        &self,
        username: &str,
        curr_password: &str,
        password: &str,
        confirm: &str,
    ) -> Result<()> {
        if !self.auth.verify_password(username, curr_password).await? {
            return Err(ValidationError::IncorrectPassword.into());
        }
        validation::validate_password(password, confirm)?;
        self.auth.update_password(username, password).await
    }

    /// Remove an account: mailing list (best effort), data, credential.
    ///
    /// Data deletion always proceeds, whatever the unsubscribe outcome;
    /// the connector swallows its own failures. Returns whether a
    /// credential record was removed.
    pub async fn delete_user(&self, username: &str) -> Result<bool> {
        if self.mailing_list.remove_on_delete() {
            let email = self.users.get_user_email(username).await?;
            if email.is_empty() {
                warn!(%username, "no stored email; skipping list removal");
            } else {
                self.mailing_list.unsubscribe(&email).await;
            }
        }

        self.users.delete_user_data(username).await?;
        let removed = self.auth.delete_record(username).await?;

        info!(%username, "deleted user");
        Ok(removed)
    }

    /// Whether `to_username` can absorb `from_username`'s named collection.
    pub async fn has_capacity_for_transfer(
        &self,
        to_username: &str,
        from_username: &str,
        coll_name: &str,
    ) -> std::result::Result<bool, StoreError> {
        if !self.is_valid_user(to_username).await? {
            return Ok(false);
        }

        let Some(collection) = self
            .users
            .get_collection_by_name(from_username, coll_name)
            .await?
        else {
            return Ok(false);
        };

        Ok(collection.size <= self.users.size_remaining(to_username).await?)
    }

    /// Adopt the donor's staged "temp" collection into `recipient`.
    ///
    /// Returns the relocated collection, or None when the donor has no
    /// temp collection staged.
    pub async fn move_temporary_collection(
        &self,
        recipient: &str,
        move_info: &MoveInfo,
    ) -> std::result::Result<Option<Collection>, StoreError> {
        let Some(temp_coll) = self
            .users
            .get_collection_by_name(&move_info.from_user, "temp")
            .await?
        else {
            warn!(
                from_user = %move_info.from_user,
                "no temporary collection to move"
            );
            return Ok(None);
        };

        let moved = self
            .users
            .move_collection(
                &move_info.from_user,
                &temp_coll,
                recipient,
                &move_info.to_coll,
                &move_info.to_title,
            )
            .await?;
        Ok(Some(moved))
    }

    /// A user is valid if anonymous (temp-prefixed) or credentialed.
    pub async fn is_valid_user(
        &self,
        username: &str,
    ) -> std::result::Result<bool, StoreError> {
        if username.starts_with(&self.config.temp_prefix) {
            return Ok(true);
        }
        self.has_user(username).await
    }

    /// Whether a credential record exists for `username`.
    pub async fn has_user(
        &self,
        username: &str,
    ) -> std::result::Result<bool, StoreError> {
        Ok(self.auth.user(username).await?.is_some())
    }
}
