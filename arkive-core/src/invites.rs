//! Invite-gated signup: pending invites, invite codes, and delivery.
//!
//! An invite code is `base64(email ":" secret)`. The secret is regenerated
//! on every send, so the most recently mailed code is the only one that
//! validates. Validation never reveals *why* a code failed; every failure
//! mode collapses into the same generic message.
//!
//! Redeemed invites are archived rather than hard-deleted, and only when
//! the caller explicitly asks: validation alone never consumes an entry.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use base64::{Engine as _, engine::general_purpose::STANDARD};
use chrono::{DateTime, Utc};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{StoreError, ValidationError};
use crate::store::Table;
use crate::template::render_placeholders;

/// Table of pending invites, keyed by email.
pub const INVITES_TABLE: &str = "h:invites";
/// Table of redeemed invites, keyed by email.
pub const ARCHIVE_INVITES_TABLE: &str = "h:arc_invites";

/// Random bytes backing each invite secret.
const INVITE_SECRET_LEN: usize = 21;

/// A pending (or archived) invite.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InviteEntry {
    pub email: String,
    pub name: String,
    #[serde(default)]
    pub desc: String,
    /// Single-use secret; absent until the first send.
    #[serde(default)]
    pub secret: Option<String>,
    /// When the invitation email was last sent.
    #[serde(default)]
    pub sent: Option<DateTime<Utc>>,
}

/// Outbound email delivery collaborator.
#[async_trait]
pub trait Mailer: Send + Sync {
    /// Deliver one message. Failures are reported but the invite secret
    /// has already been persisted by then.
    async fn send_email(
        &self,
        to: &str,
        subject: &str,
        body: &str,
    ) -> anyhow::Result<()>;
}

/// Store of pending and archived invites.
#[derive(Clone)]
pub struct InviteStore {
    invites: Table,
    archive: Table,
    mailer: Arc<dyn Mailer>,
}

impl fmt::Debug for InviteStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InviteStore").finish_non_exhaustive()
    }
}

impl InviteStore {
    /// Bind the store to its tables and delivery collaborator.
    pub fn new(invites: Table, archive: Table, mailer: Arc<dyn Mailer>) -> Self {
        Self {
            invites,
            archive,
            mailer,
        }
    }

    /// Record a pending invite, overwriting any prior entry for the email.
    ///
    /// Returns false (and stores nothing) when email or name is empty.
    pub async fn save_invite(
        &self,
        email: &str,
        name: &str,
        desc: &str,
    ) -> Result<bool, StoreError> {
        if email.is_empty() || name.is_empty() {
            return Ok(false);
        }

        let entry = InviteEntry {
            email: email.to_string(),
            name: name.to_string(),
            desc: desc.to_string(),
            secret: None,
            sent: None,
        };
        self.invites.set(email, &entry).await?;
        Ok(true)
    }

    /// Fetch a pending invite.
    pub async fn get(
        &self,
        email: &str,
    ) -> Result<Option<InviteEntry>, StoreError> {
        self.invites.get(email).await
    }

    /// Decode and verify an invite code, returning the invited email.
    ///
    /// Every failure mode (empty input, undecodable token, malformed
    /// structure, unknown email, stale secret, even a store hiccup)
    /// produces the same generic [`ValidationError::InvalidInvite`].
    pub async fn is_valid_invite(
        &self,
        code: &str,
    ) -> Result<String, ValidationError> {
        if code.is_empty() {
            return Err(ValidationError::InvalidInvite);
        }

        let Ok(decoded) = STANDARD.decode(code) else {
            debug!("invite code is not valid base64");
            return Err(ValidationError::InvalidInvite);
        };
        let Ok(text) = String::from_utf8(decoded) else {
            debug!("invite code is not valid UTF-8");
            return Err(ValidationError::InvalidInvite);
        };
        let Some((email, secret)) = text.split_once(':') else {
            debug!("invite code has no email:secret structure");
            return Err(ValidationError::InvalidInvite);
        };

        let entry = match self.invites.get::<InviteEntry>(email).await {
            Ok(entry) => entry,
            Err(err) => {
                warn!(%err, "invite lookup failed");
                return Err(ValidationError::InvalidInvite);
            }
        };

        match entry {
            Some(entry) if entry.secret.as_deref() == Some(secret) => {
                Ok(email.to_string())
            }
            _ => Err(ValidationError::InvalidInvite),
        }
    }

    /// Issue a fresh secret for a pending invite and mail the code.
    ///
    /// Returns false when no invite is pending for the email. Each send
    /// regenerates the secret, invalidating previously issued codes.
    pub async fn send_invite(
        &self,
        email: &str,
        email_template: &str,
        host: &str,
    ) -> Result<bool, StoreError> {
        let Some(mut entry) = self.invites.get::<InviteEntry>(email).await?
        else {
            warn!(%email, "no such email in invite list");
            return Ok(false);
        };

        let secret = generate_secret();
        entry.secret = Some(secret.clone());
        self.invites.set(email, &entry).await?;

        let invite_code = encode_invite_code(email, &secret);
        let body = render_placeholders(
            email_template,
            &[
                ("host", host),
                ("email_addr", email),
                (
                    "name",
                    if entry.name.is_empty() {
                        email
                    } else {
                        entry.name.as_str()
                    },
                ),
                ("invite", &invite_code),
            ],
        );

        if let Err(err) = self
            .mailer
            .send_email(
                email,
                "You are invited to join the arkive beta!",
                &body,
            )
            .await
        {
            warn!(%email, %err, "invitation email delivery failed");
        }

        entry.sent = Some(Utc::now());
        self.invites.set(email, &entry).await?;
        Ok(true)
    }

    /// Archive and remove a pending invite.
    ///
    /// The archive copy is best-effort; a failure there is logged and the
    /// removal still proceeds.
    pub async fn delete_invite(&self, email: &str) -> Result<(), StoreError> {
        match self.invites.get_raw(email).await {
            Ok(Some(raw)) => {
                if let Err(err) = self.archive.set_raw(email, raw).await {
                    warn!(%email, %err, "failed to archive invite");
                }
            }
            Ok(None) => {}
            Err(err) => {
                warn!(%email, %err, "failed to read invite for archival");
            }
        }
        self.invites.remove(email).await?;
        Ok(())
    }
}

/// Build the wire form of an invite code.
pub fn encode_invite_code(email: &str, secret: &str) -> String {
    STANDARD.encode(format!("{email}:{secret}"))
}

fn generate_secret() -> String {
    let mut bytes = [0u8; INVITE_SECRET_LEN];
    rand::rng().fill_bytes(&mut bytes);
    STANDARD.encode(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryTable;
    use std::sync::Arc;
    use tokio::sync::Mutex;

    /// Captures outbound mail instead of sending it.
    #[derive(Default)]
    struct CapturingMailer {
        sent: Mutex<Vec<(String, String)>>,
    }

    #[async_trait]
    impl Mailer for CapturingMailer {
        async fn send_email(
            &self,
            to: &str,
            _subject: &str,
            body: &str,
        ) -> anyhow::Result<()> {
            self.sent
                .lock()
                .await
                .push((to.to_string(), body.to_string()));
            Ok(())
        }
    }

    fn invite_store() -> (InviteStore, Arc<CapturingMailer>) {
        let mailer = Arc::new(CapturingMailer::default());
        let store = InviteStore::new(
            Table::new(Arc::new(MemoryTable::default())),
            Table::new(Arc::new(MemoryTable::default())),
            mailer.clone(),
        );
        (store, mailer)
    }

    #[tokio::test]
    async fn save_requires_email_and_name() {
        let (store, _) = invite_store();
        assert!(!store.save_invite("", "Alice", "").await.unwrap());
        assert!(!store.save_invite("a@b.com", "", "").await.unwrap());
        assert!(store.save_invite("a@b.com", "Alice", "").await.unwrap());
        assert!(store.get("a@b.com").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn invite_round_trip() {
        let (store, mailer) = invite_store();
        store.save_invite("a@b.com", "Alice", "").await.unwrap();

        assert!(store
            .send_invite("a@b.com", "Hi {name}: {invite}", "host")
            .await
            .unwrap());

        // The mailed body carries the code; extract and validate it.
        let code = {
            let sent = mailer.sent.lock().await;
            sent[0].1.rsplit(": ").next().unwrap().to_string()
        };

        let email = store.is_valid_invite(&code).await.unwrap();
        assert_eq!(email, "a@b.com");

        let entry = store.get("a@b.com").await.unwrap().unwrap();
        assert!(entry.sent.is_some());
    }

    #[tokio::test]
    async fn resending_invalidates_previous_code() {
        let (store, _) = invite_store();
        store.save_invite("a@b.com", "Alice", "").await.unwrap();

        store.send_invite("a@b.com", "{invite}", "host").await.unwrap();
        let first_secret = store
            .get("a@b.com")
            .await
            .unwrap()
            .unwrap()
            .secret
            .unwrap();
        let first_code = encode_invite_code("a@b.com", &first_secret);

        store.send_invite("a@b.com", "{invite}", "host").await.unwrap();

        assert!(matches!(
            store.is_valid_invite(&first_code).await,
            Err(ValidationError::InvalidInvite)
        ));
    }

    #[tokio::test]
    async fn validation_failure_modes_are_uniform() {
        let (store, _) = invite_store();
        store.save_invite("a@b.com", "Alice", "").await.unwrap();
        store.send_invite("a@b.com", "{invite}", "host").await.unwrap();

        let cases = [
            String::new(),
            "!!not-base64!!".to_string(),
            STANDARD.encode("no-separator"),
            STANDARD.encode("unknown@b.com:secret"),
            encode_invite_code("a@b.com", "wrong-secret"),
        ];
        for code in cases {
            assert!(
                matches!(
                    store.is_valid_invite(&code).await,
                    Err(ValidationError::InvalidInvite)
                ),
                "{code:?} should be rejected"
            );
        }
    }

    #[tokio::test]
    async fn send_without_entry_returns_false() {
        let (store, mailer) = invite_store();
        assert!(!store
            .send_invite("nobody@b.com", "{invite}", "host")
            .await
            .unwrap());
        assert!(mailer.sent.lock().await.is_empty());
    }

    #[tokio::test]
    async fn delete_archives_then_removes() {
        let (store, _) = invite_store();
        store.save_invite("a@b.com", "Alice", "note").await.unwrap();

        store.delete_invite("a@b.com").await.unwrap();
        assert!(store.get("a@b.com").await.unwrap().is_none());

        let archived: Option<InviteEntry> =
            store.archive.get("a@b.com").await.unwrap();
        assert_eq!(archived.unwrap().desc, "note");
    }

    #[tokio::test]
    async fn delete_of_missing_entry_is_quiet() {
        let (store, _) = invite_store();
        store.delete_invite("ghost@b.com").await.unwrap();
    }
}
