//! Best-effort third-party mailing-list integration.
//!
//! Every call here is fire-and-forget from the caller's point of view:
//! connection failures, timeouts, and surprising status codes are logged
//! and swallowed. Nothing in this module can fail a registration or a
//! deletion, and no retries are attempted.

use std::time::Duration;

use md5::{Digest, Md5};
use tracing::warn;

use crate::config::MailingListConfig;
use crate::template::render_placeholders;

/// Budget for each mailing-list API call.
const LIST_TIMEOUT: Duration = Duration::from_millis(1500);

/// Client for the external mailing-list API.
#[derive(Debug, Clone)]
pub struct MailingListConnector {
    client: reqwest::Client,
    config: MailingListConfig,
}

impl MailingListConnector {
    /// Build a connector over the given settings.
    pub fn new(config: MailingListConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }

    /// Whether subscription on registration is turned on.
    pub fn is_enabled(&self) -> bool {
        self.config.enabled
    }

    /// Whether removal on account deletion is turned on.
    pub fn remove_on_delete(&self) -> bool {
        self.config.remove_on_delete
    }

    /// Subscribe a new account to the mailing list.
    ///
    /// Uses `list_endpoint` when given, else the configured default.
    /// Success is HTTP 200; anything else is logged and ignored.
    pub async fn subscribe(
        &self,
        username: &str,
        email: &str,
        name: &str,
        list_endpoint: Option<&str>,
    ) {
        let endpoint = list_endpoint
            .map(str::to_string)
            .unwrap_or_else(|| self.config.default_endpoint.clone());
        if endpoint.is_empty() || self.config.key.is_empty() {
            warn!(
                "MAILING_LIST is turned on, but required fields are missing"
            );
            return;
        }

        let payload = render_placeholders(
            &self.config.payload,
            &[("email", email), ("name", name), ("username", username)],
        );

        let result = self
            .client
            .post(&endpoint)
            .basic_auth("nop", Some(&self.config.key))
            .header(
                reqwest::header::CONTENT_TYPE,
                "application/x-www-form-urlencoded",
            )
            .body(payload)
            .timeout(LIST_TIMEOUT)
            .send()
            .await;

        match result {
            Ok(res) if res.status().as_u16() == 200 => {}
            Ok(res) => {
                let status = res.status();
                let content = res.text().await.unwrap_or_default();
                warn!(
                    %status,
                    %content,
                    "unexpected mailing list API response"
                );
            }
            Err(err) if err.is_timeout() => {
                warn!("mailing list API timed out");
            }
            Err(err) => {
                warn!(%err, "adding to mailing list failed");
            }
        }
    }

    /// Remove an address from the mailing list.
    ///
    /// The removal endpoint's `{}` placeholder receives the MD5 digest of
    /// the lowercased email. Success is HTTP 204.
    pub async fn unsubscribe(&self, email: &str) {
        if self.config.removal_endpoint.is_empty() || self.config.key.is_empty()
        {
            warn!(
                "REMOVE_ON_DELETE is turned on, but required fields are missing"
            );
            return;
        }

        let url = self
            .config
            .removal_endpoint
            .replacen("{}", &email_digest(email), 1);

        let result = self
            .client
            .delete(&url)
            .basic_auth("nop", Some(&self.config.key))
            .timeout(LIST_TIMEOUT)
            .send()
            .await;

        match result {
            Ok(res) if res.status().as_u16() == 204 => {}
            Ok(res) => {
                let status = res.status();
                let content = res.text().await.unwrap_or_default();
                warn!(
                    %status,
                    %content,
                    "unexpected mailing list API response"
                );
            }
            Err(err) if err.is_timeout() => {
                warn!("mailing list API timed out");
            }
            Err(err) => {
                warn!(%err, "removing from mailing list failed");
            }
        }
    }
}

/// MD5 hex digest of the lowercased email, as the list API expects.
fn email_digest(email: &str) -> String {
    let digest = Md5::digest(email.to_lowercase().as_bytes());
    format!("{digest:x}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn digest_is_lowercase_md5_of_lowercased_email() {
        // Well-known MD5 test vector semantics: digest depends only on the
        // lowercased address.
        assert_eq!(email_digest("User@Example.com"), email_digest("user@example.com"));
        assert_eq!(email_digest("user@example.com").len(), 32);
        assert!(
            email_digest("user@example.com")
                .chars()
                .all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase())
        );
    }

    #[tokio::test]
    async fn subscribe_without_config_is_a_noop() {
        let connector = MailingListConnector::new(MailingListConfig {
            enabled: true,
            ..Default::default()
        });
        // No endpoint or key configured; must return without a network call.
        connector.subscribe("alice", "a@b.com", "Alice", None).await;
    }

    #[tokio::test]
    async fn unsubscribe_without_config_is_a_noop() {
        let connector = MailingListConnector::new(MailingListConfig {
            remove_on_delete: true,
            ..Default::default()
        });
        connector.unsubscribe("a@b.com").await;
    }

    #[tokio::test]
    async fn unreachable_endpoint_is_swallowed() {
        let connector = MailingListConnector::new(MailingListConfig {
            enabled: true,
            default_endpoint: "http://127.0.0.1:1/subscribe".to_string(),
            key: "key".to_string(),
            removal_endpoint: "http://127.0.0.1:1/members/{}".to_string(),
            payload: "email={email}".to_string(),
            remove_on_delete: true,
        });
        // Connection refused on both paths; neither may propagate.
        connector.subscribe("alice", "a@b.com", "Alice", None).await;
        connector.unsubscribe("a@b.com").await;
    }
}
