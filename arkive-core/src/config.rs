//! Environment-derived runtime configuration.
//!
//! All settings are gathered once at process start into an [`AppConfig`] and
//! passed by reference into each component; nothing reads the environment
//! after startup. Mailing-list settings may be partially absent, in which
//! case the connector logs a diagnostic and does nothing.

use tracing::warn;

/// Storage quota granted to new users, in bytes.
pub const DEFAULT_MAX_SIZE: u64 = 1_000_000_000;

/// Top-level configuration for the user subsystem.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Connection URL for the record store.
    pub redis_url: String,
    /// Starter collection provisioned for new accounts, if any.
    pub default_coll: Option<DefaultCollection>,
    /// Username prefix marking anonymous (pre-registration) accounts.
    pub temp_prefix: String,
    /// Mailing-list integration settings.
    pub mailing_list: MailingListConfig,
}

/// The collection created for every new account that does not bring its own.
#[derive(Debug, Clone)]
pub struct DefaultCollection {
    pub id: String,
    /// Title template; `{username}` is substituted at provisioning time.
    pub title: String,
}

/// Third-party mailing-list integration settings.
#[derive(Debug, Clone, Default)]
pub struct MailingListConfig {
    /// Whether new registrations are subscribed at all.
    pub enabled: bool,
    /// Subscription endpoint used when the caller does not supply one.
    pub default_endpoint: String,
    /// Shared API key, sent as the basic-auth password.
    pub key: String,
    /// Removal endpoint template; `{}` is replaced with the email digest.
    pub removal_endpoint: String,
    /// Subscription payload template with `{email}`, `{name}`, `{username}`.
    pub payload: String,
    /// Whether deleting a user also removes them from the list.
    pub remove_on_delete: bool,
}

impl AppConfig {
    /// Gather configuration from process environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Gather configuration through an arbitrary lookup function.
    ///
    /// `from_env` delegates here; tests supply a map-backed closure instead
    /// of mutating the process environment.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let redis_url = lookup("REDIS_BASE_URL")
            .unwrap_or_else(|| "redis://127.0.0.1:6379/0".to_string());

        let coll_id = lookup("DEFAULT_COLL_ID")
            .unwrap_or_else(|| "default-collection".to_string());
        let default_coll = if coll_id.is_empty() {
            None
        } else {
            Some(DefaultCollection {
                id: coll_id,
                title: lookup("DEFAULT_COLL_TITLE")
                    .unwrap_or_else(|| "Default Collection".to_string()),
            })
        };

        let temp_prefix =
            lookup("TEMP_PREFIX").unwrap_or_else(|| "temp-".to_string());

        let enabled = lookup("MAILING_LIST")
            .map(|v| truthy(&v))
            .unwrap_or(false);
        let mailing_list = MailingListConfig {
            enabled,
            default_endpoint: lookup("MAILING_LIST_ENDPOINT")
                .unwrap_or_default(),
            key: lookup("MAILING_LIST_KEY").unwrap_or_default(),
            removal_endpoint: lookup("MAILING_LIST_REMOVAL")
                .unwrap_or_default(),
            payload: lookup("MAILING_LIST_PAYLOAD").unwrap_or_default(),
            remove_on_delete: lookup("REMOVE_ON_DELETE")
                .map(|v| truthy(&v))
                .unwrap_or(false),
        };

        if enabled && mailing_list.default_endpoint.is_empty() {
            warn!(
                "MAILING_LIST is enabled but MAILING_LIST_ENDPOINT is unset; \
                 subscriptions will be skipped"
            );
        }

        Self {
            redis_url,
            default_coll,
            temp_prefix,
            mailing_list,
        }
    }
}

/// Parse the truthy forms accepted in environment flags.
fn truthy(value: &str) -> bool {
    matches!(value.to_ascii_lowercase().as_str(), "true" | "1" | "yes")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from<'a>(map: &'a HashMap<&'a str, &'a str>) -> impl Fn(&str) -> Option<String> + 'a {
        move |key| map.get(key).map(|v| v.to_string())
    }

    #[test]
    fn truthy_accepts_known_forms() {
        for form in ["true", "1", "yes", "TRUE", "Yes"] {
            assert!(truthy(form), "{form} should be truthy");
        }
        for form in ["", "false", "0", "no", "on"] {
            assert!(!truthy(form), "{form} should be falsy");
        }
    }

    #[test]
    fn defaults_apply_when_environment_is_empty() {
        let config = AppConfig::from_lookup(|_| None);
        assert_eq!(config.redis_url, "redis://127.0.0.1:6379/0");
        assert_eq!(config.temp_prefix, "temp-");
        let coll = config.default_coll.expect("default collection");
        assert_eq!(coll.id, "default-collection");
        assert!(!config.mailing_list.enabled);
        assert!(!config.mailing_list.remove_on_delete);
    }

    #[test]
    fn empty_collection_id_disables_provisioning() {
        let map = HashMap::from([("DEFAULT_COLL_ID", "")]);
        let config = AppConfig::from_lookup(lookup_from(&map));
        assert!(config.default_coll.is_none());
    }

    #[test]
    fn mailing_list_settings_are_gathered() {
        let map = HashMap::from([
            ("MAILING_LIST", "yes"),
            ("MAILING_LIST_ENDPOINT", "https://list.example/subscribe"),
            ("MAILING_LIST_KEY", "secret"),
            ("MAILING_LIST_REMOVAL", "https://list.example/members/{}"),
            ("MAILING_LIST_PAYLOAD", "email={email}&name={name}"),
            ("REMOVE_ON_DELETE", "1"),
        ]);
        let config = AppConfig::from_lookup(lookup_from(&map));
        let ml = &config.mailing_list;
        assert!(ml.enabled);
        assert!(ml.remove_on_delete);
        assert_eq!(ml.default_endpoint, "https://list.example/subscribe");
        assert_eq!(ml.removal_endpoint, "https://list.example/members/{}");
    }
}
