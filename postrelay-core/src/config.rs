//! TOML configuration, parsed once at startup into an immutable [`AppConfig`].
//!
//! Secrets (webhook URLs, the rendering service token) may be given inline or
//! named by environment variable. Environment lookups go through a closure so
//! tests can supply their own.

use crate::error::ConfigError;
use crate::filter::{CandidateFilter, DEFAULT_PINNED_MARKERS};
use crate::types::{AccountConfig, NotifyTarget};
use crate::window::DEFAULT_UTC_OFFSET_HOURS;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

pub const DEFAULT_SITE_ORIGIN: &str = "https://x.com";

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServiceSettings {
    pub polling_interval_minutes: u64,
    pub utc_offset_hours: i32,
    pub recent_scan_limit: usize,
    pub pinned_markers: Vec<String>,
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self {
            polling_interval_minutes: 10,
            utc_offset_hours: DEFAULT_UTC_OFFSET_HOURS,
            recent_scan_limit: 15,
            pinned_markers: DEFAULT_PINNED_MARKERS.iter().map(|m| m.to_string()).collect(),
        }
    }
}

/// Resolved rendering-collaborator settings.
#[derive(Debug, Clone, PartialEq)]
pub enum SourceConfig {
    Browserless {
        base_url: String,
        token: Option<String>,
        site_origin: String,
        settle_millis: u64,
        request_timeout_secs: u64,
    },
    Fixture {
        path: PathBuf,
    },
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StoreConfig {
    Json { dir: PathBuf },
    Sqlite { url: String },
}

impl Default for StoreConfig {
    fn default() -> Self {
        StoreConfig::Json {
            dir: PathBuf::from("state"),
        }
    }
}

/// Replacements for the real clock and the real discovery flow.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Overrides {
    pub now: Option<DateTime<Utc>>,
    pub single_post_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub service: ServiceSettings,
    pub source: SourceConfig,
    pub store: StoreConfig,
    pub overrides: Overrides,
    pub accounts: Vec<AccountConfig>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawConfig {
    #[serde(default)]
    service: ServiceSettings,
    source: RawSource,
    #[serde(default)]
    store: StoreConfig,
    #[serde(default)]
    overrides: Overrides,
    #[serde(default)]
    accounts: Vec<RawAccount>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum RawSource {
    Browserless {
        base_url: String,
        token: Option<String>,
        token_env: Option<String>,
        #[serde(default = "default_site_origin")]
        site_origin: String,
        #[serde(default = "default_settle_millis")]
        settle_millis: u64,
        #[serde(default = "default_request_timeout_secs")]
        request_timeout_secs: u64,
    },
    Fixture {
        path: PathBuf,
    },
}

fn default_site_origin() -> String {
    DEFAULT_SITE_ORIGIN.to_string()
}

fn default_settle_millis() -> u64 {
    5000
}

fn default_request_timeout_secs() -> u64 {
    60
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawAccount {
    name: Option<String>,
    target_handle: String,
    keyword: Option<String>,
    cursor_key: String,
    webhook: Option<String>,
    webhook_env: Option<String>,
}

impl AppConfig {
    /// Read and validate a config file, resolving secrets from the process
    /// environment.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ConfigError::FileNotFound {
                    path: path.display().to_string(),
                }
            } else {
                ConfigError::ValidationFailed {
                    reason: format!("cannot read {}: {}", path.display(), e),
                }
            }
        })?;
        Self::from_toml_str(&contents, |name| std::env::var(name).ok())
    }

    pub fn from_toml_str<F>(contents: &str, env: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let raw: RawConfig = toml::from_str(contents)?;
        validate_service(&raw.service)?;

        let source = resolve_source(raw.source, &env)?;
        let accounts = resolve_accounts(raw.accounts, &env)?;

        if accounts.is_empty() {
            warn!("No accounts configured");
        }

        Ok(Self {
            service: raw.service,
            source,
            store: raw.store,
            overrides: raw.overrides,
            accounts,
        })
    }

    pub fn candidate_filter(&self) -> CandidateFilter {
        CandidateFilter::new(
            self.service.pinned_markers.clone(),
            self.service.utc_offset_hours,
        )
    }
}

fn validate_service(service: &ServiceSettings) -> Result<(), ConfigError> {
    if !(-23..=23).contains(&service.utc_offset_hours) {
        return Err(ConfigError::InvalidValue {
            field: "service.utc_offset_hours".to_string(),
            value: service.utc_offset_hours.to_string(),
        });
    }
    if service.recent_scan_limit == 0 {
        return Err(ConfigError::InvalidValue {
            field: "service.recent_scan_limit".to_string(),
            value: "0".to_string(),
        });
    }
    if service.polling_interval_minutes == 0 {
        return Err(ConfigError::InvalidValue {
            field: "service.polling_interval_minutes".to_string(),
            value: "0".to_string(),
        });
    }
    Ok(())
}

fn resolve_source<F>(raw: RawSource, env: &F) -> Result<SourceConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match raw {
        RawSource::Browserless {
            base_url,
            token,
            token_env,
            site_origin,
            settle_millis,
            request_timeout_secs,
        } => {
            if base_url.trim().is_empty() {
                return Err(ConfigError::MissingField {
                    field: "source.base_url".to_string(),
                });
            }
            let token = match (token, token_env) {
                (Some(token), _) => Some(token),
                (None, Some(var_name)) => Some(non_empty(env(&var_name)).ok_or(
                    ConfigError::MissingEnvironmentVariable { var_name },
                )?),
                (None, None) => None,
            };
            Ok(SourceConfig::Browserless {
                base_url: base_url.trim_end_matches('/').to_string(),
                token,
                site_origin: site_origin.trim_end_matches('/').to_string(),
                settle_millis,
                request_timeout_secs,
            })
        }
        RawSource::Fixture { path } => Ok(SourceConfig::Fixture { path }),
    }
}

fn resolve_accounts<F>(raw: Vec<RawAccount>, env: &F) -> Result<Vec<AccountConfig>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let mut seen_keys = HashSet::new();
    let mut accounts = Vec::with_capacity(raw.len());

    for account in raw {
        let target_handle = account.target_handle.trim().trim_start_matches('@');
        if target_handle.is_empty() {
            return Err(ConfigError::MissingField {
                field: "accounts.target_handle".to_string(),
            });
        }

        validate_cursor_key(&account.cursor_key)?;
        if !seen_keys.insert(account.cursor_key.clone()) {
            return Err(ConfigError::DuplicateCursorKey {
                key: account.cursor_key,
            });
        }

        let name = account
            .name
            .filter(|n| !n.trim().is_empty())
            .unwrap_or_else(|| account.cursor_key.clone());

        // An empty or unset webhook disables the account rather than failing.
        let webhook = match (account.webhook, account.webhook_env) {
            (Some(url), _) => non_empty(Some(url)),
            (None, Some(var_name)) => {
                let resolved = non_empty(env(&var_name));
                if resolved.is_none() {
                    debug!(account = %name, var_name = %var_name, "Webhook variable not set");
                }
                resolved
            }
            (None, None) => None,
        };

        accounts.push(AccountConfig {
            name,
            target_handle: target_handle.to_string(),
            keyword: account.keyword.filter(|k| !k.is_empty()),
            cursor_key: account.cursor_key,
            notify_target: webhook.map(NotifyTarget::new),
        });
    }

    Ok(accounts)
}

/// Cursor keys name files on disk, so they are restricted to a safe alphabet.
pub fn validate_cursor_key(key: &str) -> Result<(), ConfigError> {
    let valid = !key.is_empty()
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'));
    if valid {
        Ok(())
    } else {
        Err(ConfigError::InvalidValue {
            field: "accounts.cursor_key".to_string(),
            value: key.to_string(),
        })
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    const SAMPLE: &str = r#"
[service]
polling_interval_minutes = 5
recent_scan_limit = 12

[source]
kind = "browserless"
base_url = "http://localhost:3000/"
token_env = "BROWSERLESS_TOKEN"

[store]
kind = "sqlite"
url = "sqlite://state/cursors.db"

[overrides]
now = "2024-05-01T03:00:00Z"

[[accounts]]
name = "bot1"
target_handle = "@someone"
keyword = "live"
cursor_key = "last_tweet_id_bot1"
webhook_env = "DISCORD_WEBHOOK_BOT1"

[[accounts]]
target_handle = "other"
cursor_key = "last_tweet_id_bot2"
webhook_env = "DISCORD_WEBHOOK_BOT2"
"#;

    fn env_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_parse_full_config() {
        let env = env_from(&[
            ("BROWSERLESS_TOKEN", "tok"),
            ("DISCORD_WEBHOOK_BOT1", "https://discord.com/api/webhooks/1/a"),
        ]);
        let config = AppConfig::from_toml_str(SAMPLE, env).unwrap();

        assert_eq!(config.service.polling_interval_minutes, 5);
        assert_eq!(config.service.recent_scan_limit, 12);
        assert_eq!(config.service.utc_offset_hours, 9);
        assert_eq!(config.service.pinned_markers, vec!["Pinned", "固定"]);
        assert_eq!(
            config.source,
            SourceConfig::Browserless {
                base_url: "http://localhost:3000".to_string(),
                token: Some("tok".to_string()),
                site_origin: "https://x.com".to_string(),
                settle_millis: 5000,
                request_timeout_secs: 60,
            }
        );
        assert_eq!(
            config.store,
            StoreConfig::Sqlite {
                url: "sqlite://state/cursors.db".to_string()
            }
        );
        assert!(config.overrides.now.is_some());

        assert_eq!(config.accounts.len(), 2);
        let first = &config.accounts[0];
        assert_eq!(first.name, "bot1");
        assert_eq!(first.target_handle, "someone");
        assert_eq!(first.keyword.as_deref(), Some("live"));
        assert!(first.notify_target.is_some());

        // Unset webhook variable: account present but disabled
        let second = &config.accounts[1];
        assert_eq!(second.name, "last_tweet_id_bot2");
        assert!(second.notify_target.is_none());
        assert!(second.keyword.is_none());
    }

    #[test]
    fn test_missing_token_variable_is_an_error() {
        let err = AppConfig::from_toml_str(SAMPLE, env_from(&[])).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::MissingEnvironmentVariable { ref var_name } if var_name == "BROWSERLESS_TOKEN"
        ));
    }

    #[test]
    fn test_duplicate_cursor_keys_rejected() {
        let toml = r#"
[source]
kind = "fixture"
path = "fixtures/run.json"

[[accounts]]
target_handle = "a"
cursor_key = "shared"

[[accounts]]
target_handle = "b"
cursor_key = "shared"
"#;
        let err = AppConfig::from_toml_str(toml, env_from(&[])).unwrap_err();
        assert!(matches!(err, ConfigError::DuplicateCursorKey { .. }));
    }

    #[test]
    fn test_defaults_and_empty_keyword() {
        let toml = r#"
[source]
kind = "fixture"
path = "fixtures/run.json"

[[accounts]]
target_handle = "a"
keyword = ""
cursor_key = "a"
webhook = "https://example.com/hook"
"#;
        let config = AppConfig::from_toml_str(toml, env_from(&[])).unwrap();
        assert_eq!(config.service, ServiceSettings::default());
        assert_eq!(config.store, StoreConfig::default());
        assert_eq!(config.overrides, Overrides::default());
        assert!(config.accounts[0].keyword.is_none());
        assert!(config.accounts[0].notify_target.is_some());
    }

    #[test]
    fn test_invalid_values_rejected() {
        let bad_key = r#"
[source]
kind = "fixture"
path = "f.json"

[[accounts]]
target_handle = "a"
cursor_key = "../escape"
"#;
        assert!(matches!(
            AppConfig::from_toml_str(bad_key, env_from(&[])),
            Err(ConfigError::InvalidValue { .. })
        ));

        let bad_offset = r#"
[service]
utc_offset_hours = 30

[source]
kind = "fixture"
path = "f.json"
"#;
        assert!(matches!(
            AppConfig::from_toml_str(bad_offset, env_from(&[])),
            Err(ConfigError::InvalidValue { .. })
        ));

        let empty_handle = r#"
[source]
kind = "fixture"
path = "f.json"

[[accounts]]
target_handle = "@"
cursor_key = "a"
"#;
        assert!(matches!(
            AppConfig::from_toml_str(empty_handle, env_from(&[])),
            Err(ConfigError::MissingField { .. })
        ));
    }

    #[test]
    fn test_malformed_toml() {
        let err = AppConfig::from_toml_str("[source", env_from(&[])).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_load_missing_file() {
        let err = AppConfig::load(Path::new("/definitely/not/here.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::FileNotFound { .. }));
    }
}
