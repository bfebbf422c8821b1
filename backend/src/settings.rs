//! Service configuration loaded via OrthoConfig.
//!
//! Values come from `SHIPTRACK_*` environment variables, a config file or the
//! command line. Optional backing services fall back to in-process adapters
//! when their URL is absent.

use std::net::SocketAddr;

use ortho_config::OrthoConfig;
use serde::Deserialize;
use url::Url;

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
const DEFAULT_PUBLIC_BASE_URL: &str = "http://localhost:8080";
const DEFAULT_MAIL_SENDER: &str = "shiptrack <no-reply@shiptrack.local>";
const DEFAULT_ACCESS_TOKEN_TTL_MINUTES: u32 = 1440;
const DEFAULT_DB_MAX_CONNECTIONS: u32 = 10;
const DEFAULT_NOTIFICATION_QUEUE_CAPACITY: usize = 256;

/// Errors raised while interpreting loaded settings.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    /// `bind_addr` is not a socket address.
    #[error("invalid SHIPTRACK_BIND_ADDR '{value}': {message}")]
    BindAddr {
        /// Rejected value.
        value: String,
        /// Underlying error message.
        message: String,
    },
    /// A URL setting does not parse.
    #[error("invalid URL in {name}: {message}")]
    Url {
        /// Setting name.
        name: &'static str,
        /// Underlying error message.
        message: String,
    },
    /// Access tokens must live for at least a minute.
    #[error("SHIPTRACK_ACCESS_TOKEN_TTL_MINUTES must be at least 1")]
    ZeroTokenTtl,
}

/// Runtime settings for the shiptrack service.
#[derive(Debug, Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "SHIPTRACK")]
pub struct AppSettings {
    /// Socket address the HTTP server binds to.
    pub bind_addr: Option<String>,
    /// PostgreSQL connection string; in-memory persistence when absent.
    pub database_url: Option<String>,
    /// Redis connection string for revocations and verification codes.
    pub redis_url: Option<String>,
    /// Base URL used when building verification and reset links.
    pub public_base_url: Option<String>,
    /// HTTP mail relay endpoint; notifications are only logged when absent.
    pub mail_relay_url: Option<String>,
    /// Sender address handed to the mail relay.
    pub mail_sender: Option<String>,
    /// Access token lifetime in minutes. Defaults to 1440.
    pub access_token_ttl_minutes: Option<u32>,
    /// Apply embedded migrations on startup. Defaults to `true`.
    pub run_migrations: Option<bool>,
    /// PostgreSQL pool size. Defaults to 10.
    pub db_max_connections: Option<u32>,
    /// Pending notifications held before new ones are dropped. Defaults to 256.
    pub notification_queue_capacity: Option<usize>,
}

impl AppSettings {
    /// Parsed bind address, defaulting to `0.0.0.0:8080`.
    pub fn bind_addr(&self) -> Result<SocketAddr, SettingsError> {
        let raw = self.bind_addr.as_deref().unwrap_or(DEFAULT_BIND_ADDR);
        raw.parse().map_err(|error: std::net::AddrParseError| SettingsError::BindAddr {
            value: raw.to_owned(),
            message: error.to_string(),
        })
    }

    /// Base URL with any trailing slash removed.
    pub fn public_base_url(&self) -> Result<String, SettingsError> {
        let raw = self
            .public_base_url
            .as_deref()
            .unwrap_or(DEFAULT_PUBLIC_BASE_URL);
        Url::parse(raw).map_err(|error| SettingsError::Url {
            name: "SHIPTRACK_PUBLIC_BASE_URL",
            message: error.to_string(),
        })?;
        Ok(raw.trim_end_matches('/').to_owned())
    }

    /// Parsed mail relay URL, if configured.
    pub fn mail_relay_url(&self) -> Result<Option<Url>, SettingsError> {
        self.mail_relay_url
            .as_deref()
            .map(|raw| {
                Url::parse(raw).map_err(|error| SettingsError::Url {
                    name: "SHIPTRACK_MAIL_RELAY_URL",
                    message: error.to_string(),
                })
            })
            .transpose()
    }

    /// Sender address, with a default.
    pub fn mail_sender(&self) -> &str {
        self.mail_sender.as_deref().unwrap_or(DEFAULT_MAIL_SENDER)
    }

    /// Access token lifetime.
    pub fn access_token_ttl(&self) -> Result<chrono::Duration, SettingsError> {
        let minutes = self
            .access_token_ttl_minutes
            .unwrap_or(DEFAULT_ACCESS_TOKEN_TTL_MINUTES);
        if minutes == 0 {
            return Err(SettingsError::ZeroTokenTtl);
        }
        Ok(chrono::Duration::minutes(i64::from(minutes)))
    }

    /// Whether embedded migrations run before the pool is built.
    pub fn run_migrations(&self) -> bool {
        self.run_migrations.unwrap_or(true)
    }

    /// Pool size, never below one.
    pub fn db_max_connections(&self) -> u32 {
        self.db_max_connections
            .unwrap_or(DEFAULT_DB_MAX_CONNECTIONS)
            .max(1)
    }

    /// Notification queue bound.
    pub fn notification_queue_capacity(&self) -> usize {
        self.notification_queue_capacity
            .unwrap_or(DEFAULT_NOTIFICATION_QUEUE_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    //! Unit tests for settings parsing.

    use super::*;
    use std::ffi::OsString;

    use env_lock::lock_env;
    use rstest::rstest;

    const VARS: [&str; 10] = [
        "SHIPTRACK_BIND_ADDR",
        "SHIPTRACK_DATABASE_URL",
        "SHIPTRACK_REDIS_URL",
        "SHIPTRACK_PUBLIC_BASE_URL",
        "SHIPTRACK_MAIL_RELAY_URL",
        "SHIPTRACK_MAIL_SENDER",
        "SHIPTRACK_ACCESS_TOKEN_TTL_MINUTES",
        "SHIPTRACK_RUN_MIGRATIONS",
        "SHIPTRACK_DB_MAX_CONNECTIONS",
        "SHIPTRACK_NOTIFICATION_QUEUE_CAPACITY",
    ];

    fn cleared_except(overrides: &[(&'static str, &str)]) -> Vec<(&'static str, Option<String>)> {
        VARS.iter()
            .map(|name| {
                let value = overrides
                    .iter()
                    .find(|(key, _)| key == name)
                    .map(|(_, value)| (*value).to_owned());
                (*name, value)
            })
            .collect()
    }

    fn load_from_empty_args() -> AppSettings {
        AppSettings::load_from_iter([OsString::from("shiptrack")]).expect("config should load")
    }

    #[rstest]
    fn defaults_apply_when_unset() {
        let _guard = lock_env(cleared_except(&[]));

        let settings = load_from_empty_args();

        assert_eq!(
            settings.bind_addr().expect("default addr"),
            "0.0.0.0:8080".parse::<SocketAddr>().expect("addr")
        );
        assert!(settings.database_url.is_none());
        assert!(settings.redis_url.is_none());
        assert_eq!(
            settings.public_base_url().expect("default url"),
            "http://localhost:8080"
        );
        assert!(settings.mail_relay_url().expect("absent").is_none());
        assert_eq!(
            settings.access_token_ttl().expect("ttl"),
            chrono::Duration::minutes(1440)
        );
        assert!(settings.run_migrations());
        assert_eq!(settings.db_max_connections(), 10);
    }

    #[rstest]
    fn environment_overrides_are_respected() {
        let _guard = lock_env(cleared_except(&[
            ("SHIPTRACK_BIND_ADDR", "127.0.0.1:9000"),
            ("SHIPTRACK_DATABASE_URL", "postgres://ship@localhost/track"),
            ("SHIPTRACK_PUBLIC_BASE_URL", "https://track.example.com/"),
            ("SHIPTRACK_MAIL_RELAY_URL", "https://mail.example.com/send"),
            ("SHIPTRACK_ACCESS_TOKEN_TTL_MINUTES", "15"),
            ("SHIPTRACK_RUN_MIGRATIONS", "false"),
        ]));

        let settings = load_from_empty_args();

        assert_eq!(settings.bind_addr().expect("addr").port(), 9000);
        assert_eq!(
            settings.database_url.as_deref(),
            Some("postgres://ship@localhost/track")
        );
        assert_eq!(
            settings.public_base_url().expect("url"),
            "https://track.example.com"
        );
        assert_eq!(
            settings
                .mail_relay_url()
                .expect("valid")
                .map(|url| url.host_str().map(str::to_owned)),
            Some(Some("mail.example.com".to_owned()))
        );
        assert_eq!(
            settings.access_token_ttl().expect("ttl"),
            chrono::Duration::minutes(15)
        );
        assert!(!settings.run_migrations());
    }

    #[rstest]
    #[case("SHIPTRACK_BIND_ADDR", "not-an-address")]
    #[case("SHIPTRACK_PUBLIC_BASE_URL", "not a url")]
    #[case("SHIPTRACK_MAIL_RELAY_URL", "::")]
    #[case("SHIPTRACK_ACCESS_TOKEN_TTL_MINUTES", "0")]
    fn invalid_values_are_reported(#[case] name: &'static str, #[case] value: &str) {
        let _guard = lock_env(cleared_except(&[(name, value)]));

        let settings = load_from_empty_args();
        let failed = settings.bind_addr().is_err()
            || settings.public_base_url().is_err()
            || settings.mail_relay_url().is_err()
            || settings.access_token_ttl().is_err();

        assert!(failed, "{name}={value} should be rejected");
    }
}
