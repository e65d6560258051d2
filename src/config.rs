//! Configuration Module
//!
//! Handles loading and validating server configuration from environment variables.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::error::{OpsError, Result};
use crate::queue::BackoffPolicy;

/// Server configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
/// The values are fixed for the lifetime of the process.
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP server port
    pub server_port: u16,
    /// Maximum number of entries in the idempotency cache
    pub cache_max_entries: usize,
    /// Fixed TTL in seconds for idempotency cache entries
    pub cache_ttl_seconds: u64,
    /// Background cache sweep interval in seconds
    pub cleanup_interval: u64,
    /// Maximum number of records kept in the admin audit log
    pub audit_max_entries: usize,
    /// Retries allowed after the first failed delivery before dead-lettering
    pub retry_max_attempts: u32,
    /// Base delay for exponential retry backoff
    pub retry_backoff_base_ms: u64,
    /// Upper bound on retry backoff
    pub retry_backoff_cap_ms: u64,
    /// How often the delivery worker wakes without an explicit signal
    pub delivery_poll_interval_ms: u64,
    /// Per-attempt timeout for outbound sends
    pub delivery_timeout_ms: u64,
    /// Shared secret expected in `x-admin-token`; admin API is closed when unset
    pub admin_token: Option<String>,
    /// Webhook receiving outbound messages; messages are only logged when unset
    pub outbound_webhook_url: Option<String>,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `SERVER_PORT` - HTTP server port (default: 3000)
    /// - `CACHE_MAX_ENTRIES` - Idempotency cache capacity (default: 1000)
    /// - `CACHE_TTL_SECONDS` - Idempotency cache TTL (default: 300)
    /// - `CLEANUP_INTERVAL` - Cache sweep frequency in seconds (default: 5)
    /// - `AUDIT_MAX_ENTRIES` - Audit log capacity (default: 5000)
    /// - `RETRY_MAX_ATTEMPTS` - Retries before dead-lettering (default: 3)
    /// - `RETRY_BACKOFF_BASE_MS` / `RETRY_BACKOFF_CAP_MS` - Backoff curve (default: 1000 / 60000)
    /// - `DELIVERY_POLL_INTERVAL_MS` - Worker wake interval (default: 500)
    /// - `DELIVERY_TIMEOUT_MS` - Per-attempt send timeout (default: 5000)
    /// - `ADMIN_TOKEN` - Admin API secret (default: unset)
    /// - `OUTBOUND_WEBHOOK_URL` - Outbound delivery target (default: unset)
    ///
    /// Unset variables take their default. A variable that is set but does not
    /// parse (for example `CACHE_TTL_SECONDS=-5`) is a [`OpsError::Config`].
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Builds a Config from any name -> value source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let defaults = Self::default();
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        Ok(Self {
            server_port: parse_or(var("SERVER_PORT"), "SERVER_PORT", defaults.server_port)?,
            cache_max_entries: parse_or(
                var("CACHE_MAX_ENTRIES"),
                "CACHE_MAX_ENTRIES",
                defaults.cache_max_entries,
            )?,
            cache_ttl_seconds: parse_or(
                var("CACHE_TTL_SECONDS"),
                "CACHE_TTL_SECONDS",
                defaults.cache_ttl_seconds,
            )?,
            cleanup_interval: parse_or(
                var("CLEANUP_INTERVAL"),
                "CLEANUP_INTERVAL",
                defaults.cleanup_interval,
            )?,
            audit_max_entries: parse_or(
                var("AUDIT_MAX_ENTRIES"),
                "AUDIT_MAX_ENTRIES",
                defaults.audit_max_entries,
            )?,
            retry_max_attempts: parse_or(
                var("RETRY_MAX_ATTEMPTS"),
                "RETRY_MAX_ATTEMPTS",
                defaults.retry_max_attempts,
            )?,
            retry_backoff_base_ms: parse_or(
                var("RETRY_BACKOFF_BASE_MS"),
                "RETRY_BACKOFF_BASE_MS",
                defaults.retry_backoff_base_ms,
            )?,
            retry_backoff_cap_ms: parse_or(
                var("RETRY_BACKOFF_CAP_MS"),
                "RETRY_BACKOFF_CAP_MS",
                defaults.retry_backoff_cap_ms,
            )?,
            delivery_poll_interval_ms: parse_or(
                var("DELIVERY_POLL_INTERVAL_MS"),
                "DELIVERY_POLL_INTERVAL_MS",
                defaults.delivery_poll_interval_ms,
            )?,
            delivery_timeout_ms: parse_or(
                var("DELIVERY_TIMEOUT_MS"),
                "DELIVERY_TIMEOUT_MS",
                defaults.delivery_timeout_ms,
            )?,
            // An empty ADMIN_TOKEN is kept so validate() can reject it.
            admin_token: lookup("ADMIN_TOKEN"),
            outbound_webhook_url: var("OUTBOUND_WEBHOOK_URL"),
        })
    }

    /// Checks the configuration for values the components cannot run with.
    pub fn validate(&self) -> Result<()> {
        let positive = [
            ("CACHE_MAX_ENTRIES", self.cache_max_entries as u64),
            ("CACHE_TTL_SECONDS", self.cache_ttl_seconds),
            ("CLEANUP_INTERVAL", self.cleanup_interval),
            ("AUDIT_MAX_ENTRIES", self.audit_max_entries as u64),
            ("RETRY_BACKOFF_BASE_MS", self.retry_backoff_base_ms),
            ("DELIVERY_POLL_INTERVAL_MS", self.delivery_poll_interval_ms),
            ("DELIVERY_TIMEOUT_MS", self.delivery_timeout_ms),
        ];
        for (name, value) in positive {
            if value == 0 {
                return Err(OpsError::Config(format!("{} must be greater than 0", name)));
            }
        }

        if self.retry_backoff_cap_ms < self.retry_backoff_base_ms {
            return Err(OpsError::Config(format!(
                "RETRY_BACKOFF_CAP_MS ({}) must be >= RETRY_BACKOFF_BASE_MS ({})",
                self.retry_backoff_cap_ms, self.retry_backoff_base_ms
            )));
        }

        if matches!(&self.admin_token, Some(token) if token.trim().is_empty()) {
            return Err(OpsError::Config("ADMIN_TOKEN must not be empty".to_string()));
        }

        Ok(())
    }

    /// Backoff curve for the outbound retry queue.
    pub fn backoff(&self) -> BackoffPolicy {
        BackoffPolicy::new(
            Duration::from_millis(self.retry_backoff_base_ms),
            Duration::from_millis(self.retry_backoff_cap_ms),
        )
    }

    pub fn delivery_poll_interval(&self) -> Duration {
        Duration::from_millis(self.delivery_poll_interval_ms)
    }

    pub fn delivery_timeout(&self) -> Duration {
        Duration::from_millis(self.delivery_timeout_ms)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_port: 3000,
            cache_max_entries: 1000,
            cache_ttl_seconds: 300,
            cleanup_interval: 5,
            audit_max_entries: 5000,
            retry_max_attempts: 3,
            retry_backoff_base_ms: 1000,
            retry_backoff_cap_ms: 60_000,
            delivery_poll_interval_ms: 500,
            delivery_timeout_ms: 5000,
            admin_token: None,
            outbound_webhook_url: None,
        }
    }
}

fn parse_or<T>(raw: Option<String>, name: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match raw {
        None => Ok(default),
        Some(raw) => raw.trim().parse().map_err(|e| {
            OpsError::Config(format!("{} has invalid value '{}': {}", name, raw, e))
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.cache_max_entries, 1000);
        assert_eq!(config.cache_ttl_seconds, 300);
        assert_eq!(config.server_port, 3000);
        assert_eq!(config.audit_max_entries, 5000);
        assert_eq!(config.retry_max_attempts, 3);
        assert!(config.admin_token.is_none());
        assert!(config.validate().is_ok());
    }

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn test_config_from_lookup_defaults() {
        let config = Config::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.cache_max_entries, 1000);
        assert_eq!(config.cache_ttl_seconds, 300);
        assert_eq!(config.server_port, 3000);
        assert_eq!(config.retry_max_attempts, 3);
        assert!(config.admin_token.is_none());
    }

    #[test]
    fn test_config_from_lookup_overrides() {
        let config = Config::from_lookup(lookup(&[
            ("CACHE_TTL_SECONDS", "2"),
            ("CACHE_MAX_ENTRIES", " 50 "),
            ("ADMIN_TOKEN", "s3cret"),
        ]))
        .unwrap();
        assert_eq!(config.cache_ttl_seconds, 2);
        assert_eq!(config.cache_max_entries, 50);
        assert_eq!(config.admin_token.as_deref(), Some("s3cret"));
    }

    #[test]
    fn test_negative_ttl_is_config_error() {
        let result = Config::from_lookup(lookup(&[("CACHE_TTL_SECONDS", "-5")]));
        match result {
            Err(OpsError::Config(msg)) => assert!(msg.contains("CACHE_TTL_SECONDS")),
            other => panic!("expected config error, got {:?}", other),
        }
    }

    #[test]
    fn test_unparseable_capacity_is_config_error() {
        let negative = Config::from_lookup(lookup(&[("CACHE_MAX_ENTRIES", "-1")]));
        assert!(matches!(negative, Err(OpsError::Config(_))));

        let garbage = Config::from_lookup(lookup(&[("AUDIT_MAX_ENTRIES", "lots")]));
        assert!(matches!(garbage, Err(OpsError::Config(_))));
    }

    #[test]
    fn test_zero_from_env_fails_validation() {
        let config = Config::from_lookup(lookup(&[("CACHE_MAX_ENTRIES", "0")])).unwrap();
        assert!(matches!(config.validate(), Err(OpsError::Config(_))));
    }

    #[test]
    fn test_empty_admin_token_fails_validation() {
        let config = Config::from_lookup(lookup(&[("ADMIN_TOKEN", "")])).unwrap();
        assert!(matches!(config.validate(), Err(OpsError::Config(_))));
    }

    #[test]
    fn test_validate_rejects_zero_capacity() {
        let config = Config {
            cache_max_entries: 0,
            ..Config::default()
        };
        assert!(matches!(config.validate(), Err(OpsError::Config(_))));

        let config = Config {
            audit_max_entries: 0,
            ..Config::default()
        };
        assert!(matches!(config.validate(), Err(OpsError::Config(_))));
    }

    #[test]
    fn test_validate_rejects_zero_ttl() {
        let config = Config {
            cache_ttl_seconds: 0,
            ..Config::default()
        };
        assert!(matches!(config.validate(), Err(OpsError::Config(_))));
    }

    #[test]
    fn test_validate_rejects_cap_below_base() {
        let config = Config {
            retry_backoff_base_ms: 2000,
            retry_backoff_cap_ms: 1000,
            ..Config::default()
        };
        assert!(matches!(config.validate(), Err(OpsError::Config(_))));
    }

    #[test]
    fn test_validate_rejects_blank_admin_token() {
        let config = Config {
            admin_token: Some("  ".to_string()),
            ..Config::default()
        };
        assert!(matches!(config.validate(), Err(OpsError::Config(_))));
    }

    #[test]
    fn test_backoff_from_config() {
        let config = Config {
            retry_backoff_base_ms: 100,
            retry_backoff_cap_ms: 300,
            ..Config::default()
        };
        let backoff = config.backoff();
        assert_eq!(backoff.delay_for(0), Duration::from_millis(100));
        assert_eq!(backoff.delay_for(5), Duration::from_millis(300));
    }
}
