//! Configuration module for feedwatch.

use serde::Deserialize;
use std::path::Path;

use crate::feed::MAX_FEED_SIZE;
use crate::{Result, WatchError};

/// Feed polling configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct FeedConfig {
    /// URL of the RSS/Atom feed to watch.
    #[serde(default = "default_feed_url")]
    pub url: String,
    /// Seconds to sleep between poll cycles.
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,
    /// Total request timeout in seconds.
    #[serde(default = "default_feed_timeout")]
    pub timeout_secs: u64,
    /// User-Agent header sent with every fetch.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    /// Maximum feed size in bytes.
    #[serde(default = "default_max_feed_size")]
    pub max_feed_size_bytes: u64,
}

fn default_feed_url() -> String {
    "http://localhost:8080/YUY_IX/rss".to_string()
}

fn default_poll_interval() -> u64 {
    60
}

fn default_feed_timeout() -> u64 {
    20
}

fn default_user_agent() -> String {
    "rss-watcher/1.0 (+local)".to_string()
}

fn default_max_feed_size() -> u64 {
    MAX_FEED_SIZE
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            url: default_feed_url(),
            poll_interval_secs: default_poll_interval(),
            timeout_secs: default_feed_timeout(),
            user_agent: default_user_agent(),
            max_feed_size_bytes: default_max_feed_size(),
        }
    }
}

/// Notification delivery configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct NotifyConfig {
    /// Endpoint that receives the normalized link as a text/plain POST.
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    /// Also notify for the entry used to prime an empty watermark.
    #[serde(default)]
    pub notify_on_prime: bool,
    /// Account name used to build normalized links.
    #[serde(default = "default_account")]
    pub account: String,
    /// Domain used to build normalized links.
    #[serde(default = "default_link_domain")]
    pub link_domain: String,
    /// Delivery request timeout in seconds.
    #[serde(default = "default_notify_timeout")]
    pub timeout_secs: u64,
}

fn default_endpoint() -> String {
    "http://localhost:3000/".to_string()
}

fn default_account() -> String {
    "YUY_IX".to_string()
}

fn default_link_domain() -> String {
    "x.com".to_string()
}

fn default_notify_timeout() -> u64 {
    30
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            notify_on_prime: false,
            account: default_account(),
            link_domain: default_link_domain(),
            timeout_secs: default_notify_timeout(),
        }
    }
}

/// Watermark persistence configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct StateConfig {
    /// Path to the file holding the last notified id.
    #[serde(default = "default_state_path")]
    pub path: String,
}

fn default_state_path() -> String {
    "last_seen_id.txt".to_string()
}

impl Default for StateConfig {
    fn default() -> Self {
        Self {
            path: default_state_path(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Path to the log file. Empty means console only.
    #[serde(default)]
    pub file: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: String::new(),
        }
    }
}

/// Relay receiver configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct RelayConfig {
    /// Host address to bind.
    #[serde(default = "default_relay_host")]
    pub host: String,
    /// Port number to listen on.
    #[serde(default = "default_relay_port")]
    pub port: u16,
    /// Chat webhook that receives forwarded posts.
    #[serde(default)]
    pub webhook_url: String,
    /// Role mentioned in forwarded messages. Empty disables the mention.
    #[serde(default)]
    pub role_id: String,
    /// Text placed between the mention and the link.
    #[serde(default = "default_relay_message")]
    pub message: String,
}

fn default_relay_host() -> String {
    "0.0.0.0".to_string()
}

fn default_relay_port() -> u16 {
    3000
}

fn default_relay_message() -> String {
    "new twitter post!".to_string()
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            host: default_relay_host(),
            port: default_relay_port(),
            webhook_url: String::new(),
            role_id: String::new(),
            message: default_relay_message(),
        }
    }
}

/// Main configuration structure.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct Config {
    /// Feed polling configuration.
    #[serde(default)]
    pub feed: FeedConfig,
    /// Notification configuration.
    #[serde(default)]
    pub notify: NotifyConfig,
    /// Watermark persistence configuration.
    #[serde(default)]
    pub state: StateConfig,
    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Relay configuration.
    #[serde(default)]
    pub relay: RelayConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(WatchError::Io)?;
        Self::parse(&content)
    }

    /// Load configuration from a TOML file and apply environment variable overrides.
    pub fn load_with_env<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Parse configuration from a TOML string.
    pub fn parse(s: &str) -> Result<Self> {
        toml::from_str(s).map_err(|e| WatchError::Config(format!("config parse error: {e}")))
    }

    /// Apply environment variable overrides to the configuration.
    ///
    /// Supported environment variables:
    /// - `FEEDWATCH_FEED_URL`: feed URL
    /// - `FEEDWATCH_NOTIFY_ENDPOINT`: notification endpoint
    /// - `FEEDWATCH_WEBHOOK_URL`: relay webhook URL
    /// - `PORT`: relay port
    pub fn apply_env_overrides(&mut self) {
        if let Some(url) = non_empty_env("FEEDWATCH_FEED_URL") {
            self.feed.url = url;
        }
        if let Some(endpoint) = non_empty_env("FEEDWATCH_NOTIFY_ENDPOINT") {
            self.notify.endpoint = endpoint;
        }
        if let Some(webhook) = non_empty_env("FEEDWATCH_WEBHOOK_URL") {
            self.relay.webhook_url = webhook;
        }
        if let Some(port) = non_empty_env("PORT").and_then(|p| p.parse().ok()) {
            self.relay.port = port;
        }
    }

    /// Validate the settings used by the watcher.
    pub fn validate(&self) -> Result<()> {
        validate_http_url("feed.url", &self.feed.url)?;
        validate_http_url("notify.endpoint", &self.notify.endpoint)?;

        if self.feed.poll_interval_secs == 0 {
            return Err(WatchError::Validation(
                "feed.poll_interval_secs must be greater than zero".to_string(),
            ));
        }
        if self.notify.account.trim().is_empty() {
            return Err(WatchError::Validation(
                "notify.account must not be empty".to_string(),
            ));
        }
        if self.notify.link_domain.trim().is_empty() {
            return Err(WatchError::Validation(
                "notify.link_domain must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// Validate the settings used by the relay.
    pub fn validate_relay(&self) -> Result<()> {
        if self.relay.webhook_url.is_empty() {
            return Err(WatchError::Validation(
                "relay.webhook_url is not set. \
                 Set it in the config file or via FEEDWATCH_WEBHOOK_URL."
                    .to_string(),
            ));
        }
        validate_http_url("relay.webhook_url", &self.relay.webhook_url)
    }
}

fn non_empty_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.is_empty())
}

/// Check that `value` parses as an absolute http or https URL.
fn validate_http_url(field: &str, value: &str) -> Result<()> {
    let parsed = url::Url::parse(value)
        .map_err(|e| WatchError::Validation(format!("{field}: invalid URL: {e}")))?;

    match parsed.scheme() {
        "http" | "https" => {}
        scheme => {
            return Err(WatchError::Validation(format!(
                "{field}: unsupported URL scheme: {scheme}"
            )));
        }
    }

    if parsed.host().is_none() {
        return Err(WatchError::Validation(format!("{field}: URL has no host")));
    }

    Ok(())
}
