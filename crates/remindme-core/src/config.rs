use std::path::PathBuf;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::error::{RemindmeError, Result};

pub const DEFAULT_SOCKET_PATH: &str = "/tmp/remindme.sock";
pub const DEFAULT_PID_PATH: &str = "/tmp/remindme.pid";
pub const DEFAULT_MAX_PAYLOAD_BYTES: usize = 64 * 1024; // one reminder per connection
pub const DEFAULT_READ_TIMEOUT_MS: u64 = 5_000;
pub const DEFAULT_TICK_INTERVAL_MS: u64 = 1_000; // recurring evaluator cadence
pub const DEFAULT_NOTIFY_TIMEOUT_MS: u64 = 10_000;
pub const DEFAULT_NOTIFY_TITLE: &str = "RemindMe";
pub const DEFAULT_LOG_FILTER: &str = "remindme=info,remindme_scheduler=info";

/// Environment variable naming an explicit config file.
pub const CONFIG_ENV: &str = "REMINDME_CONFIG";
/// Prefix for per-key overrides, e.g. `REMINDME_CHANNEL__SOCKET_PATH`.
pub const ENV_PREFIX: &str = "REMINDME_";

/// Top-level config (remindme.toml + REMINDME_* env overrides).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RemindmeConfig {
    #[serde(default)]
    pub channel: ChannelConfig,
    #[serde(default)]
    pub scheduler: SchedulerConfig,
    #[serde(default)]
    pub notify: NotifyConfig,
    #[serde(default)]
    pub log: LogConfig,
}

/// Submission channel (Unix socket) and process bookkeeping.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelConfig {
    #[serde(default = "default_socket_path")]
    pub socket_path: PathBuf,
    #[serde(default = "default_pid_path")]
    pub pid_path: PathBuf,
    /// Payloads above this size are dropped without parsing.
    #[serde(default = "default_max_payload_bytes")]
    pub max_payload_bytes: usize,
    /// A client that has not closed its end within this window is dropped.
    #[serde(default = "default_read_timeout_ms")]
    pub read_timeout_ms: u64,
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            socket_path: default_socket_path(),
            pid_path: default_pid_path(),
            max_payload_bytes: DEFAULT_MAX_PAYLOAD_BYTES,
            read_timeout_ms: DEFAULT_READ_TIMEOUT_MS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchedulerConfig {
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: DEFAULT_TICK_INTERVAL_MS,
        }
    }
}

/// Where fired reminders go.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NotifyBackend {
    /// `notify-send` on Linux, `osascript` on macOS.
    #[default]
    Desktop,
    /// Only write a log line. Useful on headless hosts.
    Log,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotifyConfig {
    #[serde(default)]
    pub backend: NotifyBackend,
    #[serde(default = "default_notify_title")]
    pub title: String,
    /// Upper bound on a single notifier invocation.
    #[serde(default = "default_notify_timeout_ms")]
    pub timeout_ms: u64,
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            backend: NotifyBackend::default(),
            title: default_notify_title(),
            timeout_ms: DEFAULT_NOTIFY_TIMEOUT_MS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogConfig {
    /// `tracing_subscriber::EnvFilter` directive; `RUST_LOG` wins when set.
    #[serde(default = "default_log_filter")]
    pub filter: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            filter: default_log_filter(),
        }
    }
}

fn default_socket_path() -> PathBuf {
    PathBuf::from(DEFAULT_SOCKET_PATH)
}
fn default_pid_path() -> PathBuf {
    PathBuf::from(DEFAULT_PID_PATH)
}
fn default_max_payload_bytes() -> usize {
    DEFAULT_MAX_PAYLOAD_BYTES
}
fn default_read_timeout_ms() -> u64 {
    DEFAULT_READ_TIMEOUT_MS
}
fn default_tick_interval_ms() -> u64 {
    DEFAULT_TICK_INTERVAL_MS
}
fn default_notify_title() -> String {
    DEFAULT_NOTIFY_TITLE.to_string()
}
fn default_notify_timeout_ms() -> u64 {
    DEFAULT_NOTIFY_TIMEOUT_MS
}
fn default_log_filter() -> String {
    DEFAULT_LOG_FILTER.to_string()
}

impl RemindmeConfig {
    /// Load config from a TOML file with REMINDME_* env var overrides.
    ///
    /// Checks in order:
    ///   1. Explicit path argument
    ///   2. `$REMINDME_CONFIG`
    ///   3. ~/.remindme/remindme.toml
    ///
    /// A missing file is not an error; every key has a default.
    pub fn load(config_path: Option<&str>) -> Result<Self> {
        let path = config_path
            .map(String::from)
            .or_else(|| std::env::var(CONFIG_ENV).ok())
            .unwrap_or_else(default_config_path);

        let config: RemindmeConfig = Figment::from(Serialized::defaults(RemindmeConfig::default()))
            .merge(Toml::file(&path))
            .merge(Env::prefixed(ENV_PREFIX).ignore(&["CONFIG"]).split("__"))
            .extract()
            .map_err(|e| RemindmeError::Config(e.to_string()))?;

        config.validate()?;
        Ok(config)
    }

    /// Reject values that would make the scheduling process spin or refuse
    /// every submission.
    pub fn validate(&self) -> Result<()> {
        if self.scheduler.tick_interval_ms == 0 {
            return Err(RemindmeError::Config(
                "scheduler.tick_interval_ms must be greater than 0".to_string(),
            ));
        }
        if self.channel.max_payload_bytes == 0 {
            return Err(RemindmeError::Config(
                "channel.max_payload_bytes must be greater than 0".to_string(),
            ));
        }
        if self.channel.read_timeout_ms == 0 {
            return Err(RemindmeError::Config(
                "channel.read_timeout_ms must be greater than 0".to_string(),
            ));
        }
        if self.notify.timeout_ms == 0 {
            return Err(RemindmeError::Config(
                "notify.timeout_ms must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}

fn default_config_path() -> String {
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    format!("{}/.remindme/remindme.toml", home)
}
