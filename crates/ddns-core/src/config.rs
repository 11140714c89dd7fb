//! Configuration types for the DDNS reconciler
//!
//! Configuration comes from environment variables only and is immutable once
//! loaded. Missing required values are fatal; malformed optional values fall
//! back to their defaults and are reported through [`DdnsConfig::warnings`]
//! so the daemon can log them once tracing is installed.

use crate::error::{Error, Result};
use crate::reconciler::ReconcileTarget;
use crate::scheduler::SchedulerConfig;
use std::fmt;
use std::time::Duration;
use tracing::Level;

/// Environment variable holding the provider API token
pub const ENV_API_TOKEN: &str = "CLOUDFLARE_API_TOKEN";
/// Environment variable holding the zone name
pub const ENV_ZONE_NAME: &str = "ZONE_NAME";
/// Environment variable holding the managed record name
pub const ENV_RECORD_NAME: &str = "RECORD_NAME";
/// Environment variable enabling dry-run mode
pub const ENV_DRY_RUN: &str = "DRY_RUN";
/// Environment variable holding the interval in minutes
pub const ENV_JOB_FREQUENCY: &str = "JOB_FREQUENCY";
/// Environment variable holding the log verbosity
pub const ENV_LOG_LEVEL: &str = "LOG_LEVEL";
/// Environment variable overriding the public IP lookup URL
pub const ENV_IP_LOOKUP_URL: &str = "IP_LOOKUP_URL";
/// Environment variable overriding the provider API base URL
pub const ENV_API_BASE: &str = "CLOUDFLARE_API_BASE";
/// Environment variable toggling the startup credential check
pub const ENV_VERIFY_TOKEN: &str = "VERIFY_TOKEN";
/// Environment variable bounding the total runtime in seconds
pub const ENV_MAX_RUNTIME_SECS: &str = "MAX_RUNTIME_SECS";

/// Default public IP lookup service
pub const DEFAULT_IP_LOOKUP_URL: &str = "https://api.ipify.org?format=json";

/// Default Cloudflare API base URL
pub const DEFAULT_API_BASE: &str = "https://api.cloudflare.com/client/v4";

/// Main DDNS configuration
#[derive(Clone)]
pub struct DdnsConfig {
    /// Provider API token
    /// ⚠️ NEVER log this value
    pub api_token: String,

    /// Zone containing the managed record
    pub zone_name: String,

    /// Fully qualified name of the managed A record
    pub record_name: String,

    /// Compute and log the intended change without applying it
    pub dry_run: bool,

    /// Time between cycles; `None` means run once
    pub interval: Option<Duration>,

    /// Maximum log level
    pub log_level: Level,

    /// Public IP lookup URL
    pub ip_lookup_url: String,

    /// Provider API base URL
    pub api_base: String,

    /// Verify the token before the first cycle
    pub verify_token: bool,

    /// Stop after this long even without a shutdown signal
    pub max_runtime: Option<Duration>,

    /// Non-fatal problems found while parsing optional values
    pub warnings: Vec<String>,
}

// Custom Debug implementation that hides the API token
impl fmt::Debug for DdnsConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DdnsConfig")
            .field("api_token", &"<REDACTED>")
            .field("zone_name", &self.zone_name)
            .field("record_name", &self.record_name)
            .field("dry_run", &self.dry_run)
            .field("interval", &self.interval)
            .field("log_level", &self.log_level)
            .field("ip_lookup_url", &self.ip_lookup_url)
            .field("api_base", &self.api_base)
            .field("verify_token", &self.verify_token)
            .field("max_runtime", &self.max_runtime)
            .finish()
    }
}

impl DdnsConfig {
    /// Load configuration from the process environment
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup
    ///
    /// `from_env` is this function over `std::env::var`; tests pass a map.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut warnings = Vec::new();

        let api_token = required(&lookup, ENV_API_TOKEN)?;
        let zone_name = required(&lookup, ENV_ZONE_NAME)?;
        let record_name = required(&lookup, ENV_RECORD_NAME)?;

        let dry_run = match lookup(ENV_DRY_RUN) {
            Some(raw) => parse_bool(&raw).ok_or_else(|| {
                Error::config(format!("{} must be a boolean. Got: '{}'", ENV_DRY_RUN, raw))
            })?,
            None => false,
        };

        let interval = match lookup(ENV_JOB_FREQUENCY) {
            Some(raw) => match raw.trim().parse::<i32>() {
                Ok(minutes) if minutes > 0 => Some(Duration::from_secs(minutes as u64 * 60)),
                Ok(_) => None,
                Err(e) => {
                    warnings.push(format!(
                        "failed to parse {} '{}': {}; running once",
                        ENV_JOB_FREQUENCY, raw, e
                    ));
                    None
                }
            },
            None => None,
        };

        let log_level = match lookup(ENV_LOG_LEVEL) {
            Some(raw) => parse_log_level(&raw).unwrap_or_else(|| {
                warnings.push(format!(
                    "failed to parse {} '{}'; using info",
                    ENV_LOG_LEVEL, raw
                ));
                Level::INFO
            }),
            None => Level::INFO,
        };

        let ip_lookup_url = optional_url(&lookup, ENV_IP_LOOKUP_URL, DEFAULT_IP_LOOKUP_URL)?;
        let api_base = optional_url(&lookup, ENV_API_BASE, DEFAULT_API_BASE)?;

        let verify_token = match lookup(ENV_VERIFY_TOKEN) {
            Some(raw) => parse_bool(&raw).unwrap_or_else(|| {
                warnings.push(format!(
                    "failed to parse {} '{}'; verifying token",
                    ENV_VERIFY_TOKEN, raw
                ));
                true
            }),
            None => true,
        };

        let max_runtime = match lookup(ENV_MAX_RUNTIME_SECS) {
            Some(raw) => match raw.trim().parse::<u32>() {
                Ok(0) => None,
                Ok(secs) => Some(Duration::from_secs(u64::from(secs))),
                Err(e) => {
                    warnings.push(format!(
                        "failed to parse {} '{}': {}; running until signalled",
                        ENV_MAX_RUNTIME_SECS, raw, e
                    ));
                    None
                }
            },
            None => None,
        };

        Ok(Self {
            api_token,
            zone_name,
            record_name,
            dry_run,
            interval,
            log_level,
            ip_lookup_url,
            api_base,
            verify_token,
            max_runtime,
            warnings,
        })
    }

    /// The reconciliation target described by this configuration
    pub fn target(&self) -> ReconcileTarget {
        ReconcileTarget::new(&self.zone_name, &self.record_name).with_dry_run(self.dry_run)
    }

    /// Scheduler settings described by this configuration
    pub fn scheduler_config(&self) -> SchedulerConfig {
        SchedulerConfig {
            interval: self.interval,
            max_runtime: self.max_runtime,
            ..SchedulerConfig::default()
        }
    }
}

fn required<F>(lookup: &F, key: &str) -> Result<String>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(value) if !value.trim().is_empty() => Ok(value.trim().to_string()),
        Some(_) => Err(Error::config(format!("{} cannot be empty", key))),
        None => Err(Error::config(format!(
            "{} is required. Set it via: export {}=...",
            key, key
        ))),
    }
}

fn optional_url<F>(lookup: &F, key: &str, default: &str) -> Result<String>
where
    F: Fn(&str) -> Option<String>,
{
    let url = match lookup(key) {
        Some(value) if !value.trim().is_empty() => value.trim().to_string(),
        _ => return Ok(default.to_string()),
    };

    if !url.starts_with("https://") && !url.starts_with("http://") {
        return Err(Error::config(format!(
            "{} must use HTTP or HTTPS scheme. Got: {}",
            key, url
        )));
    }

    Ok(url)
}

/// Parse a boolean the way the classic env conventions spell it
fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "t" | "true" => Some(true),
        "0" | "f" | "false" => Some(false),
        _ => None,
    }
}

/// Parse a log level name or a numeric severity
///
/// Numeric levels use the 4-step scale: -4 debug, 0 info, 4 warn, 8 error.
/// Anything below -4 enables trace.
fn parse_log_level(raw: &str) -> Option<Level> {
    let raw = raw.trim();

    if let Ok(n) = raw.parse::<i32>() {
        let level = match n {
            i32::MIN..=-5 => Level::TRACE,
            -4..=-1 => Level::DEBUG,
            0..=3 => Level::INFO,
            4..=7 => Level::WARN,
            _ => Level::ERROR,
        };
        return Some(level);
    }

    match raw.to_ascii_lowercase().as_str() {
        "trace" => Some(Level::TRACE),
        "debug" => Some(Level::DEBUG),
        "info" => Some(Level::INFO),
        "warn" | "warning" => Some(Level::WARN),
        "error" => Some(Level::ERROR),
        _ => None,
    }
}
