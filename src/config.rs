//! Configuration types for msil-extract

use crate::error::{Error, Result};
use crate::plan::ExtractionPlan;
use crate::types::Envelope;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment variable holding the API subscription key
pub const API_KEY_ENV: &str = "MSIL_API_KEY";

/// Main configuration for [`Extractor`](crate::Extractor)
///
/// Every field has a default, so an empty JSON object is a valid
/// configuration file. The API key is never serialized back out.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Config {
    /// API subscription key (falls back to `MSIL_API_KEY` when unset)
    #[serde(default, skip_serializing)]
    pub api_key: Option<String>,

    /// Directory all outputs are written to (default: "geojson")
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// Spatial filter applied to every query
    #[serde(default)]
    pub envelope: Envelope,

    /// Paging and per-request settings
    #[serde(default)]
    pub paging: PagingConfig,

    /// Retry behavior for transient failures
    #[serde(default)]
    pub retry: RetryConfig,

    /// Capacity of the event broadcast channel (default: 1024)
    #[serde(default = "default_event_channel_capacity")]
    pub event_channel_capacity: usize,

    /// Data sets to fetch (default: the MSIL plan)
    #[serde(default)]
    pub plan: ExtractionPlan,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_key: None,
            output_dir: default_output_dir(),
            envelope: Envelope::default(),
            paging: PagingConfig::default(),
            retry: RetryConfig::default(),
            event_channel_capacity: default_event_channel_capacity(),
            plan: ExtractionPlan::default(),
        }
    }
}

impl Config {
    /// Load a configuration from a JSON file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| Error::Config {
            message: format!("failed to read {}: {}", path.display(), e),
            key: None,
        })?;
        serde_json::from_str(&content).map_err(|e| Error::Config {
            message: format!("failed to parse {}: {}", path.display(), e),
            key: None,
        })
    }

    /// Check settings that would otherwise fail mid-run
    pub fn validate(&self) -> Result<()> {
        if self.paging.page_size == 0 {
            return Err(Error::config(
                "page size must be greater than zero",
                "paging.page_size",
            ));
        }
        if self.paging.request_timeout.is_zero() {
            return Err(Error::config(
                "request timeout must be greater than zero",
                "paging.request_timeout",
            ));
        }
        if self.retry.max_attempts == 0 {
            return Err(Error::config(
                "at least one attempt is required",
                "retry.max_attempts",
            ));
        }
        if let Backoff::Exponential { multiplier, .. } = self.retry.backoff
            && !(multiplier.is_finite() && multiplier >= 1.0)
        {
            return Err(Error::config(
                "backoff multiplier must be a finite number >= 1.0",
                "retry.backoff.multiplier",
            ));
        }
        if !self.envelope.is_valid() {
            return Err(Error::config(
                "envelope bounds must be finite with xmin < xmax and ymin < ymax",
                "envelope",
            ));
        }
        if self.event_channel_capacity == 0 {
            return Err(Error::config(
                "event channel capacity must be greater than zero",
                "event_channel_capacity",
            ));
        }
        self.plan.validate()
    }

    /// Resolve the API key from the configuration or the environment
    ///
    /// There is no built-in fallback key: a missing key is a configuration error.
    pub fn resolve_api_key(&self) -> Result<String> {
        let from_config = self
            .api_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .map(str::to_owned);
        if let Some(key) = from_config {
            return Ok(key);
        }

        match std::env::var(API_KEY_ENV) {
            Ok(key) if !key.trim().is_empty() => Ok(key.trim().to_owned()),
            _ => Err(Error::config(
                format!("API key is not set (use the api_key setting or {API_KEY_ENV})"),
                "api_key",
            )),
        }
    }

    /// Absolute location of an output file
    pub fn output_path(&self, file: &Path) -> PathBuf {
        self.output_dir.join(file)
    }
}

/// Paging and per-request settings
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PagingConfig {
    /// Records requested per page (default: 1000)
    #[serde(default = "default_page_size")]
    pub page_size: u32,

    /// Pause between pages, in milliseconds (default: 200)
    #[serde(default = "default_page_delay", with = "millis_serde")]
    pub page_delay: Duration,

    /// Per-request timeout, in seconds (default: 60)
    #[serde(default = "default_request_timeout", with = "duration_serde")]
    pub request_timeout: Duration,
}

impl Default for PagingConfig {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
            page_delay: default_page_delay(),
            request_timeout: default_request_timeout(),
        }
    }
}

/// Retry configuration for transient failures
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Total attempts per request, the first one included (default: 5)
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Delay schedule between attempts (default: linear, 2 second step)
    #[serde(default)]
    pub backoff: Backoff,

    /// Add random jitter to delays (default: false)
    #[serde(default)]
    pub jitter: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            backoff: Backoff::default(),
            jitter: false,
        }
    }
}

/// Delay schedule between retry attempts
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "strategy", rename_all = "snake_case")]
pub enum Backoff {
    /// `step * n` before the n-th retry (2s, 4s, 6s, ... with the default step)
    Linear {
        /// Step in milliseconds
        #[serde(with = "millis_serde")]
        step: Duration,
    },
    /// `initial_delay * multiplier^(n-1)` before the n-th retry, capped at `max_delay`
    Exponential {
        /// First delay in milliseconds
        #[serde(with = "millis_serde")]
        initial_delay: Duration,
        /// Growth factor per retry
        multiplier: f64,
        /// Cap in milliseconds
        #[serde(with = "millis_serde")]
        max_delay: Duration,
    },
}

impl Default for Backoff {
    fn default() -> Self {
        Backoff::Linear {
            step: Duration::from_secs(2),
        }
    }
}

impl Backoff {
    /// Delay to wait before the given retry (1 = first retry)
    pub fn delay_for(&self, retry: u32) -> Duration {
        let retry = retry.max(1);
        match *self {
            Backoff::Linear { step } => step.saturating_mul(retry),
            Backoff::Exponential {
                initial_delay,
                multiplier,
                max_delay,
            } => {
                let exponent = i32::try_from(retry - 1).unwrap_or(i32::MAX);
                let secs = initial_delay.as_secs_f64() * multiplier.powi(exponent);
                Duration::try_from_secs_f64(secs)
                    .unwrap_or(max_delay)
                    .min(max_delay)
            }
        }
    }
}

// Default value functions
fn default_output_dir() -> PathBuf {
    PathBuf::from("geojson")
}

fn default_event_channel_capacity() -> usize {
    1024
}

fn default_page_size() -> u32 {
    1000
}

fn default_page_delay() -> Duration {
    Duration::from_millis(200)
}

fn default_request_timeout() -> Duration {
    Duration::from_secs(60)
}

fn default_max_attempts() -> u32 {
    5
}

// Duration serialization helper (whole seconds)
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_secs())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}

// Duration serialization helper (milliseconds)
mod millis_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(u64::try_from(duration.as_millis()).unwrap_or(u64::MAX))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = u64::deserialize(deserializer)?;
        Ok(Duration::from_millis(millis))
    }
}
