//! Runtime configuration, read from environment variables.
//!
//! - `SLACK_BOT_TOKEN` - Bot token used to post messages (required to sweep)
//! - `SLACK_API_URL` - Slack Web API base (default: `https://slack.com/api`)
//! - `FLAVORTOWN_API_URL` - Source API base (default: `https://flavortown.hackclub.com/api/v1`)
//! - `DEVLOG_RELAY_CACHE_DIR` - Where the registry and seen-id records live
//! - `DEVLOG_RELAY_SWEEP_INTERVAL_SECS` - Seconds between sweeps (default: 60)
//! - `DEVLOG_RELAY_PACING_MS` - Delay after each project (default: 2000)
//! - `DEVLOG_RELAY_HTTP_TIMEOUT_SECS` - Upper bound on any upstream request (default: 30)
//! - `PORT` - HTTP port (default: 3000)

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result};

use crate::dispatch::DEFAULT_PACING;
use crate::scheduler::DEFAULT_INTERVAL;
use crate::sink::DEFAULT_SLACK_URL;
use crate::source::{DEFAULT_TIMEOUT, DEFAULT_URL};
use crate::store::default_cache_dir;

const DEFAULT_PORT: u16 = 3000;

#[derive(Debug, Clone)]
pub struct Config {
    pub slack_token: Option<String>,
    pub slack_api_url: String,
    pub source_api_url: String,
    pub cache_dir: PathBuf,
    pub sweep_interval: Duration,
    pub pacing: Duration,
    pub http_timeout: Duration,
    pub port: u16,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let cache_dir = match lookup("DEVLOG_RELAY_CACHE_DIR") {
            Some(dir) if !dir.trim().is_empty() => PathBuf::from(dir),
            _ => default_cache_dir()?,
        };

        Ok(Self {
            slack_token: lookup("SLACK_BOT_TOKEN").filter(|t| !t.trim().is_empty()),
            slack_api_url: lookup("SLACK_API_URL")
                .unwrap_or_else(|| DEFAULT_SLACK_URL.to_string()),
            source_api_url: lookup("FLAVORTOWN_API_URL")
                .unwrap_or_else(|| DEFAULT_URL.to_string()),
            cache_dir,
            sweep_interval: Duration::from_secs(parse_or(
                &lookup,
                "DEVLOG_RELAY_SWEEP_INTERVAL_SECS",
                DEFAULT_INTERVAL.as_secs(),
            )),
            pacing: Duration::from_millis(parse_or(
                &lookup,
                "DEVLOG_RELAY_PACING_MS",
                DEFAULT_PACING.as_millis() as u64,
            )),
            http_timeout: Duration::from_secs(parse_or(
                &lookup,
                "DEVLOG_RELAY_HTTP_TIMEOUT_SECS",
                DEFAULT_TIMEOUT.as_secs(),
            )),
            port: parse_or(&lookup, "PORT", DEFAULT_PORT),
        })
    }

    /// The Slack token, or an error explaining that sweeping needs one.
    pub fn require_slack_token(&self) -> Result<&str> {
        self.slack_token
            .as_deref()
            .context("SLACK_BOT_TOKEN must be set to post notifications")
    }
}

/// Parse a variable, warning and falling back to `default` when it is malformed.
fn parse_or<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: T,
) -> T {
    match lookup(key) {
        None => default,
        Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
            tracing::warn!("Ignoring invalid {}={:?}, using default", key, raw);
            default
        }),
    }
}
