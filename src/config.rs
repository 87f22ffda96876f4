use std::env;
use std::time::Duration;

use anyhow::{Context, Result};

use crate::api::client::DEFAULT_TIMEOUT;
use crate::polling::scheduler::DEFAULT_POLL_INTERVAL;

/// Where API responses come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    /// The real Meme Market API at `api_url` (default)
    Http,
    /// Fabricated responses, no network needed
    Demo,
}

/// Central configuration loaded from environment variables.
///
/// The .env file is loaded automatically at startup via dotenvy.
#[derive(Debug, Clone)]
pub struct Config {
    /// API origin for every call (MEME_MARKET_API_URL, falling back to
    /// NEXT_PUBLIC_API_URL). Empty when unset.
    pub api_url: String,
    /// Per-request timeout. `None` when MEME_MARKET_TIMEOUT_SECS=0.
    pub request_timeout: Option<Duration>,
    /// Dashboard refresh period (MEME_MARKET_POLL_INTERVAL_MS)
    pub poll_interval: Duration,
    pub backend: Backend,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build configuration from any key lookup (the process environment in
    /// `load`).
    ///
    /// Malformed numbers are an error rather than a silent default.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_url = lookup("MEME_MARKET_API_URL")
            .or_else(|| lookup("NEXT_PUBLIC_API_URL"))
            .unwrap_or_default()
            .trim()
            .trim_end_matches('/')
            .to_string();

        let request_timeout = match lookup("MEME_MARKET_TIMEOUT_SECS") {
            Some(raw) => {
                let secs: u64 = raw.trim().parse().with_context(|| {
                    format!("MEME_MARKET_TIMEOUT_SECS must be a whole number of seconds, got {raw:?}")
                })?;
                (secs > 0).then(|| Duration::from_secs(secs))
            }
            None => Some(DEFAULT_TIMEOUT),
        };

        let poll_interval = match lookup("MEME_MARKET_POLL_INTERVAL_MS") {
            Some(raw) => {
                let ms: u64 = raw.trim().parse().with_context(|| {
                    format!("MEME_MARKET_POLL_INTERVAL_MS must be milliseconds, got {raw:?}")
                })?;
                if ms == 0 {
                    anyhow::bail!("MEME_MARKET_POLL_INTERVAL_MS must be greater than zero");
                }
                Duration::from_millis(ms)
            }
            None => DEFAULT_POLL_INTERVAL,
        };

        let backend = match lookup("MEME_MARKET_BACKEND").as_deref() {
            Some("demo") => Backend::Demo,
            Some("http") | None => Backend::Http,
            Some(other) => anyhow::bail!(
                "MEME_MARKET_BACKEND must be `http` or `demo`, got {other:?}"
            ),
        };

        Ok(Self {
            api_url,
            request_timeout,
            poll_interval,
            backend,
        })
    }

    /// Check that an API origin is configured.
    /// Call this before building an HTTP executor.
    pub fn require_api_url(&self) -> Result<()> {
        if self.backend == Backend::Http && self.api_url.is_empty() {
            anyhow::bail!(
                "MEME_MARKET_API_URL not set. Add it to your .env file\n\
                 (e.g. MEME_MARKET_API_URL=http://localhost:8000/api/v1),\n\
                 or pass --demo to use fabricated data."
            );
        }
        Ok(())
    }
}
