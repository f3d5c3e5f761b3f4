use std::env;
use std::time::Duration;

use crate::services::signals::EngineConfig;
use crate::sources::hyperliquid::HYPERLIQUID_INFO_URL;

/// Process configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Hyperliquid info endpoint.
    pub info_url: String,
    /// Per-request HTTP timeout.
    pub http_timeout: Duration,
    /// Candle cache TTL (zero disables caching).
    pub candle_cache_ttl: Duration,
    /// Symbols evaluated when none are given on the command line.
    pub symbols: Vec<String>,
    /// Balance used to size accepted signals.
    pub account_balance: f64,
    /// Strategy thresholds.
    pub engine: EngineConfig,
}

fn parse_symbols(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let info_url =
            env::var("HYPERLIQUID_INFO_URL").unwrap_or_else(|_| HYPERLIQUID_INFO_URL.to_string());
        let http_timeout_ms: u64 = env::var("HTTP_TIMEOUT_MS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(8000);
        let cache_ttl_ms: u64 = env::var("CANDLE_CACHE_TTL_MS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(3000);
        let symbols = env::var("SIGNAL_SYMBOLS")
            .ok()
            .map(|s| parse_symbols(&s))
            .unwrap_or_default();
        let account_balance: f64 = env::var("ACCOUNT_BALANCE")
            .ok()
            .and_then(|v| v.parse().ok())
            .filter(|v: &f64| v.is_finite())
            .unwrap_or(0.0);

        Self {
            info_url,
            http_timeout: Duration::from_millis(http_timeout_ms),
            candle_cache_ttl: Duration::from_millis(cache_ttl_ms),
            symbols,
            account_balance,
            engine: EngineConfig::from_env(),
        }
    }

    pub fn cache_enabled(&self) -> bool {
        !self.candle_cache_ttl.is_zero()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}
