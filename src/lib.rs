//! Wraith - multi-timeframe entry signal engine for perpetual futures

pub mod config;
pub mod error;
pub mod services;
pub mod sources;
pub mod types;

use std::sync::Arc;

use services::{CandleCache, CandleFetcher, NoCache, SignalEngine, TtlCandleCache};
use sources::HyperliquidClient;

// Re-export commonly used types
pub use error::{AppError, Result, StageError};
pub use types::*;

/// Engine wired to the live Hyperliquid API as described by `config`.
pub fn engine_from_config(config: &config::Config) -> Result<SignalEngine<HyperliquidClient>> {
    let client = HyperliquidClient::new(config.info_url.clone(), config.http_timeout)?;
    let cache: Arc<dyn CandleCache> = if config.cache_enabled() {
        Arc::new(TtlCandleCache::new())
    } else {
        Arc::new(NoCache)
    };
    let fetcher = CandleFetcher::new(client, cache, config.candle_cache_ttl);
    Ok(SignalEngine::new(fetcher, config.engine.clone()))
}
