//! Exchange collaborators that supply raw candle data.

pub mod hyperliquid;

pub use hyperliquid::HyperliquidClient;

use crate::error::Result;
use crate::types::Timeframe;
use std::future::Future;

/// Raw candle snapshot provider.
///
/// Implementations return the exchange's JSON payload untouched; shaping it
/// into candles (and deciding what counts as malformed) is the fetcher's
/// job. Any `Err` is reported upstream as `API_FAIL`.
pub trait CandleSource: Send + Sync {
    fn candle_snapshot(
        &self,
        coin: &str,
        interval: Timeframe,
        start_time: i64,
        end_time: i64,
    ) -> impl Future<Output = Result<serde_json::Value>> + Send;
}
