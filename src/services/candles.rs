//! Candle acquisition: symbol normalization, fetch, defensive parsing and
//! staleness checks.

use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tracing::{debug, warn};

use crate::services::cache::CandleCache;
use crate::sources::CandleSource;
use crate::types::{Candle, CandleSeries, FetchStatus, Staleness, Timeframe};

/// Lookback floor for the request window, in bars.
const MIN_WINDOW_BARS: usize = 50;

/// A series is stale once its last bar is older than this many steps.
const STALE_STEPS: i64 = 3;

/// Age reported for an empty series.
pub const EMPTY_SERIES_AGE_SECONDS: f64 = 1e9;

const MAX_SYMBOL_LEN: usize = 20;

/// Normalize a user-supplied symbol into an exchange coin name.
///
/// `btc/usdc`, `ETH-PERP` and ` sol ` become `BTC`, `ETH`, `SOL`. Coins using
/// the exchange's lowercase `k` thousand prefix (`kPEPE`) keep it.
pub fn normalize_symbol(symbol: &str) -> Option<String> {
    let base = symbol
        .trim()
        .split(['/', '-', ':'])
        .next()
        .unwrap_or_default()
        .trim();

    if base.is_empty() || base.len() > MAX_SYMBOL_LEN {
        return None;
    }
    if !base.chars().all(|c| c.is_ascii_alphanumeric()) {
        return None;
    }

    let mut chars = base.chars();
    let normalized = match (chars.next(), chars.as_str()) {
        (Some('k'), rest)
            if rest.len() > 1 && rest.chars().all(|c| !c.is_ascii_lowercase()) =>
        {
            format!("k{}", rest)
        }
        _ => base.to_ascii_uppercase(),
    };
    Some(normalized)
}

fn coerce_f64(value: Option<&Value>) -> Option<f64> {
    let parsed = match value? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }?;
    parsed.is_finite().then_some(parsed)
}

/// Float timestamps outside the `i64` range are rejected rather than
/// saturated.
fn f64_to_i64(f: f64) -> Option<i64> {
    (f.is_finite() && f >= i64::MIN as f64 && f < i64::MAX as f64).then(|| f as i64)
}

fn coerce_i64(value: Option<&Value>) -> Option<i64> {
    match value? {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().and_then(f64_to_i64)),
        Value::String(s) => {
            let s = s.trim();
            s.parse::<i64>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().and_then(f64_to_i64))
        }
        _ => None,
    }
}

/// Parse one raw bar record. Returns `None` for records that cannot be
/// coerced; the caller drops them.
pub fn parse_raw_candle(raw: &Value) -> Option<Candle> {
    let obj = raw.as_object()?;
    let v = match obj.get("v") {
        None | Some(Value::Null) => 0.0,
        some => coerce_f64(some)?,
    };
    Some(Candle {
        t: coerce_i64(obj.get("t"))?,
        o: coerce_f64(obj.get("o"))?,
        h: coerce_f64(obj.get("h"))?,
        l: coerce_f64(obj.get("l"))?,
        c: coerce_f64(obj.get("c"))?,
        v,
    })
}

/// Turn an exchange payload into a sorted, trimmed series.
///
/// Non-array payloads are `API_FAIL`, an empty array is `EMPTY`. A non-empty
/// array whose records all fail to parse still comes back `OK` with an empty
/// series; the orchestrator reports that as `NO_CANDLES`.
pub fn parse_snapshot(payload: &Value, limit: usize) -> (Vec<Candle>, FetchStatus) {
    let Some(records) = payload.as_array() else {
        return (Vec::new(), FetchStatus::ApiFail);
    };
    if records.is_empty() {
        return (Vec::new(), FetchStatus::Empty);
    }

    let mut candles: Vec<Candle> = records.iter().filter_map(parse_raw_candle).collect();
    candles.sort_by_key(|c| c.t);
    if candles.len() > limit {
        candles.drain(..candles.len() - limit);
    }
    (candles, FetchStatus::Ok)
}

/// Staleness of `series` measured against `now_ms`.
pub fn is_stale_at(series: &[Candle], timeframe: Timeframe, now_ms: i64) -> Staleness {
    let Some(last) = series.last() else {
        return Staleness {
            stale: true,
            age_seconds: EMPTY_SERIES_AGE_SECONDS,
            last_t: 0,
        };
    };
    let age_ms = now_ms.saturating_sub(last.t);
    Staleness {
        stale: age_ms > STALE_STEPS * timeframe.step_ms(),
        age_seconds: age_ms as f64 / 1000.0,
        last_t: last.t,
    }
}

/// Staleness of `series` against the wall clock.
pub fn is_stale(series: &[Candle], timeframe: Timeframe) -> Staleness {
    is_stale_at(series, timeframe, chrono::Utc::now().timestamp_millis())
}

fn cache_key(coin: &str, timeframe: Timeframe) -> String {
    format!("{}:{}", coin, timeframe)
}

fn tail(series: &CandleSeries, limit: usize) -> CandleSeries {
    if series.len() <= limit {
        series.clone()
    } else {
        Arc::from(&series[series.len() - limit..])
    }
}

/// Fetches normalized candle series from a [`CandleSource`], reading
/// through an injected cache.
pub struct CandleFetcher<S> {
    source: S,
    cache: Arc<dyn CandleCache>,
    cache_ttl: Duration,
}

impl<S: CandleSource> CandleFetcher<S> {
    pub fn new(source: S, cache: Arc<dyn CandleCache>, cache_ttl: Duration) -> Self {
        Self {
            source,
            cache,
            cache_ttl,
        }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Fetch an interval given as an exchange string (`"5m"`, `"15m"`, `"1h"`).
    pub async fn fetch_interval(
        &self,
        symbol: &str,
        interval: &str,
        limit: usize,
    ) -> (CandleSeries, FetchStatus) {
        match Timeframe::parse(interval) {
            Some(tf) => self.fetch(symbol, tf, limit).await,
            None => (empty_series(), FetchStatus::BadInterval),
        }
    }

    /// Fetch the most recent `limit` bars for `symbol`.
    pub async fn fetch(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        limit: usize,
    ) -> (CandleSeries, FetchStatus) {
        let Some(coin) = normalize_symbol(symbol) else {
            return (empty_series(), FetchStatus::BadSymbol);
        };
        self.fetch_at(&coin, timeframe, limit, chrono::Utc::now().timestamp_millis())
            .await
    }

    /// Fetch with an explicit clock. `coin` must already be normalized.
    pub async fn fetch_at(
        &self,
        coin: &str,
        timeframe: Timeframe,
        limit: usize,
        now_ms: i64,
    ) -> (CandleSeries, FetchStatus) {
        let key = cache_key(coin, timeframe);
        if let Some(hit) = self.cache.get(&key) {
            debug!(coin, interval = %timeframe, bars = hit.len(), "Candle cache hit");
            return (tail(&hit, limit), FetchStatus::Ok);
        }

        let bars = limit.max(MIN_WINDOW_BARS) as i64 + 1;
        let start = now_ms - bars * timeframe.step_ms();

        let payload = match self
            .source
            .candle_snapshot(coin, timeframe, start, now_ms)
            .await
        {
            Ok(payload) => payload,
            Err(e) => {
                warn!(coin, interval = %timeframe, "Candle fetch failed: {}", e);
                return (empty_series(), FetchStatus::ApiFail);
            }
        };

        let (candles, status) = parse_snapshot(&payload, limit);
        if !status.is_ok() {
            warn!(coin, interval = %timeframe, status = %status, "Candle fetch unusable");
            return (empty_series(), status);
        }

        debug!(coin, interval = %timeframe, bars = candles.len(), "Fetched candles");
        let series: CandleSeries = candles.into();
        if !series.is_empty() {
            self.cache.put(&key, series.clone(), self.cache_ttl);
        }
        (series, FetchStatus::Ok)
    }
}

pub fn empty_series() -> CandleSeries {
    Arc::from(Vec::<Candle>::new())
}
