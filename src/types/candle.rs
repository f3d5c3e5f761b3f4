use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// A single normalized OHLCV bar.
///
/// `t` is the bar open time in epoch milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    pub t: i64,
    pub o: f64,
    pub h: f64,
    pub l: f64,
    pub c: f64,
    pub v: f64,
}

impl Candle {
    /// Full bar range (high minus low).
    pub fn range(&self) -> f64 {
        self.h - self.l
    }

    /// Distance from the top of the body to the high.
    pub fn upper_wick(&self) -> f64 {
        self.h - self.o.max(self.c)
    }

    /// Distance from the bottom of the body to the low.
    pub fn lower_wick(&self) -> f64 {
        self.o.min(self.c) - self.l
    }
}

/// Immutable, time-ascending candle series shared cheaply between the
/// fetcher, the cache and the filter stages.
pub type CandleSeries = Arc<[Candle]>;

/// Column views over a candle series, the shape the indicators work on.
#[derive(Debug, Clone, Default)]
pub struct Columns {
    pub high: Vec<f64>,
    pub low: Vec<f64>,
    pub close: Vec<f64>,
}

impl Columns {
    pub fn from_candles(candles: &[Candle]) -> Self {
        let mut cols = Columns {
            high: Vec::with_capacity(candles.len()),
            low: Vec::with_capacity(candles.len()),
            close: Vec::with_capacity(candles.len()),
        };
        for candle in candles {
            cols.high.push(candle.h);
            cols.low.push(candle.l);
            cols.close.push(candle.c);
        }
        cols
    }
}

/// Candle timeframes the engine understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Timeframe {
    #[serde(rename = "5m")]
    FiveMinutes,
    #[serde(rename = "15m")]
    FifteenMinutes,
    #[serde(rename = "1h")]
    OneHour,
}

impl Timeframe {
    /// Parse an exchange interval string.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "5m" => Some(Timeframe::FiveMinutes),
            "15m" => Some(Timeframe::FifteenMinutes),
            "1h" => Some(Timeframe::OneHour),
            _ => None,
        }
    }

    /// Interval string as sent to the exchange.
    pub fn as_str(&self) -> &'static str {
        match self {
            Timeframe::FiveMinutes => "5m",
            Timeframe::FifteenMinutes => "15m",
            Timeframe::OneHour => "1h",
        }
    }

    /// Bar step in milliseconds.
    pub fn step_ms(&self) -> i64 {
        match self {
            Timeframe::FiveMinutes => 5 * 60_000,
            Timeframe::FifteenMinutes => 15 * 60_000,
            Timeframe::OneHour => 60 * 60_000,
        }
    }

    /// Bar step in seconds.
    pub fn step_seconds(&self) -> i64 {
        self.step_ms() / 1000
    }
}

impl fmt::Display for Timeframe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of a candle fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FetchStatus {
    Ok,
    BadSymbol,
    BadInterval,
    ApiFail,
    Empty,
}

impl FetchStatus {
    pub fn code(&self) -> &'static str {
        match self {
            FetchStatus::Ok => "OK",
            FetchStatus::BadSymbol => "BAD_SYMBOL",
            FetchStatus::BadInterval => "BAD_INTERVAL",
            FetchStatus::ApiFail => "API_FAIL",
            FetchStatus::Empty => "EMPTY",
        }
    }

    pub fn is_ok(&self) -> bool {
        matches!(self, FetchStatus::Ok)
    }
}

impl fmt::Display for FetchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Result of a staleness check on a series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Staleness {
    pub stale: bool,
    pub age_seconds: f64,
    pub last_t: i64,
}
