use serde::{Serialize, Serializer};
use std::fmt;

use super::candle::{FetchStatus, Timeframe};

/// Trade direction chosen by the trend filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Long,
    Short,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Long => "long",
            Direction::Short => "short",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Pipeline stage, used to attribute faults.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Trend,
    Structure,
    Timing,
    Scoring,
}

/// Failed sub-check of the 1h structure filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StructureCode {
    NoHigherHigh,
    NoHigherLow,
    NoLowerLow,
    NoLowerHigh,
}

impl StructureCode {
    pub fn code(&self) -> &'static str {
        match self {
            StructureCode::NoHigherHigh => "NO_HH",
            StructureCode::NoHigherLow => "NO_HL",
            StructureCode::NoLowerLow => "NO_LL",
            StructureCode::NoLowerHigh => "NO_LH",
        }
    }
}

/// Failed sub-check of the 5m timing filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimingCode {
    AtrBad,
    EmaBad,
    BelowEma20,
    AboveEma20,
    ImpulseBad,
    DeepRebound,
    LateAboveEma,
    LateBelowEma,
    DeepPullback,
    BarTooWide,
    WickTooLong,
}

impl TimingCode {
    pub fn code(&self) -> &'static str {
        match self {
            TimingCode::AtrBad => "ATR_BAD",
            TimingCode::EmaBad => "EMA_BAD",
            TimingCode::BelowEma20 => "BELOW_EMA20",
            TimingCode::AboveEma20 => "ABOVE_EMA20",
            TimingCode::ImpulseBad => "IMPULSE_BAD",
            TimingCode::DeepRebound => "DEEP_REBOUND",
            TimingCode::LateAboveEma => "LATE_ABOVE_EMA",
            TimingCode::LateBelowEma => "LATE_BELOW_EMA",
            TimingCode::DeepPullback => "DEEP_PULLBACK",
            TimingCode::BarTooWide => "BAR_TOO_WIDE",
            TimingCode::WickTooLong => "WICK_TOO_LONG",
        }
    }
}

/// Why an evaluation did not produce an entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    Fetch(FetchStatus),
    NoCandles,
    BadCandlesParse,
    StaleCandles,
    NoTrend1h,
    Structure1hTooShort,
    NoStructure1h(StructureCode),
    Timing5mTooShort,
    Timing5m(TimingCode),
    StrategyException,
    StructException,
    TimingException,
}

impl RejectReason {
    /// Wire code, e.g. `TIMING_5M_DEEP_REBOUND`.
    pub fn code(&self) -> String {
        match self {
            RejectReason::Fetch(status) => status.code().to_string(),
            RejectReason::NoCandles => "NO_CANDLES".to_string(),
            RejectReason::BadCandlesParse => "BAD_CANDLES_PARSE".to_string(),
            RejectReason::StaleCandles => "STALE_CANDLES".to_string(),
            RejectReason::NoTrend1h => "NO_TREND_1H".to_string(),
            RejectReason::Structure1hTooShort => "1H_TOO_SHORT".to_string(),
            RejectReason::NoStructure1h(code) => format!("NO_STRUCTURE_1H_{}", code.code()),
            RejectReason::Timing5mTooShort => "5M_TOO_SHORT".to_string(),
            RejectReason::Timing5m(code) => format!("TIMING_5M_{}", code.code()),
            RejectReason::StrategyException => "STRATEGY_EXCEPTION".to_string(),
            RejectReason::StructException => "STRUCT_EXCEPTION".to_string(),
            RejectReason::TimingException => "TIMING_EXCEPTION".to_string(),
        }
    }

    /// Filter verdicts are routine; everything else means the data or the
    /// computation let us down.
    pub fn is_filter_verdict(&self) -> bool {
        matches!(
            self,
            RejectReason::NoTrend1h
                | RejectReason::NoStructure1h(_)
                | RejectReason::Timing5m(_)
        )
    }
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.code())
    }
}

impl Serialize for RejectReason {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.code())
    }
}

/// Trend path that admitted the direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TrendPath {
    Strict,
    Fallback,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendDiagnostics {
    pub close: f64,
    pub ema: Option<f64>,
    pub adx: Option<f64>,
    pub slope_pct: f64,
    pub displacement_pct: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<TrendPath>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StructureDiagnostics {
    pub bars: usize,
    pub lookback: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub high: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub low: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prev_max_high: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prev_min_low: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TimingDiagnostics {
    pub bars: usize,
    pub close: f64,
    pub atr: f64,
    pub ema20: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub impulse_start: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub impulse_end: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub impulse: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rebound: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ext_pct: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StaleEntry {
    pub timeframe: Timeframe,
    pub age_seconds: f64,
    pub last_t: i64,
    pub stale: bool,
}

/// Explanatory payload attached to a rejection. Never persisted.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "stage", rename_all = "snake_case")]
pub enum Diagnostics {
    Acquisition { timeframe: Timeframe, status: FetchStatus },
    Stale { series: Vec<StaleEntry> },
    Trend(TrendDiagnostics),
    Structure(StructureDiagnostics),
    Timing(TimingDiagnostics),
    Fault { failed_stage: Stage, message: String },
}

/// A `signal: false` outcome.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Rejection {
    pub reason: RejectReason,
    pub coin: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diag: Option<Diagnostics>,
}

/// A `signal: true` outcome.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntrySignal {
    pub direction: Direction,
    pub strength: f64,
    pub score: f64,
    pub sl_price_pct: f64,
    pub coin: String,
    pub close_5: f64,
    pub last_candle_t_5m: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weak_adx15: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub adx15: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub adx15_min: Option<f64>,
}

/// The engine's only output. Serializes with a `signal` boolean
/// discriminator next to the variant's fields.
#[derive(Debug, Clone, PartialEq)]
pub enum SignalResult {
    Rejected(Rejection),
    Accepted(EntrySignal),
}

impl SignalResult {
    pub fn reject(coin: impl Into<String>, reason: RejectReason, diag: Option<Diagnostics>) -> Self {
        SignalResult::Rejected(Rejection {
            reason,
            coin: coin.into(),
            diag,
        })
    }

    pub fn is_signal(&self) -> bool {
        matches!(self, SignalResult::Accepted(_))
    }

    pub fn coin(&self) -> &str {
        match self {
            SignalResult::Rejected(r) => &r.coin,
            SignalResult::Accepted(e) => &e.coin,
        }
    }

    /// Reason code for rejections.
    pub fn reason(&self) -> Option<String> {
        match self {
            SignalResult::Rejected(r) => Some(r.reason.code()),
            SignalResult::Accepted(_) => None,
        }
    }

    pub fn direction(&self) -> Option<Direction> {
        match self {
            SignalResult::Rejected(_) => None,
            SignalResult::Accepted(e) => Some(e.direction),
        }
    }

    pub fn as_entry(&self) -> Option<&EntrySignal> {
        match self {
            SignalResult::Accepted(e) => Some(e),
            SignalResult::Rejected(_) => None,
        }
    }

    pub fn as_rejection(&self) -> Option<&Rejection> {
        match self {
            SignalResult::Rejected(r) => Some(r),
            SignalResult::Accepted(_) => None,
        }
    }
}

impl Serialize for SignalResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        #[derive(Serialize)]
        struct Tagged<'a, T: Serialize> {
            signal: bool,
            #[serde(flatten)]
            body: &'a T,
        }

        match self {
            SignalResult::Rejected(body) => Tagged { signal: false, body }.serialize(serializer),
            SignalResult::Accepted(body) => Tagged { signal: true, body }.serialize(serializer),
        }
    }
}

/// Position sizing derived from balance and signal strength.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RiskSizing {
    pub position_size: f64,
    pub tp: f64,
    pub sl: f64,
}
