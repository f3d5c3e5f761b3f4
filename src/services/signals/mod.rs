//! Multi-timeframe entry signal engine.
//!
//! Pulls 1h, 15m and 5m candles for a coin, then runs them through the
//! trend, structure and timing gates before scoring. Every gate can stop
//! the evaluation with a reason code; whatever happens, the caller gets a
//! well-formed [`SignalResult`].

pub mod config;
pub mod indicators;
pub mod scoring;
pub mod structure;
pub mod timing;
pub mod trend;

pub use config::{EngineConfig, Preset};

use tracing::{info, warn};

use crate::error::StageError;
use crate::services::candles::{empty_series, is_stale_at, normalize_symbol, CandleFetcher};
use crate::sources::CandleSource;
use crate::types::{
    Candle, CandleSeries, Diagnostics, EntrySignal, FetchStatus, RejectReason, SignalResult,
    Stage, StaleEntry, Timeframe,
};

/// Longest fault message carried in a rejection.
const MAX_FAULT_MESSAGE: usize = 200;

/// Outcome of a single gate.
#[derive(Debug, Clone, PartialEq)]
pub enum Verdict<T> {
    Passed(T),
    Rejected {
        reason: RejectReason,
        diagnostics: Diagnostics,
    },
}

impl<T> Verdict<T> {
    pub fn is_passed(&self) -> bool {
        matches!(self, Verdict::Passed(_))
    }

    pub fn passed(&self) -> Option<&T> {
        match self {
            Verdict::Passed(value) => Some(value),
            Verdict::Rejected { .. } => None,
        }
    }

    pub fn reason(&self) -> Option<RejectReason> {
        match self {
            Verdict::Passed(_) => None,
            Verdict::Rejected { reason, .. } => Some(*reason),
        }
    }

    pub fn diagnostics(&self) -> Option<&Diagnostics> {
        match self {
            Verdict::Passed(_) => None,
            Verdict::Rejected { diagnostics, .. } => Some(diagnostics),
        }
    }
}

fn fault(coin: &str, reason: RejectReason, stage: Stage, err: StageError) -> SignalResult {
    let message: String = err.to_string().chars().take(MAX_FAULT_MESSAGE).collect();
    warn!(coin, reason = %reason, ?stage, "Signal stage fault: {}", message);
    SignalResult::reject(
        coin,
        reason,
        Some(Diagnostics::Fault {
            failed_stage: stage,
            message,
        }),
    )
}

/// Unwrap a gate outcome, or turn it into the evaluation's final result.
fn gate<T>(
    coin: &str,
    outcome: Result<Verdict<T>, StageError>,
    stage: Stage,
    fault_reason: RejectReason,
) -> Result<T, SignalResult> {
    match outcome {
        Ok(Verdict::Passed(value)) => Ok(value),
        Ok(Verdict::Rejected {
            reason,
            diagnostics,
        }) => {
            if reason.is_filter_verdict() {
                info!(coin, reason = %reason, "Entry blocked");
            } else {
                warn!(coin, reason = %reason, "Not enough history to evaluate");
            }
            Err(SignalResult::reject(coin, reason, Some(diagnostics)))
        }
        Err(e) => Err(fault(coin, fault_reason, stage, e)),
    }
}

fn last_close_usable(series: &[Candle]) -> bool {
    series.last().map_or(false, |c| c.c.is_finite() && c.c > 0.0)
}

/// Entry signal engine over an injected candle source.
pub struct SignalEngine<S> {
    fetcher: CandleFetcher<S>,
    config: EngineConfig,
}

impl<S: CandleSource> SignalEngine<S> {
    pub fn new(fetcher: CandleFetcher<S>, config: EngineConfig) -> Self {
        Self { fetcher, config }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn fetcher(&self) -> &CandleFetcher<S> {
        &self.fetcher
    }

    /// Decide whether `symbol` has an entry right now.
    pub async fn get_entry_signal(&self, symbol: &str) -> SignalResult {
        self.evaluate_at(symbol, chrono::Utc::now().timestamp_millis())
            .await
    }

    /// Evaluate with an explicit clock. Used for request windows and
    /// staleness.
    pub async fn evaluate_at(&self, symbol: &str, now_ms: i64) -> SignalResult {
        let Some(coin) = normalize_symbol(symbol) else {
            warn!(symbol, "Rejecting unusable symbol");
            return SignalResult::reject(
                symbol.trim(),
                RejectReason::Fetch(FetchStatus::BadSymbol),
                None,
            );
        };

        match self.run(&coin, now_ms).await {
            Ok(entry) => {
                info!(
                    coin = %entry.coin,
                    direction = %entry.direction,
                    score = entry.score,
                    strength = entry.strength,
                    sl_price_pct = entry.sl_price_pct,
                    weak_adx15 = entry.weak_adx15.unwrap_or(false),
                    "Entry signal"
                );
                SignalResult::Accepted(entry)
            }
            Err(rejection) => rejection,
        }
    }

    async fn acquire(&self, coin: &str, now_ms: i64) -> Result<[CandleSeries; 3], SignalResult> {
        let cfg = &self.config;
        let (h1, m15, m5) = tokio::join!(
            self.fetcher
                .fetch_at(coin, Timeframe::OneHour, cfg.lookback_1h, now_ms),
            self.fetcher
                .fetch_at(coin, Timeframe::FifteenMinutes, cfg.lookback_15m, now_ms),
            self.fetcher
                .fetch_at(coin, Timeframe::FiveMinutes, cfg.lookback_5m, now_ms),
        );

        for (timeframe, status) in [(Timeframe::OneHour, h1.1), (Timeframe::FiveMinutes, m5.1)] {
            if !status.is_ok() {
                warn!(coin, interval = %timeframe, status = %status, "Required candles unavailable");
                return Err(SignalResult::reject(
                    coin,
                    RejectReason::Fetch(status),
                    Some(Diagnostics::Acquisition { timeframe, status }),
                ));
            }
        }

        let m15 = if m15.1.is_ok() {
            m15.0
        } else {
            warn!(coin, status = %m15.1, "15m candles unavailable, scoring degraded");
            empty_series()
        };

        Ok([h1.0, m15, m5.0])
    }

    fn check_quality(
        &self,
        coin: &str,
        series: &[(Timeframe, &[Candle])],
        now_ms: i64,
    ) -> Result<(), SignalResult> {
        if series.iter().any(|(_, candles)| !last_close_usable(candles)) {
            let reason = if series.iter().any(|(_, candles)| candles.is_empty()) {
                RejectReason::NoCandles
            } else {
                RejectReason::BadCandlesParse
            };
            warn!(coin, reason = %reason, "Candle data unusable");
            return Err(SignalResult::reject(coin, reason, None));
        }

        let entries: Vec<StaleEntry> = series
            .iter()
            .map(|(timeframe, candles)| {
                let staleness = is_stale_at(candles, *timeframe, now_ms);
                StaleEntry {
                    timeframe: *timeframe,
                    age_seconds: staleness.age_seconds,
                    last_t: staleness.last_t,
                    stale: staleness.stale,
                }
            })
            .collect();
        if entries.iter().any(|e| e.stale) {
            warn!(coin, "Stale candles");
            return Err(SignalResult::reject(
                coin,
                RejectReason::StaleCandles,
                Some(Diagnostics::Stale { series: entries }),
            ));
        }
        Ok(())
    }

    async fn run(&self, coin: &str, now_ms: i64) -> Result<EntrySignal, SignalResult> {
        let cfg = &self.config;
        let [h1, m15, m5] = self.acquire(coin, now_ms).await?;

        let mut checked: Vec<(Timeframe, &[Candle])> =
            vec![(Timeframe::OneHour, &h1[..]), (Timeframe::FiveMinutes, &m5[..])];
        if !m15.is_empty() {
            checked.push((Timeframe::FifteenMinutes, &m15[..]));
        }
        self.check_quality(coin, &checked, now_ms)?;

        let trend = gate(
            coin,
            trend::evaluate(&h1, &cfg.trend),
            Stage::Trend,
            RejectReason::StrategyException,
        )?;
        gate(
            coin,
            structure::evaluate(&h1, trend.direction, &cfg.structure),
            Stage::Structure,
            RejectReason::StructException,
        )?;
        gate(
            coin,
            timing::evaluate(&m5, trend.direction, &cfg.timing),
            Stage::Timing,
            RejectReason::TimingException,
        )?;

        let adx15 = scoring::adx_15m(&m15, &cfg.scoring);
        let scoring_fault = |e| fault(coin, RejectReason::StrategyException, Stage::Scoring, e);
        let scored = scoring::score(adx15, trend.adx, cfg.trend.adx_min, &cfg.scoring)
            .map_err(scoring_fault)?;
        let sl_price_pct = scoring::stop_loss_pct(&m15, &cfg.scoring).map_err(scoring_fault)?;

        let Some(last_5m) = m5.last() else {
            return Err(SignalResult::reject(coin, RejectReason::NoCandles, None));
        };

        Ok(EntrySignal {
            direction: trend.direction,
            strength: scored.strength,
            score: scored.score,
            sl_price_pct,
            coin: coin.to_string(),
            close_5: last_5m.c,
            last_candle_t_5m: last_5m.t,
            weak_adx15: scored.weak_adx15.then_some(true),
            adx15: scored.adx15,
            adx15_min: scored.weak_adx15.then_some(cfg.scoring.adx_min_15m),
        })
    }
}
