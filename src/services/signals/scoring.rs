//! Score, strength and stop-loss sizing.

use super::config::ScoringConfig;
use super::indicators::{adx, atr, last_value};
use crate::error::{ensure_finite, StageError};
use crate::types::{Candle, Columns};

/// Scoring outcome for an accepted candidate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Score {
    pub score: f64,
    pub strength: f64,
    pub weak_adx15: bool,
    pub adx15: Option<f64>,
}

/// Map a 0-100 score onto the strength range.
pub fn strength_for(score: f64, cfg: &ScoringConfig) -> f64 {
    (score / 100.0 * cfg.strength_max).clamp(cfg.strength_min, cfg.strength_max)
}

/// Last 15m ADX, undefined for short or missing history.
pub fn adx_15m(candles: &[Candle], cfg: &ScoringConfig) -> Option<f64> {
    let cols = Columns::from_candles(candles);
    last_value(&adx(&cols.high, &cols.low, &cols.close, cfg.adx_period))
}

/// Combine mid-timeframe ADX strength with high-timeframe ADX excess.
///
/// A weak or undefined 15m ADX does not reject: the score and strength are
/// penalized instead and the result is flagged.
pub fn score(
    adx15: Option<f64>,
    adx1h: f64,
    adx_min_1h: f64,
    cfg: &ScoringConfig,
) -> Result<Score, StageError> {
    let adx1h = ensure_finite(adx1h, "1h adx")?;
    let adx15 = adx15.map(|v| ensure_finite(v, "15m adx")).transpose()?;
    let weak = adx15.map_or(true, |v| v < cfg.adx_min_15m);
    let adx15_value = adx15.unwrap_or(0.0);

    let base = 60.0 + (adx15_value - cfg.adx_min_15m) * 2.0 + (adx1h - adx_min_1h) * 1.5;
    let mut score = base.clamp(0.0, 100.0);
    let mut strength = strength_for(score, cfg);

    if weak {
        score = (score - cfg.weak_score_penalty).clamp(0.0, 100.0);
        strength = (strength_for(score, cfg) - cfg.weak_strength_penalty)
            .clamp(cfg.strength_min, cfg.strength_max);
    }

    Ok(Score {
        score,
        strength,
        weak_adx15: weak,
        adx15,
    })
}

/// Volatility-scaled stop distance as a fraction of price.
///
/// An empty or too-short 15m series has no ATR and lands on the floor.
pub fn stop_loss_pct(candles: &[Candle], cfg: &ScoringConfig) -> Result<f64, StageError> {
    let cols = Columns::from_candles(candles);
    let atr = atr(&cols.high, &cols.low, &cols.close, cfg.atr_period);
    let close = cols.close.last().copied().unwrap_or(0.0);

    let raw = if close > 0.0 {
        atr / close * cfg.sl_atr_mult
    } else {
        0.0
    };
    let raw = ensure_finite(raw, "stop distance")?;
    Ok(raw.clamp(cfg.sl_min_pct, cfg.sl_max_pct))
}
