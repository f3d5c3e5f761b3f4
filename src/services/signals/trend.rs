//! 1h trend gate: direction from the close against EMA200, strength from
//! ADX, with a relaxed path for slow but clearly directional markets.

use super::config::TrendConfig;
use super::indicators::{adx, ema, last_value, value_back};
use super::Verdict;
use crate::error::{ensure_finite, StageError};
use crate::types::{
    Candle, Columns, Diagnostics, Direction, RejectReason, TrendDiagnostics, TrendPath,
};

/// A trend that passed the gate.
#[derive(Debug, Clone, PartialEq)]
pub struct Trend {
    pub direction: Direction,
    pub adx: f64,
    pub diagnostics: TrendDiagnostics,
}

fn reject(diagnostics: TrendDiagnostics) -> Verdict<Trend> {
    Verdict::Rejected {
        reason: RejectReason::NoTrend1h,
        diagnostics: Diagnostics::Trend(diagnostics),
    }
}

pub fn evaluate(candles: &[Candle], cfg: &TrendConfig) -> Result<Verdict<Trend>, StageError> {
    let cols = Columns::from_candles(candles);
    let close = match cols.close.last() {
        Some(&c) => ensure_finite(c, "1h close")?,
        None => return Err(StageError::degenerate("empty 1h series")),
    };

    let ema_series = ema(&cols.close, cfg.ema_period);
    let ema_now = last_value(&ema_series);
    let adx_now = last_value(&adx(&cols.high, &cols.low, &cols.close, cfg.adx_period));

    let mut diag = TrendDiagnostics {
        close,
        ema: ema_now,
        adx: adx_now,
        slope_pct: 0.0,
        displacement_pct: 0.0,
        path: None,
    };

    let (Some(ema_now), Some(adx_now)) = (ema_now, adx_now) else {
        return Ok(reject(diag));
    };
    let ema_now = ensure_finite(ema_now, "ema200")?;
    let adx_now = ensure_finite(adx_now, "1h adx")?;
    if ema_now <= 0.0 {
        return Err(StageError::degenerate("ema200"));
    }

    let direction = if close > ema_now {
        Direction::Long
    } else {
        Direction::Short
    };

    let slope_pct = match value_back(&ema_series, cfg.slope_bars) {
        Some(prev) if prev > 0.0 => (ema_now - prev).abs() / prev,
        _ => 0.0,
    };
    let displacement_pct = (close - ema_now).abs() / ema_now;
    diag.slope_pct = ensure_finite(slope_pct, "ema slope")?;
    diag.displacement_pct = displacement_pct;

    let path = if adx_now >= cfg.adx_min {
        Some(TrendPath::Strict)
    } else {
        let moving = slope_pct >= cfg.min_slope_pct || displacement_pct > cfg.displacement_pct;
        let clear_of_buffer = match direction {
            Direction::Long => close > ema_now * (1.0 + cfg.ema_buffer_pct),
            Direction::Short => close < ema_now * (1.0 - cfg.ema_buffer_pct),
        };
        (adx_now >= cfg.adx_min_fallback && moving && clear_of_buffer)
            .then_some(TrendPath::Fallback)
    };

    let Some(path) = path else {
        return Ok(reject(diag));
    };
    diag.path = Some(path);

    Ok(Verdict::Passed(Trend {
        direction,
        adx: adx_now,
        diagnostics: diag,
    }))
}
