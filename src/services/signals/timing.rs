//! 5m timing gate ("rebound zone").
//!
//! Locates the last impulse leg A -> B, measures how much of it price has
//! already recovered, and refuses entries that are either too early (still
//! pulling back) or too late (extended away from EMA20). The last bar is
//! also checked for an outsized range or an adverse wick.

use super::config::TimingConfig;
use super::indicators::{atr, ema, last_value};
use super::Verdict;
use crate::error::{ensure_finite, StageError};
use crate::types::{Candle, Columns, Diagnostics, Direction, RejectReason, TimingCode, TimingDiagnostics};

/// Impulse leg feeding the rebound ratio.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Swing {
    /// Leg origin (A).
    start: f64,
    /// Leg extreme (B).
    end: f64,
}

/// Long: B is the lowest low of the recent bars (latest wins ties), A the
/// highest high before it. Short mirrors.
fn find_swing(window: &[Candle], direction: Direction, swing_bars: usize) -> Option<Swing> {
    let from = window.len().saturating_sub(swing_bars.max(1));
    let mut b_idx = from;
    for (i, candle) in window.iter().enumerate().skip(from) {
        let better = match direction {
            Direction::Long => candle.l <= window[b_idx].l,
            Direction::Short => candle.h >= window[b_idx].h,
        };
        if better {
            b_idx = i;
        }
    }

    let before = &window[..b_idx];
    if before.is_empty() {
        return None;
    }
    let swing = match direction {
        Direction::Long => Swing {
            start: before.iter().map(|c| c.h).fold(f64::NEG_INFINITY, f64::max),
            end: window[b_idx].l,
        },
        Direction::Short => Swing {
            start: before.iter().map(|c| c.l).fold(f64::INFINITY, f64::min),
            end: window[b_idx].h,
        },
    };
    Some(swing)
}

fn reject(code: TimingCode, diag: TimingDiagnostics) -> Verdict<TimingDiagnostics> {
    Verdict::Rejected {
        reason: RejectReason::Timing5m(code),
        diagnostics: Diagnostics::Timing(diag),
    }
}

pub fn evaluate(
    candles: &[Candle],
    direction: Direction,
    cfg: &TimingConfig,
) -> Result<Verdict<TimingDiagnostics>, StageError> {
    let n = candles.len();
    let mut diag = TimingDiagnostics {
        bars: n,
        ..TimingDiagnostics::default()
    };
    if n < cfg.min_bars || n == 0 {
        return Ok(Verdict::Rejected {
            reason: RejectReason::Timing5mTooShort,
            diagnostics: Diagnostics::Timing(diag),
        });
    }

    let window = &candles[n - cfg.window.clamp(1, n)..];
    let cols = Columns::from_candles(window);
    let last = window[window.len() - 1];

    let close = ensure_finite(last.c, "5m close")?;
    let atr = ensure_finite(atr(&cols.high, &cols.low, &cols.close, cfg.atr_period), "5m atr")?;
    let ema20 = last_value(&ema(&cols.close, cfg.ema_period)).unwrap_or(0.0);
    let ema20 = ensure_finite(ema20, "ema20")?;
    diag.close = close;
    diag.atr = atr;
    diag.ema20 = ema20;

    if atr <= 0.0 {
        return Ok(reject(TimingCode::AtrBad, diag));
    }
    if ema20 <= 0.0 {
        return Ok(reject(TimingCode::EmaBad, diag));
    }

    let tol = cfg.ema_tol_atr * atr;
    match direction {
        Direction::Long if close < ema20 - tol => {
            return Ok(reject(TimingCode::BelowEma20, diag));
        }
        Direction::Short if close > ema20 + tol => {
            return Ok(reject(TimingCode::AboveEma20, diag));
        }
        _ => {}
    }

    let Some(swing) = find_swing(window, direction, cfg.swing_bars) else {
        return Ok(reject(TimingCode::ImpulseBad, diag));
    };
    let impulse = ensure_finite((swing.start - swing.end).abs(), "impulse")?;
    diag.impulse_start = Some(swing.start);
    diag.impulse_end = Some(swing.end);
    diag.impulse = Some(impulse);

    let leg_valid = match direction {
        Direction::Long => swing.start - swing.end > 0.0,
        Direction::Short => swing.end - swing.start > 0.0,
    };
    if !leg_valid {
        return Ok(reject(TimingCode::ImpulseBad, diag));
    }

    let rebound = match direction {
        Direction::Long => (close - swing.end) / impulse,
        Direction::Short => (swing.end - close) / impulse,
    };
    let rebound = ensure_finite(rebound, "rebound")?;
    diag.rebound = Some(rebound);

    if rebound >= cfg.max_rebound {
        diag.limit = Some(cfg.max_rebound);
        return Ok(reject(TimingCode::DeepRebound, diag));
    }

    let ext_pct = match direction {
        Direction::Long => (close - ema20) / ema20,
        Direction::Short => (ema20 - close) / ema20,
    };
    diag.ext_pct = Some(ext_pct);
    if ext_pct > cfg.max_ext_pct {
        diag.limit = Some(cfg.max_ext_pct);
        let code = match direction {
            Direction::Long => TimingCode::LateAboveEma,
            Direction::Short => TimingCode::LateBelowEma,
        };
        return Ok(reject(code, diag));
    }

    if rebound <= cfg.min_rebound {
        diag.limit = Some(cfg.min_rebound);
        return Ok(reject(TimingCode::DeepPullback, diag));
    }

    if last.range() > cfg.max_bar_atr * atr {
        diag.limit = Some(cfg.max_bar_atr * atr);
        return Ok(reject(TimingCode::BarTooWide, diag));
    }

    let adverse_wick = match direction {
        Direction::Long => last.upper_wick(),
        Direction::Short => last.lower_wick(),
    };
    if adverse_wick > cfg.max_wick_atr * atr {
        diag.limit = Some(cfg.max_wick_atr * atr);
        return Ok(reject(TimingCode::WickTooLong, diag));
    }

    Ok(Verdict::Passed(diag))
}
