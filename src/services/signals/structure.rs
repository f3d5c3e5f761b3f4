//! 1h structure gate: higher-high/higher-low for longs, lower-low/lower-high
//! for shorts, measured against the bars just before the current one.

use super::config::StructureConfig;
use super::Verdict;
use crate::error::{ensure_finite, StageError};
use crate::types::{Candle, Diagnostics, Direction, RejectReason, StructureCode, StructureDiagnostics};

pub fn evaluate(
    candles: &[Candle],
    direction: Direction,
    cfg: &StructureConfig,
) -> Result<Verdict<StructureDiagnostics>, StageError> {
    let n = candles.len();
    let mut diag = StructureDiagnostics {
        bars: n,
        lookback: cfg.lookback,
        high: None,
        low: None,
        prev_max_high: None,
        prev_min_low: None,
    };

    if n < cfg.lookback + 2 {
        return Ok(Verdict::Rejected {
            reason: RejectReason::Structure1hTooShort,
            diagnostics: Diagnostics::Structure(diag),
        });
    }

    let last = &candles[n - 1];
    let window = &candles[n - 1 - cfg.lookback..n - 1];
    let prev_max_high = window.iter().map(|c| c.h).fold(f64::NEG_INFINITY, f64::max);
    let prev_min_low = window.iter().map(|c| c.l).fold(f64::INFINITY, f64::min);

    let high = ensure_finite(last.h, "1h high")?;
    let low = ensure_finite(last.l, "1h low")?;
    let prev_max_high = ensure_finite(prev_max_high, "1h window high")?;
    let prev_min_low = ensure_finite(prev_min_low, "1h window low")?;

    diag.high = Some(high);
    diag.low = Some(low);
    diag.prev_max_high = Some(prev_max_high);
    diag.prev_min_low = Some(prev_min_low);

    let failed = match direction {
        Direction::Long => {
            if high <= prev_max_high * (1.0 + cfg.margin_pct) {
                Some(StructureCode::NoHigherHigh)
            } else if low <= prev_min_low {
                Some(StructureCode::NoHigherLow)
            } else {
                None
            }
        }
        Direction::Short => {
            if low >= prev_min_low * (1.0 - cfg.margin_pct) {
                Some(StructureCode::NoLowerLow)
            } else if high >= prev_max_high {
                Some(StructureCode::NoLowerHigh)
            } else {
                None
            }
        }
    };

    Ok(match failed {
        Some(code) => Verdict::Rejected {
            reason: RejectReason::NoStructure1h(code),
            diagnostics: Diagnostics::Structure(diag),
        },
        None => Verdict::Passed(diag),
    })
}
