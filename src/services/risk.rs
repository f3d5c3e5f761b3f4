//! Position sizing from account balance and signal strength.

use crate::types::RiskSizing;

/// Sizing constants.
#[derive(Debug, Clone, PartialEq)]
pub struct RiskConfig {
    /// Balance floor used when the account is smaller.
    pub min_capital: f64,
    /// Fraction of capital committed per position.
    pub position_percent: f64,
    pub min_position: f64,
    pub strength_min: f64,
    pub strength_max: f64,
}

impl Default for RiskConfig {
    fn default() -> Self {
        Self {
            min_capital: 10.0,
            position_percent: 0.05,
            min_position: 1.0,
            strength_min: 0.15,
            strength_max: 8.0,
        }
    }
}

/// `(tp, sl)` price percentages per strength bucket.
const BUCKETS: [(f64, (f64, f64)); 3] = [
    (1.5, (0.006, 0.004)),
    (3.0, (0.012, 0.006)),
    (5.0, (0.020, 0.009)),
];
const TOP_BUCKET: (f64, f64) = (0.035, 0.012);

fn round4(value: f64) -> f64 {
    (value * 10_000.0).round() / 10_000.0
}

/// Take-profit and stop-loss percentages for a strength.
pub fn tp_sl_for(strength: f64, cfg: &RiskConfig) -> (f64, f64) {
    let strength = if strength.is_finite() {
        strength.clamp(cfg.strength_min, cfg.strength_max)
    } else {
        cfg.strength_min
    };
    BUCKETS
        .iter()
        .find(|(upper, _)| strength < *upper)
        .map(|(_, pair)| *pair)
        .unwrap_or(TOP_BUCKET)
}

/// Position size: a fixed share of capital, scaled up for strong signals.
pub fn position_size(balance: f64, strength: f64, cfg: &RiskConfig) -> f64 {
    let balance = if balance.is_finite() { balance } else { 0.0 };
    let mut size = balance.max(cfg.min_capital) * cfg.position_percent;
    if strength >= 5.0 {
        size *= 1.4;
    } else if strength >= 3.0 {
        size *= 1.2;
    }
    round4(size.max(cfg.min_position))
}

pub fn validate_trade_conditions(balance: f64, strength: f64) -> RiskSizing {
    validate_with(balance, strength, &RiskConfig::default())
}

pub fn validate_with(balance: f64, strength: f64, cfg: &RiskConfig) -> RiskSizing {
    let (tp, sl) = tp_sl_for(strength, cfg);
    RiskSizing {
        position_size: position_size(balance, strength, cfg),
        tp,
        sl,
    }
}
