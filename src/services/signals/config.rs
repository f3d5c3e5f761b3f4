//! Strategy thresholds.
//!
//! Every tunable of the engine lives here. Strategy variants are named
//! presets over the same structure, optionally adjusted per threshold from
//! the environment.

use std::env;
use std::fmt;
use tracing::warn;

/// Named threshold sets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Preset {
    #[default]
    Default,
    Conservative,
    Aggressive,
}

impl Preset {
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "" | "default" => Some(Preset::Default),
            "conservative" => Some(Preset::Conservative),
            "aggressive" => Some(Preset::Aggressive),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Preset::Default => "default",
            Preset::Conservative => "conservative",
            Preset::Aggressive => "aggressive",
        }
    }
}

impl fmt::Display for Preset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 1h trend gate.
#[derive(Debug, Clone, PartialEq)]
pub struct TrendConfig {
    pub ema_period: usize,
    pub adx_period: usize,
    /// Strict-path ADX floor (`ADX_MIN_TREND_1H`).
    pub adx_min: f64,
    /// Fallback-path ADX floor (`ADX_MIN_FALLBACK_1H`).
    pub adx_min_fallback: f64,
    pub slope_bars: usize,
    /// Minimum relative EMA change over `slope_bars` (`MIN_EMA_SLOPE_PCT_6H`).
    pub min_slope_pct: f64,
    /// Close must clear the EMA by this fraction on the fallback path.
    pub ema_buffer_pct: f64,
    /// Displacement from the EMA that counts as a trend on its own.
    pub displacement_pct: f64,
}

impl Default for TrendConfig {
    fn default() -> Self {
        Self {
            ema_period: 200,
            adx_period: 14,
            adx_min: 20.0,
            adx_min_fallback: 15.0,
            slope_bars: 6,
            min_slope_pct: 0.002,
            ema_buffer_pct: 0.002,
            displacement_pct: 0.01,
        }
    }
}

/// 1h structure gate.
#[derive(Debug, Clone, PartialEq)]
pub struct StructureConfig {
    /// Bars before the current one that form the reference window.
    pub lookback: usize,
    /// Extra clearance required for the breakout leg (HH or LL).
    pub margin_pct: f64,
}

impl Default for StructureConfig {
    fn default() -> Self {
        Self {
            lookback: 8,
            margin_pct: 0.0,
        }
    }
}

/// 5m timing gate.
#[derive(Debug, Clone, PartialEq)]
pub struct TimingConfig {
    pub window: usize,
    pub min_bars: usize,
    /// Bars searched for the swing extreme (B).
    pub swing_bars: usize,
    pub atr_period: usize,
    pub ema_period: usize,
    /// Side-band tolerance around EMA20, in ATRs.
    pub ema_tol_atr: f64,
    pub max_rebound: f64,
    pub min_rebound: f64,
    pub max_ext_pct: f64,
    pub max_bar_atr: f64,
    pub max_wick_atr: f64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            window: 60,
            min_bars: 30,
            swing_bars: 24,
            atr_period: 14,
            ema_period: 20,
            ema_tol_atr: 0.5,
            max_rebound: 0.80,
            min_rebound: 0.20,
            max_ext_pct: 0.006,
            max_bar_atr: 3.0,
            max_wick_atr: 1.5,
        }
    }
}

/// Score, strength and stop-loss sizing.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoringConfig {
    pub adx_period: usize,
    /// 15m ADX below this marks the mid timeframe as weak.
    pub adx_min_15m: f64,
    pub strength_min: f64,
    pub strength_max: f64,
    pub weak_score_penalty: f64,
    pub weak_strength_penalty: f64,
    pub atr_period: usize,
    pub sl_atr_mult: f64,
    pub sl_min_pct: f64,
    pub sl_max_pct: f64,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            adx_period: 14,
            adx_min_15m: 18.0,
            strength_min: 0.2,
            strength_max: 8.0,
            weak_score_penalty: 4.0,
            weak_strength_penalty: 0.25,
            atr_period: 14,
            sl_atr_mult: 1.5,
            sl_min_pct: 0.02,
            sl_max_pct: 0.035,
        }
    }
}

/// Complete engine configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    pub preset: Preset,
    pub lookback_1h: usize,
    pub lookback_15m: usize,
    pub lookback_5m: usize,
    pub trend: TrendConfig,
    pub structure: StructureConfig,
    pub timing: TimingConfig,
    pub scoring: ScoringConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            preset: Preset::Default,
            lookback_1h: 260,
            lookback_15m: 260,
            lookback_5m: 320,
            trend: TrendConfig::default(),
            structure: StructureConfig::default(),
            timing: TimingConfig::default(),
            scoring: ScoringConfig::default(),
        }
    }
}

impl EngineConfig {
    pub fn preset(preset: Preset) -> Self {
        let mut config = Self {
            preset,
            ..Self::default()
        };
        match preset {
            Preset::Default => {}
            Preset::Conservative => {
                config.trend.adx_min = 25.0;
                config.trend.adx_min_fallback = 18.0;
                config.scoring.adx_min_15m = 20.0;
                config.timing.min_rebound = 0.25;
                config.timing.max_rebound = 0.70;
                config.timing.max_ext_pct = 0.004;
            }
            Preset::Aggressive => {
                config.trend.adx_min = 16.0;
                config.trend.adx_min_fallback = 12.0;
                config.scoring.adx_min_15m = 15.0;
                config.timing.min_rebound = 0.15;
                config.timing.max_rebound = 0.85;
                config.timing.max_ext_pct = 0.009;
            }
        }
        config
    }

    /// Preset by name. Unknown names fall back to the default preset.
    pub fn named(name: &str) -> Self {
        match Preset::parse(name) {
            Some(preset) => Self::preset(preset),
            None => {
                warn!(preset = name, "Unknown signal preset, using default");
                Self::default()
            }
        }
    }

    /// `SIGNAL_PRESET` plus per-threshold overrides from the process
    /// environment.
    pub fn from_env() -> Self {
        let preset = env::var("SIGNAL_PRESET").unwrap_or_default();
        let mut config = Self::named(&preset);
        config.apply_overrides(|key| env::var(key).ok());
        config
    }

    /// Apply per-threshold overrides. Values that do not parse keep the
    /// preset value.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let float = |key: &str, slot: &mut f64| {
            if let Some(v) = lookup(key).and_then(|v| v.trim().parse::<f64>().ok()) {
                if v.is_finite() {
                    *slot = v;
                }
            }
        };

        float("ADX_MIN_TREND_1H", &mut self.trend.adx_min);
        float("ADX_MIN_FALLBACK_1H", &mut self.trend.adx_min_fallback);
        float("ADX_MIN_TREND_15M", &mut self.scoring.adx_min_15m);
        float("MIN_EMA_SLOPE_PCT_6H", &mut self.trend.min_slope_pct);
        float("TREND_EMA_BUFFER_PCT", &mut self.trend.ema_buffer_pct);
        float("TREND_DISPLACEMENT_PCT", &mut self.trend.displacement_pct);
        float("STRUCT_MARGIN_PCT", &mut self.structure.margin_pct);
        float("TIMING_MAX_REBOUND", &mut self.timing.max_rebound);
        float("TIMING_MIN_REBOUND", &mut self.timing.min_rebound);
        float("TIMING_MAX_EXT_PCT", &mut self.timing.max_ext_pct);
        float("ATR_SL_MULT", &mut self.scoring.sl_atr_mult);
        float("ATR_SL_MIN_PCT", &mut self.scoring.sl_min_pct);
        float("ATR_SL_MAX_PCT", &mut self.scoring.sl_max_pct);
        float("WEAK_ADX15_SCORE_PENALTY", &mut self.scoring.weak_score_penalty);
        float("WEAK_ADX15_STRENGTH_PENALTY", &mut self.scoring.weak_strength_penalty);

        if let Some(lookback) = lookup("STRUCT_LOOKBACK_1H")
            .and_then(|v| v.trim().parse::<usize>().ok())
            .filter(|v| *v > 0)
        {
            self.structure.lookback = lookback;
        }
    }
}
