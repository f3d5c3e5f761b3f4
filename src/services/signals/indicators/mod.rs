//! Indicator library.
//!
//! Pure functions over float slices. Series-valued indicators return a
//! vector the same length as the input, with `None` where the indicator is
//! not yet defined.

pub mod adx;
pub mod atr;
pub mod ema;
pub mod rma;

pub use adx::adx;
pub use atr::{atr, true_range};
pub use ema::ema;
pub use rma::rma;

/// Last defined value of an indicator series.
///
/// Only looks at the final slot: an undefined tail means the indicator is
/// undefined now, regardless of earlier values.
pub fn last_value(series: &[Option<f64>]) -> Option<f64> {
    series.last().copied().flatten()
}

/// Value `bars_back` bars before the last one.
pub fn value_back(series: &[Option<f64>], bars_back: usize) -> Option<f64> {
    let idx = series.len().checked_sub(1 + bars_back)?;
    series[idx]
}
