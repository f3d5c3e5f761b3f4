//! Exponential Moving Average (EMA).

/// EMA seeded with the simple average of the first `period` values.
///
/// The first `period - 1` slots are `None`. Every slot is `None` when the
/// input is shorter than `period` or `period` is zero.
pub fn ema(values: &[f64], period: usize) -> Vec<Option<f64>> {
    let mut out = vec![None; values.len()];
    if period == 0 || values.len() < period {
        return out;
    }

    let multiplier = 2.0 / (period as f64 + 1.0);

    // First EMA is SMA
    let mut ema = values[..period].iter().sum::<f64>() / period as f64;
    out[period - 1] = Some(ema);

    for (i, value) in values.iter().enumerate().skip(period) {
        ema = (value - ema) * multiplier + ema;
        out[i] = Some(ema);
    }

    out
}
