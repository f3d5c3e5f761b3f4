//! Wilder's smoothed moving average (RMA).

/// Wilder smoothing: seeded by the simple average of the first `period`
/// values, then `rma = (rma * (period - 1) + x) / period`.
///
/// Same shape as [`super::ema`].
pub fn rma(values: &[f64], period: usize) -> Vec<Option<f64>> {
    let mut out = vec![None; values.len()];
    if period == 0 || values.len() < period {
        return out;
    }

    let p = period as f64;
    let mut rma = values[..period].iter().sum::<f64>() / p;
    out[period - 1] = Some(rma);

    for (i, value) in values.iter().enumerate().skip(period) {
        rma = (rma * (p - 1.0) + value) / p;
        out[i] = Some(rma);
    }

    out
}
