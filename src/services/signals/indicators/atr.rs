//! Average True Range (ATR).

/// True range of a bar against the previous close.
pub fn true_range(high: f64, low: f64, prev_close: f64) -> f64 {
    let hl = high - low;
    let hc = (high - prev_close).abs();
    let lc = (low - prev_close).abs();
    hl.max(hc).max(lc)
}

/// Last ATR value using Wilder's recursion.
///
/// Seeded with the average of the first `period` true ranges. Returns `0.0`
/// when fewer than `period` true ranges exist; callers treat a non-positive
/// ATR as unusable.
pub fn atr(high: &[f64], low: &[f64], close: &[f64], period: usize) -> f64 {
    let n = high.len().min(low.len()).min(close.len());
    if period == 0 || n < 2 {
        return 0.0;
    }

    let true_ranges: Vec<f64> = (1..n)
        .map(|i| true_range(high[i], low[i], close[i - 1]))
        .collect();
    if true_ranges.len() < period {
        return 0.0;
    }

    let p = period as f64;
    let mut atr = true_ranges[..period].iter().sum::<f64>() / p;
    for tr in &true_ranges[period..] {
        atr = (atr * (p - 1.0) + tr) / p;
    }
    atr
}
