//! Average Directional Index (ADX).

use super::atr::true_range;
use super::rma::rma;

/// ADX series, same length as the input bars.
///
/// +DM, -DM and true range are Wilder-smoothed, turned into DX, and DX is
/// smoothed again. Bars where DX cannot be formed yet contribute `0.0` to the
/// second smoothing pass rather than being skipped, which pulls the first
/// few ADX values toward zero.
pub fn adx(high: &[f64], low: &[f64], close: &[f64], period: usize) -> Vec<Option<f64>> {
    let n = high.len().min(low.len()).min(close.len());
    if n < 2 || period == 0 {
        return vec![None; n];
    }

    let mut plus_dm = Vec::with_capacity(n - 1);
    let mut minus_dm = Vec::with_capacity(n - 1);
    let mut tr = Vec::with_capacity(n - 1);

    for i in 1..n {
        let up_move = high[i] - high[i - 1];
        let down_move = low[i - 1] - low[i];

        plus_dm.push(if up_move > down_move && up_move > 0.0 { up_move } else { 0.0 });
        minus_dm.push(if down_move > up_move && down_move > 0.0 { down_move } else { 0.0 });
        tr.push(true_range(high[i], low[i], close[i - 1]));
    }

    let smoothed_plus = rma(&plus_dm, period);
    let smoothed_minus = rma(&minus_dm, period);
    let smoothed_tr = rma(&tr, period);

    let dx: Vec<f64> = (0..tr.len())
        .map(|i| match (smoothed_plus[i], smoothed_minus[i], smoothed_tr[i]) {
            (Some(pdm), Some(mdm), Some(atr)) if atr > 0.0 => {
                let plus_di = 100.0 * pdm / atr;
                let minus_di = 100.0 * mdm / atr;
                let di_sum = plus_di + minus_di;
                if di_sum > 0.0 {
                    100.0 * (plus_di - minus_di).abs() / di_sum
                } else {
                    0.0
                }
            }
            _ => 0.0,
        })
        .collect();

    // Bar 0 has no previous bar, so the DM/TR series start one bar late.
    let mut out = Vec::with_capacity(n);
    out.push(None);
    out.extend(rma(&dx, period));
    out
}
