//! Numeric kernels behind the indicator series.

/// Relative tolerance below which a window's standard deviation is treated as zero.
pub const DEGENERATE_STD_RELATIVE: f64 = 1e-12;

/// Trailing simple return `p[idx] / p[idx - window] - 1`.
///
/// Returns `None` when `idx < window` or `idx` is out of range.
#[must_use]
pub fn trailing_return(prices: &[f64], idx: usize, window: usize) -> Option<f64> {
    let base = idx.checked_sub(window)?;
    Some(prices.get(idx)? / prices.get(base)? - 1.0)
}

/// Momentum spread in percentage points between two price series at `idx`.
#[must_use]
pub fn momentum_at(lhs: &[f64], rhs: &[f64], idx: usize, window: usize) -> Option<f64> {
    let a = trailing_return(lhs, idx, window)?;
    let b = trailing_return(rhs, idx, window)?;
    Some((a - b) * 100.0)
}

/// Momentum spread for every row.
#[must_use]
pub fn momentum_series(lhs: &[f64], rhs: &[f64], window: usize) -> Vec<Option<f64>> {
    (0..lhs.len().min(rhs.len()))
        .map(|i| momentum_at(lhs, rhs, i, window))
        .collect()
}

/// Arithmetic mean and sample standard deviation (n - 1) of `values`.
///
/// Returns `None` for fewer than two values.
#[must_use]
pub fn mean_and_sample_std(values: &[f64]) -> Option<(f64, f64)> {
    if values.len() < 2 {
        return None;
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let ss: f64 = values.iter().map(|v| (v - mean).powi(2)).sum();
    Some((mean, (ss / (n - 1.0)).sqrt()))
}

/// Rolling Z-score of each value against the trailing `lookback` values
/// (current one included).
///
/// The first `lookback - 1` rows are `None`, as is any row whose window has a
/// zero or numerically degenerate standard deviation.
#[must_use]
pub fn rolling_zscore(values: &[f64], lookback: usize) -> Vec<Option<f64>> {
    if lookback == 0 {
        return vec![None; values.len()];
    }
    (0..values.len())
        .map(|i| {
            let start = (i + 1).checked_sub(lookback)?;
            let window = &values[start..=i];
            let (mean, std) = mean_and_sample_std(window)?;
            if !(std > DEGENERATE_STD_RELATIVE * mean.abs()) {
                return None;
            }
            let z = (values[i] - mean) / std;
            z.is_finite().then_some(z)
        })
        .collect()
}

/// Series rebased so the first value is 100.
#[must_use]
pub fn rebase_to_100(values: &[f64]) -> Vec<f64> {
    match values.first() {
        Some(&first) => values.iter().map(|v| v / first * 100.0).collect(),
        None => Vec::new(),
    }
}

/// Percentage change from the first to the last value.
#[must_use]
pub fn period_change_pct(values: &[f64]) -> Option<f64> {
    Some((values.last()? / values.first()? - 1.0) * 100.0)
}
