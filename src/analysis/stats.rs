//! Summary statistics over metric sequences.
//!
//! Empty inputs are not errors: every function here returns 0.0 for them.

/// Sort samples ascending by IEEE total order; NaNs end up at the extremes
pub fn sort_samples(values: &mut [f64]) {
    values.sort_by(|a, b| a.total_cmp(b));
}

/// Arithmetic mean, 0.0 for an empty slice
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Index of the `p`-th percentile in an ascending sequence of `n` samples
///
/// `ceil(n * p / 100) - 1`, clamped to the sequence. `None` when `n == 0`.
pub fn percentile_index(n: usize, p: u32) -> Option<usize> {
    if n == 0 {
        return None;
    }
    let rank = (n * p as usize).div_ceil(100);
    Some(rank.saturating_sub(1).min(n - 1))
}

/// `p`-th percentile of an ascending-sorted slice, 0.0 when empty
pub fn percentile_sorted(sorted: &[f64], p: u32) -> f64 {
    percentile_index(sorted.len(), p)
        .map(|idx| sorted[idx])
        .unwrap_or(0.0)
}

/// Lost over received packets, 0.0 when nothing was received
pub fn loss_rate(lost: u64, received: u64) -> f64 {
    if received == 0 {
        return 0.0;
    }
    lost as f64 / received as f64
}

/// Mean and 99th percentile of a sample set
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TailSummary {
    pub mean: f64,
    pub p99: f64,
}

impl TailSummary {
    /// Summarize unsorted samples
    pub fn from_samples(mut values: Vec<f64>) -> Self {
        sort_samples(&mut values);
        Self {
            mean: mean(&values),
            p99: percentile_sorted(&values, 99),
        }
    }
}
