//! Empirical cumulative distributions.

use serde::{Deserialize, Serialize};

use super::stats::sort_samples;

/// One step of an empirical CDF
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CdfPoint {
    pub value: f64,
    /// Fraction of samples less than or equal to `value`, in (0, 1]
    pub fraction: f64,
}

/// Empirical CDF of `samples`: the sorted values, the i-th (1-indexed) paired with i / n
pub fn empirical_cdf(samples: &[f64]) -> Vec<CdfPoint> {
    let mut sorted = samples.to_vec();
    sort_samples(&mut sorted);
    let n = sorted.len() as f64;
    sorted
        .into_iter()
        .enumerate()
        .map(|(i, value)| CdfPoint {
            value,
            fraction: (i + 1) as f64 / n,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cdf_of_small_sample() {
        let samples = [3.0, 1.0, 2.0];
        let cdf = empirical_cdf(&samples);
        let values: Vec<f64> = cdf.iter().map(|p| p.value).collect();
        let fractions: Vec<f64> = cdf.iter().map(|p| p.fraction).collect();
        assert_eq!(values, vec![1.0, 2.0, 3.0]);
        assert_eq!(fractions, vec![1.0 / 3.0, 2.0 / 3.0, 1.0]);
        // input untouched
        assert_eq!(samples, [3.0, 1.0, 2.0]);
    }

    #[test]
    fn test_cdf_of_empty_sample() {
        assert!(empirical_cdf(&[]).is_empty());
    }

    #[test]
    fn test_repeated_values_keep_every_step() {
        let cdf = empirical_cdf(&[5.0, 5.0]);
        assert_eq!(cdf.len(), 2);
        assert_eq!(cdf[0].fraction, 0.5);
        assert_eq!(cdf[1].fraction, 1.0);
        assert_eq!(cdf, empirical_cdf(&[5.0, 5.0]));
    }
}
