//! Percentile statistics for match counts and variable frequencies

use serde::{Deserialize, Serialize};

/// Linear-interpolation percentile over sorted values.
///
/// `pct` is 0-100. Empty input yields 0.0.
pub fn percentile(sorted: &[f64], pct: f64) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }
    let rank = (pct.clamp(0.0, 100.0) / 100.0) * (sorted.len() - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    if lo == hi {
        return sorted[lo];
    }
    sorted[lo] + (sorted[hi] - sorted[lo]) * (rank - lo as f64)
}

/// Summary of how often values were extracted
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FrequencyDistribution {
    pub count: usize,
    pub mean: f64,
    pub p25: f64,
    pub p50: f64,
    pub p75: f64,
    pub p90: f64,
    pub max: f64,
}

impl FrequencyDistribution {
    /// Compute distribution from unsorted values.
    pub fn from_values(values: &mut [f64]) -> Self {
        if values.is_empty() {
            return Self::default();
        }

        values.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
        let n = values.len();

        Self {
            count: n,
            mean: values.iter().sum::<f64>() / n as f64,
            p25: percentile(values, 25.0),
            p50: percentile(values, 50.0),
            p75: percentile(values, 75.0),
            p90: percentile(values, 90.0),
            max: values[n - 1],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_percentile_interpolates() {
        let v = [10.0, 20.0, 30.0, 40.0];
        assert_eq!(percentile(&v, 0.0), 10.0);
        assert_eq!(percentile(&v, 100.0), 40.0);
        assert!((percentile(&v, 75.0) - 32.5).abs() < 1e-9);
        assert!((percentile(&v, 50.0) - 25.0).abs() < 1e-9);
    }

    #[test]
    fn test_percentile_empty_and_single() {
        assert_eq!(percentile(&[], 75.0), 0.0);
        assert_eq!(percentile(&[7.0], 90.0), 7.0);
    }

    #[test]
    fn test_distribution() {
        let mut values = vec![5.0, 1.0, 3.0, 2.0, 4.0];
        let dist = FrequencyDistribution::from_values(&mut values);
        assert_eq!(dist.count, 5);
        assert_eq!(dist.mean, 3.0);
        assert_eq!(dist.p25, 2.0);
        assert_eq!(dist.p50, 3.0);
        assert_eq!(dist.p75, 4.0);
        assert_eq!(dist.max, 5.0);
    }

    #[test]
    fn test_empty_distribution() {
        let dist = FrequencyDistribution::from_values(&mut []);
        assert_eq!(dist, FrequencyDistribution::default());
    }
}
