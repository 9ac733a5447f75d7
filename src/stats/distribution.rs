//! Order statistics, CDF tables and fairness
//!
//! All order statistics are exact and computed over the full sample set.
//! Percentiles use linear interpolation between closest ranks, so the
//! median of an even-sized set is the mean of its two middle values and
//! every percentile is monotone in `p`.
//!
//! CDF tables are downsampled to a bounded number of points. Downsampling
//! draws a uniform subset with a fixed-seed generator, always keeps the
//! maximum, and never touches the order statistics.

use rand::seq::index;
use rand::SeedableRng;
use rand_xoshiro::Xoshiro256PlusPlus;
use serde::Serialize;

/// Percentiles reported next to min/max/mean/median by default
pub const DEFAULT_PERCENTILES: [f64; 4] = [5.0, 25.0, 75.0, 95.0];

/// Largest CDF table written by default
pub const DEFAULT_CDF_POINTS: usize = 10_000;

/// Fixed seed so repeated runs produce identical CDF files
const CDF_SEED: u64 = 0x6e73_6c6f_6773_7461;

/// Order statistics of one sample set
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Summary {
    pub count: usize,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub median: f64,
    /// `(p, value)` pairs in ascending `p`
    pub percentiles: Vec<(f64, f64)>,
}

impl Summary {
    /// Summarize `samples`, or `None` if there are none
    pub fn compute(samples: &[f64], percentiles: &[f64]) -> Option<Self> {
        if samples.is_empty() {
            return None;
        }
        let sorted = sorted(samples);
        Some(Self::from_sorted(&sorted, percentiles))
    }

    /// Summarize an already sorted, non-empty slice
    pub fn from_sorted(sorted: &[f64], percentiles: &[f64]) -> Self {
        debug_assert!(!sorted.is_empty());
        let sum: f64 = sorted.iter().sum();

        Self {
            count: sorted.len(),
            min: sorted[0],
            max: sorted[sorted.len() - 1],
            mean: sum / sorted.len() as f64,
            median: percentile_of_sorted(sorted, 50.0),
            percentiles: percentiles
                .iter()
                .map(|&p| (p, percentile_of_sorted(sorted, p)))
                .collect(),
        }
    }

    /// Value of a configured percentile
    pub fn percentile(&self, p: f64) -> Option<f64> {
        self.percentiles
            .iter()
            .find(|(q, _)| *q == p)
            .map(|(_, value)| *value)
    }
}

/// Sorted copy of `samples` (total order, NaN last)
pub fn sorted(samples: &[f64]) -> Vec<f64> {
    let mut sorted = samples.to_vec();
    sorted.sort_by(f64::total_cmp);
    sorted
}

/// Interpolated percentile of a sorted, non-empty slice
pub fn percentile_of_sorted(sorted: &[f64], p: f64) -> f64 {
    let p = p.clamp(0.0, 100.0);
    let rank = p / 100.0 * (sorted.len() - 1) as f64;
    let lower = rank.floor() as usize;
    let upper = rank.ceil() as usize;
    if lower == upper {
        return sorted[lower];
    }
    let weight = rank - lower as f64;
    sorted[lower] + (sorted[upper] - sorted[lower]) * weight
}

/// One CDF table row
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CdfPoint {
    /// `i / n` for the i-th smallest value (1-based)
    pub rank: f64,
    pub value: f64,
}

/// Cumulative distribution table with at most `max_points` rows
///
/// Returns exactly `min(n, max_points)` points; the last point is always
/// the maximum with rank 1.0.
pub fn cdf(samples: &[f64], max_points: usize) -> Vec<CdfPoint> {
    let sorted = sorted(samples);
    let n = sorted.len();
    if n == 0 || max_points == 0 {
        return Vec::new();
    }

    let point = |i: usize| CdfPoint {
        rank: (i + 1) as f64 / n as f64,
        value: sorted[i],
    };

    if n <= max_points {
        return (0..n).map(point).collect();
    }

    let mut rng = Xoshiro256PlusPlus::seed_from_u64(CDF_SEED);
    let mut chosen = index::sample(&mut rng, n - 1, max_points - 1).into_vec();
    chosen.sort_unstable();
    chosen.push(n - 1);
    chosen.into_iter().map(point).collect()
}

/// Jain's fairness index `(Σv)² / (n·Σv²)`
///
/// 1.0 means perfectly even, `1/n` means one host did everything. Returns
/// 0.0 when every value is zero and -1.0 when there are no values.
pub fn fairness_index(values: &[f64]) -> f64 {
    if values.is_empty() {
        return -1.0;
    }
    let sum: f64 = values.iter().sum();
    let sum_sq: f64 = values.iter().map(|v| v * v).sum();
    if sum_sq == 0.0 {
        return 0.0;
    }
    sum * sum / (values.len() as f64 * sum_sq)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_single() {
        let summary = Summary::compute(&[12.0], &DEFAULT_PERCENTILES).unwrap();
        assert_eq!(summary.count, 1);
        assert_eq!(summary.min, 12.0);
        assert_eq!(summary.max, 12.0);
        assert_eq!(summary.mean, 12.0);
        assert_eq!(summary.median, 12.0);
        assert_eq!(summary.percentile(95.0), Some(12.0));
    }

    #[test]
    fn test_summary_empty() {
        assert!(Summary::compute(&[], &DEFAULT_PERCENTILES).is_none());
    }

    #[test]
    fn test_median_even() {
        let summary = Summary::compute(&[4.0, 1.0, 3.0, 2.0], &[]).unwrap();
        assert_eq!(summary.median, 2.5);
        assert_eq!(summary.mean, 2.5);
        assert!(summary.percentiles.is_empty());
    }

    #[test]
    fn test_percentiles_interpolate() {
        let samples: Vec<f64> = (1..=101).map(f64::from).collect();
        let summary = Summary::compute(&samples, &DEFAULT_PERCENTILES).unwrap();
        assert_eq!(summary.percentile(5.0), Some(6.0));
        assert_eq!(summary.percentile(25.0), Some(26.0));
        assert_eq!(summary.median, 51.0);
        assert_eq!(summary.percentile(75.0), Some(76.0));
        assert_eq!(summary.percentile(95.0), Some(96.0));
        assert_eq!(summary.percentile(99.0), None);
    }

    #[test]
    fn test_order_statistics_are_monotone() {
        let samples: Vec<f64> = (0..997u32)
            .map(|i| f64::from((i * 7919) % 1013) * 0.37)
            .collect();
        let s = Summary::compute(&samples, &DEFAULT_PERCENTILES).unwrap();
        let p = |q| s.percentile(q).unwrap();
        assert!(s.min <= p(5.0));
        assert!(p(5.0) <= p(25.0));
        assert!(p(25.0) <= s.median);
        assert!(s.median <= p(75.0));
        assert!(p(75.0) <= p(95.0));
        assert!(p(95.0) <= s.max);
    }

    #[test]
    fn test_cdf_small() {
        let points = cdf(&[3.0, 1.0, 2.0], DEFAULT_CDF_POINTS);
        assert_eq!(points.len(), 3);
        assert_eq!(points[0], CdfPoint { rank: 1.0 / 3.0, value: 1.0 });
        assert_eq!(points[2], CdfPoint { rank: 1.0, value: 3.0 });
    }

    #[test]
    fn test_cdf_empty() {
        assert!(cdf(&[], 10).is_empty());
    }

    #[test]
    fn test_cdf_downsampled() {
        let samples: Vec<f64> = (0..25_000).map(|i| f64::from(i) / 10.0).collect();
        let points = cdf(&samples, DEFAULT_CDF_POINTS);

        assert_eq!(points.len(), DEFAULT_CDF_POINTS);
        assert_eq!(points.last().unwrap().rank, 1.0);
        assert_eq!(points.last().unwrap().value, 2499.9);
        assert!(points.windows(2).all(|w| w[0].rank < w[1].rank && w[0].value <= w[1].value));

        // The sampled median stays close to the true median
        let mid = points.iter().find(|p| p.rank >= 0.5).unwrap();
        assert!((mid.value - 1250.0).abs() < 25.0);
    }

    #[test]
    fn test_cdf_is_reproducible() {
        let samples: Vec<f64> = (0..12_345).map(f64::from).collect();
        assert_eq!(cdf(&samples, 1000), cdf(&samples, 1000));
    }

    #[test]
    fn test_cdf_single_point() {
        let points = cdf(&[5.0, 1.0, 9.0], 1);
        assert_eq!(points, vec![CdfPoint { rank: 1.0, value: 9.0 }]);
    }

    #[test]
    fn test_fairness_index() {
        assert_eq!(fairness_index(&[5.0, 5.0, 5.0, 5.0]), 1.0);
        assert_eq!(fairness_index(&[10.0, 0.0, 0.0, 0.0]), 0.25);
        assert_eq!(fairness_index(&[0.0, 0.0]), 0.0);
        assert_eq!(fairness_index(&[]), -1.0);
    }
}
