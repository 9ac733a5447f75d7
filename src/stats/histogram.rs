//! Approximate latency histogram using HdrHistogram
//!
//! Used where many small latency groups need percentiles without keeping
//! every sample, such as the latency-over-time series. Values are recorded
//! in microseconds with 3 significant digits (0.1% precision) over a range
//! of 1 microsecond to 1 hour; out-of-range values are clamped.
//!
//! Exact statistics over full sample sets live in [`super::distribution`].
//!
//! # Example
//!
//! ```
//! use nslogstat::stats::histogram::LatencyHistogram;
//!
//! let mut hist = LatencyHistogram::new();
//! hist.record_ms(12.0);
//! hist.record_ms(40.0);
//!
//! let median = hist.percentile_ms(50.0).unwrap();
//! assert!((median - 12.0).abs() < 0.1);
//! ```

use hdrhistogram::Histogram;

/// Largest trackable value: 1 hour in microseconds
const MAX_MICROS: u64 = 3_600_000_000;

/// Latency histogram wrapper with millisecond input and output
#[derive(Debug, Clone)]
pub struct LatencyHistogram {
    histogram: Histogram<u64>,
    /// Exact sum in milliseconds, so the mean is not quantized
    sum_ms: f64,
}

impl LatencyHistogram {
    pub fn new() -> Self {
        // Bounds are constant and valid, so construction cannot fail
        let histogram = Histogram::new_with_bounds(1, MAX_MICROS, 3)
            .expect("Failed to create histogram with valid bounds");

        Self {
            histogram,
            sum_ms: 0.0,
        }
    }

    /// Record one latency in milliseconds
    #[inline]
    pub fn record_ms(&mut self, latency_ms: f64) {
        let micros = (latency_ms * 1000.0).round().clamp(1.0, MAX_MICROS as f64) as u64;
        // Saturating record - value is already clamped into range
        let _ = self.histogram.record(micros);
        self.sum_ms += latency_ms;
    }

    /// Latency at a percentile (0.0 - 100.0), `None` if empty
    pub fn percentile_ms(&self, percentile: f64) -> Option<f64> {
        if self.is_empty() {
            return None;
        }
        Some(self.histogram.value_at_quantile(percentile / 100.0) as f64 / 1000.0)
    }

    /// Exact mean of the recorded values
    pub fn mean_ms(&self) -> Option<f64> {
        if self.is_empty() {
            return None;
        }
        Some(self.sum_ms / self.len() as f64)
    }

    pub fn len(&self) -> u64 {
        self.histogram.len()
    }

    pub fn is_empty(&self) -> bool {
        self.histogram.len() == 0
    }
}

impl Default for LatencyHistogram {
    fn default() -> Self {
        Self::new()
    }
}
