//! Summary statistics for palette normalization.
//!
//! Percentiles are approximate: they come from fixed-size histograms rather
//! than sorted copies of the data, which keeps memory flat for large volumes.

use serde::{Deserialize, Serialize};

/// Number of histogram buckets used for percentile estimates.
const HISTOGRAM_BUCKETS: usize = 1000;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct Histogram {
    low: f32,
    high: f32,
    counts: Vec<u64>,
    total: u64,
}

impl Histogram {
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss
    )]
    fn build(values: impl Iterator<Item = f32>, low: f32, high: f32) -> Self {
        let mut counts = vec![0u64; HISTOGRAM_BUCKETS];
        let mut total = 0u64;
        let range = high - low;
        for v in values {
            let bucket = if range > 0.0 {
                (((v - low) / range) * HISTOGRAM_BUCKETS as f32) as usize
            } else {
                0
            };
            counts[bucket.min(HISTOGRAM_BUCKETS - 1)] += 1;
            total += 1;
        }
        Self {
            low,
            high,
            counts,
            total,
        }
    }

    /// Value below which `percent` of the samples lie.
    #[allow(clippy::cast_precision_loss)]
    fn percentile(&self, percent: f32) -> f32 {
        if self.total == 0 {
            return 0.0;
        }
        let target = (percent.clamp(0.0, 100.0) / 100.0) * self.total as f32;
        let width = (self.high - self.low) / HISTOGRAM_BUCKETS as f32;
        let mut cumulative = 0.0f32;
        for (bucket, &count) in self.counts.iter().enumerate() {
            let count = count as f32;
            if count > 0.0 && cumulative + count >= target {
                let frac = ((target - cumulative) / count).clamp(0.0, 1.0);
                return self.low + (bucket as f32 + frac) * width;
            }
            cumulative += count;
        }
        self.high
    }
}

/// Statistics of one map of a volume.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FastStatistics {
    count: usize,
    mean: f32,
    min: f32,
    max: f32,
    most_negative: f32,
    least_negative: f32,
    least_positive: f32,
    most_positive: f32,
    positive: Histogram,
    negative: Histogram,
    absolute: Histogram,
}

impl FastStatistics {
    /// Computes statistics over the finite values of `data`.
    #[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation)]
    pub fn new(data: &[f32]) -> Self {
        let finite = || data.iter().copied().filter(|v| v.is_finite());

        let mut stats = Self {
            min: f32::MAX,
            max: f32::MIN,
            most_negative: 0.0,
            least_negative: f32::MIN,
            least_positive: f32::MAX,
            most_positive: 0.0,
            ..Self::default()
        };
        let mut sum = 0.0f64;
        for v in finite() {
            stats.count += 1;
            sum += f64::from(v);
            stats.min = stats.min.min(v);
            stats.max = stats.max.max(v);
            if v > 0.0 {
                stats.least_positive = stats.least_positive.min(v);
                stats.most_positive = stats.most_positive.max(v);
            } else if v < 0.0 {
                stats.least_negative = stats.least_negative.max(v);
                stats.most_negative = stats.most_negative.min(v);
            }
        }

        if stats.count == 0 {
            return Self::default();
        }
        stats.mean = (sum / stats.count as f64) as f32;
        if stats.least_positive == f32::MAX {
            stats.least_positive = 0.0;
        }
        if stats.least_negative == f32::MIN {
            stats.least_negative = 0.0;
        }

        let max_abs = stats.most_positive.max(-stats.most_negative);
        stats.positive = Histogram::build(finite().filter(|&v| v > 0.0), 0.0, stats.most_positive);
        stats.negative = Histogram::build(
            finite().filter(|&v| v < 0.0).map(|v| -v),
            0.0,
            -stats.most_negative,
        );
        stats.absolute = Histogram::build(finite().filter(|&v| v != 0.0).map(f32::abs), 0.0, max_abs);
        stats
    }

    /// Number of finite values.
    #[must_use]
    pub fn count(&self) -> usize {
        self.count
    }

    /// Mean of the finite values.
    #[must_use]
    pub fn mean(&self) -> f32 {
        self.mean
    }

    /// Minimum finite value.
    #[must_use]
    pub fn min(&self) -> f32 {
        self.min
    }

    /// Maximum finite value.
    #[must_use]
    pub fn max(&self) -> f32 {
        self.max
    }

    /// Ranges of the non-zero data as
    /// `(most_negative, least_negative, least_positive, most_positive)`.
    ///
    /// Missing signs report zeros.
    #[must_use]
    pub fn nonzero_ranges(&self) -> (f32, f32, f32, f32) {
        (
            self.most_negative,
            self.least_negative,
            self.least_positive,
            self.most_positive,
        )
    }

    /// Approximate percentile (0..=100) of the positive values.
    #[must_use]
    pub fn positive_percentile(&self, percent: f32) -> f32 {
        self.positive.percentile(percent)
    }

    /// Approximate percentile (0..=100) of the negative values, measured
    /// outward from zero, so 100 is the most negative value.
    #[must_use]
    pub fn negative_percentile(&self, percent: f32) -> f32 {
        -self.negative.percentile(percent)
    }

    /// Approximate percentile (0..=100) of the absolute non-zero values.
    #[must_use]
    pub fn absolute_percentile(&self, percent: f32) -> f32 {
        self.absolute.percentile(percent)
    }
}
