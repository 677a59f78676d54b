//! Segment length histograms before and after welding
//!
//! Pure aggregation only; the table rendering lives in
//! [`report`](crate::report).

use serde::{Deserialize, Serialize};

/// Upper bounds of the default histogram buckets, in mm
pub const DEFAULT_SEGMENT_LENGTHS: [f64; 12] = [
    0.002, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0, 5.0, 10.0, 20.0, 50.0, 100.0,
];

/// One histogram bucket covering `[min_mm, max_mm)`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SegmentBucket {
    /// Inclusive lower bound
    pub min_mm: f64,
    /// Exclusive upper bound, `None` for the final unbounded bucket
    pub max_mm: Option<f64>,
    /// Segments counted from the source
    pub source_count: u64,
    /// Segments counted in the target
    pub target_count: u64,
}

impl SegmentBucket {
    fn contains(&self, length: f64) -> bool {
        match self.max_mm {
            Some(max) => length >= self.min_mm && length < max,
            None => length >= self.min_mm,
        }
    }

    fn count_mut(&mut self, is_source: bool) -> &mut u64 {
        if is_source {
            &mut self.source_count
        } else {
            &mut self.target_count
        }
    }
}

/// Source and target segment length histograms with running totals
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SegmentStatistics {
    /// Buckets in ascending order; the last one is unbounded
    pub buckets: Vec<SegmentBucket>,
    /// Summed source segment length in mm
    pub total_length_source: f64,
    /// Summed target segment length in mm
    pub total_length_target: f64,
    /// Number of source segments
    pub total_count_source: u64,
    /// Number of target segments
    pub total_count_target: u64,
}

impl Default for SegmentStatistics {
    fn default() -> Self {
        Self::new()
    }
}

impl SegmentStatistics {
    /// Create statistics with the default bucket boundaries
    pub fn new() -> Self {
        Self::with_lengths(&DEFAULT_SEGMENT_LENGTHS)
    }

    /// Create statistics with custom ascending bucket boundaries
    ///
    /// `n` boundaries produce `n + 1` buckets: `[0, l0)`, `[l0, l1)`, ...,
    /// and a final `[l(n-1), inf)`.
    pub fn with_lengths(lengths: &[f64]) -> Self {
        let mut buckets = Vec::with_capacity(lengths.len() + 1);
        let mut min_mm = 0.0;
        for &max in lengths {
            buckets.push(SegmentBucket {
                min_mm,
                max_mm: Some(max),
                source_count: 0,
                target_count: 0,
            });
            min_mm = max;
        }
        buckets.push(SegmentBucket {
            min_mm,
            max_mm: None,
            source_count: 0,
            target_count: 0,
        });

        Self {
            buckets,
            total_length_source: 0.0,
            total_length_target: 0.0,
            total_count_source: 0,
            total_count_target: 0,
        }
    }

    /// Record one segment
    ///
    /// Non-positive (and NaN) lengths are ignored. Every other length lands
    /// in exactly one bucket: the first whose range contains it, or the
    /// last bucket.
    pub fn update(&mut self, length: f64, is_source: bool) {
        if length.is_nan() || length <= 0.0 {
            return;
        }

        let last = self.buckets.len() - 1;
        let index = self
            .buckets
            .iter()
            .position(|b| b.contains(length))
            .unwrap_or(last);
        *self.buckets[index].count_mut(is_source) += 1;

        if is_source {
            self.total_count_source += 1;
            self.total_length_source += length;
        } else {
            self.total_count_target += 1;
            self.total_length_target += length;
        }
    }

    /// Sum of all source bucket counts
    pub fn source_bucket_total(&self) -> u64 {
        self.buckets.iter().map(|b| b.source_count).sum()
    }

    /// Sum of all target bucket counts
    pub fn target_bucket_total(&self) -> u64 {
        self.buckets.iter().map(|b| b.target_count).sum()
    }
}
