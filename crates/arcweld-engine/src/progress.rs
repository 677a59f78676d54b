//! Progress snapshots, observer callback and run results

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::statistics::SegmentStatistics;

/// Point-in-time view of a welding run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WelderProgress {
    /// Share of the source consumed, 0 to 100
    pub percent_complete: f64,
    /// Seconds since processing started
    pub seconds_elapsed: f64,
    /// Linear estimate of the seconds left
    pub seconds_remaining: f64,
    /// Lines that carried a command word
    pub gcodes_processed: u64,
    /// Source lines consumed
    pub lines_processed: u64,
    /// Source points replaced by arcs
    pub points_compressed: u64,
    /// Arc commands written
    pub arcs_created: u64,
    /// Source bytes consumed
    pub source_file_position: u64,
    /// Source size in bytes
    pub source_file_size: u64,
    /// Bytes written to the target
    pub target_file_size: u64,
    /// Source bytes per target byte; above 1 means the output is smaller
    pub compression_ratio: f64,
    /// Size reduction in percent
    pub compression_percent: f64,
    /// Segment length histograms
    pub segment_statistics: SegmentStatistics,
}

impl WelderProgress {
    /// Multi-line rendering including the statistics table
    pub fn detail(&self) -> String {
        format!(
            "\nExtrusion/Retraction Counts\n{}\n",
            self.segment_statistics
        )
    }
}

impl fmt::Display for WelderProgress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:.2}% complete in {:.2} seconds with {:.2} seconds remaining. \
             Gcodes Processed: {}, Current Line: {}, Points Compressed: {}, \
             ArcsCreated: {}, Compression Ratio: {:.2}, Size Reduction: {:.2}% ",
            self.percent_complete,
            self.seconds_elapsed,
            self.seconds_remaining,
            self.gcodes_processed,
            self.lines_processed,
            self.points_compressed,
            self.arcs_created,
            self.compression_ratio,
            self.compression_percent
        )
    }
}

/// Answer of a progress observer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressControl {
    /// Keep processing
    Continue,
    /// Stop processing as soon as possible
    Cancel,
}

/// Receives progress snapshots during a run
///
/// Invoked synchronously on the processing thread. Closures of the form
/// `FnMut(&WelderProgress) -> ProgressControl` implement it directly.
pub trait ProgressObserver {
    /// Handle a snapshot and decide whether to continue
    fn on_progress(&mut self, progress: &WelderProgress) -> ProgressControl;
}

impl<F> ProgressObserver for F
where
    F: FnMut(&WelderProgress) -> ProgressControl,
{
    fn on_progress(&mut self, progress: &WelderProgress) -> ProgressControl {
        self(progress)
    }
}

/// Observer that never cancels and ignores every snapshot
#[derive(Debug, Clone, Copy, Default)]
pub struct SilentObserver;

impl ProgressObserver for SilentObserver {
    fn on_progress(&mut self, _progress: &WelderProgress) -> ProgressControl {
        ProgressControl::Continue
    }
}

/// Outcome of a welding run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WelderResults {
    /// Whether the whole source was processed
    pub success: bool,
    /// Whether the observer stopped the run
    pub cancelled: bool,
    /// Human-readable outcome
    pub message: String,
    /// Final progress snapshot
    pub progress: WelderProgress,
}
