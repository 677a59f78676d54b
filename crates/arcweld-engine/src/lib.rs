//! # Arcweld Engine
//!
//! Replaces runs of short G0/G1 segments with equivalent G2/G3 arcs while
//! streaming a G-code file from source to target.
//!
//! ## Pipeline
//!
//! - **Geometry**: circle fitting and the tolerance checks a candidate must pass
//! - **Candidate arc**: the points, extrusion and feed rate of the span being welded
//! - **Accumulator**: accept/reject decisions and the unwritten command buffer
//! - **Extruder**: E and F bookkeeping so the target extrudes exactly like the source
//! - **Welder**: the line loop, progress reporting and cancellation
//!
//! ## Reporting
//!
//! - **Statistics**: segment length histograms for source and target
//! - **Report**: fixed-width rendering of the histograms

pub mod accumulator;
pub mod emit;
pub mod extruder;
pub mod geometry;
pub mod progress;
pub mod report;
pub mod segmented_arc;
pub mod statistics;
pub mod unwritten;
pub mod welder;

pub use accumulator::{ArcAccumulator, FinishedSpan};
pub use extruder::{ArcEmission, ArcExtrusion, ExtruderState};
pub use geometry::{
    ArcDirection, ArcGeometry, FitOutcome, FitTolerance, GeometryOracle, ThreePointOracle,
};
pub use progress::{
    ProgressControl, ProgressObserver, SilentObserver, WelderProgress, WelderResults,
};
pub use report::StatisticsTable;
pub use segmented_arc::{CandidateArc, ExtrusionClass};
pub use statistics::{SegmentBucket, SegmentStatistics, DEFAULT_SEGMENT_LENGTHS};
pub use unwritten::{UnwrittenBuffer, UnwrittenCommand};
pub use welder::{ArcWelder, VERSION};
