//! # arcweld
//!
//! Streaming G-code postprocessor that welds runs of short G0/G1 segments
//! into G2/G3 arcs, shrinking files without changing the printed path.
//!
//! ## Architecture
//!
//! arcweld is organized as a workspace with multiple crates:
//!
//! 1. **arcweld-core** - Shared data types and error enums
//! 2. **arcweld-gcode** - Line streaming, parsing and position tracking
//! 3. **arcweld-settings** - Welder configuration and its persistence
//! 4. **arcweld-engine** - Arc fitting, extrusion bookkeeping and the weld loop
//! 5. **arcweld** - Command line binary that integrates all crates

pub use arcweld_core::{Error, GcodeError, Position, Result, Units, WelderError};
pub use arcweld_engine::{
    ArcWelder, GeometryOracle, ProgressControl, ProgressObserver, SegmentStatistics,
    SilentObserver, ThreePointOracle, WelderProgress, WelderResults,
};
pub use arcweld_gcode::{GcodeParser, ParsedCommand, PositionTracker};
pub use arcweld_settings::{default_config_path, WelderConfig};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Build date (set at compile time)
pub const BUILD_DATE: &str = env!("BUILD_DATE");

/// Initialize logging
///
/// Sets up structured logging with:
/// - Output on stderr, so stdout stays free for reports
/// - RUST_LOG environment variable support, `info` by default
/// - JSON lines instead of human-readable text when `json` is set
pub fn init_logging(json: bool) -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::prelude::*;
    use tracing_subscriber::EnvFilter;

    let env_filter =
        EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new("info"))?;

    if json {
        let fmt_layer = fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .with_target(true)
            .with_current_span(false);
        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt_layer)
            .try_init()?;
    } else {
        let fmt_layer = fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(false)
            .with_level(true)
            .with_line_number(false);
        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt_layer)
            .try_init()?;
    }

    Ok(())
}
