//! Streaming weld driver
//!
//! One pass over the source: each line is parsed, resolved against the
//! machine state, then either offered to the accumulator or written after
//! flushing whatever candidate is open. Progress is reported on a wall
//! clock cadence and the observer may cancel at each report.

use std::fs::{self, File};
use std::io::{BufRead, BufWriter, Write};
use std::path::Path;
use std::time::Instant;

use arcweld_core::WelderError;
use arcweld_gcode::{
    GcodeFileReader, GcodeLineReader, GcodeParser, ParsedCommand, PositionSnapshot,
    PositionTracker, SourceLine,
};
use arcweld_settings::{SettingsError, WelderConfig};
use tracing::{debug, error, info, warn};

use crate::accumulator::{ArcAccumulator, FinishedSpan};
use crate::emit;
use crate::extruder::{ArcExtrusion, ExtruderState};
use crate::geometry::{FitTolerance, GeometryOracle, ThreePointOracle};
use crate::progress::{ProgressControl, ProgressObserver, WelderProgress, WelderResults};
use crate::segmented_arc::CandidateArc;
use crate::statistics::SegmentStatistics;
use crate::unwritten::UnwrittenCommand;

/// Version written into the target header
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

const SUCCESS_MESSAGE: &str = "Arc welding completed successfully";

/// Replaces runs of G0/G1 moves with G2/G3 arcs
///
/// # Example
/// ```no_run
/// use arcweld_engine::{ArcWelder, SilentObserver};
/// use arcweld_settings::WelderConfig;
/// use std::path::Path;
///
/// let welder = ArcWelder::new(WelderConfig::default());
/// let results = welder.process(
///     Path::new("part.gcode"),
///     Path::new("part.aw.gcode"),
///     &mut SilentObserver,
/// );
/// println!("{}", results.message);
/// ```
pub struct ArcWelder {
    config: WelderConfig,
    oracle: Box<dyn GeometryOracle>,
}

enum RunOutcome {
    Completed,
    Cancelled,
}

impl ArcWelder {
    /// Create a welder using the three-point circle fit
    pub fn new(config: WelderConfig) -> Self {
        Self::with_oracle(config, ThreePointOracle::new())
    }

    /// Create a welder with a custom geometry oracle
    pub fn with_oracle(config: WelderConfig, oracle: impl GeometryOracle + 'static) -> Self {
        Self {
            config,
            oracle: Box::new(oracle),
        }
    }

    /// Active configuration
    pub fn config(&self) -> &WelderConfig {
        &self.config
    }

    /// Weld `source` into `target`
    ///
    /// Never panics on bad input or I/O failure; every outcome is reported
    /// through the returned [`WelderResults`].
    pub fn process<O>(&self, source: &Path, target: &Path, observer: &mut O) -> WelderResults
    where
        O: ProgressObserver + ?Sized,
    {
        if let Err(err) = self.validate() {
            return Self::failure(err, WelderProgress::default());
        }

        if is_same_file(source, target) {
            let err = WelderError::TargetUnwritable {
                path: target.display().to_string(),
                reason: "target is the same file as the source".to_string(),
            };
            return Self::failure(err, Default::default());
        }

        let source_unreadable = |reason: String| WelderError::SourceUnreadable {
            path: source.display().to_string(),
            reason,
        };
        let reader = match GcodeFileReader::new(source) {
            Ok(reader) => reader,
            Err(e) => return Self::failure(source_unreadable(e.to_string()), Default::default()),
        };
        let lines = match reader.lines() {
            Ok(lines) => lines,
            Err(e) => return Self::failure(source_unreadable(e.to_string()), Default::default()),
        };
        let file = match File::create(target) {
            Ok(file) => file,
            Err(e) => {
                let err = WelderError::TargetUnwritable {
                    path: target.display().to_string(),
                    reason: e.to_string(),
                };
                return Self::failure(err, Default::default());
            }
        };

        info!(
            "Welding {} into {} ({} bytes)",
            source.display(),
            target.display(),
            reader.file_size()
        );
        self.run(
            lines,
            reader.file_size(),
            BufWriter::new(file),
            SessionNames {
                source: source.display().to_string(),
                target: target.display().to_string(),
            },
            observer,
        )
    }

    /// Weld an in-memory or otherwise already opened stream
    ///
    /// `source_size` is only used to compute the completion percentage.
    pub fn process_stream<R, W, O>(
        &self,
        reader: R,
        source_size: u64,
        writer: W,
        observer: &mut O,
    ) -> WelderResults
    where
        R: BufRead,
        W: Write,
        O: ProgressObserver + ?Sized,
    {
        if let Err(err) = self.validate() {
            return Self::failure(err, WelderProgress::default());
        }
        self.run(
            GcodeLineReader::new(reader),
            source_size,
            writer,
            SessionNames {
                source: "<source stream>".to_string(),
                target: "<target stream>".to_string(),
            },
            observer,
        )
    }

    fn validate(&self) -> Result<(), WelderError> {
        self.config.validate().map_err(|e| match e {
            SettingsError::InvalidSetting { key, reason } => WelderError::InvalidSetting {
                name: key,
                reason,
            },
            other => WelderError::InvalidSetting {
                name: "config".to_string(),
                reason: other.to_string(),
            },
        })
    }

    fn run<R, W, O>(
        &self,
        mut lines: GcodeLineReader<R>,
        source_size: u64,
        writer: W,
        names: SessionNames,
        observer: &mut O,
    ) -> WelderResults
    where
        R: BufRead,
        W: Write,
        O: ProgressObserver + ?Sized,
    {
        let mut session = WeldSession::new(
            &self.config,
            self.oracle.as_ref(),
            writer,
            names,
            source_size,
        );
        let outcome = session.run(&mut lines, observer);
        let progress = session.progress();

        match outcome {
            Ok(RunOutcome::Completed) => {
                // The run is over; a cancel answer here changes nothing
                let _ = observer.on_progress(&progress);
                info!("{}", progress);
                WelderResults {
                    success: true,
                    cancelled: false,
                    message: SUCCESS_MESSAGE.to_string(),
                    progress,
                }
            }
            Ok(RunOutcome::Cancelled) => {
                info!("Welding cancelled after {} lines", progress.lines_processed);
                WelderResults {
                    success: false,
                    cancelled: true,
                    message: WelderError::Cancelled.to_string(),
                    progress,
                }
            }
            Err(err) => Self::failure(err, progress),
        }
    }

    fn failure(err: WelderError, progress: WelderProgress) -> WelderResults {
        error!("Welding failed: {}", err);
        WelderResults {
            success: false,
            cancelled: err.is_cancelled(),
            message: err.to_string(),
            progress,
        }
    }
}

/// Whether both paths resolve to the same existing file
fn is_same_file(source: &Path, target: &Path) -> bool {
    match (fs::canonicalize(source), fs::canonicalize(target)) {
        (Ok(source), Ok(target)) => source == target,
        _ => false,
    }
}

struct SessionNames {
    source: String,
    target: String,
}

/// State of one run, from the first line to the final flush
struct WeldSession<'a, W: Write> {
    config: &'a WelderConfig,
    oracle: &'a dyn GeometryOracle,
    tolerance: FitTolerance,
    parser: GcodeParser,
    tracker: PositionTracker,
    extruder: ExtruderState,
    accumulator: ArcAccumulator,
    statistics: SegmentStatistics,
    writer: W,
    names: SessionNames,
    started: Instant,
    source_size: u64,
    source_position: u64,
    target_size: u64,
    lines_processed: u64,
    gcodes_processed: u64,
    points_compressed: u64,
    arcs_created: u64,
}

impl<'a, W: Write> WeldSession<'a, W> {
    fn new(
        config: &'a WelderConfig,
        oracle: &'a dyn GeometryOracle,
        writer: W,
        names: SessionNames,
        source_size: u64,
    ) -> Self {
        Self {
            config,
            oracle,
            tolerance: FitTolerance::from(config),
            parser: GcodeParser::new(),
            tracker: PositionTracker::new(config.g90_g91_influences_extruder),
            extruder: ExtruderState::new(),
            accumulator: ArcAccumulator::new(config.buffer_size),
            statistics: SegmentStatistics::new(),
            writer,
            names,
            started: Instant::now(),
            source_size,
            source_position: 0,
            target_size: 0,
            lines_processed: 0,
            gcodes_processed: 0,
            points_compressed: 0,
            arcs_created: 0,
        }
    }

    /// Process every line, then flush the writer on every exit path
    fn run<R, O>(
        &mut self,
        lines: &mut GcodeLineReader<R>,
        observer: &mut O,
    ) -> Result<RunOutcome, WelderError>
    where
        R: BufRead,
        O: ProgressObserver + ?Sized,
    {
        let result = self.process_lines(lines, observer);
        let flushed = self.writer.flush().map_err(|e| self.target_error(e));
        let outcome = result?;
        flushed?;
        Ok(outcome)
    }

    fn process_lines<R, O>(
        &mut self,
        lines: &mut GcodeLineReader<R>,
        observer: &mut O,
    ) -> Result<RunOutcome, WelderError>
    where
        R: BufRead,
        O: ProgressObserver + ?Sized,
    {
        self.write_header()?;

        let period = self.config.notification_period_seconds;
        let mut next_notification = period;

        loop {
            let line = match lines.next_line() {
                Ok(Some(line)) => line,
                Ok(None) => break,
                Err(e) => {
                    return Err(WelderError::SourceUnreadable {
                        path: self.names.source.clone(),
                        reason: e.to_string(),
                    })
                }
            };
            self.source_position += line.bytes;
            self.lines_processed += 1;
            self.process_line(&line)?;

            let elapsed = self.started.elapsed().as_secs_f64();
            if elapsed >= next_notification {
                let progress = self.progress();
                if observer.on_progress(&progress) == ProgressControl::Cancel {
                    info!("Cancellation requested at line {}", line.line_number);
                    self.flush_verbatim()?;
                    return Ok(RunOutcome::Cancelled);
                }
                next_notification = elapsed + period;
            }
        }

        self.flush_candidate()?;
        debug!(
            "Processed {} lines, {} arcs created",
            self.lines_processed, self.arcs_created
        );
        Ok(RunOutcome::Completed)
    }

    fn process_line(&mut self, line: &SourceLine) -> Result<(), WelderError> {
        let command = match self.parser.parse(&line.text, line.line_number) {
            Ok(command) => command,
            Err(e) => {
                warn!("Copying malformed line unchanged: {}", e);
                self.flush_candidate()?;
                return self.write_line(&line.text);
            }
        };
        if !command.is_empty() {
            self.gcodes_processed += 1;
        }

        let snapshot = self.tracker.update(&command);
        self.extruder.observe(&snapshot);

        if !CandidateArc::can_start(&command, &snapshot) {
            self.flush_candidate()?;
            return self.write_verbatim(&command, &snapshot);
        }

        let pending = UnwrittenCommand::new(command, snapshot);
        let Err(rejected) = self.accumulator.offer(pending, self.oracle, &self.tolerance) else {
            return Ok(());
        };
        self.flush_candidate()?;
        match self.accumulator.offer(rejected, self.oracle, &self.tolerance) {
            Ok(()) => Ok(()),
            // An idle accumulator takes any startable command
            Err(cmd) => self.write_verbatim(&cmd.command, &cmd.snapshot),
        }
    }

    /// Close the open candidate as an arc when possible
    fn flush_candidate(&mut self) -> Result<(), WelderError> {
        match self.accumulator.take() {
            Some(span) if span.is_arc() => self.write_arc(span),
            Some(span) => self.write_span_verbatim(span),
            None => Ok(()),
        }
    }

    /// Close the open candidate without welding it
    fn flush_verbatim(&mut self) -> Result<(), WelderError> {
        match self.accumulator.take() {
            Some(span) => self.write_span_verbatim(span),
            None => Ok(()),
        }
    }

    fn write_span_verbatim(&mut self, span: FinishedSpan) -> Result<(), WelderError> {
        if !span.commands.is_empty() {
            debug!(
                "Writing {} buffered command(s) unchanged",
                span.commands.len()
            );
        }
        for unwritten in &span.commands {
            self.write_verbatim(&unwritten.command, &unwritten.snapshot)?;
        }
        Ok(())
    }

    fn write_arc(&mut self, span: FinishedSpan) -> Result<(), WelderError> {
        let Some(geometry) = span.candidate.geometry().copied() else {
            return self.write_span_verbatim(span);
        };
        let Some((end_e, last_line)) = span
            .commands
            .last()
            .map(|c| (c.snapshot.e, c.command.line_number))
        else {
            return self.write_span_verbatim(span);
        };

        let emission = self.extruder.emit_arc(&ArcExtrusion {
            delta: span.candidate.extrusion(),
            end_e,
            feedrate: span.candidate.feedrate(),
            is_relative: span.candidate.is_extruder_relative(),
        });
        let comment = emit::span_comment(
            span.commands.iter().filter_map(|c| c.command.comment.as_deref()),
        );
        self.write_line(&emit::arc_command(&geometry, &emission, comment.as_deref()))?;
        if let Some(e) = emission.reset_e {
            self.write_line(&emit::reset_e_command(e))?;
        }

        for unwritten in &span.commands {
            self.statistics.update(unwritten.length(), true);
        }
        self.statistics.update(geometry.length(), false);

        let points = span.candidate.point_count() as u64;
        self.arcs_created += 1;
        self.points_compressed += points - 1;
        debug!(
            "{} from {} points at line {}: radius {:.3}mm, deviation {:.5}mm",
            geometry.direction.gcode_command(),
            points,
            last_line,
            geometry.radius,
            geometry.max_deviation
        );
        Ok(())
    }

    fn write_verbatim(
        &mut self,
        command: &ParsedCommand,
        snapshot: &PositionSnapshot,
    ) -> Result<(), WelderError> {
        self.write_line(&command.gcode)?;
        self.extruder.record_verbatim(snapshot);
        if command.is_linear_move() {
            let length = snapshot.length();
            self.statistics.update(length, true);
            self.statistics.update(length, false);
        }
        Ok(())
    }

    fn write_header(&mut self) -> Result<(), WelderError> {
        let config = self.config;
        let header = [
            format!("; Postprocessed by arcweld {}", VERSION),
            format!("; resolution={}mm", config.resolution_mm),
            format!("; max_radius={}mm", config.max_radius_mm),
            format!(
                "; g90_g91_influences_extruder={}",
                config.g90_g91_influences_extruder
            ),
            format!("; buffer_size={}", config.buffer_size),
            String::new(),
        ];
        for line in &header {
            self.write_line(line)?;
        }
        Ok(())
    }

    fn write_line(&mut self, text: &str) -> Result<(), WelderError> {
        let written = self
            .writer
            .write_all(text.as_bytes())
            .and_then(|_| self.writer.write_all(b"\n"));
        written.map_err(|e| self.target_error(e))?;
        self.target_size += text.len() as u64 + 1;
        Ok(())
    }

    fn target_error(&self, e: std::io::Error) -> WelderError {
        WelderError::TargetUnwritable {
            path: self.names.target.clone(),
            reason: e.to_string(),
        }
    }

    fn progress(&self) -> WelderProgress {
        let seconds_elapsed = self.started.elapsed().as_secs_f64();
        let percent_complete = if self.source_size > 0 {
            (self.source_position as f64 / self.source_size as f64 * 100.0).min(100.0)
        } else {
            0.0
        };
        let seconds_remaining = if percent_complete > 0.0 {
            seconds_elapsed / percent_complete * (100.0 - percent_complete)
        } else {
            0.0
        };
        let compression_ratio = if self.target_size > 0 {
            self.source_position as f64 / self.target_size as f64
        } else {
            0.0
        };
        let compression_percent = if self.source_position > 0 {
            (1.0 - self.target_size as f64 / self.source_position as f64) * 100.0
        } else {
            0.0
        };

        WelderProgress {
            percent_complete,
            seconds_elapsed,
            seconds_remaining,
            gcodes_processed: self.gcodes_processed,
            lines_processed: self.lines_processed,
            points_compressed: self.points_compressed,
            arcs_created: self.arcs_created,
            source_file_position: self.source_position,
            source_file_size: self.source_size,
            target_file_size: self.target_size,
            compression_ratio,
            compression_percent,
            segment_statistics: self.statistics.clone(),
        }
    }
}
