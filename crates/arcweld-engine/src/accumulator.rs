//! Accept/reject state machine around the candidate arc
//!
//! The accumulator is either idle or holds exactly one [`CandidateArc`]
//! together with the commands it spans. It never writes anything itself:
//! a rejection hands the command back so the caller can flush and offer it
//! again, which then opens a fresh candidate anchored at that command.

use crate::geometry::{FitTolerance, GeometryOracle};
use crate::segmented_arc::CandidateArc;
use crate::unwritten::{UnwrittenBuffer, UnwrittenCommand};

/// A closed span ready to be written
#[derive(Debug)]
pub struct FinishedSpan {
    /// The candidate as it stood when closed
    pub candidate: CandidateArc,
    /// The commands it consumed, in source order
    pub commands: Vec<UnwrittenCommand>,
}

impl FinishedSpan {
    /// Whether the span is written as one arc rather than verbatim
    pub fn is_arc(&self) -> bool {
        self.candidate.point_count() >= 3 && self.candidate.geometry().is_some()
    }
}

/// Owner of the in-flight candidate and its unwritten commands
#[derive(Debug)]
pub struct ArcAccumulator {
    candidate: Option<CandidateArc>,
    unwritten: UnwrittenBuffer,
    buffer_size: usize,
}

impl ArcAccumulator {
    /// Create an idle accumulator holding at most `buffer_size` commands
    pub fn new(buffer_size: usize) -> Self {
        Self {
            candidate: None,
            unwritten: UnwrittenBuffer::with_capacity(buffer_size.min(4096)),
            buffer_size,
        }
    }

    /// Whether no candidate is open
    pub fn is_idle(&self) -> bool {
        self.candidate.is_none()
    }

    /// Number of buffered commands
    pub fn buffered(&self) -> usize {
        self.unwritten.len()
    }

    /// Offer a command that passed [`CandidateArc::can_start`]
    ///
    /// While idle the command always opens a candidate. Otherwise it is
    /// accepted only when compatible, geometrically admissible and the
    /// buffer has room; on rejection it is returned untouched.
    pub fn offer(
        &mut self,
        command: UnwrittenCommand,
        oracle: &dyn GeometryOracle,
        tolerance: &FitTolerance,
    ) -> Result<(), UnwrittenCommand> {
        let Some(candidate) = self.candidate.as_mut() else {
            self.candidate = Some(CandidateArc::start(&command.command, &command.snapshot));
            self.unwritten.push(command);
            return Ok(());
        };

        if self.unwritten.len() >= self.buffer_size {
            tracing::debug!(
                "Buffer full at {} commands, forcing flush",
                self.buffer_size
            );
            return Err(command);
        }

        if !candidate.is_compatible(&command.command, &command.snapshot)
            || !candidate.try_add(&command.snapshot, oracle, tolerance)
        {
            return Err(command);
        }

        self.unwritten.push(command);
        Ok(())
    }

    /// Close the open candidate, returning to idle
    pub fn take(&mut self) -> Option<FinishedSpan> {
        let candidate = self.candidate.take()?;
        Some(FinishedSpan {
            candidate,
            commands: self.unwritten.drain(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::ThreePointOracle;
    use arcweld_gcode::{GcodeParser, PositionTracker};

    fn unwritten(tracker: &mut PositionTracker, line: &str) -> UnwrittenCommand {
        let command = GcodeParser::new().parse(line, 1).unwrap();
        let snapshot = tracker.update(&command);
        UnwrittenCommand::new(command, snapshot)
    }

    fn arc_line(radius: f64, degrees: f64) -> String {
        let a = degrees.to_radians();
        format!("G1 X{:.4} Y{:.4}", radius * a.cos(), radius * a.sin())
    }

    #[test]
    fn test_buffer_matches_points() {
        let mut tracker = PositionTracker::default();
        unwritten(&mut tracker, "G0 X10 Y0");
        let oracle = ThreePointOracle::new();
        let tolerance = FitTolerance::default();
        let mut acc = ArcAccumulator::new(100);

        for step in 1..=5 {
            let cmd = unwritten(&mut tracker, &arc_line(10.0, step as f64 * 10.0));
            assert!(acc.offer(cmd, &oracle, &tolerance).is_ok());
        }
        assert_eq!(acc.buffered(), 5);

        let span = acc.take().unwrap();
        assert!(acc.is_idle());
        assert_eq!(span.candidate.point_count() - 1, span.commands.len());
        assert!(span.is_arc());
    }

    #[test]
    fn test_rejection_returns_command() {
        let mut tracker = PositionTracker::default();
        let oracle = ThreePointOracle::new();
        let tolerance = FitTolerance::default();
        let mut acc = ArcAccumulator::new(100);

        let first = unwritten(&mut tracker, "G1 X1 Y0");
        assert!(acc.offer(first, &oracle, &tolerance).is_ok());
        let second = unwritten(&mut tracker, "G1 X1 Y1");
        let rejected = acc.offer(second, &oracle, &tolerance).unwrap_err();
        assert_eq!(rejected.gcode(), "G1 X1 Y1");

        let span = acc.take().unwrap();
        assert!(!span.is_arc());
        assert_eq!(span.commands.len(), 1);

        assert!(acc.offer(rejected, &oracle, &tolerance).is_ok());
        assert_eq!(acc.buffered(), 1);
    }

    #[test]
    fn test_straight_span_is_not_an_arc() {
        let mut tracker = PositionTracker::default();
        let oracle = ThreePointOracle::new();
        let tolerance = FitTolerance::default();
        let mut acc = ArcAccumulator::new(100);

        for line in ["G1 X1 Y0.501", "G1 X2 Y0.999", "G1 X3 Y1.5", "G1 X4 Y2.001"] {
            let cmd = unwritten(&mut tracker, line);
            assert!(acc.offer(cmd, &oracle, &tolerance).is_ok());
        }

        let span = acc.take().unwrap();
        assert_eq!(span.commands.len(), 4);
        assert!(!span.is_arc());
    }

    #[test]
    fn test_buffer_limit_forces_rejection() {
        let mut tracker = PositionTracker::default();
        unwritten(&mut tracker, "G0 X10 Y0");
        let oracle = ThreePointOracle::new();
        let tolerance = FitTolerance::default();
        let mut acc = ArcAccumulator::new(3);

        for step in 1..=3 {
            let cmd = unwritten(&mut tracker, &arc_line(10.0, step as f64 * 10.0));
            assert!(acc.offer(cmd, &oracle, &tolerance).is_ok());
        }
        let cmd = unwritten(&mut tracker, &arc_line(10.0, 40.0));
        assert!(acc.offer(cmd, &oracle, &tolerance).is_err());
        assert_eq!(acc.buffered(), 3);
    }
}
