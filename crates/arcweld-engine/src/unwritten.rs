//! Commands held back while a candidate arc is open

use std::collections::VecDeque;

use arcweld_gcode::{ParsedCommand, PositionSnapshot};

/// A source command plus the machine state resolved for it
#[derive(Debug, Clone, PartialEq)]
pub struct UnwrittenCommand {
    /// The parsed source line
    pub command: ParsedCommand,
    /// Machine state before and after the command
    pub snapshot: PositionSnapshot,
}

impl UnwrittenCommand {
    /// Pair a command with its resolved state
    pub fn new(command: ParsedCommand, snapshot: PositionSnapshot) -> Self {
        Self { command, snapshot }
    }

    /// Raw source text
    pub fn gcode(&self) -> &str {
        &self.command.gcode
    }

    /// Length of the segment this command draws
    pub fn length(&self) -> f64 {
        self.snapshot.length()
    }
}

/// FIFO of commands spanning the open candidate
#[derive(Debug, Default)]
pub struct UnwrittenBuffer {
    commands: VecDeque<UnwrittenCommand>,
}

impl UnwrittenBuffer {
    /// Create an empty buffer sized for `capacity` commands
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            commands: VecDeque::with_capacity(capacity),
        }
    }

    /// Append a command
    pub fn push(&mut self, command: UnwrittenCommand) {
        self.commands.push_back(command);
    }

    /// Number of buffered commands
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    /// Whether nothing is buffered
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Most recently buffered command
    pub fn back(&self) -> Option<&UnwrittenCommand> {
        self.commands.back()
    }

    /// Remove and return every command in source order
    pub fn drain(&mut self) -> Vec<UnwrittenCommand> {
        self.commands.drain(..).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arcweld_gcode::{GcodeParser, PositionTracker};

    fn unwritten(tracker: &mut PositionTracker, line: &str) -> UnwrittenCommand {
        let command = GcodeParser::new().parse(line, 1).unwrap();
        let snapshot = tracker.update(&command);
        UnwrittenCommand::new(command, snapshot)
    }

    #[test]
    fn test_fifo_order() {
        let mut tracker = PositionTracker::default();
        let mut buffer = UnwrittenBuffer::with_capacity(4);
        buffer.push(unwritten(&mut tracker, "G1 X3 Y4"));
        buffer.push(unwritten(&mut tracker, "G1 X3 Y5"));

        assert_eq!(buffer.len(), 2);
        assert_eq!(buffer.back().unwrap().gcode(), "G1 X3 Y5");

        let drained = buffer.drain();
        assert!(buffer.is_empty());
        assert_eq!(drained[0].gcode(), "G1 X3 Y4");
        assert!((drained[0].length() - 5.0).abs() < 1e-12);
        assert!((drained[1].length() - 1.0).abs() < 1e-12);
    }
}
