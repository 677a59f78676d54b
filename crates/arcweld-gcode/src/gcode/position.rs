//! Modal state tracking and absolute position resolution

use arcweld_core::{Position, Units};
use serde::{Deserialize, Serialize};

use super::ParsedCommand;

/// Extrusion amounts smaller than this are treated as no extrusion
const EXTRUSION_EPSILON: f64 = 1e-9;

/// Modal state relevant to path rewriting
///
/// Tracks the modal groups that persist across commands until changed:
/// - Distance mode (G90=absolute, G91=incremental)
/// - Extruder distance mode (M82=absolute, M83=relative)
/// - Units (G20=inches, G21=millimeters)
/// - Feed rate (sticky F word)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ModalState {
    /// XYZ positioning is relative (G91)
    pub is_relative: bool,
    /// Extruder positioning is relative (M83)
    pub is_extruder_relative: bool,
    /// Active units
    pub units: Units,
    /// Feed rate in force, 0 when never set
    pub feedrate: f64,
}

impl Default for ModalState {
    fn default() -> Self {
        Self {
            is_relative: false,          // G90
            is_extruder_relative: false, // M82
            units: Units::MM,            // G21
            feedrate: 0.0,
        }
    }
}

impl ModalState {
    /// Whether the active units are millimeters
    pub fn is_metric(&self) -> bool {
        self.units == Units::MM
    }
}

/// Resolved machine state after one command
///
/// Positions and E values are in the coordinate frame of the file, so G92
/// shifts the frame without reporting any travel.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PositionSnapshot {
    /// Position before the command
    pub previous: Position,
    /// Position after the command
    pub position: Position,
    /// Absolute E before the command
    pub previous_e: f64,
    /// Absolute E after the command
    pub e: f64,
    /// Extrusion delta produced by the command
    pub e_relative: f64,
    /// Feed rate in force after the command
    pub f: f64,
    /// Modal state after the command
    pub modal: ModalState,
    /// Whether the command moved the tool (G0-G3)
    pub is_motion: bool,
}

impl PositionSnapshot {
    /// Distance travelled in the XY plane
    pub fn xy_length(&self) -> f64 {
        if self.is_motion {
            self.previous.xy_distance_to(&self.position)
        } else {
            0.0
        }
    }

    /// Distance travelled in XYZ
    pub fn length(&self) -> f64 {
        if self.is_motion {
            self.previous.distance_to(&self.position)
        } else {
            0.0
        }
    }

    /// Whether the command pushes filament
    pub fn is_extruding(&self) -> bool {
        self.e_relative > EXTRUSION_EPSILON
    }

    /// Whether the command pulls filament back
    pub fn is_retracting(&self) -> bool {
        self.e_relative < -EXTRUSION_EPSILON
    }

    /// Whether the command is a pure travel with respect to the extruder
    pub fn is_travel(&self) -> bool {
        !self.is_extruding() && !self.is_retracting()
    }
}

/// Resolves absolute position and modal flags command by command
///
/// Single-pass: each call to [`update`](Self::update) applies one command
/// and returns the resulting snapshot.
#[derive(Debug, Clone)]
pub struct PositionTracker {
    g90_g91_influences_extruder: bool,
    position: Position,
    e: f64,
    modal: ModalState,
}

impl PositionTracker {
    /// Create a new tracker at the origin with default modal state
    ///
    /// When `g90_g91_influences_extruder` is set, G90/G91 also switch the
    /// extruder between absolute and relative mode, as some firmwares do.
    pub fn new(g90_g91_influences_extruder: bool) -> Self {
        Self {
            g90_g91_influences_extruder,
            position: Position::default(),
            e: 0.0,
            modal: ModalState::default(),
        }
    }

    /// Current position
    pub fn position(&self) -> Position {
        self.position
    }

    /// Current absolute E
    pub fn e(&self) -> f64 {
        self.e
    }

    /// Current modal state
    pub fn modal(&self) -> ModalState {
        self.modal
    }

    /// Apply a command and return the resolved state
    pub fn update(&mut self, command: &ParsedCommand) -> PositionSnapshot {
        let previous = self.position;
        let previous_e = self.e;
        let mut e_relative = 0.0;
        let mut is_motion = false;

        match command.command.as_str() {
            "G0" | "G1" | "G2" | "G3" => {
                is_motion = true;
                self.apply_axes(command);
                if let Some(e) = command.get('E') {
                    e_relative = if self.modal.is_extruder_relative {
                        e
                    } else {
                        e - self.e
                    };
                    self.e += e_relative;
                }
                if let Some(f) = command.get('F') {
                    if f > 0.0 {
                        self.modal.feedrate = f;
                    }
                }
            }
            "G20" => self.modal.units = Units::INCH,
            "G21" => self.modal.units = Units::MM,
            "G28" => self.home(command),
            "G90" => {
                self.modal.is_relative = false;
                if self.g90_g91_influences_extruder {
                    self.modal.is_extruder_relative = false;
                }
            }
            "G91" => {
                self.modal.is_relative = true;
                if self.g90_g91_influences_extruder {
                    self.modal.is_extruder_relative = true;
                }
            }
            "G92" => self.set_frame(command),
            "M82" => self.modal.is_extruder_relative = false,
            "M83" => self.modal.is_extruder_relative = true,
            _ => {}
        }

        PositionSnapshot {
            previous,
            position: self.position,
            previous_e,
            e: self.e,
            e_relative,
            f: self.modal.feedrate,
            modal: self.modal,
            is_motion,
        }
    }

    fn apply_axes(&mut self, command: &ParsedCommand) {
        let relative = self.modal.is_relative;
        let resolve = |current: f64, word: Option<f64>| match word {
            Some(v) if relative => current + v,
            Some(v) => v,
            None => current,
        };
        self.position.x = resolve(self.position.x, command.get('X'));
        self.position.y = resolve(self.position.y, command.get('Y'));
        self.position.z = resolve(self.position.z, command.get('Z'));
    }

    fn home(&mut self, command: &ParsedCommand) {
        let any_axis = command.has('X') || command.has('Y') || command.has('Z');
        if !any_axis || command.has('X') {
            self.position.x = 0.0;
        }
        if !any_axis || command.has('Y') {
            self.position.y = 0.0;
        }
        if !any_axis || command.has('Z') {
            self.position.z = 0.0;
        }
    }

    fn set_frame(&mut self, command: &ParsedCommand) {
        let any_axis = ['X', 'Y', 'Z', 'E'].iter().any(|&a| command.has(a));
        if !any_axis {
            self.position = Position::default();
            self.e = 0.0;
            return;
        }
        if let Some(x) = command.get('X') {
            self.position.x = x;
        }
        if let Some(y) = command.get('Y') {
            self.position.y = y;
        }
        if let Some(z) = command.get('Z') {
            self.position.z = z;
        }
        if let Some(e) = command.get('E') {
            self.e = e;
        }
    }
}

impl Default for PositionTracker {
    fn default() -> Self {
        Self::new(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gcode::GcodeParser;

    fn run(tracker: &mut PositionTracker, line: &str) -> PositionSnapshot {
        let cmd = GcodeParser::new().parse(line, 1).unwrap();
        tracker.update(&cmd)
    }

    #[test]
    fn test_absolute_moves_and_extrusion() {
        let mut tracker = PositionTracker::default();
        run(&mut tracker, "G1 X10 Y0 F1200");
        let snap = run(&mut tracker, "G1 X10 Y5 E1.5");
        assert_eq!(snap.previous, Position::new(10.0, 0.0, 0.0));
        assert_eq!(snap.position, Position::new(10.0, 5.0, 0.0));
        assert!((snap.e_relative - 1.5).abs() < 1e-12);
        assert!((snap.xy_length() - 5.0).abs() < 1e-12);
        assert_eq!(snap.f, 1200.0);
        assert!(snap.is_extruding());

        let snap = run(&mut tracker, "G1 E0.5");
        assert!((snap.e_relative + 1.0).abs() < 1e-12);
        assert!(snap.is_retracting());
        assert_eq!(snap.xy_length(), 0.0);
    }

    #[test]
    fn test_relative_extrusion() {
        let mut tracker = PositionTracker::default();
        run(&mut tracker, "M83");
        run(&mut tracker, "G1 X1 E0.2");
        let snap = run(&mut tracker, "G1 X2 E0.3");
        assert!((snap.e_relative - 0.3).abs() < 1e-12);
        assert!((snap.e - 0.5).abs() < 1e-12);
        assert!(snap.modal.is_extruder_relative);
    }

    #[test]
    fn test_relative_positioning() {
        let mut tracker = PositionTracker::default();
        run(&mut tracker, "G1 X5 Y5");
        run(&mut tracker, "G91");
        let snap = run(&mut tracker, "G1 X1 Y-2");
        assert_eq!(snap.position, Position::new(6.0, 3.0, 0.0));
        assert!(snap.modal.is_relative);
        assert!(!snap.modal.is_extruder_relative);
    }

    #[test]
    fn test_g90_g91_influences_extruder() {
        let mut tracker = PositionTracker::new(true);
        let snap = run(&mut tracker, "G91");
        assert!(snap.modal.is_extruder_relative);
        let snap = run(&mut tracker, "G1 X1 E0.4");
        assert!((snap.e_relative - 0.4).abs() < 1e-12);
        let snap = run(&mut tracker, "G90");
        assert!(!snap.modal.is_extruder_relative);
        let snap = run(&mut tracker, "G1 X2 E1.0");
        assert!((snap.e_relative - 0.6).abs() < 1e-12);
    }

    #[test]
    fn test_g92_and_g28() {
        let mut tracker = PositionTracker::default();
        run(&mut tracker, "G1 X10 Y10 Z0.3 E5");
        let snap = run(&mut tracker, "G92 E0");
        assert_eq!(snap.e, 0.0);
        assert_eq!(snap.e_relative, 0.0);
        assert_eq!(snap.length(), 0.0);
        assert_eq!(snap.position, Position::new(10.0, 10.0, 0.3));

        let snap = run(&mut tracker, "G28 X");
        assert_eq!(snap.position, Position::new(0.0, 10.0, 0.3));
        let snap = run(&mut tracker, "G28");
        assert_eq!(snap.position, Position::default());
    }

    #[test]
    fn test_units() {
        let mut tracker = PositionTracker::default();
        assert!(tracker.modal().is_metric());
        run(&mut tracker, "G20");
        assert!(!tracker.modal().is_metric());
        run(&mut tracker, "G21");
        assert!(tracker.modal().is_metric());
    }
}
