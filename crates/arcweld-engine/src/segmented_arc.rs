//! The single in-flight candidate arc

use arcweld_core::Position;
use arcweld_gcode::{ParsedCommand, PositionSnapshot};

use crate::geometry::{ArcGeometry, FitOutcome, FitTolerance, GeometryOracle};

/// Z difference still considered the same layer
const Z_TOLERANCE: f64 = 1e-6;

/// Feed rates closer than this are considered equal
const FEEDRATE_TOLERANCE: f64 = 1e-9;

/// What a linear move does to the filament
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtrusionClass {
    /// Pushes filament
    Extruding,
    /// Pulls filament back
    Retracting,
    /// Leaves the extruder alone
    Travel,
}

impl ExtrusionClass {
    /// Classify a resolved command
    pub fn of(snapshot: &PositionSnapshot) -> Self {
        if snapshot.is_extruding() {
            Self::Extruding
        } else if snapshot.is_retracting() {
            Self::Retracting
        } else {
            Self::Travel
        }
    }
}

/// Points accumulated toward one arc
///
/// The first point is the anchor, the machine position before the first
/// consumed command; every consumed command adds its end point. Reset by
/// replacement at every flush, never reused across spans.
#[derive(Debug, Clone)]
pub struct CandidateArc {
    points: Vec<Position>,
    extrusion: f64,
    feedrate: f64,
    is_extruder_relative: bool,
    is_rapid: bool,
    class: ExtrusionClass,
    geometry: Option<ArcGeometry>,
}

impl CandidateArc {
    /// Whether a command may open a candidate at all
    ///
    /// Requires a G0/G1 with XY travel, absolute positioning, metric units
    /// and no Z change.
    pub fn can_start(command: &ParsedCommand, snapshot: &PositionSnapshot) -> bool {
        command.is_linear_move()
            && snapshot.xy_length() > 0.0
            && !snapshot.modal.is_relative
            && snapshot.modal.is_metric()
            && snapshot.previous.same_z(&snapshot.position, Z_TOLERANCE)
    }

    /// Open a candidate with the command's start as anchor
    pub fn start(command: &ParsedCommand, snapshot: &PositionSnapshot) -> Self {
        Self {
            points: vec![snapshot.previous, snapshot.position],
            extrusion: snapshot.e_relative,
            feedrate: snapshot.f,
            is_extruder_relative: snapshot.modal.is_extruder_relative,
            is_rapid: command.command == "G0",
            class: ExtrusionClass::of(snapshot),
            geometry: None,
        }
    }

    /// Whether a command shares the move word, extrusion mode, feed rate,
    /// extrusion class and layer with this candidate
    pub fn is_compatible(&self, command: &ParsedCommand, snapshot: &PositionSnapshot) -> bool {
        self.is_rapid == (command.command == "G0")
            && self.is_extruder_relative == snapshot.modal.is_extruder_relative
            && (self.feedrate - snapshot.f).abs() < FEEDRATE_TOLERANCE
            && self.class == ExtrusionClass::of(snapshot)
            && self
                .points
                .last()
                .is_some_and(|p| p.same_z(&snapshot.position, Z_TOLERANCE))
    }

    /// Try to extend the candidate with the command's end point
    ///
    /// Returns false, leaving the candidate untouched, when the oracle
    /// rejects the extended point sequence. A sequence that is still a
    /// straight run is kept without geometry, so it is written verbatim
    /// unless later points bend it into an arc.
    pub fn try_add(
        &mut self,
        snapshot: &PositionSnapshot,
        oracle: &dyn GeometryOracle,
        tolerance: &FitTolerance,
    ) -> bool {
        self.points.push(snapshot.position);
        if self.points.len() >= 3 {
            match oracle.fit(&self.points, tolerance) {
                FitOutcome::Arc(geometry) => self.geometry = Some(geometry),
                FitOutcome::Straight => self.geometry = None,
                FitOutcome::NoFit => {
                    self.points.pop();
                    return false;
                }
            }
        }
        self.extrusion += snapshot.e_relative;
        true
    }

    /// Number of points including the anchor
    pub fn point_count(&self) -> usize {
        self.points.len()
    }

    /// Accumulated points
    pub fn points(&self) -> &[Position] {
        &self.points
    }

    /// Fitted arc, absent until three points bend away from a straight line
    pub fn geometry(&self) -> Option<&ArcGeometry> {
        self.geometry.as_ref()
    }

    /// Summed extrusion delta of the consumed commands
    pub fn extrusion(&self) -> f64 {
        self.extrusion
    }

    /// Feed rate shared by the consumed commands
    pub fn feedrate(&self) -> f64 {
        self.feedrate
    }

    /// Extruder mode shared by the consumed commands
    pub fn is_extruder_relative(&self) -> bool {
        self.is_extruder_relative
    }

    /// Whether the consumed commands are G0 rapids
    pub fn is_rapid(&self) -> bool {
        self.is_rapid
    }

    /// Extrusion class shared by the consumed commands
    pub fn class(&self) -> ExtrusionClass {
        self.class
    }
}
