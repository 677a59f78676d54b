//! Extrusion and feed rate bookkeeping for the output stream
//!
//! The target file must leave the extruder exactly where the source would.
//! In absolute mode the E values written on arcs are computed, so an
//! emitted counter is kept alongside the true source E and resynchronized
//! with `G92 E` once they drift apart. In relative mode the rounding
//! remainder of each arc is carried into the next one.

use arcweld_gcode::PositionSnapshot;

/// Largest tolerated difference between emitted and true absolute E
pub const E_DRIFT_TOLERANCE: f64 = 0.000001;

/// Decimal places used for E words
pub const E_PRECISION: usize = 6;

/// Extrusion parameters of a closed arc span
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ArcExtrusion {
    /// Summed extrusion delta of the consumed commands
    pub delta: f64,
    /// True absolute E after the last consumed command
    pub end_e: f64,
    /// Feed rate of the consumed commands
    pub feedrate: f64,
    /// Extruder mode of the consumed commands
    pub is_relative: bool,
}

/// Words to write for one arc
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ArcEmission {
    /// E word, `None` for travel arcs
    pub e: Option<f64>,
    /// F word, `None` when the feed rate is already in force
    pub f: Option<f64>,
    /// Value for a `G92 E` reset to write after the arc
    pub reset_e: Option<f64>,
}

/// Extruder and feed state of the run
#[derive(Debug, Clone, Default)]
pub struct ExtruderState {
    is_relative: bool,
    absolute_e: f64,
    emitted_e: f64,
    emitted_f: Option<f64>,
    relative_residual: f64,
    commands_observed: u64,
}

fn round_to(value: f64, precision: usize) -> f64 {
    let scale = 10f64.powi(precision as i32);
    (value * scale).round() / scale
}

impl ExtruderState {
    /// Create the state for a fresh run
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the resolved state of a processed command
    ///
    /// Called once per interpreted command, whether it ends up buffered,
    /// welded or written verbatim.
    pub fn observe(&mut self, snapshot: &PositionSnapshot) {
        let is_relative = snapshot.modal.is_extruder_relative;
        if is_relative != self.is_relative {
            tracing::debug!(
                "Extruder switched to {} mode",
                if is_relative { "relative" } else { "absolute" }
            );
        }
        self.is_relative = is_relative;
        self.absolute_e = snapshot.e;
        self.commands_observed += 1;
    }

    /// Whether the extruder is currently in relative mode
    pub fn is_relative(&self) -> bool {
        self.is_relative
    }

    /// True absolute E of the last observed command
    pub fn absolute_e(&self) -> f64 {
        self.absolute_e
    }

    /// Counter of E as written to the target
    pub fn emitted_e(&self) -> f64 {
        self.emitted_e
    }

    /// Feed rate in force in the target, if any was written
    pub fn emitted_f(&self) -> Option<f64> {
        self.emitted_f
    }

    /// Number of commands passed to [`observe`](Self::observe)
    pub fn commands_observed(&self) -> u64 {
        self.commands_observed
    }

    /// Account for a command copied unchanged to the target
    pub fn record_verbatim(&mut self, snapshot: &PositionSnapshot) {
        self.emitted_e = snapshot.e;
        if snapshot.f > 0.0 {
            self.emitted_f = Some(snapshot.f);
        }
    }

    /// Compute the E and F words for an arc and update the emitted state
    pub fn emit_arc(&mut self, extrusion: &ArcExtrusion) -> ArcEmission {
        let f = match self.emitted_f {
            Some(current) if (current - extrusion.feedrate).abs() < 1e-9 => None,
            _ if extrusion.feedrate > 0.0 => Some(extrusion.feedrate),
            _ => None,
        };
        if f.is_some() {
            self.emitted_f = f;
        }

        if extrusion.is_relative {
            let mut e = None;
            if extrusion.delta != 0.0 {
                let target = extrusion.delta + self.relative_residual;
                let value = round_to(target, E_PRECISION);
                self.relative_residual = target - value;
                e = Some(value);
            }
            self.emitted_e = extrusion.end_e;
            return ArcEmission {
                e,
                f,
                reset_e: None,
            };
        }

        let mut e = None;
        if extrusion.delta != 0.0 {
            let value = round_to(self.emitted_e + extrusion.delta, E_PRECISION);
            self.emitted_e = value;
            e = Some(value);
        }

        let mut reset_e = None;
        if (self.emitted_e - extrusion.end_e).abs() > E_DRIFT_TOLERANCE {
            let value = round_to(extrusion.end_e, E_PRECISION);
            tracing::warn!(
                "Extruder drift {:.7} exceeds tolerance, resetting E to {:.6}",
                self.emitted_e - extrusion.end_e,
                value
            );
            self.emitted_e = value;
            reset_e = Some(value);
        }

        ArcEmission { e, f, reset_e }
    }
}
