//! Machine position and unit types

use serde::{Deserialize, Serialize};

/// Length units selected by G20/G21
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Units {
    /// Millimeters (G21)
    #[default]
    MM,
    /// Inches (G20)
    INCH,
}

impl std::fmt::Display for Units {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MM => write!(f, "mm"),
            Self::INCH => write!(f, "in"),
        }
    }
}

/// Position in 3D space, expressed in the coordinate frame of the G-code file
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    /// X-axis position
    pub x: f64,
    /// Y-axis position
    pub y: f64,
    /// Z-axis position
    pub z: f64,
}

impl Position {
    /// Create a new position with X, Y, Z coordinates
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Calculate distance to another position (XYZ)
    pub fn distance_to(&self, other: &Position) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        let dz = self.z - other.z;
        (dx * dx + dy * dy + dz * dz).sqrt()
    }

    /// Calculate distance to another position projected on the XY plane
    pub fn xy_distance_to(&self, other: &Position) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }

    /// Whether two positions share the same Z height within `tolerance`
    pub fn same_z(&self, other: &Position, tolerance: f64) -> bool {
        (self.z - other.z).abs() <= tolerance
    }
}

impl std::fmt::Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "X{:.3} Y{:.3} Z{:.3}", self.x, self.y, self.z)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_units_display() {
        assert_eq!(Units::default(), Units::MM);
        assert_eq!(Units::INCH.to_string(), "in");
    }

    #[test]
    fn test_position_distances() {
        let a = Position::new(0.0, 0.0, 0.0);
        let b = Position::new(3.0, 4.0, 12.0);
        assert!((a.distance_to(&b) - 13.0).abs() < 1e-12);
        assert!((a.xy_distance_to(&b) - 5.0).abs() < 1e-12);
        assert!(!a.same_z(&b, 1e-6));
    }

    #[test]
    fn test_position_serde() {
        let pos = Position::new(1.5, -2.0, 0.2);
        let json = serde_json::to_string(&pos).unwrap();
        let back: Position = serde_json::from_str(&json).unwrap();
        assert_eq!(pos, back);
    }
}
