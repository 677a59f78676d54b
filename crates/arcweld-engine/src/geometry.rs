//! Circle fitting for candidate arcs
//!
//! The oracle classifies a sequence of XY points as a straight run, a single
//! circular arc within tolerance, or neither. For an arc the returned
//! [`ArcGeometry`] carries everything needed to emit the G2/G3 command.

use arcweld_core::Position;
use arcweld_settings::WelderConfig;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Sine of the angle at the first point below which three points count as collinear
const COLLINEAR_SINE: f64 = 1e-9;

/// Angular steps smaller than this are treated as zero when checking monotonicity
const ANGLE_EPSILON: f64 = 1e-12;

/// Direction of an arc (clockwise or counter-clockwise)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ArcDirection {
    /// Clockwise arc (G2)
    Clockwise,
    /// Counter-clockwise arc (G3)
    CounterClockwise,
}

impl ArcDirection {
    /// Returns the G-code command for this direction
    pub fn gcode_command(&self) -> &'static str {
        match self {
            ArcDirection::Clockwise => "G2",
            ArcDirection::CounterClockwise => "G3",
        }
    }
}

/// Tolerances a fitted arc must satisfy
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FitTolerance {
    /// Maximum distance between any input point and the arc, in mm
    pub resolution_mm: f64,
    /// Minimum arc radius, in mm
    pub min_radius_mm: f64,
    /// Maximum arc radius, in mm
    pub max_radius_mm: f64,
    /// Allowed relative difference between arc length and path length
    pub arc_length_tolerance: f64,
}

impl Default for FitTolerance {
    fn default() -> Self {
        Self::from(&WelderConfig::default())
    }
}

impl From<&WelderConfig> for FitTolerance {
    fn from(config: &WelderConfig) -> Self {
        Self {
            resolution_mm: config.resolution_mm,
            min_radius_mm: config.min_radius_mm,
            max_radius_mm: config.max_radius_mm,
            arc_length_tolerance: config.arc_length_tolerance,
        }
    }
}

/// A circular arc fitted through a point sequence
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ArcGeometry {
    /// First point of the sequence
    pub start: Position,
    /// Last point of the sequence
    pub end: Position,
    /// Center X
    pub center_x: f64,
    /// Center Y
    pub center_y: f64,
    /// Radius in mm
    pub radius: f64,
    /// Arc direction
    pub direction: ArcDirection,
    /// Swept angle in radians, always positive
    pub sweep: f64,
    /// Largest distance between an input point and the circle
    pub max_deviation: f64,
}

impl ArcGeometry {
    /// Arc length in mm
    pub fn length(&self) -> f64 {
        self.radius * self.sweep
    }

    /// X offset from start to center
    pub fn i(&self) -> f64 {
        self.center_x - self.start.x
    }

    /// Y offset from start to center
    pub fn j(&self) -> f64 {
        self.center_y - self.start.y
    }
}

/// Classification of a point sequence
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FitOutcome {
    /// The points lie on one arc
    Arc(ArcGeometry),
    /// The points already follow the straight chord from first to last
    Straight,
    /// Neither a line nor an arc
    NoFit,
}

impl FitOutcome {
    /// The fitted arc, if any
    pub fn arc(self) -> Option<ArcGeometry> {
        match self {
            FitOutcome::Arc(geometry) => Some(geometry),
            FitOutcome::Straight | FitOutcome::NoFit => None,
        }
    }
}

/// Decides whether a point sequence is an arc
///
/// Implementations must only return [`FitOutcome::Arc`] for sequences whose
/// every point lies within `resolution_mm` of the returned arc, and should
/// report [`FitOutcome::Straight`] whenever the chord alone is that close.
pub trait GeometryOracle {
    /// Classify `points`
    fn fit(&self, points: &[Position], tolerance: &FitTolerance) -> FitOutcome;
}

/// Fits the circle through the first, middle and last points
///
/// The circle is exact at both endpoints, which G2/G3 require. Sequences
/// within the resolution of their chord are straight and never become arcs.
/// Otherwise the fit is rejected when:
/// - the three points are collinear or the radius is out of bounds
/// - any point is farther than the resolution from the circle
/// - the angular sweep is not monotonic or reaches a full turn
/// - the arc length differs too much from the polyline length
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreePointOracle;

impl ThreePointOracle {
    /// Create a new oracle
    pub fn new() -> Self {
        Self
    }

    /// Find the center of a circle passing through three points
    fn circle_center(p1: &Position, p2: &Position, p3: &Position) -> Option<(f64, f64)> {
        let (ax, ay) = (p1.x, p1.y);
        let (bx, by) = (p2.x, p2.y);
        let (cx, cy) = (p3.x, p3.y);

        let d = 2.0 * (ax * (by - cy) + bx * (cy - ay) + cx * (ay - by));
        let spread = p1.xy_distance_to(p2) * p1.xy_distance_to(p3);
        if spread <= 0.0 || d.abs() / (2.0 * spread) < COLLINEAR_SINE {
            return None;
        }

        let a2 = ax * ax + ay * ay;
        let b2 = bx * bx + by * by;
        let c2 = cx * cx + cy * cy;
        let ux = (a2 * (by - cy) + b2 * (cy - ay) + c2 * (ay - by)) / d;
        let uy = (a2 * (cx - bx) + b2 * (ax - cx) + c2 * (bx - ax)) / d;
        Some((ux, uy))
    }

    /// Sum of the signed turns between consecutive segments
    fn signed_turn(points: &[Position]) -> f64 {
        points
            .windows(3)
            .map(|w| {
                let (ux, uy) = (w[1].x - w[0].x, w[1].y - w[0].y);
                let (vx, vy) = (w[2].x - w[1].x, w[2].y - w[1].y);
                (ux * vy - uy * vx).atan2(ux * vx + uy * vy)
            })
            .sum()
    }

    fn polyline_length(points: &[Position]) -> f64 {
        points.windows(2).map(|w| w[0].xy_distance_to(&w[1])).sum()
    }

    /// Whether every point is within `resolution` of the chord and the
    /// points advance along it
    fn follows_chord(points: &[Position], resolution: f64) -> bool {
        let start = points[0];
        let end = points[points.len() - 1];
        let chord = start.xy_distance_to(&end);
        if chord <= 0.0 {
            return false;
        }
        let (ux, uy) = ((end.x - start.x) / chord, (end.y - start.y) / chord);

        let mut previous = f64::NEG_INFINITY;
        for point in points {
            let (dx, dy) = (point.x - start.x, point.y - start.y);
            let along = dx * ux + dy * uy;
            let across = (dx * uy - dy * ux).abs();
            if across > resolution || along <= previous {
                return false;
            }
            previous = along;
        }
        true
    }

    fn fit_arc(points: &[Position], tolerance: &FitTolerance) -> Option<ArcGeometry> {
        let start = points[0];
        let end = points[points.len() - 1];
        let (center_x, center_y) =
            Self::circle_center(&start, &points[points.len() / 2], &end)?;
        let radius = (start.x - center_x).hypot(start.y - center_y);
        if !radius.is_finite()
            || radius < tolerance.min_radius_mm
            || radius > tolerance.max_radius_mm
        {
            return None;
        }

        let mut max_deviation: f64 = 0.0;
        for point in points {
            let deviation = ((point.x - center_x).hypot(point.y - center_y) - radius).abs();
            if deviation > tolerance.resolution_mm {
                return None;
            }
            max_deviation = max_deviation.max(deviation);
        }

        let turn = Self::signed_turn(points);
        let direction = if turn > 0.0 {
            ArcDirection::CounterClockwise
        } else {
            ArcDirection::Clockwise
        };
        let sign = if direction == ArcDirection::CounterClockwise {
            1.0
        } else {
            -1.0
        };

        // Every step must advance the same way around the center
        let mut sweep = 0.0;
        let mut previous_angle = (start.y - center_y).atan2(start.x - center_x);
        for point in &points[1..] {
            let angle = (point.y - center_y).atan2(point.x - center_x);
            let mut step = angle - previous_angle;
            if step > PI {
                step -= 2.0 * PI;
            } else if step <= -PI {
                step += 2.0 * PI;
            }
            step *= sign;
            if step <= ANGLE_EPSILON {
                return None;
            }
            sweep += step;
            previous_angle = angle;
        }
        if sweep >= 2.0 * PI {
            return None;
        }

        let polyline_length = Self::polyline_length(points);
        if polyline_length <= 0.0 {
            return None;
        }
        let arc_length = radius * sweep;
        if (arc_length - polyline_length).abs() / polyline_length
            >= tolerance.arc_length_tolerance
        {
            return None;
        }

        Some(ArcGeometry {
            start,
            end,
            center_x,
            center_y,
            radius,
            direction,
            sweep,
            max_deviation,
        })
    }
}

impl GeometryOracle for ThreePointOracle {
    fn fit(&self, points: &[Position], tolerance: &FitTolerance) -> FitOutcome {
        if points.len() < 3 {
            return FitOutcome::NoFit;
        }
        if Self::follows_chord(points, tolerance.resolution_mm) {
            return FitOutcome::Straight;
        }
        match Self::fit_arc(points, tolerance) {
            Some(geometry) => FitOutcome::Arc(geometry),
            None => FitOutcome::NoFit,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn arc_points(radius: f64, from_deg: f64, to_deg: f64, count: usize) -> Vec<Position> {
        (0..count)
            .map(|i| {
                let t = from_deg + (to_deg - from_deg) * i as f64 / (count - 1) as f64;
                let a = t.to_radians();
                Position::new(radius * a.cos(), radius * a.sin(), 0.2)
            })
            .collect()
    }

    fn tolerance(resolution_mm: f64) -> FitTolerance {
        FitTolerance {
            resolution_mm,
            ..FitTolerance::default()
        }
    }

    fn fit(points: &[Position], tolerance: &FitTolerance) -> FitOutcome {
        ThreePointOracle::new().fit(points, tolerance)
    }

    #[test]
    fn test_quarter_circle_counter_clockwise() {
        let points = arc_points(10.0, 0.0, 90.0, 8);
        let arc = fit(&points, &tolerance(0.01)).arc().unwrap();

        assert_eq!(arc.direction, ArcDirection::CounterClockwise);
        assert!((arc.radius - 10.0).abs() < 1e-9);
        assert!(arc.center_x.abs() < 1e-9 && arc.center_y.abs() < 1e-9);
        assert!((arc.sweep - PI / 2.0).abs() < 1e-9);
        assert!((arc.length() - 5.0 * PI).abs() < 1e-9);
        assert!((arc.i() + 10.0).abs() < 1e-9);
        assert!(arc.j().abs() < 1e-9);
    }

    #[test]
    fn test_clockwise_direction() {
        let points = arc_points(5.0, 90.0, 0.0, 6);
        let arc = fit(&points, &tolerance(0.01)).arc().unwrap();
        assert_eq!(arc.direction, ArcDirection::Clockwise);
        assert_eq!(arc.direction.gcode_command(), "G2");
    }

    #[test]
    fn test_collinear_points_are_straight() {
        let points: Vec<Position> = (0..10)
            .map(|i| Position::new(i as f64 * 0.1, 0.0, 0.2))
            .collect();
        assert_eq!(fit(&points, &tolerance(0.05)), FitOutcome::Straight);
    }

    #[test]
    fn test_rounded_diagonal_is_straight() {
        // A 30 degree line printed with 3 decimals wobbles by up to 0.0005 mm
        let (dx, dy) = (30f64.to_radians().cos(), 30f64.to_radians().sin());
        let points: Vec<Position> = (0..12)
            .map(|i| {
                let t = 1.0 + i as f64 * 0.737;
                let x = (t * dx * 1000.0).round() / 1000.0;
                let y = (t * dy * 1000.0).round() / 1000.0;
                Position::new(x, y, 0.2)
            })
            .collect();
        assert_eq!(fit(&points, &tolerance(0.05)), FitOutcome::Straight);
        assert_eq!(fit(&points[..3], &tolerance(0.05)), FitOutcome::Straight);
    }

    #[test]
    fn test_line_that_doubles_back_is_not_straight() {
        let points = vec![
            Position::new(0.0, 0.0, 0.2),
            Position::new(2.0, 0.0, 0.2),
            Position::new(1.0, 0.0, 0.2),
            Position::new(3.0, 0.0, 0.2),
        ];
        assert_eq!(fit(&points, &tolerance(0.05)), FitOutcome::NoFit);
    }

    #[test]
    fn test_deviation_beyond_resolution_rejected() {
        let mut points = arc_points(10.0, 0.0, 90.0, 9);
        points[2].x += 0.2;
        assert_eq!(fit(&points, &tolerance(0.05)), FitOutcome::NoFit);
    }

    #[test]
    fn test_max_radius_rejected() {
        let points = arc_points(100.0, 0.0, 10.0, 5);
        let strict = FitTolerance {
            resolution_mm: 0.05,
            min_radius_mm: 0.05,
            max_radius_mm: 50.0,
            arc_length_tolerance: 0.05,
        };
        assert_eq!(fit(&points, &strict), FitOutcome::NoFit);
        assert!(fit(&points, &tolerance(0.05)).arc().is_some());
    }

    #[test]
    fn test_min_radius_rejected() {
        let points = arc_points(0.5, 0.0, 180.0, 7);
        let tight = FitTolerance {
            min_radius_mm: 1.0,
            ..tolerance(0.01)
        };
        assert_eq!(fit(&points, &tight), FitOutcome::NoFit);
        assert!(fit(&points, &tolerance(0.01)).arc().is_some());
    }

    #[test]
    fn test_zigzag_rejected() {
        // All on one circle, but the path doubles back
        let mut points = arc_points(10.0, 0.0, 60.0, 4);
        points.swap(1, 2);
        assert_eq!(fit(&points, &tolerance(0.05)), FitOutcome::NoFit);
    }

    #[test]
    fn test_fewer_than_three_points() {
        let points = arc_points(10.0, 0.0, 90.0, 2);
        assert_eq!(fit(&points, &tolerance(0.05)), FitOutcome::NoFit);
    }
}
