//! Text of the commands the welder writes

use crate::extruder::{ArcEmission, E_PRECISION};
use crate::geometry::ArcGeometry;

/// Decimal places for X/Y words
const XY_PRECISION: usize = 3;

/// Decimal places for I/J words
const IJ_PRECISION: usize = 5;

/// Fixed-point formatting that never prints a negative zero
pub fn format_fixed(value: f64, precision: usize) -> String {
    let text = format!("{:.*}", precision, value);
    match text.strip_prefix('-') {
        Some(rest) if rest.chars().all(|c| c == '0' || c == '.') => rest.to_string(),
        _ => text,
    }
}

/// Feed rate without trailing zeros (`1200`, `1234.5`)
pub fn format_feedrate(value: f64) -> String {
    let text = format_fixed(value, 3);
    text.trim_end_matches('0').trim_end_matches('.').to_string()
}

/// Distinct non-empty comments in source order, joined for a single line
pub fn span_comment<'a>(comments: impl IntoIterator<Item = &'a str>) -> Option<String> {
    let mut distinct: Vec<&str> = Vec::new();
    for comment in comments {
        if !comment.is_empty() && !distinct.contains(&comment) {
            distinct.push(comment);
        }
    }
    (!distinct.is_empty()).then(|| distinct.join(" - "))
}

/// `G2`/`G3` line replacing a span
pub fn arc_command(
    geometry: &ArcGeometry,
    emission: &ArcEmission,
    comment: Option<&str>,
) -> String {
    let mut line = format!(
        "{} X{} Y{} I{} J{}",
        geometry.direction.gcode_command(),
        format_fixed(geometry.end.x, XY_PRECISION),
        format_fixed(geometry.end.y, XY_PRECISION),
        format_fixed(geometry.i(), IJ_PRECISION),
        format_fixed(geometry.j(), IJ_PRECISION),
    );
    if let Some(e) = emission.e {
        line.push_str(&format!(" E{}", format_fixed(e, E_PRECISION)));
    }
    if let Some(f) = emission.f {
        line.push_str(&format!(" F{}", format_feedrate(f)));
    }
    if let Some(comment) = comment {
        line.push_str(" ; ");
        line.push_str(comment);
    }
    line
}

/// `G92 E` line resynchronizing the extruder
pub fn reset_e_command(e: f64) -> String {
    format!("G92 E{}", format_fixed(e, E_PRECISION))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::ArcDirection;
    use arcweld_core::Position;

    #[test]
    fn test_format_fixed() {
        assert_eq!(format_fixed(1.23456789, 3), "1.235");
        assert_eq!(format_fixed(-0.0001, 3), "0.000");
        assert_eq!(format_fixed(-0.5, 1), "-0.5");
    }

    #[test]
    fn test_format_feedrate() {
        assert_eq!(format_feedrate(1200.0), "1200");
        assert_eq!(format_feedrate(1234.5), "1234.5");
        assert_eq!(format_feedrate(0.125), "0.125");
    }

    #[test]
    fn test_arc_command() {
        let geometry = ArcGeometry {
            start: Position::new(10.0, 0.0, 0.2),
            end: Position::new(0.0, 10.0, 0.2),
            center_x: 0.0,
            center_y: 0.0,
            radius: 10.0,
            direction: ArcDirection::CounterClockwise,
            sweep: std::f64::consts::FRAC_PI_2,
            max_deviation: 0.0,
        };
        let emission = ArcEmission {
            e: Some(1.2345678),
            f: Some(1800.0),
            reset_e: None,
        };
        assert_eq!(
            arc_command(&geometry, &emission, None),
            "G3 X0.000 Y10.000 I-10.00000 J0.00000 E1.234568 F1800"
        );
        assert_eq!(
            arc_command(&geometry, &emission, Some("perimeter")),
            "G3 X0.000 Y10.000 I-10.00000 J0.00000 E1.234568 F1800 ; perimeter"
        );
        assert_eq!(reset_e_command(2.5), "G92 E2.500000");
    }

    #[test]
    fn test_span_comment() {
        assert_eq!(span_comment(["", ""]), None);
        assert_eq!(
            span_comment(["perimeter", "perimeter", "", "infill", "perimeter"]).as_deref(),
            Some("perimeter - infill")
        );
    }
}
