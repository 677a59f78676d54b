//! Fixed-column rendering of segment statistics
//!
//! ```text
//!    Min          Max     Source  Target   Change
//! -----------------------------------------------
//!   0.000mm to   0.002mm       0       0     0.0%
//! ```

use std::fmt;

use crate::statistics::SegmentStatistics;

const MIN_COLUMN_SIZE: usize = 8;
const LABEL_COLUMN_SIZE: usize = 4;
const PERCENT_COLUMN_SIZE: usize = 9;
const TOTALS_LABEL_SIZE: usize = 22;
const MAX_PRECISION: usize = 6;

/// Percent change between two counts, one decimal place
///
/// `INF` when growing from zero, `0.0%` when both are zero.
pub fn percent_change(source: u64, target: u64) -> String {
    if source == 0 {
        if target > 0 {
            return "INF".to_string();
        }
        return "0.0%".to_string();
    }
    let change = (target as f64 - source as f64) / source as f64 * 100.0;
    format!("{:.1}%", change)
}

/// Digits needed to print the decimal part of `value` exactly
fn precision_of(value: f64) -> usize {
    (0..=MAX_PRECISION)
        .find(|&p| {
            let scaled = value * 10f64.powi(p as i32);
            (scaled - scaled.round()).abs() < 1e-6
        })
        .unwrap_or(MAX_PRECISION)
}

fn center(text: &str, width: usize) -> String {
    let padding = width.saturating_sub(text.len());
    let left = padding / 2;
    format!("{}{}{}", " ".repeat(left), text, " ".repeat(padding - left))
}

/// Table view over [`SegmentStatistics`]
pub struct StatisticsTable<'a> {
    statistics: &'a SegmentStatistics,
}

impl<'a> StatisticsTable<'a> {
    /// Wrap statistics for display
    pub fn new(statistics: &'a SegmentStatistics) -> Self {
        Self { statistics }
    }

    fn bounds(&self) -> impl Iterator<Item = f64> + '_ {
        self.statistics
            .buckets
            .iter()
            .flat_map(|b| std::iter::once(b.min_mm).chain(b.max_mm))
    }

    fn mm_precision(&self) -> usize {
        self.bounds().map(precision_of).max().unwrap_or(0)
    }

    fn mm_column_size(&self, precision: usize) -> usize {
        let max_width = self
            .bounds()
            .map(|v| format!("{:.0}", v.trunc()).len())
            .max()
            .unwrap_or(1);
        // Two characters for the "mm" suffix, one for the decimal point
        let mut size = max_width + precision + 2;
        if precision > 0 {
            size += 1;
        }
        size.max(MIN_COLUMN_SIZE)
    }

    fn count_column_size(&self) -> usize {
        let max_count = self
            .statistics
            .buckets
            .iter()
            .map(|b| b.source_count.max(b.target_count))
            .max()
            .unwrap_or(0);
        max_count.to_string().len().max(MIN_COLUMN_SIZE)
    }

    fn write_total(
        f: &mut fmt::Formatter<'_>,
        label: &str,
        value: &str,
        width: usize,
    ) -> fmt::Result {
        let fill = width.saturating_sub(TOTALS_LABEL_SIZE);
        write!(
            f,
            "{:>label_w$}{:.>fill$}",
            label,
            value,
            label_w = TOTALS_LABEL_SIZE,
            fill = fill
        )
    }
}

impl fmt::Display for StatisticsTable<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let stats = self.statistics;
        let precision = self.mm_precision();
        let mm = self.mm_column_size(precision);
        let count = self.count_column_size();
        let width = mm + LABEL_COLUMN_SIZE + mm + count + count + PERCENT_COLUMN_SIZE;

        write!(f, "{}", center("Min", mm))?;
        write!(f, "{:w$}", "", w = LABEL_COLUMN_SIZE)?;
        write!(f, "{}", center("Max", mm))?;
        writeln!(
            f,
            "{:>c$}{:>c$}{:>p$}",
            "Source",
            "Target",
            "Change",
            c = count,
            p = PERCENT_COLUMN_SIZE
        )?;
        writeln!(f, "{}", "-".repeat(width))?;

        let last = stats.buckets.len().saturating_sub(1);
        for (index, bucket) in stats.buckets.iter().enumerate() {
            let min_mm = format!("{:.p$}mm", bucket.min_mm, p = precision);
            match bucket.max_mm {
                Some(max) if index != last => {
                    let max_mm = format!("{:.p$}mm", max, p = precision);
                    write!(
                        f,
                        "{:>mm$}{:>l$}{:>mm$}",
                        min_mm,
                        " to ",
                        max_mm,
                        l = LABEL_COLUMN_SIZE
                    )?;
                }
                _ => {
                    write!(
                        f,
                        "{:>mm$}{:>l$}{:>mm$}",
                        "",
                        " >= ",
                        min_mm,
                        l = LABEL_COLUMN_SIZE
                    )?;
                }
            }
            writeln!(
                f,
                "{:>c$}{:>c$}{:>p$}",
                bucket.source_count,
                bucket.target_count,
                percent_change(bucket.source_count, bucket.target_count),
                c = count,
                p = PERCENT_COLUMN_SIZE
            )?;
        }

        writeln!(f, "{}", "-".repeat(width))?;

        if (stats.total_length_source - stats.total_length_target).abs() < 0.001 {
            let total = format!("{:.p$}mm", stats.total_length_source, p = precision);
            Self::write_total(f, "Total distance:", &total, width)?;
            writeln!(f)?;
        } else {
            let source = format!("{:.p$}mm", stats.total_length_source, p = precision);
            let target = format!("{:.p$}mm", stats.total_length_target, p = precision);
            Self::write_total(f, "Total distance source:", &source, width)?;
            writeln!(f)?;
            Self::write_total(f, "Total distance target:", &target, width)?;
            writeln!(f)?;
        }

        Self::write_total(
            f,
            "Total count source:",
            &stats.total_count_source.to_string(),
            width,
        )?;
        writeln!(f)?;
        Self::write_total(
            f,
            "Total count target:",
            &stats.total_count_target.to_string(),
            width,
        )?;
        writeln!(f)?;
        Self::write_total(
            f,
            "Total percent change:",
            &percent_change(stats.total_count_source, stats.total_count_target),
            width,
        )
    }
}

impl fmt::Display for SegmentStatistics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&StatisticsTable::new(self), f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_percent_change() {
        assert_eq!(percent_change(0, 0), "0.0%");
        assert_eq!(percent_change(0, 5), "INF");
        assert_eq!(percent_change(10, 5), "-50.0%");
        assert_eq!(percent_change(4, 5), "25.0%");
        assert_eq!(percent_change(3, 3), "0.0%");
    }

    #[test]
    fn test_precision_of() {
        assert_eq!(precision_of(0.002), 3);
        assert_eq!(precision_of(0.5), 1);
        assert_eq!(precision_of(100.0), 0);
    }

    #[test]
    fn test_center() {
        assert_eq!(center("Min", 9), "   Min   ");
        assert_eq!(center("Max", 8), "  Max   ");
    }

    #[test]
    fn test_table_layout() {
        let mut stats = SegmentStatistics::new();
        stats.update(0.75, true);
        stats.update(0.75, true);
        stats.update(1.5, false);

        let table = stats.to_string();
        let lines: Vec<&str> = table.lines().collect();
        // mm columns are 9 wide, counts 8, change 9
        let width = 9 + 4 + 9 + 8 + 8 + 9;

        assert_eq!(
            lines[0],
            format!(
                "{}{}{}{:>8}{:>8}{:>9}",
                "   Min   ", "    ", "   Max   ", "Source", "Target", "Change"
            )
        );
        assert_eq!(lines[1], "-".repeat(width));
        assert_eq!(lines[2], format!("  0.000mm to   0.002mm{:>8}{:>8}{:>9}", 0, 0, "0.0%"));
        assert_eq!(lines[8], format!("  0.500mm to   1.000mm{:>8}{:>8}{:>9}", 2, 0, "-100.0%"));
        assert_eq!(lines[9], format!("  1.000mm to   5.000mm{:>8}{:>8}{:>9}", 0, 1, "INF"));
        assert_eq!(lines[14], format!("{:9} >= 100.000mm{:>8}{:>8}{:>9}", "", 0, 0, "0.0%"));
        assert_eq!(lines[15], "-".repeat(width));
        assert_eq!(lines[16], format!("{:>22}{:.>25}", "Total distance:", "1.500mm"));
        assert_eq!(lines[17], format!("{:>22}{:.>25}", "Total count source:", "2"));
        assert_eq!(lines[18], format!("{:>22}{:.>25}", "Total count target:", "1"));
        assert_eq!(lines[19], format!("{:>22}{:.>25}", "Total percent change:", "-50.0%"));
        assert_eq!(lines.len(), 20);
        assert!(lines.iter().all(|l| l.len() == width));
    }

    #[test]
    fn test_separate_distance_rows() {
        let mut stats = SegmentStatistics::new();
        stats.update(2.0, true);
        stats.update(3.0, false);
        let table = stats.to_string();
        assert!(table.contains("Total distance source:"));
        assert!(table.contains("Total distance target:"));
        assert!(!table.contains("Total distance:"));
    }
}
