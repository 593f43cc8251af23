//! Line protocol spoken to the display: `"<cpu>,<gpu>\n"`, one decimal each.

use crate::providers::Celsius;

pub fn format_record(cpu: Celsius, gpu: Celsius) -> String {
    format!("{:.1},{:.1}\n", cpu, gpu)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn one_decimal_per_field() {
        assert_eq!(format_record(42.34, 55.71), "42.3,55.7\n");
        assert_eq!(format_record(40.0, 61.0), "40.0,61.0\n");
        assert_eq!(format_record(100.26, 9.04), "100.3,9.0\n");
    }

    #[test]
    fn record_is_single_ascii_line() {
        let line = format_record(38.5, 71.25);
        assert!(line.is_ascii());
        assert_eq!(line.matches('\n').count(), 1);
        assert!(line.ends_with('\n'));
        assert_eq!(line.trim_end().split(',').count(), 2);
    }
}
