//! Unit conversion for ODB++ dimensions.
//!
//! All dimensions stored on `PcbModel` are millimetres. ODB++ sources are
//! typically MM, INCH, or MIL (thousandths of an inch); everything is
//! converted to mm once, at parse time.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Unit {
    Mm,
    Inch,
    Mil,
}

impl Unit {
    /// Parse a `misc/info` `UNITS=` value. Unrecognized strings default to mm.
    pub fn parse(s: &str) -> Self {
        match s.trim().to_uppercase().as_str() {
            "INCH" | "IN" => Unit::Inch,
            "MIL" | "MILS" | "TH" => Unit::Mil,
            _ => Unit::Mm,
        }
    }
}

/// Convert `value` from `unit` to millimetres.
pub fn to_mm(value: f64, unit: Unit) -> f64 {
    match unit {
        Unit::Mm => value,
        Unit::Inch => value * 25.4,
        Unit::Mil => value * 0.0254,
    }
}

/// ODB++ symbol names always encode their dimensions in mils.
pub fn mils_to_mm(value: f64) -> f64 {
    to_mm(value, Unit::Mil)
}

/// ODB++ is Y-up; editors (and this model) are Y-down.
pub fn negate_y(y: f64) -> f64 {
    -y
}

/// Format a float the way the downstream JSON expects: fixed at 6 fractional
/// digits, then trailing zeros (and a dangling decimal point) stripped.
pub fn format_number(value: f64) -> f64 {
    let s = format!("{value:.6}");
    let s = s.trim_end_matches('0').trim_end_matches('.');
    s.parse().unwrap_or(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mm_is_identity() {
        assert_eq!(to_mm(10.0, Unit::Mm), 10.0);
    }

    #[test]
    fn inch_to_mm() {
        assert!((to_mm(1.0, Unit::Inch) - 25.4).abs() < 1e-9);
    }

    #[test]
    fn mil_to_mm() {
        assert!((to_mm(1000.0, Unit::Mil) - 25.4).abs() < 1e-9);
        assert!((to_mm(100.0, Unit::Mil) - 2.54).abs() < 1e-9);
    }

    #[test]
    fn unknown_unit_string_defaults_to_mm() {
        assert_eq!(Unit::parse("furlongs"), Unit::Mm);
    }

    #[test]
    fn idempotence_of_mm() {
        // to_mm(to_mm(x, mil), mm) == to_mm(x, mil)
        let once = to_mm(100.0, Unit::Mil);
        let twice = to_mm(once, Unit::Mm);
        assert_eq!(once, twice);
    }

    #[test]
    fn negate_y_is_involution() {
        assert_eq!(negate_y(negate_y(3.5)), 3.5);
        assert_eq!(negate_y(0.0), 0.0);
    }

    #[test]
    fn format_number_strips_trailing_zeros() {
        assert_eq!(format_number(1.0), 1.0);
        assert_eq!(format_number(1.5), 1.5);
        assert_eq!(format_number(0.0), 0.0);
        assert_eq!(format_number(1.123456789), 1.123457);
    }
}
