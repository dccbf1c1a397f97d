//! Shared line-tokenizing helpers for ODB++'s `KEY=value;` and whitespace
//! tagged-record stanzas (§4.4-§4.9). Every per-file parser in this crate
//! reduces to: split into logical lines, classify the first token, dispatch.

/// Parse a float, tolerating ODB++'s occasional leading `+` and trailing
/// garbage a malformed record can introduce. Returns `None` rather than
/// erroring; callers log and substitute a default (§7 tolerated classes).
pub fn parse_float(s: &str) -> Option<f64> {
    s.trim().trim_start_matches('+').parse::<f64>().ok()
}

pub fn parse_int(s: &str) -> Option<i64> {
    s.trim().trim_start_matches('+').parse::<i64>().ok()
}

/// Split a record line into whitespace-separated fields, ignoring a
/// trailing `;` terminator some ODB++ exporters emit.
pub fn fields(line: &str) -> Vec<&str> {
    line.trim()
        .trim_end_matches(';')
        .split_whitespace()
        .collect()
}

/// Parse a `KEY=value` line (as found in `misc/info`, `matrix/matrix`
/// `LAYER{...}` stanzas, and `CMP`/`PKG` property lines) into its two halves.
pub fn key_value(line: &str) -> Option<(&str, &str)> {
    let line = line.trim();
    let eq = line.find('=')?;
    Some((&line[..eq], &line[eq + 1..]))
}

/// Iterate non-empty, non-comment (`#`) logical lines of a record file.
pub fn record_lines(content: &str) -> impl Iterator<Item = &str> {
    content.lines().filter(|l| {
        let t = l.trim();
        !t.is_empty() && !t.starts_with('#')
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_float_basic() {
        assert_eq!(parse_float("1.5"), Some(1.5));
        assert_eq!(parse_float("+2.0"), Some(2.0));
        assert_eq!(parse_float("-3"), Some(-3.0));
        assert_eq!(parse_float("abc"), None);
    }

    #[test]
    fn parse_int_basic() {
        assert_eq!(parse_int("42"), Some(42));
        assert_eq!(parse_int("+7"), Some(7));
        assert_eq!(parse_int("x"), None);
    }

    #[test]
    fn fields_splits_and_trims_terminator() {
        assert_eq!(fields("OB 1.0 2.0 ;"), vec!["OB", "1.0", "2.0"]);
    }

    #[test]
    fn key_value_splits_on_first_equals() {
        assert_eq!(key_value("UNITS=MM"), Some(("UNITS", "MM")));
        assert_eq!(key_value("A=B=C"), Some(("A", "B=C")));
        assert_eq!(key_value("no-equals"), None);
    }

    #[test]
    fn record_lines_skips_blank_and_comments() {
        let content = "# header\n\nOB 1 2\n# trailer\nOS 3 4\n";
        let lines: Vec<&str> = record_lines(content).collect();
        assert_eq!(lines, vec!["OB 1 2", "OS 3 4"]);
    }
}
