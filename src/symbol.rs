//! ODB++ symbol name decoding (§4.3): turns names like `r100`, `rc100x50x10`
//! into `PadDef`s, with an optional custom-outline override read from a
//! symbol's own `features` file.

use crate::model::{PadDef, Point};
use crate::records::{parse_float, record_lines};
use crate::units::mils_to_mm;
use std::path::Path;

/// Decode a standard ODB++ symbol name. All numeric dimensions in symbol
/// names are mils regardless of the job's declared units.
///
/// Recognized forms, in order:
///   r<d>            round, diameter d
///   s<d>            square, side d
///   rect<w>x<h>     rectangle
///   oval<w>x<h>     oval
///   rc[r]?<w>x<h>x[r]?<c>  rounded rectangle, corner radius c
///   donut_r<od>x<id>       annular ring (outer diameter only, id ignored)
///   th[r]?<d>       thermal relief, treated as a circle
///   <name><d>       fallback: first numeric run found anywhere in the name
///
/// A name with no decodable dimension becomes a 1mm custom placeholder,
/// which the caller may replace via `decode_symbol_features` if a sibling
/// `features` file exists.
pub fn decode_symbol_name(name: &str) -> PadDef {
    let lower = name.to_ascii_lowercase();

    if let Some(rest) = lower.strip_prefix('r') {
        if let Some(d) = parse_dim(rest) {
            return PadDef::circle(mils_to_mm(d));
        }
    }
    if let Some(rest) = lower.strip_prefix('s') {
        if let Some(d) = parse_dim(rest) {
            let mm = mils_to_mm(d);
            return PadDef::rect(mm, mm);
        }
    }
    if let Some(rest) = lower.strip_prefix("rect") {
        if let Some((w, h)) = parse_dim_pair(rest) {
            return PadDef::rect(mils_to_mm(w), mils_to_mm(h));
        }
    }
    if let Some(rest) = lower.strip_prefix("oval") {
        if let Some((w, h)) = parse_dim_pair(rest) {
            return PadDef::oval(mils_to_mm(w), mils_to_mm(h));
        }
    }
    if let Some(rest) = lower.strip_prefix("rc") {
        let rest = rest.strip_prefix('r').unwrap_or(rest);
        if let Some((w, h, c)) = parse_dim_triple(rest) {
            let (w, h, c) = (mils_to_mm(w), mils_to_mm(h), mils_to_mm(c));
            let min_side = w.min(h);
            let ratio = if min_side > 0.0 { c / min_side * 2.0 } else { 0.25 };
            return PadDef::roundrect(w, h, ratio.min(0.5));
        }
    }
    if let Some(rest) = lower.strip_prefix("donut_r") {
        if let Some((od, _id)) = parse_dim_pair(rest) {
            return PadDef::circle(mils_to_mm(od));
        }
    }
    if let Some(rest) = lower.strip_prefix("th") {
        let rest = rest.strip_prefix('r').unwrap_or(rest);
        if let Some(d) = leading_dim(rest) {
            return PadDef::circle(mils_to_mm(d));
        }
    }

    if let Some(d) = first_dim_anywhere(&lower) {
        if d > 0.0 {
            return PadDef::circle(mils_to_mm(d));
        }
    }

    PadDef::custom(1.0, 1.0, Vec::new())
}

fn parse_dim(s: &str) -> Option<f64> {
    if s.is_empty() || !s.chars().all(|c| c.is_ascii_digit() || c == '.') {
        return None;
    }
    parse_float(s)
}

fn parse_dim_pair(s: &str) -> Option<(f64, f64)> {
    let (a, b) = s.split_once('x')?;
    Some((parse_dim(a)?, parse_dim(b)?))
}

fn parse_dim_triple(s: &str) -> Option<(f64, f64, f64)> {
    let mut parts = s.split('x');
    let w = parse_dim(parts.next()?)?;
    let h = parse_dim(parts.next()?)?;
    let c_raw = parts.next()?;
    let c = parse_dim(c_raw.strip_prefix('r').unwrap_or(c_raw))?;
    Some((w, h, c))
}

/// Leading numeric run at the start of `s`.
fn leading_dim(s: &str) -> Option<f64> {
    let digits: String = s
        .chars()
        .take_while(|c| c.is_ascii_digit() || *c == '.')
        .collect();
    if digits.is_empty() {
        None
    } else {
        parse_float(&digits)
    }
}

/// First numeric run anywhere in `s` (fallback for unrecognized symbol names).
fn first_dim_anywhere(s: &str) -> Option<f64> {
    let start = s.find(|c: char| c.is_ascii_digit())?;
    leading_dim(&s[start..])
}

/// Parse a symbol's `features` file for a custom polygon outline, centering
/// it on its own bounding box. Only called when the name decode above
/// falls through to `PadShape::Custom`.
pub fn decode_symbol_features(content: &str) -> Option<PadDef> {
    let mut pts: Vec<(f64, f64)> = Vec::new();
    let mut in_surface = false;

    for line in record_lines(content) {
        let upper = line.to_uppercase();
        if upper.starts_with("S P") {
            in_surface = true;
            continue;
        }
        if !in_surface {
            continue;
        }
        if upper.starts_with("SE") {
            in_surface = false;
            continue;
        }
        if let Some(rest) = upper.strip_prefix("OB ").or_else(|| upper.strip_prefix("OS ")) {
            let mut parts = rest.split_whitespace();
            if let (Some(x), Some(y)) = (parts.next().and_then(parse_float), parts.next().and_then(parse_float)) {
                pts.push((x, y));
            }
        }
    }

    if pts.is_empty() {
        return None;
    }

    let x_min = pts.iter().map(|p| p.0).fold(f64::INFINITY, f64::min);
    let x_max = pts.iter().map(|p| p.0).fold(f64::NEG_INFINITY, f64::max);
    let y_min = pts.iter().map(|p| p.1).fold(f64::INFINITY, f64::min);
    let y_max = pts.iter().map(|p| p.1).fold(f64::NEG_INFINITY, f64::max);

    let cx = (x_min + x_max) / 2.0;
    let cy = (y_min + y_max) / 2.0;
    let outline: Vec<Point> = pts.iter().map(|&(x, y)| Point::new(x - cx, y - cy)).collect();

    Some(PadDef::custom(
        (x_max - x_min).max(0.01),
        (y_max - y_min).max(0.01),
        outline,
    ))
}

/// Parse a whole `symbols/<name>/` directory: decode the name, then
/// override with `features`-file geometry if one exists and the decode
/// fell through to a custom placeholder.
pub fn load_symbol_dir(name: &str, features_path: Option<&Path>) -> PadDef {
    let decoded = decode_symbol_name(name);
    if decoded.shape != crate::model::PadShape::Custom {
        return decoded;
    }
    if let Some(path) = features_path {
        if let Ok(content) = std::fs::read_to_string(path) {
            if let Some(pd) = decode_symbol_features(&content) {
                return pd;
            }
        }
    }
    decoded
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::PadShape;

    #[test]
    fn round_pad() {
        let pd = decode_symbol_name("r100");
        assert_eq!(pd.shape, PadShape::Circle);
        assert!((pd.width - 2.54).abs() < 1e-6);
    }

    #[test]
    fn square_pad() {
        let pd = decode_symbol_name("s80");
        assert_eq!(pd.shape, PadShape::Rect);
        assert!((pd.width - 2.032).abs() < 1e-6);
        assert!((pd.height - 2.032).abs() < 1e-6);
    }

    #[test]
    fn rectangle_pad() {
        let pd = decode_symbol_name("rect100x50");
        assert_eq!(pd.shape, PadShape::Rect);
        assert!((pd.width - 2.54).abs() < 1e-6);
        assert!((pd.height - 1.27).abs() < 1e-6);
    }

    #[test]
    fn oval_pad() {
        let pd = decode_symbol_name("oval60x40");
        assert_eq!(pd.shape, PadShape::Oval);
        assert!((pd.width - 1.524).abs() < 1e-6);
        assert!((pd.height - 1.016).abs() < 1e-6);
    }

    #[test]
    fn roundrect_pad() {
        let pd = decode_symbol_name("rc100x50x10");
        assert_eq!(pd.shape, PadShape::RoundRect);
        assert!((pd.width - 2.54).abs() < 1e-6);
        assert!((pd.height - 1.27).abs() < 1e-6);
        assert!(pd.roundrect_ratio > 0.0 && pd.roundrect_ratio <= 0.5);
    }

    #[test]
    fn donut_pad_uses_outer_diameter() {
        let pd = decode_symbol_name("donut_r100x50");
        assert_eq!(pd.shape, PadShape::Circle);
        assert!((pd.width - 2.54).abs() < 1e-6);
    }

    #[test]
    fn thermal_pad_is_circle() {
        let pd = decode_symbol_name("thr120");
        assert_eq!(pd.shape, PadShape::Circle);
    }

    #[test]
    fn unrecognized_name_with_digits_falls_back_to_circle() {
        let pd = decode_symbol_name("custom42");
        assert_eq!(pd.shape, PadShape::Circle);
    }

    #[test]
    fn unrecognized_name_without_digits_is_custom_placeholder() {
        let pd = decode_symbol_name("weird_shape");
        assert_eq!(pd.shape, PadShape::Custom);
    }

    #[test]
    fn features_outline_is_centered() {
        let content = "S P 0\nOB 10 10\nOS 20 10\nOS 20 20\nOS 10 20\nSE\n";
        let pd = decode_symbol_features(content).unwrap();
        assert!((pd.width - 10.0).abs() < 1e-6);
        let centered_has_negative = pd.custom_outline.iter().any(|p| p.x < 0.0);
        assert!(centered_has_negative);
    }
}
