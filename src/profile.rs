//! `steps/<step>/profile` parser (§4.4): board outline as a sequence of
//! line/arc graphics on `Edge.Cuts`.

use crate::geometry::{arc_center_to_mid, Point};
use crate::model::GraphicItem;
use crate::records::parse_float;
use crate::units::{negate_y, to_mm, Unit};

const OUTLINE_WIDTH: f64 = 0.05;
const CLOSE_THRESHOLD_MM: f64 = 0.001;

/// Parse `profile` contents into board-outline graphics. Surface-form
/// profiles (`S P ... SE`) are recognized and skipped entirely, matching
/// the original: the surface form only appears paired with an equivalent
/// `OB`/`OS`/`OC` contour in practice, and modeling it would double the
/// outline.
pub fn parse_profile(content: &str, units: Unit) -> Vec<GraphicItem> {
    let mut items = Vec::new();
    let mut contour: Vec<Point> = Vec::new();
    let mut in_surface = false;

    for raw_line in content.lines() {
        let line = raw_line.trim();
        if line.is_empty() {
            continue;
        }
        let upper = line.to_uppercase();

        if upper.starts_with("S P") {
            in_surface = true;
            continue;
        }
        if in_surface {
            if upper.starts_with("SE") {
                in_surface = false;
            }
            continue;
        }

        let fields: Vec<&str> = line.split_whitespace().collect();
        match fields.first().map(|s| s.to_uppercase()).as_deref() {
            Some("OB") if fields.len() >= 3 => {
                if let (Some(x), Some(y)) = (parse_float(fields[1]), parse_float(fields[2])) {
                    let p = Point::new(to_mm(x, units), negate_y(to_mm(y, units)));
                    contour = vec![p];
                }
            }
            Some("OS") if fields.len() >= 3 => {
                if let (Some(x), Some(y)) = (parse_float(fields[1]), parse_float(fields[2])) {
                    let end = Point::new(to_mm(x, units), negate_y(to_mm(y, units)));
                    if let Some(&start) = contour.last() {
                        items.push(GraphicItem::line("Edge.Cuts", start, end, OUTLINE_WIDTH));
                    }
                    contour.push(end);
                }
            }
            Some("OC") if fields.len() >= 6 => {
                if let (Some(ex), Some(ey), Some(cx), Some(cy)) = (
                    parse_float(fields[1]),
                    parse_float(fields[2]),
                    parse_float(fields[3]),
                    parse_float(fields[4]),
                ) {
                    let clockwise = fields[5].eq_ignore_ascii_case("y") || fields[5].eq_ignore_ascii_case("cw");
                    let end = Point::new(to_mm(ex, units), negate_y(to_mm(ey, units)));
                    let center = Point::new(to_mm(cx, units), negate_y(to_mm(cy, units)));
                    if let Some(&start) = contour.last() {
                        let mid = arc_center_to_mid(start, end, center, clockwise);
                        items.push(GraphicItem::arc("Edge.Cuts", start, mid, end, OUTLINE_WIDTH));
                    }
                    contour.push(end);
                }
            }
            Some("OE") => {
                close_contour(&contour, &mut items);
                contour.clear();
            }
            _ => {}
        }
    }

    items
}

fn close_contour(contour: &[Point], items: &mut Vec<GraphicItem>) {
    if contour.len() < 2 {
        return;
    }
    let first = contour[0];
    let last = *contour.last().unwrap();
    if (first.x - last.x).abs() > CLOSE_THRESHOLD_MM || (first.y - last.y).abs() > CLOSE_THRESHOLD_MM {
        items.push(GraphicItem::line("Edge.Cuts", last, first, OUTLINE_WIDTH));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::GraphicKind;

    #[test]
    fn rectangular_outline_closes_with_four_segments() {
        let content = "\
OB 0 0
OS 100 0
OS 100 80
OS 0 80
OS 0 0
OE
";
        let items = parse_profile(content, Unit::Mm);
        assert_eq!(items.len(), 4);
        assert!(items.iter().all(|i| i.item_type == GraphicKind::Line));
    }

    #[test]
    fn open_contour_gets_closing_segment() {
        let content = "\
OB 0 0
OS 100 0
OS 100 80
OS 0 80
OE
";
        let items = parse_profile(content, Unit::Mm);
        assert_eq!(items.len(), 4);
    }

    #[test]
    fn already_closed_contour_skips_extra_segment() {
        let content = "\
OB 0 0
OS 100 0
OS 0 0
OE
";
        let items = parse_profile(content, Unit::Mm);
        assert_eq!(items.len(), 2);
    }

    #[test]
    fn arc_segment_produces_mid_point() {
        let content = "\
OB 5 0
OC -5 0 0 0 Y
OE
";
        let items = parse_profile(content, Unit::Mm);
        let arc = items.iter().find(|i| i.item_type == GraphicKind::Arc).unwrap();
        assert!(arc.mid.is_some());
    }

    #[test]
    fn surface_form_profile_is_skipped() {
        let content = "\
S P 0
OB 0 0
OS 10 10
SE
";
        let items = parse_profile(content, Unit::Mm);
        assert!(items.is_empty());
    }

    #[test]
    fn mil_units_are_converted() {
        let content = "\
OB 0 0
OS 1000 0
OE
";
        let items = parse_profile(content, Unit::Mil);
        assert!((items[0].end.x - 25.4).abs() < 1e-6);
    }
}
