//! Per-layer `features` file parser (§4.6): traces, arcs, and filled zones
//! on copper layers.

use crate::geometry::{arc_center_to_mid, Point};
use crate::model::{LayeredArc, LayeredTrace, PadDef, TraceArcGeom, TraceSegment, Zone, ZonePolygon};
use crate::records::{parse_float, parse_int};
use crate::symbol::decode_symbol_name;
use crate::units::{negate_y, to_mm, Unit};
use std::collections::HashMap;

const DEFAULT_WIDTH_MM: f64 = 0.25;

pub struct LayerFeatures {
    pub traces: Vec<LayeredTrace>,
    pub arcs: Vec<LayeredArc>,
    pub zones: Vec<Zone>,
}

/// Resolve a feature's draw width: layer-local symbol table entry first
/// (checked against globally decoded symbol definitions), falling back to
/// decoding the symbol's name directly, and finally the fixed default.
fn resolve_width(sym_idx: i64, sym_table: &HashMap<i64, String>, global_symbols: &HashMap<String, PadDef>) -> f64 {
    let Some(name) = sym_table.get(&sym_idx) else {
        return DEFAULT_WIDTH_MM;
    };
    if let Some(pd) = global_symbols.get(name) {
        return pd.width;
    }
    decode_symbol_name(name).width
}

/// Parse a copper layer's `features` file.
///
/// `net_map` maps this layer's feature ids (assigned in file order, one per
/// line that yields a drawn feature - `L`, `P`, `A`, or the start of an `S
/// P` surface) to net index. `global_symbols` is the job-wide symbol table
/// decoded from `symbols/`; `sym_table` entries declared at the top of this
/// file (`$<idx> <name>`) take priority matching against it.
pub fn parse_layer_features(
    content: &str,
    kicad_layer: &str,
    net_map: &HashMap<u32, usize>,
    net_names: &HashMap<usize, String>,
    global_symbols: &HashMap<String, PadDef>,
    units: Unit,
) -> LayerFeatures {
    let mut sym_table: HashMap<i64, String> = HashMap::new();
    let mut traces = Vec::new();
    let mut arcs = Vec::new();
    let mut zones = Vec::new();

    let mut feature_id: u32 = 0;
    let mut in_surface = false;
    let mut surface_points: Vec<Point> = Vec::new();
    let mut surface_net_idx = 0usize;

    for raw_line in content.lines() {
        let line = raw_line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        if let Some(rest) = line.strip_prefix('$') {
            let mut parts = rest.splitn(2, char::is_whitespace);
            if let (Some(idx_str), Some(name)) = (parts.next(), parts.next()) {
                if let Some(idx) = parse_int(idx_str) {
                    sym_table.insert(idx, name.trim().to_string());
                    continue;
                }
            }
        }

        let upper = line.to_uppercase();

        if in_surface {
            if upper.starts_with("SE") {
                if !surface_points.is_empty() {
                    zones.push(Zone {
                        net_index: surface_net_idx,
                        net_name: net_names.get(&surface_net_idx).cloned().unwrap_or_default(),
                        layer: kicad_layer.to_string(),
                        polygons: vec![ZonePolygon {
                            outline: std::mem::take(&mut surface_points),
                            holes: Vec::new(),
                        }],
                    });
                }
                in_surface = false;
                continue;
            }
            if let Some(p) = parse_surface_point(line, units) {
                surface_points.push(p);
            }
            continue;
        }

        let fields: Vec<&str> = line.split_whitespace().collect();
        let Some(tag) = fields.first().copied() else { continue };

        match tag {
            "L" if fields.len() >= 6 => {
                if let (Some(xs), Some(ys), Some(xe), Some(ye), Some(sym_idx)) = (
                    parse_float(fields[1]),
                    parse_float(fields[2]),
                    parse_float(fields[3]),
                    parse_float(fields[4]),
                    parse_int(fields[5]),
                ) {
                    let width = resolve_width(sym_idx, &sym_table, global_symbols).max(0.01);
                    let net_idx = *net_map.get(&feature_id).unwrap_or(&0);
                    traces.push(LayeredTrace {
                        segment: TraceSegment {
                            start: Point::new(to_mm(xs, units), negate_y(to_mm(ys, units))),
                            end: Point::new(to_mm(xe, units), negate_y(to_mm(ye, units))),
                            width,
                            net_index: net_idx,
                        },
                        layer: kicad_layer.to_string(),
                    });
                    feature_id += 1;
                }
            }
            "P" if fields.len() >= 4 => {
                feature_id += 1;
            }
            "A" if fields.len() >= 8 => {
                if let (Some(xs), Some(ys), Some(xe), Some(ye), Some(xc), Some(yc), Some(sym_idx)) = (
                    parse_float(fields[1]),
                    parse_float(fields[2]),
                    parse_float(fields[3]),
                    parse_float(fields[4]),
                    parse_float(fields[5]),
                    parse_float(fields[6]),
                    parse_int(fields[7]),
                ) {
                    let clockwise = fields
                        .get(9)
                        .map(|f| f.eq_ignore_ascii_case("y") || f.eq_ignore_ascii_case("cw"))
                        .unwrap_or(false);
                    let width = resolve_width(sym_idx, &sym_table, global_symbols).max(0.01);
                    let net_idx = *net_map.get(&feature_id).unwrap_or(&0);

                    let start = Point::new(to_mm(xs, units), negate_y(to_mm(ys, units)));
                    let end = Point::new(to_mm(xe, units), negate_y(to_mm(ye, units)));
                    let center = Point::new(to_mm(xc, units), negate_y(to_mm(yc, units)));
                    let mid = arc_center_to_mid(start, end, center, clockwise);

                    arcs.push(LayeredArc {
                        arc: TraceArcGeom { start, mid, end, width, net_index: net_idx },
                        layer: kicad_layer.to_string(),
                    });
                    feature_id += 1;
                }
            }
            _ if upper.starts_with("S P") => {
                in_surface = true;
                surface_points.clear();
                surface_net_idx = *net_map.get(&feature_id).unwrap_or(&0);
                feature_id += 1;
            }
            _ => {}
        }
    }

    LayerFeatures { traces, arcs, zones }
}

/// `OB`/`OS`/`OC` inside a surface record; arcs within a zone outline are
/// collapsed to their endpoint, matching the original's zone simplification.
fn parse_surface_point(line: &str, units: Unit) -> Option<Point> {
    let fields: Vec<&str> = line.split_whitespace().collect();
    match fields.first().map(|s| s.to_uppercase()).as_deref() {
        Some("OB") | Some("OS") | Some("OC") if fields.len() >= 3 => {
            let x = parse_float(fields[1])?;
            let y = parse_float(fields[2])?;
            Some(Point::new(to_mm(x, units), negate_y(to_mm(y, units))))
        }
        _ => None,
    }
}
