//! Drill layer parser (§4.9): the `tools` table and `features` hit list,
//! producing through-hole vias.

use crate::model::{Point, Via};
use crate::records::{parse_float, parse_int};
use crate::units::{negate_y, to_mm, Unit};
use crate::symbol::decode_symbol_name;
use std::collections::HashMap;

const DEFAULT_DRILL_MM: f64 = 0.3;
/// Rough annular-ring estimate: via pad diameter is drill plus this.
const ANNULAR_RING_MM: f64 = 0.2;

/// Parse a drill layer's `tools` file: `T<num> <diameter> ...` lines.
pub fn parse_tools(content: &str, units: Unit) -> HashMap<u32, f64> {
    let mut tools = HashMap::new();
    for raw_line in content.lines() {
        let line = raw_line.trim();
        let Some(rest) = line.strip_prefix('T').or_else(|| line.strip_prefix('t')) else { continue };
        let mut parts = rest.splitn(2, char::is_whitespace);
        let Some(num_str) = parts.next() else { continue };
        let Some(dia_str) = parts.next().map(str::trim) else { continue };
        let dia_token = dia_str.split_whitespace().next().unwrap_or("");
        if let (Some(num), Some(dia)) = (parse_int(num_str), parse_float(dia_token)) {
            tools.insert(num as u32, to_mm(dia, units));
        }
    }
    tools
}

/// Parse a drill layer's `features` file into vias. `via_layers` is the
/// (start, end) copper layer pair a through-hole connects; this crate
/// always uses the outermost copper pair (§4.9 Non-goals: no blind/buried
/// via span detection).
pub fn parse_drill_features(
    content: &str,
    tools: &HashMap<u32, f64>,
    net_map: &HashMap<u32, usize>,
    via_layers: (String, String),
    units: Unit,
) -> Vec<Via> {
    let mut sym_table: HashMap<i64, String> = HashMap::new();
    let mut vias = Vec::new();
    let mut feature_id: u32 = 0;

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

        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.first().copied() != Some("P") || fields.len() < 4 {
            continue;
        }

        let (Some(x), Some(y), Some(sym_idx)) =
            (parse_float(fields[1]), parse_float(fields[2]), parse_int(fields[3]))
        else {
            log::debug!("malformed drill P record: {line}");
            feature_id += 1;
            continue;
        };

        let drill = tools.get(&(sym_idx as u32)).copied().unwrap_or_else(|| {
            sym_table
                .get(&sym_idx)
                .map(|name| decode_symbol_name(name).width)
                .unwrap_or(DEFAULT_DRILL_MM)
        });

        let net_idx = *net_map.get(&feature_id).unwrap_or(&0);

        vias.push(Via {
            pos: Point::new(to_mm(x, units), negate_y(to_mm(y, units))),
            diameter: drill + ANNULAR_RING_MM,
            drill,
            net_index: net_idx,
            layer_pair: via_layers.clone(),
        });
        feature_id += 1;
    }

    vias
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tools_table_parses_diameters() {
        let content = "T1 10.0\nT2 20\n";
        let tools = parse_tools(content, Unit::Mil);
        assert!((tools[&1] - 0.254).abs() < 1e-6);
        assert!((tools[&2] - 0.508).abs() < 1e-6);
    }

    #[test]
    fn via_diameter_adds_annular_ring() {
        let mut tools = HashMap::new();
        tools.insert(1, 0.3);
        let content = "P 0 0 1 P\n";
        let net_map = HashMap::new();
        let vias = parse_drill_features(content, &tools, &net_map, ("F.Cu".into(), "B.Cu".into()), Unit::Mm);
        assert_eq!(vias.len(), 1);
        assert!((vias[0].diameter - 0.5).abs() < 1e-9);
        assert!((vias[0].drill - 0.3).abs() < 1e-9);
    }

    #[test]
    fn missing_tool_falls_back_to_symbol_decode() {
        let content = "$0 r10\nP 0 0 0 P\n";
        let tools = HashMap::new();
        let net_map = HashMap::new();
        let vias = parse_drill_features(content, &tools, &net_map, ("F.Cu".into(), "B.Cu".into()), Unit::Mm);
        assert!(vias[0].drill > 0.0);
    }

    #[test]
    fn default_via_layers_are_outer_copper() {
        let content = "P 0 0 5 P\n";
        let tools = HashMap::new();
        let net_map = HashMap::new();
        let vias = parse_drill_features(content, &tools, &net_map, ("F.Cu".into(), "B.Cu".into()), Unit::Mm);
        assert_eq!(vias[0].layer_pair, ("F.Cu".to_string(), "B.Cu".to_string()));
    }
}
