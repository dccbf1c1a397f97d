//! Component-layer parser (§4.8): placements and pads from
//! `steps/<step>/layers/<comp layer>/components`.

use crate::model::{ComponentInstance, Footprint, FootprintPad, PadDef, PadType, Point, Side};
use crate::records::{parse_float, parse_int};
use crate::units::{negate_y, to_mm, Unit};
use std::collections::HashMap;

struct RawComponent {
    x: f64,
    y: f64,
    rotation: f64,
    name: String,
    reference: Option<String>,
    pads: Vec<RawPad>,
    props: HashMap<String, String>,
}

struct RawPad {
    pin: String,
    x: f64,
    y: f64,
    rotation: f64,
    net_num: usize,
}

/// Parse a `components` file for one side of the board. `net_names` maps net
/// index to name (for `FootprintPad::net_name`); it comes from the already
/// assembled `PcbModel::nets`.
pub fn parse_components(content: &str, side: Side, units: Unit, net_names: &HashMap<usize, String>) -> Vec<ComponentInstance> {
    let mut out = Vec::new();
    let mut current: Option<RawComponent> = None;

    for raw_line in content.lines() {
        let line = raw_line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let fields: Vec<&str> = line.split(';').next().unwrap_or(line).split_whitespace().collect();
        let Some(tag) = fields.first().copied() else { continue };

        match tag.to_uppercase().as_str() {
            "CMP" if fields.len() >= 7 => {
                if let Some(prev) = current.take() {
                    out.push(finalize(prev, side, net_names));
                }
                let (Some(x), Some(y), Some(rot)) =
                    (parse_float(fields[2]), parse_float(fields[3]), parse_float(fields[4]))
                else {
                    log::debug!("malformed CMP record: {line}");
                    continue;
                };
                let name = fields[6].to_string();
                let reference = extract_ref(line);
                current = Some(RawComponent {
                    x: to_mm(x, units),
                    y: to_mm(y, units),
                    rotation: rot,
                    name,
                    reference,
                    pads: Vec::new(),
                    props: HashMap::new(),
                });
            }
            "TOP" | "BOT" if fields.len() >= 7 => {
                let Some(comp) = current.as_mut() else { continue };
                let (Some(x), Some(y), Some(rot), Some(net_num)) = (
                    parse_float(fields[2]),
                    parse_float(fields[3]),
                    parse_float(fields[4]),
                    parse_int(fields[6]),
                ) else {
                    log::debug!("malformed {tag} record: {line}");
                    continue;
                };
                comp.pads.push(RawPad {
                    pin: fields[1].to_string(),
                    x: to_mm(x, units),
                    y: to_mm(y, units),
                    rotation: rot,
                    net_num: net_num.max(0) as usize,
                });
            }
            "PRP" if fields.len() >= 2 => {
                let Some(comp) = current.as_mut() else { continue };
                if let Some(value) = extract_quoted(line) {
                    comp.props.insert(fields[1].to_string(), value);
                }
            }
            _ => {}
        }
    }

    if let Some(prev) = current.take() {
        out.push(finalize(prev, side, net_names));
    }

    out
}

fn extract_ref(line: &str) -> Option<String> {
    for marker in [";ID=", "; ID=", ";REF=", "; REF="] {
        if let Some(pos) = line.to_uppercase().find(&marker.to_uppercase()) {
            let rest = &line[pos + marker.len()..];
            return rest.split_whitespace().next().map(str::to_string);
        }
    }
    None
}

fn extract_quoted(line: &str) -> Option<String> {
    let start = line.find('\'')?;
    let end = line[start + 1..].find('\'')? + start + 1;
    Some(line[start + 1..end].to_string())
}

fn finalize(raw: RawComponent, side: Side, net_names: &HashMap<usize, String>) -> ComponentInstance {
    let pkg_name = raw
        .props
        .get("COMP_PACKAGE_NAME")
        .cloned()
        .unwrap_or_else(|| raw.name.clone());

    let layers: Vec<String> = match side {
        Side::Top => vec!["F.Cu".to_string(), "F.Paste".to_string(), "F.Mask".to_string()],
        _ => vec!["B.Cu".to_string(), "B.Paste".to_string(), "B.Mask".to_string()],
    };

    let pads = raw
        .pads
        .into_iter()
        .map(|p| FootprintPad {
            number: p.pin,
            pad_def: PadDef::circle(0.5),
            pos: Point::new(p.x, negate_y(p.y)),
            rotation: p.rotation,
            net_index: p.net_num,
            net_name: net_names.get(&p.net_num).cloned().unwrap_or_default(),
            pad_type: PadType::Smd,
            layers: layers.clone(),
        })
        .collect();

    let footprint = Footprint {
        name: pkg_name.clone(),
        pads,
        graphics: Vec::new(),
    };

    ComponentInstance {
        reference: raw.reference.unwrap_or(raw.name),
        footprint_name: pkg_name,
        footprint,
        pos: Point::new(raw.x, negate_y(raw.y)),
        rotation: raw.rotation,
        side,
        properties: raw.props,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn simple_component_with_ref_and_one_pad() {
        let content = "CMP 0 10 10 0 0 SOT23 ;ID=Q1\nTOP 1 0.5 0 0 0 1 0\nPRP COMP_PACKAGE_NAME 'SOT-23'\n";
        let mut nets = HashMap::new();
        nets.insert(1, "VCC".to_string());
        let comps = parse_components(content, Side::Top, Unit::Mm, &nets);
        assert_eq!(comps.len(), 1);
        assert_eq!(comps[0].reference, "Q1");
        assert_eq!(comps[0].footprint_name, "SOT-23");
        assert_eq!(comps[0].footprint.pads.len(), 1);
        assert_eq!(comps[0].footprint.pads[0].net_name, "VCC");
    }

    #[test]
    fn missing_ref_falls_back_to_component_name() {
        let content = "CMP 0 0 0 0 0 R0402\n";
        let nets = HashMap::new();
        let comps = parse_components(content, Side::Top, Unit::Mm, &nets);
        assert_eq!(comps[0].reference, "R0402");
    }

    #[test]
    fn bottom_side_components_get_bottom_layers() {
        let content = "CMP 0 0 0 0 0 R0402 ;ID=R1\nBOT 1 0 0 0 0 0 0\n";
        let nets = HashMap::new();
        let comps = parse_components(content, Side::Bottom, Unit::Mm, &nets);
        assert_eq!(comps[0].footprint.pads[0].layers[0], "B.Cu");
    }

    #[test]
    fn multiple_components_in_one_file() {
        let content = "CMP 0 0 0 0 0 R0402 ;ID=R1\nCMP 1 5 5 0 0 R0402 ;ID=R2\n";
        let nets = HashMap::new();
        let comps = parse_components(content, Side::Top, Unit::Mm, &nets);
        assert_eq!(comps.len(), 2);
        assert_eq!(comps[1].reference, "R2");
    }
}
