//! `matrix/matrix` parser (§4.3): layer definitions, ordering, and KiCad
//! layer-name assignment.

use crate::model::{LayerDef, LayerType, Polarity, Side};
use crate::records::key_value;

#[derive(Default)]
struct RawLayer {
    odb_name: String,
    type_str: String,
    polarity_str: String,
}

/// Parse the full contents of `matrix/matrix` into ordered `LayerDef`s with
/// KiCad names, sides, and copper ordering already assigned.
///
/// Layers appear in ODB++ in matrix order, which for fab archives is top to
/// bottom; `STEP{...}` stanzas are skipped entirely, as is any key this
/// parser does not need (`ROW`, `OLD_NAME`, `CONTEXT`, drill span markers).
pub fn parse_matrix(content: &str) -> Vec<LayerDef> {
    let mut raw_layers: Vec<RawLayer> = Vec::new();
    let mut current: Option<RawLayer> = None;
    let mut in_step = false;

    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let upper = line.to_uppercase();

        if upper.starts_with("STEP") {
            in_step = true;
            continue;
        }
        if upper.starts_with("LAYER") {
            in_step = false;
            current = Some(RawLayer::default());
            continue;
        }
        if line == "{" {
            continue;
        }
        if line == "}" {
            if let Some(layer) = current.take() {
                if !layer.odb_name.is_empty() {
                    raw_layers.push(layer);
                }
            }
            continue;
        }
        if in_step {
            continue;
        }
        let Some(layer) = current.as_mut() else { continue };

        let Some((key, val)) = key_value(line) else { continue };
        match key.trim().to_uppercase().as_str() {
            "NAME" => layer.odb_name = val.trim().to_string(),
            "TYPE" => layer.type_str = val.trim().to_string(),
            "POLARITY" => layer.polarity_str = val.trim().to_string(),
            _ => {}
        }
    }

    assign_names(raw_layers)
}

fn assign_names(raw: Vec<RawLayer>) -> Vec<LayerDef> {
    let mut layers: Vec<LayerDef> = raw
        .into_iter()
        .map(|r| LayerDef {
            odb_name: r.odb_name,
            kicad_name: String::new(),
            layer_type: LayerType::classify(&r.type_str),
            side: Side::Both,
            layer_id: -1,
            polarity: Polarity::parse(&r.polarity_str),
            copper_order: -1,
        })
        .collect();

    let copper_indices: Vec<usize> = layers
        .iter()
        .enumerate()
        .filter(|(_, l)| l.layer_type.is_copper())
        .map(|(i, _)| i)
        .collect();
    let n_copper = copper_indices.len();

    for (order, &idx) in copper_indices.iter().enumerate() {
        let layer = &mut layers[idx];
        layer.copper_order = order as i32;
        if order == 0 {
            layer.kicad_name = "F.Cu".to_string();
            layer.layer_id = 0;
            layer.side = Side::Top;
        } else if order == n_copper - 1 {
            layer.kicad_name = "B.Cu".to_string();
            layer.layer_id = 2;
            layer.side = Side::Bottom;
        } else {
            layer.kicad_name = format!("In{order}.Cu");
            layer.layer_id = 2 + 2 * order as i32;
            layer.side = Side::Both;
        }
    }

    for layer in &mut layers {
        if layer.layer_type.is_copper() {
            continue;
        }
        let name_lower = layer.odb_name.to_ascii_lowercase();
        let is_top = name_lower.contains("top") || name_lower.contains("front") || name_lower.contains("comp");

        match layer.layer_type {
            LayerType::SolderMask => {
                layer.kicad_name = if is_top { "F.Mask" } else { "B.Mask" }.to_string();
                layer.side = if is_top { Side::Top } else { Side::Bottom };
            }
            LayerType::SilkScreen => {
                layer.kicad_name = if is_top { "F.SilkS" } else { "B.SilkS" }.to_string();
                layer.side = if is_top { Side::Top } else { Side::Bottom };
            }
            LayerType::SolderPaste => {
                layer.kicad_name = if is_top { "F.Paste" } else { "B.Paste" }.to_string();
                layer.side = if is_top { Side::Top } else { Side::Bottom };
            }
            LayerType::Drill => {
                layer.kicad_name = "drill".to_string();
            }
            LayerType::Component => {
                let is_top_comp = name_lower.contains("top") || name_lower.contains("comp");
                layer.kicad_name = if is_top_comp { "F.Fab" } else { "B.Fab" }.to_string();
                layer.side = if is_top_comp { Side::Top } else { Side::Bottom };
            }
            _ => {
                layer.kicad_name = format!("User.{}", layer.odb_name);
            }
        }
    }

    layers
}
