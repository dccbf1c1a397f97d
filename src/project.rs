//! JSON projection (§5): turns a [`PcbModel`] into the stable, serde-derived
//! schema downstream tooling consumes.

use crate::model::{
    ComponentInstance, GraphicKind, LayerType, PadShape, PcbModel, Side,
};
use crate::units::format_number;
use serde::Serialize;
use std::collections::HashMap;

#[derive(Serialize)]
pub struct ProjectedBoard {
    pub outline: Outline,
    pub layers: Vec<ProjectedLayer>,
    pub nets: Vec<ProjectedNet>,
    pub stackup: ProjectedStackup,
    pub footprints: HashMap<String, ProjectedFootprint>,
    pub components: Vec<ProjectedComponent>,
    pub traces: Vec<ProjectedTrace>,
    pub trace_arcs: Vec<ProjectedArc>,
    pub vias: Vec<ProjectedVia>,
    pub zones: Vec<ProjectedZone>,
    pub graphics: Vec<ProjectedGraphic>,
}

#[derive(Serialize)]
pub struct Outline {
    pub segments: Vec<Segment>,
    pub arcs: Vec<ArcSeg>,
}

#[derive(Serialize)]
pub struct Segment {
    pub start: [f64; 2],
    pub end: [f64; 2],
    pub width: f64,
}

#[derive(Serialize)]
pub struct ArcSeg {
    pub start: [f64; 2],
    pub mid: [f64; 2],
    pub end: [f64; 2],
    pub width: f64,
}

#[derive(Serialize)]
pub struct ProjectedLayer {
    pub kicad_id: i32,
    pub kicad_name: String,
    #[serde(rename = "type")]
    pub layer_type: String,
    pub ipc_name: String,
    pub ipc_function: String,
    pub ipc_side: String,
    pub copper_order: i32,
}

#[derive(Serialize)]
pub struct ProjectedNet {
    pub id: usize,
    pub name: String,
}

#[derive(Serialize)]
pub struct ProjectedStackup {
    pub board_thickness: f64,
    pub layers: Vec<ProjectedStackupLayer>,
}

#[derive(Serialize)]
pub struct ProjectedStackupLayer {
    pub name: String,
    #[serde(rename = "type")]
    pub layer_type: &'static str,
    pub thickness: f64,
    pub material: String,
    pub epsilon_r: f64,
    pub kicad_layer_id: i32,
}

#[derive(Serialize)]
pub struct ProjectedFootprint {
    pub name: String,
    pub origin: [f64; 2],
    pub pads: Vec<ProjectedPad>,
    pub graphics: Vec<()>,
}

#[derive(Serialize)]
pub struct ProjectedPad {
    pub name: String,
    pub shape: &'static str,
    pub width: f64,
    pub height: f64,
    pub drill_diameter: f64,
    pub offset: [f64; 2],
    pub roundrect_ratio: f64,
    #[serde(rename = "type")]
    pub pad_type: &'static str,
    pub layer_side: &'static str,
    pub rotation: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub custom_shape: Option<Vec<[f64; 2]>>,
}

#[derive(Serialize)]
pub struct ProjectedComponent {
    pub refdes: String,
    pub footprint_ref: String,
    pub value: String,
    pub position: [f64; 2],
    pub rotation: f64,
    pub mirror: bool,
    pub pin_net_map: HashMap<String, String>,
}

#[derive(Serialize)]
pub struct ProjectedTrace {
    pub start: [f64; 2],
    pub end: [f64; 2],
    pub width: f64,
    pub layer: String,
    pub net_id: usize,
}

#[derive(Serialize)]
pub struct ProjectedArc {
    pub start: [f64; 2],
    pub mid: [f64; 2],
    pub end: [f64; 2],
    pub width: f64,
    pub layer: String,
    pub net_id: usize,
}

#[derive(Serialize)]
pub struct ProjectedVia {
    pub position: [f64; 2],
    pub diameter: f64,
    pub drill: f64,
    pub start_layer: String,
    pub end_layer: String,
    pub net_id: usize,
}

#[derive(Serialize)]
pub struct ProjectedZone {
    pub layer: String,
    pub net_id: usize,
    pub net_name: String,
    pub min_thickness: f64,
    pub clearance: f64,
    pub outline: Vec<[f64; 2]>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub holes: Vec<Vec<[f64; 2]>>,
}

#[derive(Serialize)]
pub struct ProjectedGraphic {
    pub kind: &'static str,
    pub start: [f64; 2],
    pub end: [f64; 2],
    pub center: [f64; 2],
    pub radius: f64,
    pub width: f64,
    pub layer: String,
    pub fill: bool,
    pub sweep_angle: f64,
}

fn pt(p: crate::model::Point) -> [f64; 2] {
    [format_number(p.x), format_number(p.y)]
}

fn pad_shape_str(shape: PadShape) -> &'static str {
    match shape {
        PadShape::Circle => "circle",
        PadShape::Rect => "rect",
        PadShape::Oval => "oval",
        PadShape::RoundRect => "roundrect",
        PadShape::Custom => "custom",
    }
}

fn layer_type_str(lt: LayerType) -> &'static str {
    match lt {
        LayerType::Signal => "signal",
        LayerType::Power => "power",
        LayerType::Mixed => "mixed",
        _ => "user",
    }
}

fn ipc_function_str(lt: LayerType) -> &'static str {
    match lt {
        LayerType::Signal | LayerType::Mixed => "SIGNAL",
        LayerType::Power => "POWER_GROUND",
        LayerType::SolderMask => "SOLDERMASK",
        LayerType::SilkScreen => "SILKSCREEN",
        LayerType::SolderPaste => "PASTEMASK",
        LayerType::Drill => "DRILL",
        LayerType::Component => "ASSEMBLY",
        LayerType::Document | LayerType::Other => "DOCUMENT",
    }
}

fn side_str(side: Side) -> &'static str {
    match side {
        Side::Top => "TOP",
        Side::Bottom => "BOTTOM",
        Side::Both => "ALL",
    }
}

fn stackup_layer_type_str(t: crate::model::StackupLayerType) -> &'static str {
    match t {
        crate::model::StackupLayerType::Copper => "copper",
        crate::model::StackupLayerType::Core => "core",
        crate::model::StackupLayerType::Prepreg => "prepreg",
        crate::model::StackupLayerType::SolderMask => "soldermask",
    }
}

/// Rotate `(x, y)` counter-clockwise by `angle_deg` around the origin.
fn rotate(x: f64, y: f64, angle_deg: f64) -> (f64, f64) {
    if angle_deg.abs() < 0.001 {
        return (x, y);
    }
    let rad = angle_deg.to_radians();
    let (sin_a, cos_a) = rad.sin_cos();
    (x * cos_a - y * sin_a, x * sin_a + y * cos_a)
}

fn value_of(comp: &ComponentInstance) -> String {
    comp.value().to_string()
}

fn project_footprint(comp: &ComponentInstance) -> ProjectedFootprint {
    let pads = comp
        .footprint
        .pads
        .iter()
        .map(|pad| {
            let mut rel_x = pad.pos.x - comp.pos.x;
            let mut rel_y = pad.pos.y - comp.pos.y;
            if comp.rotation.abs() > 0.001 {
                let (rx, ry) = rotate(rel_x, rel_y, -comp.rotation);
                rel_x = rx;
                rel_y = ry;
            }
            if comp.side == Side::Bottom {
                rel_x = -rel_x;
            }

            let layer_side = match (comp.side, pad.pad_type) {
                (_, crate::model::PadType::ThruHole) | (_, crate::model::PadType::NpThruHole) => "ALL",
                (Side::Bottom, _) => "BOTTOM",
                _ => "TOP",
            };
            let pad_type = match pad.pad_type {
                crate::model::PadType::Smd => "smd",
                crate::model::PadType::ThruHole => "thru_hole",
                crate::model::PadType::NpThruHole => "np_thru_hole",
            };

            ProjectedPad {
                name: pad.number.clone(),
                shape: pad_shape_str(pad.pad_def.shape),
                width: format_number(pad.pad_def.width),
                height: format_number(pad.pad_def.height),
                drill_diameter: format_number(pad.pad_def.drill),
                offset: [format_number(rel_x), format_number(rel_y)],
                roundrect_ratio: format_number(pad.pad_def.roundrect_ratio),
                pad_type,
                layer_side,
                rotation: format_number(pad.rotation),
                custom_shape: if pad.pad_def.custom_outline.is_empty() {
                    None
                } else {
                    Some(pad.pad_def.custom_outline.iter().map(|&p| pt(p)).collect())
                },
            }
        })
        .collect();

    ProjectedFootprint {
        name: comp.footprint_name.clone(),
        origin: [0.0, 0.0],
        pads,
        graphics: Vec::new(),
    }
}

/// Project a validated [`PcbModel`] into the stable JSON schema.
pub fn project(model: &PcbModel) -> ProjectedBoard {
    let mut segments = Vec::new();
    let mut arcs_out = Vec::new();
    for item in &model.outline {
        match item.item_type {
            GraphicKind::Line => segments.push(Segment {
                start: pt(item.start),
                end: pt(item.end),
                width: format_number(item.width),
            }),
            GraphicKind::Arc => {
                if let Some(mid) = item.mid {
                    arcs_out.push(ArcSeg {
                        start: pt(item.start),
                        mid: pt(mid),
                        end: pt(item.end),
                        width: format_number(item.width),
                    });
                }
            }
            _ => {}
        }
    }

    let layers = model
        .layers
        .iter()
        .map(|l| ProjectedLayer {
            kicad_id: l.layer_id,
            kicad_name: l.kicad_name.clone(),
            layer_type: layer_type_str(l.layer_type).to_string(),
            ipc_name: l.odb_name.clone(),
            ipc_function: ipc_function_str(l.layer_type).to_string(),
            ipc_side: side_str(l.side).to_string(),
            copper_order: l.copper_order,
        })
        .collect();

    let nets = model.nets.iter().map(|n| ProjectedNet { id: n.index, name: n.name.clone() }).collect();

    let stackup = ProjectedStackup {
        board_thickness: format_number(model.board_thickness),
        layers: model
            .stackup
            .iter()
            .map(|sl| ProjectedStackupLayer {
                name: sl.name.clone(),
                layer_type: stackup_layer_type_str(sl.layer_type),
                thickness: format_number(sl.thickness),
                material: sl.material.clone(),
                epsilon_r: format_number(sl.epsilon_r),
                kicad_layer_id: -1,
            })
            .collect(),
    };

    let mut footprints = HashMap::new();
    let mut components = Vec::new();

    for comp in &model.components {
        footprints
            .entry(comp.footprint_name.clone())
            .or_insert_with(|| project_footprint(comp));

        let pin_net_map: HashMap<String, String> = comp
            .footprint
            .pads
            .iter()
            .filter(|p| !p.net_name.is_empty())
            .map(|p| (p.number.clone(), p.net_name.clone()))
            .collect();

        components.push(ProjectedComponent {
            refdes: comp.reference.clone(),
            footprint_ref: comp.footprint_name.clone(),
            value: value_of(comp),
            position: pt(comp.pos),
            rotation: format_number(comp.rotation),
            mirror: comp.side == Side::Bottom,
            pin_net_map,
        });
    }

    let traces = model
        .traces
        .iter()
        .map(|t| ProjectedTrace {
            start: pt(t.segment.start),
            end: pt(t.segment.end),
            width: format_number(t.segment.width),
            layer: t.layer.clone(),
            net_id: t.segment.net_index,
        })
        .collect();

    let trace_arcs = model
        .arcs
        .iter()
        .map(|a| ProjectedArc {
            start: pt(a.arc.start),
            mid: pt(a.arc.mid),
            end: pt(a.arc.end),
            width: format_number(a.arc.width),
            layer: a.layer.clone(),
            net_id: a.arc.net_index,
        })
        .collect();

    let vias = model
        .vias
        .iter()
        .map(|v| ProjectedVia {
            position: pt(v.pos),
            diameter: format_number(v.diameter),
            drill: format_number(v.drill),
            start_layer: v.layer_pair.0.clone(),
            end_layer: v.layer_pair.1.clone(),
            net_id: v.net_index,
        })
        .collect();

    let mut zones = Vec::new();
    for zone in &model.zones {
        for poly in &zone.polygons {
            zones.push(ProjectedZone {
                layer: zone.layer.clone(),
                net_id: zone.net_index,
                net_name: zone.net_name.clone(),
                min_thickness: 0.25,
                clearance: 0.5,
                outline: poly.outline.iter().map(|&p| pt(p)).collect(),
                holes: poly.holes.iter().map(|h| h.iter().map(|&p| pt(p)).collect()).collect(),
            });
        }
    }

    let graphics = model
        .graphics
        .iter()
        .map(|g| ProjectedGraphic {
            kind: match g.item_type {
                GraphicKind::Line => "line",
                GraphicKind::Arc => "arc",
                GraphicKind::Circle => "circle",
                GraphicKind::Polygon => "polygon",
                GraphicKind::Rect => "rect",
            },
            start: pt(g.start),
            end: pt(g.end),
            center: g.mid.map(pt).unwrap_or([0.0, 0.0]),
            radius: 0.0,
            width: format_number(g.width),
            layer: g.layer.clone(),
            fill: g.fill,
            sweep_angle: 0.0,
        })
        .collect();

    ProjectedBoard {
        outline: Outline { segments, arcs: arcs_out },
        layers,
        nets,
        stackup,
        footprints,
        components,
        traces,
        trace_arcs,
        vias,
        zones,
        graphics,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::*;
    use std::collections::HashMap as Map;

    fn sample_component(side: Side, rotation: f64) -> ComponentInstance {
        let mut props = Map::new();
        props.insert("VALUE".to_string(), "10k".to_string());
        ComponentInstance {
            reference: "R1".to_string(),
            footprint_name: "R0402".to_string(),
            footprint: Footprint {
                name: "R0402".to_string(),
                pads: vec![FootprintPad {
                    number: "1".to_string(),
                    pad_def: PadDef::rect(0.5, 0.5),
                    pos: Point::new(11.0, 10.0),
                    rotation: 0.0,
                    net_index: 1,
                    net_name: "VCC".to_string(),
                    pad_type: PadType::Smd,
                    layers: vec!["F.Cu".to_string()],
                }],
                graphics: Vec::new(),
            },
            pos: Point::new(10.0, 10.0),
            rotation,
            side,
            properties: props,
        }
    }

    #[test]
    fn pad_rebased_to_footprint_local_space() {
        let comp = sample_component(Side::Top, 0.0);
        let fp = project_footprint(&comp);
        assert_eq!(fp.pads[0].offset, [1.0, 0.0]);
    }

    #[test]
    fn bottom_side_mirrors_pad_x() {
        let comp = sample_component(Side::Bottom, 0.0);
        let fp = project_footprint(&comp);
        assert_eq!(fp.pads[0].offset, [-1.0, 0.0]);
    }

    #[test]
    fn component_value_surfaces_in_projection() {
        let mut model = PcbModel::new();
        model.nets.push(NetDef { index: 0, name: String::new() });
        model.components.push(sample_component(Side::Top, 0.0));
        let projected = project(&model);
        assert_eq!(projected.components[0].value, "10k");
    }

    #[test]
    fn zone_flattened_one_json_zone_per_polygon() {
        let mut model = PcbModel::new();
        model.zones.push(Zone {
            net_index: 1,
            net_name: "GND".to_string(),
            layer: "F.Cu".to_string(),
            polygons: vec![
                ZonePolygon { outline: vec![Point::new(0.0, 0.0)], holes: Vec::new() },
                ZonePolygon { outline: vec![Point::new(1.0, 1.0)], holes: Vec::new() },
            ],
        });
        let projected = project(&model);
        assert_eq!(projected.zones.len(), 2);
    }

    #[test]
    fn footprints_are_deduplicated_by_name() {
        let mut model = PcbModel::new();
        model.components.push(sample_component(Side::Top, 0.0));
        let mut other = sample_component(Side::Top, 0.0);
        other.reference = "R2".to_string();
        model.components.push(other);
        let projected = project(&model);
        assert_eq!(projected.footprints.len(), 1);
        assert_eq!(projected.components.len(), 2);
    }
}
