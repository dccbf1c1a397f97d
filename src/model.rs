//! The in-memory PCB model (§3) and its post-parse invariants (§4.10).

use crate::error::{OdbError, Result};
pub use crate::geometry::Point;
use std::collections::HashMap;

/// Pad shape vocabulary (§3 `PadDef`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PadShape {
    Circle,
    Rect,
    Oval,
    RoundRect,
    Custom,
}

/// A pad or via-candidate geometry, independent of where it sits.
#[derive(Debug, Clone, PartialEq)]
pub struct PadDef {
    pub shape: PadShape,
    pub width: f64,
    pub height: f64,
    pub roundrect_ratio: f64,
    pub custom_outline: Vec<Point>,
    pub drill: f64,
}

impl PadDef {
    pub fn circle(diameter: f64) -> Self {
        Self {
            shape: PadShape::Circle,
            width: diameter,
            height: diameter,
            roundrect_ratio: 0.0,
            custom_outline: Vec::new(),
            drill: 0.0,
        }
    }

    pub fn rect(width: f64, height: f64) -> Self {
        Self {
            shape: PadShape::Rect,
            width,
            height,
            roundrect_ratio: 0.0,
            custom_outline: Vec::new(),
            drill: 0.0,
        }
    }

    pub fn oval(width: f64, height: f64) -> Self {
        Self {
            shape: PadShape::Oval,
            width,
            height,
            roundrect_ratio: 0.0,
            custom_outline: Vec::new(),
            drill: 0.0,
        }
    }

    pub fn roundrect(width: f64, height: f64, ratio: f64) -> Self {
        Self {
            shape: PadShape::RoundRect,
            width,
            height,
            roundrect_ratio: ratio.clamp(0.0, 0.5),
            custom_outline: Vec::new(),
            drill: 0.0,
        }
    }

    pub fn custom(width: f64, height: f64, outline: Vec<Point>) -> Self {
        Self {
            shape: PadShape::Custom,
            width,
            height,
            roundrect_ratio: 0.0,
            custom_outline: outline,
            drill: 0.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PadType {
    Smd,
    ThruHole,
    NpThruHole,
}

/// A pad belonging to a `Footprint`, positioned in world coordinates until
/// the JSON projector rebases it to footprint-local space.
#[derive(Debug, Clone)]
pub struct FootprintPad {
    pub number: String,
    pub pad_def: PadDef,
    pub pos: Point,
    pub rotation: f64,
    pub net_index: usize,
    pub net_name: String,
    pub pad_type: PadType,
    pub layers: Vec<String>,
}

#[derive(Debug, Clone, Default)]
pub struct Footprint {
    pub name: String,
    pub pads: Vec<FootprintPad>,
    pub graphics: Vec<GraphicItem>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Top,
    Bottom,
    Both,
}

/// A placed component instance. `footprint_name` is the key into
/// `PcbModel::footprints`; `footprint` carries the world-space pad geometry
/// produced directly by the component parser (§4.8) before projection.
#[derive(Debug, Clone)]
pub struct ComponentInstance {
    pub reference: String,
    pub footprint_name: String,
    pub footprint: Footprint,
    pub pos: Point,
    pub rotation: f64,
    pub side: Side,
    pub properties: HashMap<String, String>,
}

impl ComponentInstance {
    /// `VALUE` falling back to `COMP_PACKAGE_NAME`'s sibling `COMP_VALUE`.
    pub fn value(&self) -> &str {
        self.properties
            .get("VALUE")
            .or_else(|| self.properties.get("COMP_VALUE"))
            .map(String::as_str)
            .unwrap_or("")
    }
}

#[derive(Debug, Clone, Copy)]
pub struct TraceSegment {
    pub start: Point,
    pub end: Point,
    pub width: f64,
    pub net_index: usize,
}

#[derive(Debug, Clone)]
pub struct LayeredTrace {
    pub segment: TraceSegment,
    pub layer: String,
}

#[derive(Debug, Clone, Copy)]
pub struct TraceArcGeom {
    pub start: Point,
    pub mid: Point,
    pub end: Point,
    pub width: f64,
    pub net_index: usize,
}

#[derive(Debug, Clone)]
pub struct LayeredArc {
    pub arc: TraceArcGeom,
    pub layer: String,
}

#[derive(Debug, Clone)]
pub struct Via {
    pub pos: Point,
    pub diameter: f64,
    pub drill: f64,
    pub net_index: usize,
    pub layer_pair: (String, String),
}

#[derive(Debug, Clone, Default)]
pub struct ZonePolygon {
    pub outline: Vec<Point>,
    pub holes: Vec<Vec<Point>>,
}

#[derive(Debug, Clone)]
pub struct Zone {
    pub net_index: usize,
    pub net_name: String,
    pub layer: String,
    pub polygons: Vec<ZonePolygon>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GraphicKind {
    Line,
    Arc,
    Circle,
    Polygon,
    Rect,
}

#[derive(Debug, Clone)]
pub struct GraphicItem {
    pub item_type: GraphicKind,
    pub layer: String,
    pub start: Point,
    pub end: Point,
    pub mid: Option<Point>,
    pub width: f64,
    pub fill: bool,
}

impl GraphicItem {
    pub fn line(layer: impl Into<String>, start: Point, end: Point, width: f64) -> Self {
        Self {
            item_type: GraphicKind::Line,
            layer: layer.into(),
            start,
            end,
            mid: None,
            width,
            fill: false,
        }
    }

    pub fn arc(layer: impl Into<String>, start: Point, mid: Point, end: Point, width: f64) -> Self {
        Self {
            item_type: GraphicKind::Arc,
            layer: layer.into(),
            start,
            end,
            mid: Some(mid),
            width,
            fill: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayerType {
    Signal,
    Power,
    Mixed,
    SolderMask,
    SilkScreen,
    SolderPaste,
    Drill,
    Document,
    Component,
    Other,
}

impl LayerType {
    /// Classify an ODB++ matrix `TYPE=` value, folding declared synonyms.
    pub fn classify(type_str: &str) -> Self {
        match type_str.trim().to_uppercase().as_str() {
            "SIGNAL" => LayerType::Signal,
            "POWER_GROUND" | "POWER" => LayerType::Power,
            "MIXED" => LayerType::Mixed,
            "SOLDER_MASK" => LayerType::SolderMask,
            "SILK_SCREEN" => LayerType::SilkScreen,
            "SOLDER_PASTE" => LayerType::SolderPaste,
            "DRILL" | "ROUT" => LayerType::Drill,
            "DOCUMENT" => LayerType::Document,
            "COMPONENT" => LayerType::Component,
            _ => LayerType::Other,
        }
    }

    pub fn is_copper(&self) -> bool {
        matches!(self, LayerType::Signal | LayerType::Power | LayerType::Mixed)
    }
}

#[derive(Debug, Clone)]
pub struct LayerDef {
    pub odb_name: String,
    pub kicad_name: String,
    pub layer_type: LayerType,
    pub side: Side,
    pub layer_id: i32,
    pub polarity: Polarity,
    /// -1 for non-copper layers; otherwise contiguous 0..N-1 outer→inner→outer.
    pub copper_order: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Polarity {
    Positive,
    Negative,
}

impl Polarity {
    pub fn parse(s: &str) -> Self {
        if s.trim().eq_ignore_ascii_case("negative") {
            Polarity::Negative
        } else {
            Polarity::Positive
        }
    }
}

#[derive(Debug, Clone)]
pub struct NetDef {
    pub index: usize,
    pub name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StackupLayerType {
    Copper,
    Core,
    Prepreg,
    SolderMask,
}

#[derive(Debug, Clone)]
pub struct StackupLayer {
    pub name: String,
    pub layer_type: StackupLayerType,
    pub thickness: f64,
    pub material: String,
    pub epsilon_r: f64,
}

/// The frozen, fully-assembled PCB model (§3 `PcbModel`).
#[derive(Debug, Clone, Default)]
pub struct PcbModel {
    pub job_name: String,
    pub units: String,
    pub board_thickness: f64,
    pub layers: Vec<LayerDef>,
    pub stackup: Vec<StackupLayer>,
    pub nets: Vec<NetDef>,
    pub outline: Vec<GraphicItem>,
    pub components: Vec<ComponentInstance>,
    pub footprints: HashMap<String, Footprint>,
    pub traces: Vec<LayeredTrace>,
    pub arcs: Vec<LayeredArc>,
    pub vias: Vec<Via>,
    pub zones: Vec<Zone>,
    pub graphics: Vec<GraphicItem>,
}

impl PcbModel {
    pub fn new() -> Self {
        Self {
            board_thickness: 1.6,
            units: "MM".to_string(),
            ..Default::default()
        }
    }

    /// Check the invariants §4.10 requires before handing the model to the
    /// projector. Called once by the assembler; exposed publicly so tests
    /// can exercise it directly (see SPEC_FULL.md §4.10).
    pub fn validate(&self) -> Result<()> {
        match self.nets.first() {
            Some(n) if n.index == 0 && n.name.is_empty() => {}
            _ => {
                return Err(OdbError::Invalid(
                    "net 0 must exist with empty name".to_string(),
                ))
            }
        }
        for (i, n) in self.nets.iter().enumerate() {
            if n.index != i {
                return Err(OdbError::Invalid(format!(
                    "net indices must be contiguous from 0; found gap at {i}"
                )));
            }
            if i > 0 && n.name.is_empty() {
                return Err(OdbError::Invalid(format!(
                    "net {i} has an empty name, but only net 0 may be unconnected"
                )));
            }
        }

        let known: std::collections::HashSet<&str> =
            self.layers.iter().map(|l| l.kicad_name.as_str()).collect();
        let layer_ok = |layer: &str| known.contains(layer) || layer.starts_with("User.");

        for t in &self.traces {
            if !layer_ok(&t.layer) {
                return Err(OdbError::Invalid(format!("trace on unknown layer {}", t.layer)));
            }
        }
        for a in &self.arcs {
            if !layer_ok(&a.layer) {
                return Err(OdbError::Invalid(format!("arc on unknown layer {}", a.layer)));
            }
        }
        for z in &self.zones {
            if !layer_ok(&z.layer) {
                return Err(OdbError::Invalid(format!("zone on unknown layer {}", z.layer)));
            }
        }
        for v in &self.vias {
            if !layer_ok(&v.layer_pair.0) || !layer_ok(&v.layer_pair.1) {
                return Err(OdbError::Invalid(format!(
                    "via spans unknown layers {:?}",
                    v.layer_pair
                )));
            }
        }

        for c in &self.components {
            if !self.footprints.contains_key(&c.footprint_name) {
                return Err(OdbError::Invalid(format!(
                    "component {} references missing footprint {}",
                    c.reference, c.footprint_name
                )));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_model() -> PcbModel {
        let mut m = PcbModel::new();
        m.nets.push(NetDef { index: 0, name: String::new() });
        m
    }

    #[test]
    fn empty_model_validates() {
        assert!(base_model().validate().is_ok());
    }

    #[test]
    fn missing_net_zero_fails() {
        let m = PcbModel::new();
        assert!(m.validate().is_err());
    }

    #[test]
    fn net_gap_fails() {
        let mut m = base_model();
        m.nets.push(NetDef { index: 2, name: "VCC".to_string() });
        assert!(m.validate().is_err());
    }

    #[test]
    fn unknown_footprint_reference_fails() {
        let mut m = base_model();
        m.components.push(ComponentInstance {
            reference: "R1".to_string(),
            footprint_name: "missing".to_string(),
            footprint: Footprint::default(),
            pos: Point::new(0.0, 0.0),
            rotation: 0.0,
            side: Side::Top,
            properties: HashMap::new(),
        });
        assert!(m.validate().is_err());
    }
}
