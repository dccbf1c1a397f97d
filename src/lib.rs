//! ODB++ PCB fabrication archive parser and JSON projector.
//!
//! `parse` runs the fixed pipeline described in the module layout below and
//! returns a validated [`model::PcbModel`]; [`project::project`] turns that
//! model into the stable JSON schema. `list_steps` is a lighter entry point
//! used by the `--list-steps` CLI mode.

pub mod archive;
pub mod components;
pub mod context;
pub mod drill;
pub mod eda;
pub mod error;
pub mod geometry;
pub mod ident;
pub mod layer_features;
pub mod matrix;
pub mod model;
pub mod profile;
pub mod project;
pub mod records;
pub mod symbol;
pub mod units;

pub use error::{OdbError, Result};
pub use model::PcbModel;

use context::ParserContext;
use model::{LayerType, NetDef, Side, StackupLayer, StackupLayerType};
use std::collections::HashMap;
use std::path::Path;
use units::Unit;

/// Parse an ODB++ archive or directory into a [`PcbModel`].
///
/// `step` selects which `steps/<name>` to read; `None` picks the first step
/// in lexicographic order. Runs the stages in a fixed order: misc/info,
/// matrix, symbols, profile, eda/data, components, layer features, drill.
pub fn parse(path: &Path, step: Option<&str>) -> Result<PcbModel> {
    let opened = archive::open(path)?;
    let odb_root = archive::find_odb_root(&opened.root)?;
    let step_root = archive::find_step(&odb_root, step)?;
    let step_name = step_root
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();

    log::info!("ODB++ root: {}, step: {}", odb_root.display(), step_name);

    let (units, job_name) = parse_misc_info(&odb_root);
    let mut ctx = ParserContext::new(odb_root.clone(), step_root.clone(), step_name.clone(), units);

    let mut model = PcbModel::new();
    model.units = unit_label(units);
    model.job_name = job_name;

    model.layers = parse_matrix_stage(&odb_root)?;
    model.stackup = synthesize_stackup(&model.layers);

    let global_symbols = load_symbols(&odb_root);

    if let Some(content) = read_step_file(&step_root, &["profile"]) {
        model.outline = profile::parse_profile(&content, units);
    } else {
        log::warn!("profile not found, no board outline");
    }

    if let Some(content) = read_step_file(&step_root, &["eda", "data"]) {
        model.nets = eda::parse_eda_data(&content, &mut ctx);
    } else {
        log::warn!("eda/data not found, no netlist data");
        ctx.net_index("");
        model.nets = vec![NetDef { index: 0, name: String::new() }];
    }
    let net_names: HashMap<usize, String> = model.nets.iter().map(|n| (n.index, n.name.clone())).collect();

    parse_components_stage(&step_root, &model.layers, units, &net_names, &mut model);
    parse_layer_features_stage(&step_root, &model.layers, &ctx, &global_symbols, &net_names, units, &mut model);
    parse_drill_stage(&step_root, &model.layers, &ctx, units, &mut model);

    model.validate()?;
    Ok(model)
}

/// List step names available under an ODB++ archive or directory, without
/// running the full parse pipeline.
pub fn list_steps(path: &Path) -> Result<Vec<String>> {
    let opened = archive::open(path)?;
    let odb_root = archive::find_odb_root(&opened.root)?;
    archive::list_steps(&odb_root)
}

fn unit_label(u: Unit) -> String {
    match u {
        Unit::Mm => "MM",
        Unit::Inch => "INCH",
        Unit::Mil => "MIL",
    }
    .to_string()
}

fn parse_misc_info(odb_root: &Path) -> (Unit, String) {
    let Some(content) = read_file(odb_root, &["misc", "info"]) else {
        log::warn!("misc/info not found, assuming MM units");
        return (Unit::Mm, String::new());
    };

    let mut units = Unit::Mm;
    let mut job_name = String::new();

    for line in content.lines() {
        let line = line.trim();
        if let Some((key, val)) = records::key_value(line) {
            match key.trim().to_uppercase().as_str() {
                "UNITS" => units = Unit::parse(val),
                "JOB_NAME" => job_name = val.trim().to_string(),
                _ => {}
            }
        }
    }

    log::info!("units: {}, job: {}", unit_label(units), job_name);
    (units, job_name)
}

fn parse_matrix_stage(odb_root: &Path) -> Result<Vec<model::LayerDef>> {
    let content = read_file(odb_root, &["matrix", "matrix"])
        .ok_or_else(|| OdbError::MatrixMissing(odb_root.join("matrix/matrix")))?;
    let layers = matrix::parse_matrix(&content);
    log::info!(
        "found {} layers ({} copper)",
        layers.len(),
        layers.iter().filter(|l| l.layer_type.is_copper()).count()
    );
    Ok(layers)
}

/// Best-effort stackup synthesis: one entry per copper layer, with a core or
/// prepreg placeholder between adjacent copper layers. The original never
/// populated an equivalent structure; ODB++ archives carry true stackup data
/// in a separate, frequently-absent `stackup` resource this crate does not
/// assume exists, so this is enrichment rather than a faithful port.
fn synthesize_stackup(layers: &[model::LayerDef]) -> Vec<StackupLayer> {
    let copper: Vec<&model::LayerDef> = layers.iter().filter(|l| l.layer_type.is_copper()).collect();
    let mut stackup = Vec::new();

    for (i, cl) in copper.iter().enumerate() {
        stackup.push(StackupLayer {
            name: cl.kicad_name.clone(),
            layer_type: StackupLayerType::Copper,
            thickness: 0.035,
            material: "copper".to_string(),
            epsilon_r: 4.5,
        });
        if i + 1 < copper.len() {
            let is_outer_gap = i == 0 || i + 2 == copper.len();
            stackup.push(StackupLayer {
                name: format!("dielectric {}-{}", cl.kicad_name, copper[i + 1].kicad_name),
                layer_type: if is_outer_gap {
                    StackupLayerType::Prepreg
                } else {
                    StackupLayerType::Core
                },
                thickness: 0.2,
                material: "FR4".to_string(),
                epsilon_r: 4.5,
            });
        }
    }

    stackup
}

fn load_symbols(odb_root: &Path) -> HashMap<String, model::PadDef> {
    let sym_dir = archive::find_ci(odb_root, "symbols").or_else(|| archive::find_ci(odb_root, "lib"));
    let Some(sym_dir) = sym_dir else {
        log::warn!("no symbols directory found");
        return HashMap::new();
    };

    let mut entries: Vec<_> = std::fs::read_dir(&sym_dir)
        .map(|it| it.flatten().filter(|e| e.path().is_dir()).collect())
        .unwrap_or_else(|_| Vec::new());
    entries.sort_by_key(|e| e.file_name());

    let mut symbols = HashMap::new();
    for entry in entries {
        let name = entry.file_name().to_string_lossy().to_string();
        let features_path = archive::find_ci(&entry.path(), "features");
        let pad_def = symbol::load_symbol_dir(&name, features_path.as_deref());
        symbols.insert(name, pad_def);
    }
    log::info!("parsed {} symbol definitions", symbols.len());
    symbols
}

fn component_layer_dir(step_root: &Path, layers: &[model::LayerDef], side_top: bool) -> Option<std::path::PathBuf> {
    let layers_dir = archive::find_ci(step_root, "layers")?;

    if let Ok(entries) = std::fs::read_dir(&layers_dir) {
        for entry in entries.flatten() {
            if !entry.path().is_dir() {
                continue;
            }
            let name_lower = entry.file_name().to_string_lossy().to_ascii_lowercase();
            if !name_lower.contains("comp") {
                continue;
            }
            if side_top && (name_lower.contains("top") || name_lower.ends_with("_t")) {
                return Some(entry.path());
            }
            if !side_top && (name_lower.contains("bot") || name_lower.ends_with("_b")) {
                return Some(entry.path());
            }
        }
    }

    for layer in layers {
        if layer.layer_type != LayerType::Component {
            continue;
        }
        let name_lower = layer.odb_name.to_ascii_lowercase();
        if side_top && (name_lower.contains("top") || name_lower.contains("comp")) {
            return archive::find_ci(&layers_dir, &layer.odb_name);
        }
        if !side_top && (name_lower.contains("bot") || name_lower.contains("sold")) {
            return archive::find_ci(&layers_dir, &layer.odb_name);
        }
    }

    None
}

fn parse_components_stage(
    step_root: &Path,
    layers: &[model::LayerDef],
    units: Unit,
    net_names: &HashMap<usize, String>,
    model: &mut PcbModel,
) {
    for (side, is_top) in [(Side::Top, true), (Side::Bottom, false)] {
        let Some(dir) = component_layer_dir(step_root, layers, is_top) else { continue };
        let Some(comp_file) = archive::find_ci(&dir, "components") else { continue };
        let Ok(content) = std::fs::read_to_string(&comp_file) else { continue };

        for comp in components::parse_components(&content, side, units, net_names) {
            model
                .footprints
                .entry(comp.footprint_name.clone())
                .or_insert_with(|| comp.footprint.clone());
            model.components.push(comp);
        }
    }
    log::info!("parsed {} component instances", model.components.len());
}

fn parse_layer_features_stage(
    step_root: &Path,
    layers: &[model::LayerDef],
    ctx: &ParserContext,
    global_symbols: &HashMap<String, model::PadDef>,
    net_names: &HashMap<usize, String>,
    units: Unit,
    model: &mut PcbModel,
) {
    let Some(layers_dir) = archive::find_ci(step_root, "layers") else { return };

    for layer in layers.iter().filter(|l| l.layer_type.is_copper()) {
        let Some(layer_dir) = archive::find_ci(&layers_dir, &layer.odb_name) else { continue };
        let Some(features_path) = archive::find_ci(&layer_dir, "features") else { continue };
        let Ok(content) = std::fs::read_to_string(&features_path) else { continue };

        let empty_map = HashMap::new();
        let net_map = ctx.feature_nets.get(&layer.odb_name).unwrap_or(&empty_map);
        let lf = layer_features::parse_layer_features(
            &content,
            &layer.kicad_name,
            net_map,
            net_names,
            global_symbols,
            units,
        );
        model.traces.extend(lf.traces);
        model.arcs.extend(lf.arcs);
        model.zones.extend(lf.zones);
    }

    log::info!(
        "parsed {} traces, {} arcs, {} zones",
        model.traces.len(),
        model.arcs.len(),
        model.zones.len()
    );
}

fn parse_drill_stage(step_root: &Path, layers: &[model::LayerDef], ctx: &ParserContext, units: Unit, model: &mut PcbModel) {
    let Some(layers_dir) = archive::find_ci(step_root, "layers") else { return };

    let via_layers = outer_copper_pair(layers);

    for layer in layers.iter().filter(|l| l.layer_type == LayerType::Drill) {
        let Some(layer_dir) = archive::find_ci(&layers_dir, &layer.odb_name) else { continue };

        let tools = archive::find_ci(&layer_dir, "tools")
            .and_then(|p| std::fs::read_to_string(p).ok())
            .map(|c| drill::parse_tools(&c, units))
            .unwrap_or_default();

        let Some(features_path) = archive::find_ci(&layer_dir, "features") else { continue };
        let Ok(content) = std::fs::read_to_string(&features_path) else { continue };

        let empty_map = HashMap::new();
        let net_map = ctx.feature_nets.get(&layer.odb_name).unwrap_or(&empty_map);
        model
            .vias
            .extend(drill::parse_drill_features(&content, &tools, net_map, via_layers.clone(), units));
    }

    log::info!("parsed {} vias", model.vias.len());
}

fn outer_copper_pair(layers: &[model::LayerDef]) -> (String, String) {
    let top = layers.iter().find(|l| l.kicad_name == "F.Cu").map(|l| l.kicad_name.clone());
    let bottom = layers.iter().find(|l| l.kicad_name == "B.Cu").map(|l| l.kicad_name.clone());
    (top.unwrap_or_else(|| "F.Cu".to_string()), bottom.unwrap_or_else(|| "B.Cu".to_string()))
}

fn read_file(root: &Path, parts: &[&str]) -> Option<String> {
    let mut current = root.to_path_buf();
    for part in parts {
        current = archive::find_ci(&current, part)?;
    }
    std::fs::read_to_string(&current).ok()
}

fn read_step_file(step_root: &Path, parts: &[&str]) -> Option<String> {
    read_file(step_root, parts)
}
