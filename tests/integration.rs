//! End-to-end tests building a synthetic ODB++ tree on disk and running the
//! full pipeline, grounded on the upstream Python test suite's
//! `_create_sample_odb` fixture.

use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn write(dir: &Path, rel: &str, content: &str) {
    let path = dir.join(rel);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, content).unwrap();
}

/// Two-signal-layer, two-net board with a rectangular outline, one trace,
/// one round pad symbol, and a drilled via.
fn sample_odb_root() -> TempDir {
    let dir = TempDir::new().unwrap();
    let root = dir.path();

    write(root, "misc/info", "UNITS=MM\nJOB_NAME=test_board\n");

    write(
        root,
        "matrix/matrix",
        "\
LAYER {
NAME=top
TYPE=SIGNAL
}
LAYER {
NAME=bottom
TYPE=SIGNAL
}
LAYER {
NAME=drill
TYPE=DRILL
}
",
    );

    write(
        root,
        "steps/pcb/profile",
        "\
OB 0 0
OS 100 0
OS 100 80
OS 0 80
OS 0 0
OE
",
    );

    write(
        root,
        "steps/pcb/eda/data",
        "\
NET VCC
FID L top 0
NET GND
FID L top 1
",
    );

    write(root, "steps/pcb/layers/top/features", "$0 r10\nL 0 0 50 0 0 P\nL 50 0 50 40 0 P\n");
    write(root, "steps/pcb/layers/bottom/features", "");
    write(root, "steps/pcb/layers/drill/features", "$0 r12\nP 10 10 0 P\n");
    write(root, "steps/pcb/layers/drill/tools", "");

    write(root, "symbols/r10/features", "");
    write(root, "symbols/r12/features", "");

    dir
}

#[test]
fn parses_rectangular_outline() {
    let dir = sample_odb_root();
    let model = odbpp::parse(dir.path(), None).unwrap();
    assert_eq!(model.outline.len(), 4);
}

#[test]
fn parses_two_signal_layers_top_and_bottom() {
    let dir = sample_odb_root();
    let model = odbpp::parse(dir.path(), None).unwrap();
    let cu_names: Vec<&str> = model
        .layers
        .iter()
        .filter(|l| l.layer_type.is_copper())
        .map(|l| l.kicad_name.as_str())
        .collect();
    assert_eq!(cu_names, vec!["F.Cu", "B.Cu"]);
}

#[test]
fn parses_traces_with_net_cross_reference() {
    let dir = sample_odb_root();
    let model = odbpp::parse(dir.path(), None).unwrap();
    assert_eq!(model.traces.len(), 2);
    assert_eq!(model.traces[0].segment.net_index, 1);
    assert_eq!(model.traces[1].segment.net_index, 2);
    assert_eq!(model.nets[1].name, "VCC");
    assert_eq!(model.nets[2].name, "GND");
}

#[test]
fn round_pad_symbol_widens_trace() {
    let dir = sample_odb_root();
    let model = odbpp::parse(dir.path(), None).unwrap();
    // r10 decodes to a 10 mil = 0.254mm circle, used as trace width here.
    assert!((model.traces[0].segment.width - 0.254).abs() < 1e-6);
}

#[test]
fn via_is_parsed_from_drill_layer() {
    let dir = sample_odb_root();
    let model = odbpp::parse(dir.path(), None).unwrap();
    assert_eq!(model.vias.len(), 1);
    assert_eq!(model.vias[0].layer_pair, ("F.Cu".to_string(), "B.Cu".to_string()));
}

#[test]
fn net_zero_is_reserved_and_unconnected() {
    let dir = sample_odb_root();
    let model = odbpp::parse(dir.path(), None).unwrap();
    assert_eq!(model.nets[0].index, 0);
    assert_eq!(model.nets[0].name, "");
}

#[test]
fn archive_round_trips_through_tar_gz() {
    let dir = sample_odb_root();
    let staging = TempDir::new().unwrap();
    let tgz_path = staging.path().join("board.tgz");

    let tar_gz = fs::File::create(&tgz_path).unwrap();
    let enc = flate2::write::GzEncoder::new(tar_gz, flate2::Compression::default());
    let mut tar_builder = tar::Builder::new(enc);
    tar_builder.append_dir_all(".", dir.path()).unwrap();
    tar_builder.into_inner().unwrap().finish().unwrap();

    let model = odbpp::parse(&tgz_path, None).unwrap();
    assert_eq!(model.outline.len(), 4);
}

#[test]
fn list_steps_reports_sorted_names() {
    let dir = sample_odb_root();
    write(dir.path(), "steps/alt/profile", "");
    let steps = odbpp::list_steps(dir.path()).unwrap();
    assert_eq!(steps, vec!["alt", "pcb"]);
}

#[test]
fn empty_archive_without_matrix_is_an_error() {
    let dir = TempDir::new().unwrap();
    assert!(odbpp::parse(dir.path(), None).is_err());
}

#[test]
fn component_pad_offset_cancels_out_for_unrotated_top_component() {
    let dir = sample_odb_root();
    write(
        dir.path(),
        "steps/pcb/layers/comp_top/components",
        "CMP 0 10 10 0 0 R0402 ;ID=R1\nTOP 1 10 10 0 0 1 0\n",
    );
    let model = odbpp::parse(dir.path(), None).unwrap();
    let comp = model.components.iter().find(|c| c.reference == "R1").unwrap();
    let pad = &comp.footprint.pads[0];
    assert!((pad.pos.x - comp.pos.x).abs() < 1e-6);
}

#[test]
fn projection_produces_serializable_json() {
    let dir = sample_odb_root();
    let model = odbpp::parse(dir.path(), None).unwrap();
    let projected = odbpp::project::project(&model);
    let json = serde_json::to_string(&projected).unwrap();
    assert!(json.contains("\"outline\""));
    assert!(json.contains("\"nets\""));
    assert!(json.contains("\"traces\""));
}
