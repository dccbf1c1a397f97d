//! `ParserContext`: the explicit state threaded through the pipeline stages,
//! in place of the original's instance attributes on one big `OdbParser`
//! class (see SPEC_FULL.md Design Notes, "Global parser state → explicit
//! parser context").

use crate::ident::IdGenerator;
use crate::model::PadDef;
use crate::units::Unit;
use std::collections::HashMap;
use std::path::PathBuf;

/// A single entry from an EDA `PKG` package descriptor. Retained on the
/// context for completeness but not read by the JSON projector — mirrors
/// the original parser's unused `_eda_packages` bookkeeping.
#[derive(Debug, Clone, Default)]
pub struct PinDesc {
    pub number: String,
    pub name: String,
}

/// State accumulated while parsing a single step, passed by reference
/// between the matrix/eda/profile/layer/component/drill stages.
pub struct ParserContext {
    pub odb_root: PathBuf,
    pub step_root: PathBuf,
    pub step_name: String,
    pub units: Unit,

    pub ids: IdGenerator,

    /// Per-layer symbol table: `$<index>` -> decoded pad definition.
    pub symbol_tables: HashMap<String, HashMap<u32, PadDef>>,

    /// feature id (per layer) -> net index, populated by the EDA stage.
    pub feature_nets: HashMap<String, HashMap<u32, usize>>,

    /// net name -> net index, built incrementally as NET records are seen.
    pub net_name_to_index: HashMap<String, usize>,

    /// Advisory EDA package table: package name -> pin descriptors.
    pub packages: HashMap<String, Vec<PinDesc>>,

    /// Drill tool table for the active drill layer: tool number -> diameter (mm).
    pub drill_tools: HashMap<u32, f64>,
}

impl ParserContext {
    pub fn new(odb_root: PathBuf, step_root: PathBuf, step_name: String, units: Unit) -> Self {
        Self {
            odb_root,
            step_root,
            step_name,
            units,
            ids: IdGenerator::new(),
            symbol_tables: HashMap::new(),
            feature_nets: HashMap::new(),
            net_name_to_index: HashMap::new(),
            packages: HashMap::new(),
            drill_tools: HashMap::new(),
        }
    }

    /// Resolve (or allocate) the net index for `name`. Net 0 is reserved for
    /// the empty/unconnected name and is expected to already be registered by
    /// the caller before any other net is resolved.
    pub fn net_index(&mut self, name: &str) -> usize {
        if let Some(&idx) = self.net_name_to_index.get(name) {
            return idx;
        }
        let idx = self.net_name_to_index.len();
        self.net_name_to_index.insert(name.to_string(), idx);
        idx
    }

    pub fn layer_dir(&self, layer_name: &str) -> PathBuf {
        self.step_root.join("layers").join(layer_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx() -> ParserContext {
        ParserContext::new(PathBuf::from("/root"), PathBuf::from("/root/steps/pcb"), "pcb".to_string(), Unit::Mm)
    }

    #[test]
    fn net_zero_reserved_first() {
        let mut c = ctx();
        assert_eq!(c.net_index(""), 0);
        assert_eq!(c.net_index("VCC"), 1);
        assert_eq!(c.net_index("GND"), 2);
        assert_eq!(c.net_index("VCC"), 1);
    }

    #[test]
    fn layer_dir_join() {
        let c = ctx();
        assert_eq!(c.layer_dir("top"), PathBuf::from("/root/steps/pcb/layers/top"));
    }
}
