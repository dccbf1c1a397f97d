//! `steps/<step>/eda/data` parser (§4.5): the netlist / feature-to-net
//! cross reference, and advisory package-pin descriptors.

use crate::context::{ParserContext, PinDesc};
use crate::model::NetDef;
use crate::records::{parse_float, parse_int};

/// Parse `eda/data`, registering nets (net 0 reserved for "") and
/// populating `ctx.feature_nets` and `ctx.packages` as a side effect.
/// Returns the net table in index order, ready for `PcbModel::nets`.
pub fn parse_eda_data(content: &str, ctx: &mut ParserContext) -> Vec<NetDef> {
    ctx.net_index("");

    let mut nets = vec![NetDef { index: 0, name: String::new() }];
    let mut current_net_index: Option<usize> = None;
    let mut current_pkg: Option<String> = None;

    for raw_line in content.lines() {
        let line = raw_line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let fields: Vec<&str> = line.split_whitespace().collect();
        let Some(tag) = fields.first() else { continue };

        match tag.to_uppercase().as_str() {
            "NET" if fields.len() >= 2 => {
                let name = fields[1].to_string();
                let idx = ctx.net_index(&name);
                nets.push(NetDef { index: idx, name: name.clone() });
                current_net_index = Some(idx);
                current_pkg = None;
            }
            "FID" if fields.len() >= 4 => {
                let Some(net_idx) = current_net_index else { continue };
                let layer_name = fields[2].to_string();
                let Some(feature_id) = parse_int(fields[3]) else {
                    log::debug!("FID record with unparseable feature id: {line}");
                    continue;
                };
                ctx.feature_nets
                    .entry(layer_name)
                    .or_default()
                    .insert(feature_id as u32, net_idx);
            }
            "PKG" if fields.len() >= 2 => {
                let name = fields[1].to_string();
                ctx.packages.entry(name.clone()).or_default();
                current_pkg = Some(name);
                current_net_index = None;
            }
            "PIN" if fields.len() >= 4 => {
                let Some(pkg) = current_pkg.as_ref() else { continue };
                let (Some(_x), Some(_y)) = (parse_float(fields[3]), fields.get(4).and_then(|f| parse_float(f))) else {
                    log::debug!("PIN record with unparseable position: {line}");
                    continue;
                };
                ctx.packages.entry(pkg.clone()).or_default().push(PinDesc {
                    number: fields[1].to_string(),
                    name: fields.get(2).unwrap_or(&"").to_string(),
                });
            }
            _ => {}
        }
    }

    nets
}
