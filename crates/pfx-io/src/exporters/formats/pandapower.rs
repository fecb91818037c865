//! pandapower JSON exporter
//!
//! Serializes an [`AltNetwork`] into the pandapower JSON layout: one
//! `split`-oriented DataFrame per element table wrapped in a
//! `pandapowerNet` object. Row positions become the DataFrame index, which is
//! what the result tables of the alternate engine are keyed by.

use crate::exporters::ExportMetadata;
use anyhow::{Context, Result};
use pfx_core::alternate::{AltNetwork, AltTable};
use serde::Serialize;
use serde_json::{json, Map, Value};
use std::{fs, path::Path};

#[derive(Serialize)]
struct DataFrameObject {
    columns: Vec<String>,
    index: Vec<usize>,
    data: Vec<Vec<Value>>,
}

const BUS_COLUMNS: &[(&str, &str)] = &[
    ("name", "object"),
    ("vn_kv", "float64"),
    ("in_service", "bool"),
];

const LINE_COLUMNS: &[(&str, &str)] = &[
    ("name", "object"),
    ("from_bus", "uint32"),
    ("to_bus", "uint32"),
    ("length_km", "float64"),
    ("r_ohm_per_km", "float64"),
    ("x_ohm_per_km", "float64"),
    ("c_nf_per_km", "float64"),
    ("g_us_per_km", "float64"),
    ("r0_ohm_per_km", "float64"),
    ("x0_ohm_per_km", "float64"),
    ("c0_nf_per_km", "float64"),
    ("g0_us_per_km", "float64"),
    ("max_i_ka", "float64"),
    ("parallel", "uint32"),
    ("df", "float64"),
    ("in_service", "bool"),
];

const TRAFO_COLUMNS: &[(&str, &str)] = &[
    ("name", "object"),
    ("hv_bus", "uint32"),
    ("lv_bus", "uint32"),
    ("sn_mva", "float64"),
    ("vn_hv_kv", "float64"),
    ("vn_lv_kv", "float64"),
    ("vk_percent", "float64"),
    ("vkr_percent", "float64"),
    ("pfe_kw", "float64"),
    ("i0_percent", "float64"),
    ("shift_degree", "float64"),
    ("tap_side", "object"),
    ("tap_neutral", "int32"),
    ("tap_min", "int32"),
    ("tap_max", "int32"),
    ("tap_pos", "int32"),
    ("tap_step_percent", "float64"),
    ("tap_step_degree", "float64"),
    ("tap_phase_shifter", "bool"),
    ("vector_group", "object"),
    ("vk0_percent", "float64"),
    ("vkr0_percent", "float64"),
    ("mag0_percent", "float64"),
    ("mag0_rx", "float64"),
    ("si0_hv_partial", "float64"),
    ("parallel", "uint32"),
    ("df", "float64"),
    ("in_service", "bool"),
];

const EXT_GRID_COLUMNS: &[(&str, &str)] = &[
    ("name", "object"),
    ("bus", "uint32"),
    ("vm_pu", "float64"),
    ("va_degree", "float64"),
    ("s_sc_max_mva", "float64"),
    ("rx_max", "float64"),
    ("r0x0_max", "float64"),
    ("x0x_max", "float64"),
    ("in_service", "bool"),
];

const LOAD_COLUMNS: &[(&str, &str)] = &[
    ("name", "object"),
    ("bus", "uint32"),
    ("p_mw", "float64"),
    ("q_mvar", "float64"),
    ("const_z_percent", "float64"),
    ("const_i_percent", "float64"),
    ("sn_mva", "float64"),
    ("scaling", "float64"),
    ("in_service", "bool"),
    ("type", "object"),
];

const SGEN_COLUMNS: &[(&str, &str)] = &[
    ("name", "object"),
    ("bus", "uint32"),
    ("p_mw", "float64"),
    ("q_mvar", "float64"),
    ("sn_mva", "float64"),
    ("scaling", "float64"),
    ("in_service", "bool"),
    ("type", "object"),
];

const ASYMMETRIC_COLUMNS: &[(&str, &str)] = &[
    ("name", "object"),
    ("bus", "uint32"),
    ("p_a_mw", "float64"),
    ("p_b_mw", "float64"),
    ("p_c_mw", "float64"),
    ("q_a_mvar", "float64"),
    ("q_b_mvar", "float64"),
    ("q_c_mvar", "float64"),
    ("sn_mva", "float64"),
    ("scaling", "float64"),
    ("in_service", "bool"),
    ("type", "object"),
];

const SHUNT_COLUMNS: &[(&str, &str)] = &[
    ("name", "object"),
    ("bus", "uint32"),
    ("p_mw", "float64"),
    ("q_mvar", "float64"),
    ("vn_kv", "float64"),
    ("step", "uint32"),
    ("max_step", "uint32"),
    ("in_service", "bool"),
];

const SWITCH_COLUMNS: &[(&str, &str)] = &[
    ("name", "object"),
    ("bus", "uint32"),
    ("element", "uint32"),
    ("et", "object"),
    ("closed", "bool"),
];

fn make_dataframe<T: Serialize>(columns: &[(&str, &str)], rows: &[T]) -> Result<Value> {
    let mut data = Vec::with_capacity(rows.len());
    for row in rows {
        let Value::Object(record) = serde_json::to_value(row)? else {
            anyhow::bail!("table rows must serialize to JSON objects");
        };
        data.push(
            columns
                .iter()
                .map(|(name, _)| record.get(*name).cloned().unwrap_or(Value::Null))
                .collect(),
        );
    }

    let object = DataFrameObject {
        columns: columns.iter().map(|(name, _)| name.to_string()).collect(),
        index: (0..rows.len()).collect(),
        data,
    };
    let dtype: Map<String, Value> = columns
        .iter()
        .map(|(name, dtype)| (name.to_string(), Value::String(dtype.to_string())))
        .collect();
    let obj_str = serde_json::to_string(&object)?;
    Ok(json!({
        "_module": "pandas.core.frame",
        "_class": "DataFrame",
        "_object": obj_str,
        "orient": "split",
        "dtype": dtype,
        "is_multiindex": false,
        "is_multicolumn": false,
    }))
}

/// The `pandapowerNet` JSON object of an alternate network.
pub fn pandapower_net_value(network: &AltNetwork, metadata: Option<&ExportMetadata>) -> Result<Value> {
    let mut tables = Map::new();
    for table in AltTable::ALL {
        let frame = match table {
            AltTable::Bus => make_dataframe(BUS_COLUMNS, &network.bus),
            AltTable::Line => make_dataframe(LINE_COLUMNS, &network.line),
            AltTable::Trafo => make_dataframe(TRAFO_COLUMNS, &network.trafo),
            AltTable::ExtGrid => make_dataframe(EXT_GRID_COLUMNS, &network.ext_grid),
            AltTable::Load => make_dataframe(LOAD_COLUMNS, &network.load),
            AltTable::Sgen => make_dataframe(SGEN_COLUMNS, &network.sgen),
            AltTable::AsymmetricLoad => make_dataframe(ASYMMETRIC_COLUMNS, &network.asymmetric_load),
            AltTable::AsymmetricSgen => make_dataframe(ASYMMETRIC_COLUMNS, &network.asymmetric_sgen),
            AltTable::Shunt => make_dataframe(SHUNT_COLUMNS, &network.shunt),
            AltTable::Switch => make_dataframe(SWITCH_COLUMNS, &network.switch),
        }
        .with_context(|| format!("building {} table", table))?;
        tables.insert(table.as_str().to_string(), frame);
    }
    tables.insert("name".to_string(), Value::String(network.name.clone()));
    tables.insert("f_hz".to_string(), json!(network.f_hz));
    tables.insert("sn_mva".to_string(), json!(network.sn_mva));

    let meta_value = metadata.and_then(|meta| {
        let mut map = Map::new();
        if let Some(source) = meta.source_description() {
            map.insert("source".to_string(), Value::String(source.to_string()));
        }
        if let Some(ts) = meta.creation_timestamp() {
            map.insert("created_at".to_string(), Value::String(ts));
        }
        if let Some(version) = meta.pfx_version() {
            map.insert("pfx_version".to_string(), Value::String(version.to_string()));
        }
        if map.is_empty() {
            None
        } else {
            Some(Value::Object(map))
        }
    });

    let mut payload = json!({
        "_module": "pandapower.auxiliary",
        "_class": "pandapowerNet",
        "_object": tables,
    });

    if let Some(meta_value) = meta_value {
        if let Some(obj) = payload.as_object_mut() {
            obj.insert("_meta".to_string(), meta_value);
        }
    }
    Ok(payload)
}

/// Export an alternate network to pandapower-style JSON
pub fn export_alt_network_to_pandapower(
    network: &AltNetwork,
    output_path: impl AsRef<Path>,
    metadata: Option<&ExportMetadata>,
) -> Result<()> {
    let output_path = output_path.as_ref();
    let payload = pandapower_net_value(network, metadata)?;
    let output = serde_json::to_string_pretty(&payload)?;
    fs::write(output_path, output)
        .with_context(|| format!("writing pandapower network {}", output_path.display()))?;
    Ok(())
}
