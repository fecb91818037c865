use super::pandapower::{export_alt_network_to_pandapower, pandapower_net_value};
use crate::exporters::ExportMetadata;
use anyhow::Result;
use chrono::{TimeZone, Utc};
use pfx_core::alternate::{AltNetwork, BusRow, LoadRow, SwitchRow};
use serde_json::Value;
use std::fs;
use tempfile::TempDir;

fn build_sample_network() -> AltNetwork {
    let mut net = AltNetwork::new("sample", 50.0);
    net.add_bus(BusRow {
        name: "node 1".to_string(),
        vn_kv: 10.5,
        in_service: true,
    });
    net.add_load(LoadRow {
        name: "sym_load 2".to_string(),
        bus: 0,
        p_mw: 1.0,
        q_mvar: 0.2,
        const_z_percent: 0.0,
        const_i_percent: 0.0,
        sn_mva: None,
        scaling: 1.0,
        in_service: true,
        load_type: "wye".to_string(),
    });
    net.add_switch(SwitchRow {
        name: String::new(),
        bus: 0,
        element: 0,
        et: "l".to_string(),
        closed: false,
    });
    net
}

fn sample_metadata() -> ExportMetadata {
    ExportMetadata {
        source: Some("pp-sym-sym_load".to_string()),
        created_at: Some(Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap()),
        pfx_version: Some("0.1.0".to_string()),
    }
}

fn frame(object: &serde_json::Map<String, Value>, table: &str) -> Value {
    let encoded = object
        .get(table)
        .and_then(|v| v.get("_object"))
        .and_then(Value::as_str)
        .expect("missing DataFrame payload");
    serde_json::from_str(encoded).unwrap()
}

#[test]
fn test_pandapower_export_structure() -> Result<()> {
    let network = build_sample_network();
    let temp_dir = TempDir::new()?;
    let output_file = temp_dir.path().join("network.json");
    let metadata = sample_metadata();
    export_alt_network_to_pandapower(&network, &output_file, Some(&metadata))?;
    let content = fs::read_to_string(&output_file)?;
    let parsed: Value = serde_json::from_str(&content)?;
    let object = parsed
        .get("_object")
        .and_then(Value::as_object)
        .expect("missing _object");
    assert_eq!(
        object
            .get("bus")
            .and_then(|v| v.get("_module"))
            .and_then(Value::as_str),
        Some("pandas.core.frame")
    );
    for table in ["line", "trafo", "ext_grid", "sgen", "asymmetric_load", "shunt"] {
        assert!(object.get(table).is_some(), "missing table {}", table);
    }
    assert_eq!(object.get("f_hz").and_then(Value::as_f64), Some(50.0));

    let meta = parsed
        .get("_meta")
        .and_then(Value::as_object)
        .expect("missing _meta");
    assert_eq!(
        meta.get("source").and_then(Value::as_str),
        Some("pp-sym-sym_load")
    );
    assert_eq!(
        meta.get("created_at").and_then(Value::as_str),
        Some("2024-03-01T12:00:00Z")
    );
    Ok(())
}

#[test]
fn test_pandapower_rows_follow_column_order() -> Result<()> {
    let network = build_sample_network();
    let payload = pandapower_net_value(&network, None)?;
    let object = payload["_object"].as_object().expect("missing _object");

    let load = frame(object, "load");
    assert_eq!(load["columns"][2], "p_mw");
    assert_eq!(load["columns"][9], "type");
    assert_eq!(load["index"], serde_json::json!([0]));
    assert_eq!(load["data"][0][2], 1.0);
    // missing rated power travels as null
    assert!(load["data"][0][6].is_null());
    assert_eq!(load["data"][0][9], "wye");

    let switch = frame(object, "switch");
    assert_eq!(switch["data"][0][3], "l");
    assert_eq!(switch["data"][0][4], false);

    let trafo = frame(object, "trafo");
    assert_eq!(trafo["data"], serde_json::json!([]));
    Ok(())
}

#[test]
fn test_pandapower_export_without_metadata() -> Result<()> {
    let network = build_sample_network();
    let temp_dir = TempDir::new()?;
    let output_file = temp_dir.path().join("network_plain.json");

    export_alt_network_to_pandapower(&network, &output_file, None)?;
    let content = fs::read_to_string(&output_file)?;
    let parsed: Value = serde_json::from_str(&content)?;

    assert!(parsed.get("_meta").is_none());
    Ok(())
}
