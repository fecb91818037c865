//! Canonical JSON dataset reader.
//!
//! A dataset file is an envelope around the per-category records:
//!
//! ```json
//! {"version": "1.0", "type": "input", "is_batch": false, "attributes": {},
//!  "data": {"node": [{"id": 1, "u_rated": 10500.0}]}}
//! ```
//!
//! Only single (non-batch) datasets are supported. Values that are absent
//! from a record are read as missing (`NaN` / NA) and left for the validator.

use pfx_core::{CalculationSymmetry, Network, PfxError, PfxResult, ResultSet};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use tracing::debug;

/// Version string written to and expected in every dataset envelope.
pub const DATASET_VERSION: &str = "1.0";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetEnvelope {
    pub version: String,
    #[serde(rename = "type")]
    pub dataset_type: String,
    #[serde(default)]
    pub is_batch: bool,
    #[serde(default)]
    pub attributes: Map<String, Value>,
    pub data: Value,
}

impl DatasetEnvelope {
    pub fn new(dataset_type: impl Into<String>, data: Value) -> Self {
        Self {
            version: DATASET_VERSION.to_string(),
            dataset_type: dataset_type.into(),
            is_batch: false,
            attributes: Map::new(),
            data,
        }
    }

    fn parse(json: &str) -> PfxResult<Self> {
        let envelope: DatasetEnvelope = serde_json::from_str(json)?;
        if envelope.version != DATASET_VERSION {
            return Err(PfxError::Parse(format!(
                "unsupported dataset version '{}' (expected {})",
                envelope.version, DATASET_VERSION
            )));
        }
        if envelope.is_batch {
            return Err(PfxError::Parse(
                "batch datasets are not supported; export one scenario per case".to_string(),
            ));
        }
        Ok(envelope)
    }
}

/// Parse an `input` dataset into a canonical network.
pub fn parse_network(json: &str) -> PfxResult<Network> {
    let envelope = DatasetEnvelope::parse(json)?;
    if envelope.dataset_type != "input" {
        return Err(PfxError::Parse(format!(
            "expected an input dataset, found type '{}'",
            envelope.dataset_type
        )));
    }
    let network: Network = serde_json::from_value(envelope.data)?;
    debug!(stats = %network.stats(), "parsed canonical input");
    Ok(network)
}

pub fn load_network(path: impl AsRef<Path>) -> PfxResult<Network> {
    let path = path.as_ref();
    let json = fs::read_to_string(path)?;
    parse_network(&json).map_err(|err| match err {
        PfxError::Parse(message) => PfxError::Parse(format!("{}: {}", path.display(), message)),
        other => other,
    })
}

/// Parse a `sym_output` or `asym_output` dataset.
pub fn parse_result_set(json: &str) -> PfxResult<ResultSet> {
    let envelope = DatasetEnvelope::parse(json)?;
    let symmetry = CalculationSymmetry::from_output_type(&envelope.dataset_type).ok_or_else(|| {
        PfxError::Parse(format!(
            "expected sym_output or asym_output dataset, found type '{}'",
            envelope.dataset_type
        ))
    })?;
    let data: BTreeMap<String, Vec<Value>> = serde_json::from_value(envelope.data)?;
    ResultSet::from_data(symmetry, data)
}

pub fn load_result_set(path: impl AsRef<Path>) -> PfxResult<ResultSet> {
    let path = path.as_ref();
    let json = fs::read_to_string(path)?;
    parse_result_set(&json).map_err(|err| match err {
        PfxError::Parse(message) => PfxError::Parse(format!("{}: {}", path.display(), message)),
        other => other,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pfx_core::{ComponentId, ComponentType, OutputRecord, PhaseValue};

    const INPUT: &str = r#"{
        "version": "1.0",
        "type": "input",
        "is_batch": false,
        "attributes": {},
        "data": {
            "node": [{"id": 1, "u_rated": 10500.0}, {"id": 2, "u_rated": 10500.0}],
            "line": [{"id": 3, "from_node": 1, "to_node": 2, "from_status": 1, "to_status": 1,
                      "r1": 0.25, "x1": 0.2, "c1": 1e-6, "tan1": 0.0}],
            "source": [{"id": 4, "node": 1, "status": 1, "u_ref": 1.0}]
        }
    }"#;

    #[test]
    fn parses_input_dataset() {
        let network = parse_network(INPUT).unwrap();
        assert_eq!(network.node.len(), 2);
        assert_eq!(network.line[0].to_node, ComponentId::new(2));
        assert!(network.line[0].i_n.is_nan());
        assert!(network.source[0].sk.is_nan());
    }

    #[test]
    fn rejects_batch_and_wrong_types() {
        let batch = INPUT.replace("\"is_batch\": false", "\"is_batch\": true");
        assert!(matches!(parse_network(&batch), Err(PfxError::Parse(_))));

        let output = INPUT.replace("\"type\": \"input\"", "\"type\": \"sym_output\"");
        assert!(matches!(parse_network(&output), Err(PfxError::Parse(_))));

        let version = INPUT.replace("\"1.0\"", "\"2.0\"");
        assert!(matches!(parse_network(&version), Err(PfxError::Parse(_))));
    }

    #[test]
    fn parses_asymmetric_output_with_nulls() {
        let json = r#"{
            "version": "1.0",
            "type": "asym_output",
            "is_batch": false,
            "attributes": {},
            "data": {
                "node": [{"id": 1, "energized": 1,
                          "u_pu": [1.0, 1.0, 1.0],
                          "u": [6062.2, 6062.2, 6062.2],
                          "u_angle": [0.0, -2.0944, 2.0944],
                          "p": [1.0, 2.0, null],
                          "q": [0.0, 0.0, 0.0]}]
            }
        }"#;
        let result = parse_result_set(json).unwrap();
        assert_eq!(result.symmetry, CalculationSymmetry::Asymmetric);
        let record = result.record(ComponentType::Node, ComponentId::new(1)).unwrap();
        let OutputRecord::Node(node) = record else {
            panic!("expected node record");
        };
        let PhaseValue::PerPhase(p) = node.p else {
            panic!("expected per-phase value");
        };
        assert!(p[2].is_nan());
    }

    #[test]
    fn load_network_names_the_file_on_parse_errors() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.json");
        fs::write(&path, INPUT.replace("\"input\"", "\"update\"")).unwrap();
        let err = load_network(&path).unwrap_err();
        assert!(err.to_string().contains("broken.json"));
    }
}
