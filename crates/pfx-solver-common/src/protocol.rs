//! JSON messages exchanged with solver shims.
//!
//! A shim reads exactly one request object from stdin and writes exactly one
//! response object to stdout. Both carry [`PROTOCOL_VERSION`]; a response
//! with a different version is rejected.
//!
//! Canonical engine:
//!
//! ```text
//! {"protocol_version": 1, "engine": "canonical",
//!  "params": {"symmetry": "symmetric", "method": "newton_raphson", ...},
//!  "input": {"node": [...], "line": [...], ...}}
//! -> {"protocol_version": 1, "data": {"node": [...], ...}}
//! ```
//!
//! Alternate engine:
//!
//! ```text
//! {"protocol_version": 1, "engine": "alternate",
//!  "options": {"symmetric": true, "algorithm": "nr", ...},
//!  "net": {"bus": [...], "line": [...], ...}}
//! -> {"protocol_version": 1, "tables": {"res_bus": {"columns": [...], "index": [...], "data": [...]}}}
//! ```

use crate::error::{SolverProcessError, SolverProcessResult};
use pfx_core::alternate::{AltNetwork, RawResultSet, RawTable};
use pfx_core::{AltSolverOptions, CalculationParams, CalculationSymmetry, Network, ResultSet};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Version of the exchange format. Increment on breaking changes.
pub const PROTOCOL_VERSION: u32 = 1;

#[derive(Debug, Serialize)]
pub struct CanonicalRequest<'a> {
    pub protocol_version: u32,
    pub engine: &'static str,
    pub params: &'a CalculationParams,
    pub input: &'a Network,
}

impl<'a> CanonicalRequest<'a> {
    pub fn new(network: &'a Network, params: &'a CalculationParams) -> Self {
        Self {
            protocol_version: PROTOCOL_VERSION,
            engine: "canonical",
            params,
            input: network,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CanonicalResponse {
    pub protocol_version: u32,
    /// Output records by category, as in a `sym_output`/`asym_output` dataset
    pub data: BTreeMap<String, Vec<serde_json::Value>>,
}

impl CanonicalResponse {
    pub fn into_result_set(self, symmetry: CalculationSymmetry) -> SolverProcessResult<ResultSet> {
        check_version(self.protocol_version)?;
        ResultSet::from_data(symmetry, self.data)
            .map_err(|e| SolverProcessError::Protocol(e.to_string()))
    }
}

#[derive(Debug, Serialize)]
pub struct AlternateRequest<'a> {
    pub protocol_version: u32,
    pub engine: &'static str,
    pub options: &'a AltSolverOptions,
    pub net: &'a AltNetwork,
}

impl<'a> AlternateRequest<'a> {
    pub fn new(net: &'a AltNetwork, options: &'a AltSolverOptions) -> Self {
        Self {
            protocol_version: PROTOCOL_VERSION,
            engine: "alternate",
            options,
            net,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct AlternateResponse {
    pub protocol_version: u32,
    /// Raw result tables keyed by result table name
    pub tables: BTreeMap<String, RawTable>,
}

impl AlternateResponse {
    pub fn into_raw_results(self) -> SolverProcessResult<RawResultSet> {
        check_version(self.protocol_version)?;
        for (name, table) in &self.tables {
            if table.index.len() != table.data.len() {
                return Err(SolverProcessError::Protocol(format!(
                    "table {} has {} index entries but {} data rows",
                    name,
                    table.index.len(),
                    table.data.len()
                )));
            }
            if let Some(row) = table.data.iter().find(|row| row.len() != table.columns.len()) {
                return Err(SolverProcessError::Protocol(format!(
                    "table {} has a row with {} values for {} columns",
                    name,
                    row.len(),
                    table.columns.len()
                )));
            }
        }
        Ok(RawResultSet {
            tables: self.tables,
        })
    }
}

fn check_version(version: u32) -> SolverProcessResult<()> {
    if version != PROTOCOL_VERSION {
        return Err(SolverProcessError::Protocol(format!(
            "protocol version {} is not supported (expected {})",
            version, PROTOCOL_VERSION
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pfx_core::{ComponentId, ComponentType, Node};
    use serde_json::json;

    #[test]
    fn canonical_request_shape() {
        let mut network = Network::new();
        network.node.push(Node::new(ComponentId::new(1), 400.0));
        let params = CalculationParams::new(CalculationSymmetry::Asymmetric);
        let value = serde_json::to_value(CanonicalRequest::new(&network, &params)).unwrap();
        assert_eq!(value["protocol_version"], 1);
        assert_eq!(value["engine"], "canonical");
        assert_eq!(value["params"]["symmetry"], "asymmetric");
        assert_eq!(value["params"]["method"], "newton_raphson");
        assert_eq!(value["input"]["node"][0]["u_rated"], 400.0);
    }

    #[test]
    fn canonical_response_becomes_result_set() {
        let response: CanonicalResponse = serde_json::from_value(json!({
            "protocol_version": 1,
            "data": {"node": [{"id": 1, "energized": 1, "u_pu": 1.0, "u": 400.0,
                               "u_angle": 0.0, "p": 0.0, "q": 0.0}]}
        }))
        .unwrap();
        let result = response
            .into_result_set(CalculationSymmetry::Symmetric)
            .unwrap();
        assert_eq!(result.ids(ComponentType::Node), vec![ComponentId::new(1)]);
    }

    #[test]
    fn alternate_response_is_checked() {
        let response: AlternateResponse = serde_json::from_value(json!({
            "protocol_version": 1,
            "tables": {"res_bus": {"columns": ["vm_pu", "va_degree"],
                                   "index": [0, 1],
                                   "data": [[1.0, 0.0], [null, null]]}}
        }))
        .unwrap();
        let raw = response.into_raw_results().unwrap();
        let view = raw.table("res_bus").unwrap().view();
        assert!(view.get(1, "vm_pu").unwrap().is_nan());

        let ragged: AlternateResponse = serde_json::from_value(json!({
            "protocol_version": 1,
            "tables": {"res_bus": {"columns": ["vm_pu"], "index": [0], "data": [[1.0, 2.0]]}}
        }))
        .unwrap();
        assert!(ragged.into_raw_results().is_err());
    }

    #[test]
    fn other_protocol_versions_are_rejected() {
        let response: AlternateResponse =
            serde_json::from_value(json!({"protocol_version": 2, "tables": {}})).unwrap();
        assert!(matches!(
            response.into_raw_results(),
            Err(SolverProcessError::Protocol(_))
        ));
    }
}
