//! Model-consistency validation of canonical networks.
//!
//! The checks mirror the input validation of the canonical engine so a case
//! that would be rejected there is rejected here first, with the offending
//! category, id and field named. Results are reported through the
//! [`Diagnostics`] collection from pfx-core; topology findings are warnings
//! only, since de-energized nodes are a legitimate calculation outcome.

use pfx_core::graph_utils::{find_islands, Topology};
use pfx_core::{
    status_closed, AsymLoadGen, BranchSide, CalculationSymmetry, ComponentId, ComponentType,
    DiagnosticIssue, Diagnostics, Line, LoadGenType, Network, Severity, Shunt, Source, SymLoadGen,
    Transformer, ValidationError, WindingType, NA_INT,
};
use std::collections::{HashMap, HashSet};
use tracing::{debug, warn};

/// Configuration for network validation behavior
#[derive(Debug, Clone, Default)]
pub struct ValidationConfig {
    /// Treat warnings as errors (strict mode)
    pub strict: bool,
    /// Skip topological checks (for partial networks)
    pub skip_topology: bool,
}

impl ValidationConfig {
    /// Create strict validation config
    pub fn strict() -> Self {
        Self {
            strict: true,
            ..Default::default()
        }
    }
}

/// Validate a network for the given calculation mode and populate
/// diagnostics with any issues found.
///
/// Phases:
/// - **Structure**: nodes present, category names known
/// - **Identifiers**: present and unique across all categories
/// - **Reference integrity**: node references resolve
/// - **Parameters**: per-category required fields and value ranges
/// - **Topology**: isolated nodes and islands without a source (warnings)
pub fn validate_network(
    network: &Network,
    symmetry: CalculationSymmetry,
    diag: &mut Diagnostics,
    config: &ValidationConfig,
) {
    // Phase 1: Structural validation
    if !validate_structure(network, diag) {
        return;
    }

    // Phase 2: Identifiers
    validate_ids(network, diag);

    // Phase 3: Reference integrity
    validate_references(network, diag);

    // Phase 4: Per-category parameters
    validate_parameters(network, symmetry, diag);

    // Phase 5: Topological validation (unless skipped)
    if !config.skip_topology {
        validate_topology(network, diag);
    }

    if config.strict {
        for issue in &mut diag.issues {
            issue.severity = Severity::Error;
        }
    }
}

/// Validate with the default configuration and fail on the first error set.
///
/// Warnings are logged and returned so callers can still report them.
pub fn assert_valid_input(
    network: &Network,
    symmetry: CalculationSymmetry,
) -> Result<Diagnostics, ValidationError> {
    let mut diag = Diagnostics::new();
    validate_network(network, symmetry, &mut diag, &ValidationConfig::default());
    for issue in diag.warnings() {
        warn!(%issue, "validation warning");
    }
    debug!(summary = %diag.summary(), "validated canonical input");
    diag.into_result()
}

/// Returns `false` when nothing further can be checked.
fn validate_structure(network: &Network, diag: &mut Diagnostics) -> bool {
    for (name, records) in &network.opaque {
        if ComponentType::from_name(name).is_none() {
            diag.add_error(name, None, "unknown component category");
        } else if records.iter().any(|r| !r.is_object()) {
            diag.add_error(name, None, "component records must be JSON objects");
        }
    }

    if network.node.is_empty() {
        diag.add_error("node", None, "network has no nodes");
        return false;
    }
    if network.source.is_empty() {
        diag.add_warning(
            "source",
            None,
            "network has no source; every node will be de-energized",
        );
    }
    true
}

fn validate_ids(network: &Network, diag: &mut Diagnostics) {
    let mut seen: HashMap<ComponentId, String> = HashMap::new();
    for component in network.references() {
        if component.id.is_na() {
            diag.add_field_error(&component.category, None, "id", "required field is missing");
            continue;
        }
        if let Some(first) = seen.get(&component.id) {
            diag.add_field_error(
                &component.category,
                Some(component.id),
                "id",
                &format!("id is not unique (also used by {} {})", first, component.id),
            );
        } else {
            seen.insert(component.id, component.category.clone());
        }
    }
}

fn validate_references(network: &Network, diag: &mut Diagnostics) {
    let nodes: HashSet<ComponentId> = network.node.iter().map(|n| n.id).collect();
    for component in network.references() {
        let id = (!component.id.is_na()).then_some(component.id);
        for (field, node) in &component.nodes {
            if node.is_na() {
                diag.add_field_error(&component.category, id, field, "required field is missing");
            } else if !nodes.contains(node) {
                diag.add_field_error(
                    &component.category,
                    id,
                    field,
                    &format!("refers to unknown node {}", node),
                );
            }
        }
    }

    let branch_ends = network
        .line
        .iter()
        .map(|l| ("line", l.id, l.from_node, l.to_node))
        .chain(
            network
                .transformer
                .iter()
                .map(|t| ("transformer", t.id, t.from_node, t.to_node)),
        );
    for (category, id, from, to) in branch_ends {
        if !from.is_na() && from == to {
            diag.add_field_error(category, Some(id), "to_node", "to_node must differ from from_node");
        }
    }
}

/// Range checks for one component, reporting under its category and id.
struct FieldCheck<'a> {
    diag: &'a mut Diagnostics,
    category: &'static str,
    id: Option<ComponentId>,
}

impl<'a> FieldCheck<'a> {
    fn new(diag: &'a mut Diagnostics, category: ComponentType, id: ComponentId) -> Self {
        Self {
            diag,
            category: category.as_str(),
            id: (!id.is_na()).then_some(id),
        }
    }

    fn error(&mut self, field: &str, message: &str) {
        self.diag.add(
            DiagnosticIssue::new(Severity::Error, self.category, message)
                .with_id(self.id)
                .with_field(field),
        );
    }

    fn required(&mut self, field: &str, value: f64) -> Option<f64> {
        if value.is_nan() {
            self.error(field, "required field is missing");
            None
        } else if !value.is_finite() {
            self.error(field, "value must be finite");
            None
        } else {
            Some(value)
        }
    }

    fn greater_than(&mut self, field: &str, value: f64, bound: f64) -> Option<f64> {
        let value = self.required(field, value)?;
        if value <= bound {
            self.error(field, &format!("must be greater than {} (got {})", bound, value));
        }
        Some(value)
    }

    fn greater_or_equal(&mut self, field: &str, value: f64, bound: f64) -> Option<f64> {
        let value = self.required(field, value)?;
        if value < bound {
            self.error(field, &format!("must be at least {} (got {})", bound, value));
        }
        Some(value)
    }

    /// Optional field: only checked when present.
    fn optional_greater_than(&mut self, field: &str, value: f64, bound: f64) {
        if !value.is_nan() {
            self.greater_than(field, value, bound);
        }
    }

    fn optional_greater_or_equal(&mut self, field: &str, value: f64, bound: f64) {
        if !value.is_nan() {
            self.greater_or_equal(field, value, bound);
        }
    }

    fn status(&mut self, field: &str, value: i8) {
        if value == NA_INT {
            self.error(field, "required field is missing");
        } else if value != 0 && value != 1 {
            self.error(field, &format!("must be 0 or 1 (got {})", value));
        }
    }

    fn enum_code(&mut self, field: &str, value: i8, valid: bool) {
        if value == NA_INT {
            self.error(field, "required field is missing");
        } else if !valid {
            self.error(field, &format!("invalid enum value {}", value));
        }
    }

    fn not_both_zero(&mut self, fields: [&str; 2], values: [f64; 2]) {
        if values[0] == 0.0 && values[1] == 0.0 {
            self.error(
                fields[0],
                &format!("{} and {} must not both be zero", fields[0], fields[1]),
            );
        }
    }
}

fn validate_parameters(network: &Network, symmetry: CalculationSymmetry, diag: &mut Diagnostics) {
    let asymmetric = !symmetry.is_symmetric();

    for node in &network.node {
        FieldCheck::new(diag, ComponentType::Node, node.id).greater_than("u_rated", node.u_rated, 0.0);
    }
    for line in &network.line {
        validate_line(line, asymmetric, diag);
    }
    for transformer in &network.transformer {
        validate_transformer(transformer, diag);
    }
    for source in &network.source {
        validate_source(source, diag);
    }
    for (category, appliances) in [
        (ComponentType::SymLoad, &network.sym_load),
        (ComponentType::SymGen, &network.sym_gen),
    ] {
        for appliance in appliances {
            validate_sym_appliance(category, appliance, diag);
        }
    }
    for (category, appliances) in [
        (ComponentType::AsymLoad, &network.asym_load),
        (ComponentType::AsymGen, &network.asym_gen),
    ] {
        for appliance in appliances {
            validate_asym_appliance(category, appliance, diag);
        }
    }
    for shunt in &network.shunt {
        validate_shunt(shunt, asymmetric, diag);
    }

    for (name, records) in &network.opaque {
        let Some(category) = ComponentType::from_name(name) else {
            continue;
        };
        for record in records {
            let id = record
                .get("id")
                .and_then(|v| v.as_i64())
                .and_then(|v| i32::try_from(v).ok())
                .map(ComponentId::new)
                .unwrap_or(ComponentId::new(pfx_core::NA_ID));
            let mut check = FieldCheck::new(diag, category, id);
            for field in ["status", "from_status", "to_status", "status_1", "status_2", "status_3"] {
                if let Some(value) = record.get(field).and_then(|v| v.as_i64()) {
                    if value != 0 && value != 1 {
                        check.error(field, &format!("must be 0 or 1 (got {})", value));
                    }
                }
            }
        }
    }
}

fn validate_line(line: &Line, asymmetric: bool, diag: &mut Diagnostics) {
    let mut check = FieldCheck::new(diag, ComponentType::Line, line.id);
    check.status("from_status", line.from_status);
    check.status("to_status", line.to_status);
    let r1 = check.required("r1", line.r1);
    let x1 = check.required("x1", line.x1);
    check.required("c1", line.c1);
    check.required("tan1", line.tan1);
    if let (Some(r1), Some(x1)) = (r1, x1) {
        check.not_both_zero(["r1", "x1"], [r1, x1]);
    }
    check.optional_greater_than("i_n", line.i_n, 0.0);

    if asymmetric {
        let r0 = check.required("r0", line.r0);
        let x0 = check.required("x0", line.x0);
        check.required("c0", line.c0);
        check.required("tan0", line.tan0);
        if let (Some(r0), Some(x0)) = (r0, x0) {
            check.not_both_zero(["r0", "x0"], [r0, x0]);
        }
    }
}

fn validate_transformer(t: &Transformer, diag: &mut Diagnostics) {
    let mut check = FieldCheck::new(diag, ComponentType::Transformer, t.id);
    check.status("from_status", t.from_status);
    check.status("to_status", t.to_status);
    check.greater_than("u1", t.u1, 0.0);
    check.greater_than("u2", t.u2, 0.0);
    let sn = check.greater_than("sn", t.sn, 0.0).filter(|sn| *sn > 0.0);

    let uk = check.required("uk", t.uk);
    if let Some(uk) = uk {
        if uk <= 0.0 || uk >= 1.0 {
            check.error("uk", &format!("must be between 0 and 1 (got {})", uk));
        }
    }
    let pk = check.greater_or_equal("pk", t.pk, 0.0);
    if let (Some(uk), Some(pk), Some(sn)) = (uk, pk, sn) {
        if uk < pk / sn {
            check.error("uk", "must be at least pk/sn");
        }
    }

    let i0 = check.greater_or_equal("i0", t.i0, 0.0);
    if let Some(i0) = i0 {
        if i0 >= 1.0 {
            check.error("i0", &format!("must be less than 1 (got {})", i0));
        }
    }
    let p0 = check.greater_or_equal("p0", t.p0, 0.0);
    if let (Some(i0), Some(p0), Some(sn)) = (i0, p0, sn) {
        if i0 < p0 / sn {
            check.error("i0", "must be at least p0/sn");
        }
    }

    check.enum_code(
        "winding_from",
        t.winding_from,
        WindingType::from_code(t.winding_from).is_some(),
    );
    check.enum_code(
        "winding_to",
        t.winding_to,
        WindingType::from_code(t.winding_to).is_some(),
    );
    check.enum_code("clock", t.clock, (0..=12).contains(&t.clock));
    check.enum_code(
        "tap_side",
        t.tap_side,
        BranchSide::from_code(t.tap_side).is_some(),
    );

    for (field, value) in [("tap_pos", t.tap_pos), ("tap_min", t.tap_min), ("tap_max", t.tap_max)] {
        if value == NA_INT {
            check.error(field, "required field is missing");
        }
    }
    if t.tap_min != NA_INT && t.tap_max != NA_INT {
        let (low, high) = if t.tap_min <= t.tap_max {
            (t.tap_min, t.tap_max)
        } else {
            (t.tap_max, t.tap_min)
        };
        if t.tap_pos != NA_INT && !(low..=high).contains(&t.tap_pos) {
            check.error("tap_pos", "must be between tap_min and tap_max");
        }
        if t.tap_nom != NA_INT && !(low..=high).contains(&t.tap_nom) {
            check.error("tap_nom", "must be between tap_min and tap_max");
        }
    }
    check.greater_or_equal("tap_size", t.tap_size, 0.0);
}

fn validate_source(source: &Source, diag: &mut Diagnostics) {
    let mut check = FieldCheck::new(diag, ComponentType::Source, source.id);
    check.status("status", source.status);
    check.greater_than("u_ref", source.u_ref, 0.0);
    check.optional_greater_than("sk", source.sk, 0.0);
    check.optional_greater_or_equal("rx_ratio", source.rx_ratio, 0.0);
    check.optional_greater_than("z01_ratio", source.z01_ratio, 0.0);
}

fn validate_sym_appliance(category: ComponentType, appliance: &SymLoadGen, diag: &mut Diagnostics) {
    let mut check = FieldCheck::new(diag, category, appliance.id);
    check.status("status", appliance.status);
    check.enum_code(
        "type",
        appliance.load_gen_type,
        LoadGenType::from_code(appliance.load_gen_type).is_some(),
    );
    check.required("p_specified", appliance.p_specified);
    check.required("q_specified", appliance.q_specified);
}

fn validate_asym_appliance(
    category: ComponentType,
    appliance: &AsymLoadGen,
    diag: &mut Diagnostics,
) {
    let mut check = FieldCheck::new(diag, category, appliance.id);
    check.status("status", appliance.status);
    check.enum_code(
        "type",
        appliance.load_gen_type,
        LoadGenType::from_code(appliance.load_gen_type).is_some(),
    );
    for (field, values) in [
        ("p_specified", appliance.p_specified),
        ("q_specified", appliance.q_specified),
    ] {
        if values.iter().any(|v| v.is_nan()) {
            check.error(field, "required field is missing for at least one phase");
        } else if values.iter().any(|v| !v.is_finite()) {
            check.error(field, "value must be finite");
        }
    }
}

fn validate_shunt(shunt: &Shunt, asymmetric: bool, diag: &mut Diagnostics) {
    let mut check = FieldCheck::new(diag, ComponentType::Shunt, shunt.id);
    check.status("status", shunt.status);
    check.required("g1", shunt.g1);
    check.required("b1", shunt.b1);
    if asymmetric {
        check.required("g0", shunt.g0);
        check.required("b0", shunt.b0);
    }
}

/// Islands without a source and isolated nodes; warnings only.
fn validate_topology(network: &Network, diag: &mut Diagnostics) {
    let topology = Topology::from_network(network);
    if network.node.len() > 1 {
        for node in &network.node {
            if topology.degree(node.id) == 0 {
                diag.add_warning("node", Some(node.id), "node is not connected to any closed branch");
            }
        }
    }

    let has_active_source = network.source.iter().any(|s| status_closed(s.status));
    if !has_active_source {
        return;
    }
    for island in find_islands(network) {
        if !island.has_source {
            let first = island.nodes.first().copied();
            diag.add_warning(
                "node",
                first,
                &format!(
                    "island of {} node{} has no source and will be de-energized",
                    island.nodes.len(),
                    if island.nodes.len() == 1 { "" } else { "s" }
                ),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pfx_core::Node;

    fn id(v: i32) -> ComponentId {
        ComponentId::new(v)
    }

    fn valid_network() -> Network {
        let mut network = Network::new();
        network.node.push(Node::new(id(1), 10.5e3));
        network.node.push(Node::new(id(2), 10.5e3));
        network.line.push(Line {
            id: id(3),
            from_node: id(1),
            to_node: id(2),
            from_status: 1,
            to_status: 1,
            r1: 0.25,
            x1: 0.2,
            c1: 1e-6,
            tan1: 0.0,
            ..Line::default()
        });
        network.source.push(Source {
            id: id(4),
            node: id(1),
            status: 1,
            u_ref: 1.0,
            ..Source::default()
        });
        network.sym_load.push(SymLoadGen::new(
            id(5),
            id(2),
            LoadGenType::ConstPq,
            1e6,
            2e5,
        ));
        network
    }

    fn transformer() -> Transformer {
        Transformer {
            id: id(6),
            from_node: id(1),
            to_node: id(2),
            from_status: 1,
            to_status: 1,
            u1: 10.5e3,
            u2: 0.4e3,
            sn: 1e6,
            uk: 0.1,
            pk: 1e3,
            i0: 0.01,
            p0: 100.0,
            winding_from: 2,
            winding_to: 1,
            clock: 11,
            tap_side: 0,
            tap_pos: 0,
            tap_min: -2,
            tap_max: 2,
            tap_nom: 0,
            tap_size: 100.0,
            ..Transformer::default()
        }
    }

    fn errors_for(network: &Network, symmetry: CalculationSymmetry) -> Vec<DiagnosticIssue> {
        let mut diag = Diagnostics::new();
        validate_network(network, symmetry, &mut diag, &ValidationConfig::default());
        diag.errors().cloned().collect()
    }

    #[test]
    fn valid_network_passes() {
        let diag = assert_valid_input(&valid_network(), CalculationSymmetry::Symmetric).unwrap();
        assert!(!diag.has_errors());
    }

    #[test]
    fn dangling_reference_names_component() {
        let mut network = valid_network();
        network.sym_load[0].node = id(99);
        let err = assert_valid_input(&network, CalculationSymmetry::Symmetric).unwrap_err();
        assert_eq!(err.category(), Some("sym_load"));
        assert_eq!(err.id(), Some(id(5)));
        assert!(err.to_string().contains("unknown node 99"));
    }

    #[test]
    fn ids_must_be_unique_across_categories() {
        let mut network = valid_network();
        network.sym_load[0].id = id(3);
        let errors = errors_for(&network, CalculationSymmetry::Symmetric);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].category, "sym_load");
        assert_eq!(errors[0].field.as_deref(), Some("id"));
    }

    #[test]
    fn line_impedance_and_rating_rules() {
        let mut network = valid_network();
        network.line[0].r1 = 0.0;
        network.line[0].x1 = 0.0;
        network.line[0].i_n = -1.0;
        let errors = errors_for(&network, CalculationSymmetry::Symmetric);
        let fields: Vec<_> = errors.iter().filter_map(|e| e.field.as_deref()).collect();
        assert!(fields.contains(&"r1"));
        assert!(fields.contains(&"i_n"));
    }

    #[test]
    fn asymmetric_mode_requires_zero_sequence() {
        let network = valid_network();
        assert!(errors_for(&network, CalculationSymmetry::Symmetric).is_empty());
        let errors = errors_for(&network, CalculationSymmetry::Asymmetric);
        let fields: Vec<_> = errors.iter().filter_map(|e| e.field.as_deref()).collect();
        assert_eq!(fields, vec!["r0", "x0", "c0", "tan0"]);
    }

    #[test]
    fn transformer_rules() {
        let mut network = valid_network();
        network.line.clear();
        network.transformer.push(transformer());
        assert!(errors_for(&network, CalculationSymmetry::Symmetric).is_empty());

        let mut bad = transformer();
        bad.uk = 0.0005;
        bad.clock = 13;
        bad.tap_pos = 5;
        bad.winding_to = 9;
        network.transformer[0] = bad;
        let errors = errors_for(&network, CalculationSymmetry::Symmetric);
        let fields: Vec<_> = errors.iter().filter_map(|e| e.field.as_deref()).collect();
        assert!(fields.contains(&"uk"));
        assert!(fields.contains(&"clock"));
        assert!(fields.contains(&"tap_pos"));
        assert!(fields.contains(&"winding_to"));
        assert!(errors.iter().all(|e| e.id == Some(id(6))));
    }

    #[test]
    fn reversed_tap_range_is_accepted() {
        let mut network = valid_network();
        network.line.clear();
        let mut t = transformer();
        t.tap_min = 2;
        t.tap_max = -2;
        t.tap_pos = -1;
        network.transformer.push(t);
        assert!(errors_for(&network, CalculationSymmetry::Symmetric).is_empty());
    }

    #[test]
    fn missing_required_fields_are_errors() {
        let mut network = valid_network();
        network.sym_load[0].load_gen_type = NA_INT;
        network.source[0].u_ref = f64::NAN;
        let errors = errors_for(&network, CalculationSymmetry::Symmetric);
        assert_eq!(errors.len(), 2);
        assert!(errors.iter().all(|e| e.message.contains("missing")));
    }

    #[test]
    fn unknown_category_is_rejected() {
        let mut network = valid_network();
        network
            .opaque
            .insert("bus".to_string(), vec![serde_json::json!({"id": 9})]);
        let err = assert_valid_input(&network, CalculationSymmetry::Symmetric).unwrap_err();
        assert_eq!(err.category(), Some("bus"));
    }

    #[test]
    fn topology_issues_are_warnings() {
        let mut network = valid_network();
        network.line[0].to_status = 0;
        network.node.push(Node::new(id(7), 400.0));
        let diag = assert_valid_input(&network, CalculationSymmetry::Symmetric).unwrap();
        assert!(diag.has_warnings());
        assert!(diag
            .warnings()
            .any(|w| w.id == Some(id(7)) && w.message.contains("not connected")));
        assert!(diag.warnings().any(|w| w.message.contains("no source")));
    }

    #[test]
    fn strict_mode_promotes_warnings() {
        let mut network = valid_network();
        network.node.push(Node::new(id(7), 400.0));
        let mut diag = Diagnostics::new();
        validate_network(
            &network,
            CalculationSymmetry::Symmetric,
            &mut diag,
            &ValidationConfig::strict(),
        );
        assert!(diag.has_errors());
        assert!(!diag.has_warnings());
    }
}
