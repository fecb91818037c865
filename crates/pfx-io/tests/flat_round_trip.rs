//! Translation and reconciliation checked end to end against the flat engines.

use pfx_core::alternate::{AltTable, RawResultSet};
use pfx_core::comparison::{compare_result_sets, ComparisonTolerance};
use pfx_core::{
    AltSolverOptions, AlternateSolver, AsymLoadGen, CalculationParams, CalculationSymmetry,
    CanonicalSolver, ComponentId, ComponentType, Line, LoadGenType, Network, Node, ResultSet,
    Shunt, Source, SymLoadGen, Transformer, WindingType,
};
use pfx_io::translate::{reconcile, translate, Translation};
use pfx_solver_common::{FlatAlternateSolver, FlatCanonicalSolver};
use serde_json::json;

fn id(value: i32) -> ComponentId {
    ComponentId::new(value)
}

/// Feeder with a transformer, a dead spur behind an open line end and every
/// symmetric appliance type.
fn feeder() -> Network {
    let mut network = Network::new();
    network.node.push(Node::new(id(1), 10.5e3));
    network.node.push(Node::new(id(2), 10.5e3));
    network.node.push(Node::new(id(3), 400.0));
    network.node.push(Node::new(id(11), 10.5e3));
    network.line.push(Line {
        id: id(4),
        from_node: id(1),
        to_node: id(2),
        r1: 0.1,
        x1: 0.2,
        c1: 1e-8,
        tan1: 0.0,
        i_n: 500.0,
        ..Line::default()
    });
    network.line.push(Line {
        id: id(13),
        from_node: id(2),
        to_node: id(11),
        to_status: 0,
        r1: 0.1,
        x1: 0.2,
        c1: 1e-8,
        tan1: 0.0,
        ..Line::default()
    });
    network.transformer.push(Transformer {
        id: id(5),
        from_node: id(2),
        to_node: id(3),
        u1: 10.5e3,
        u2: 400.0,
        sn: 1e6,
        uk: 0.06,
        pk: 1e4,
        i0: 0.01,
        p0: 1e3,
        winding_from: WindingType::Delta.code(),
        winding_to: WindingType::WyeN.code(),
        clock: 11,
        tap_side: 0,
        tap_pos: 0,
        tap_min: -2,
        tap_max: 2,
        tap_nom: 0,
        tap_size: 250.0,
        ..Transformer::default()
    });
    network.source.push(Source::new(id(6), id(1), 1.02));
    network.sym_load.push(SymLoadGen::new(id(7), id(3), LoadGenType::ConstPq, 1e5, 2e4));
    network.sym_load.push(SymLoadGen::new(id(8), id(3), LoadGenType::ConstI, 5e4, 1e4));
    network.sym_load.push(SymLoadGen::new(id(12), id(11), LoadGenType::ConstPq, 1e4, 0.0));
    network.sym_gen.push(SymLoadGen::new(id(9), id(2), LoadGenType::ConstPq, 3e4, 0.0));
    network.sym_gen.push(SymLoadGen::new(id(14), id(2), LoadGenType::ConstY, 2e4, 5e3));
    network.shunt.push(Shunt {
        id: id(10),
        node: id(2),
        g1: 1e-6,
        b1: 2e-6,
        g0: 0.0,
        b0: 0.0,
        ..Shunt::default()
    });
    network
}

fn unbalanced_node() -> Network {
    let mut network = Network::new();
    network.node.push(Node::new(id(1), 400.0));
    network.source.push(Source {
        sk: 1e20,
        ..Source::new(id(2), id(1), 1.0)
    });
    network.asym_load.push(AsymLoadGen::new(
        id(3),
        id(1),
        [1e4, 2e4, 3e4],
        [1e3, 0.0, 2e3],
    ));
    network.sym_load.push(SymLoadGen::new(id(4), id(1), LoadGenType::ConstPq, 3e4, 6e3));
    network
}

fn run_both(network: &Network, symmetry: CalculationSymmetry) -> (ResultSet, ResultSet, Translation) {
    let params = CalculationParams::new(symmetry);
    let canonical = FlatCanonicalSolver
        .calculate_power_flow(network, &params)
        .unwrap();

    let translation = translate(network, symmetry).unwrap();
    let options = AltSolverOptions::for_params(&params).unwrap();
    let raw: RawResultSet = FlatAlternateSolver
        .run_power_flow(&translation.network, &options)
        .unwrap();
    let alternate = reconcile(&raw, &translation).unwrap();
    (canonical, alternate, translation)
}

#[test]
fn symmetric_feeder_agrees() {
    let (canonical, alternate, _) = run_both(&feeder(), CalculationSymmetry::Symmetric);
    let report = compare_result_sets(&canonical, &alternate, &ComparisonTolerance::uniform(1e-8, 1e-6));
    assert!(report.is_match(), "{}", report.summary());
    assert!(report.compared_values > 0);

    // the spur behind the open line end is dead in both models
    let node = alternate.record(ComponentType::Node, id(11)).unwrap();
    assert_eq!(node.energized(), 0);
    let spur = alternate.record(ComponentType::Line, id(13)).unwrap();
    assert_eq!(spur.energized(), 1);
    assert!(spur.field("loading").unwrap().total().is_nan());
}

#[test]
fn reconciled_records_follow_input_order() {
    let (_, alternate, _) = run_both(&feeder(), CalculationSymmetry::Symmetric);
    assert_eq!(
        alternate.ids(ComponentType::SymLoad),
        vec![id(7), id(8), id(12)]
    );
    assert_eq!(alternate.ids(ComponentType::Node), vec![id(1), id(2), id(3), id(11)]);
}

#[test]
fn asymmetric_phases_are_regrouped() {
    let (canonical, alternate, translation) =
        run_both(&unbalanced_node(), CalculationSymmetry::Asymmetric);
    let report = compare_result_sets(&canonical, &alternate, &ComparisonTolerance::uniform(1e-8, 1e-6));
    assert!(report.is_match(), "{}", report.summary());

    let p = alternate
        .record(ComponentType::AsymLoad, id(3))
        .and_then(|r| r.field("p"))
        .unwrap();
    let values = p.values();
    assert_eq!(values.len(), 3);
    assert!((values[2] - 3e4).abs() < 1e-6);

    // the balanced load comes back from totals split over the phases
    let row = translation.index.get(ComponentType::SymLoad, id(4)).unwrap();
    assert_eq!(row.table, AltTable::Load);
    let p = alternate
        .record(ComponentType::SymLoad, id(4))
        .and_then(|r| r.field("p"))
        .unwrap();
    assert!(p.values().iter().all(|v| (v - 1e4).abs() < 1e-6));
}

#[test]
fn index_map_is_a_bijection() {
    let network = feeder();
    let translation = translate(&network, CalculationSymmetry::Symmetric).unwrap();
    translation
        .index
        .verify_bijection(&translation.network)
        .unwrap();

    let components: usize = network
        .present_types()
        .into_iter()
        .map(|category| network.ids(category).len())
        .sum();
    assert_eq!(translation.index.len(), components);
    // one switch for the open end of line 13
    assert_eq!(translation.index.auxiliary_len(), 1);
    assert_eq!(translation.network.switch.len(), 1);
    assert_eq!(translation.network.row_count(), components + 1);
}

#[test]
fn translation_is_deterministic() {
    let network = feeder();
    let first = translate(&network, CalculationSymmetry::Symmetric).unwrap();
    let second = translate(&network, CalculationSymmetry::Symmetric).unwrap();
    assert_eq!(first.network, second.network);
    assert_eq!(first.index, second.index);

    let mut reversed = network.clone();
    reversed.node.reverse();
    reversed.sym_load.reverse();
    let third = translate(&reversed, CalculationSymmetry::Symmetric).unwrap();
    assert_eq!(first.network, third.network);
}

#[test]
fn unsupported_category_is_rejected() {
    let mut network = feeder();
    network.opaque.insert(
        "link".to_string(),
        vec![json!({"id": 20, "from_node": 1, "to_node": 2})],
    );
    let err = translate(&network, CalculationSymmetry::Symmetric).unwrap_err();
    assert_eq!(err.category, "link");
    assert_eq!(err.id, Some(id(20)));
}
