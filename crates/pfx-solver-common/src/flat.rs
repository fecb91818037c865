//! Flat-profile reference engines.
//!
//! Both engines skip the network equations: every energized node sits at the
//! reference voltage of the first live source with zero angle (per phase
//! `0, -120, 120` degrees), branches carry no flow and the sources cover the
//! total demand in equal shares. Appliance power still follows the voltage
//! dependence of its type. [`FlatCanonicalSolver`] computes this from the
//! canonical model and [`FlatAlternateSolver`] from the table model, so a
//! faithful translation and reconciliation makes both agree to rounding.
//! They exist to exercise the pipeline without external engines.

use pfx_core::alternate::{AltNetwork, RawResultSet, RawTable};
use pfx_core::graph_utils::{energized_buses, energized_nodes};
use pfx_core::{
    status_closed, AltSolverOptions, AlternateSolver, ApplianceOutput, BranchOutput,
    CalculationParams, CalculationSymmetry, CanonicalSolver, ComponentId, ComponentType,
    LoadGenType, Network, NodeOutput, OutputRecord, PhaseValue, ResultSet, SolverError,
};
use std::collections::{BTreeSet, HashMap};

const PHASES: [&str; 3] = ["a", "b", "c"];
const PHASE_ANGLES_DEG: [f64; 3] = [0.0, -120.0, 120.0];

fn spread(symmetry: CalculationSymmetry, total: f64) -> PhaseValue {
    PhaseValue::splat(symmetry, total / symmetry.phases() as f64)
}

fn per_phase(symmetry: CalculationSymmetry, values: [f64; 3]) -> PhaseValue {
    match symmetry {
        CalculationSymmetry::Symmetric => PhaseValue::Scalar(values.iter().sum()),
        CalculationSymmetry::Asymmetric => PhaseValue::PerPhase(values),
    }
}

fn add(a: PhaseValue, b: PhaseValue) -> PhaseValue {
    a.zip_with(b, |x, y| x + y)
}

fn phase_angles(symmetry: CalculationSymmetry) -> PhaseValue {
    match symmetry {
        CalculationSymmetry::Symmetric => PhaseValue::Scalar(0.0),
        CalculationSymmetry::Asymmetric => PhaseValue::PerPhase(PHASE_ANGLES_DEG),
    }
}

/// Running totals of power in one unit system.
struct PowerBook {
    symmetry: CalculationSymmetry,
    /// Consumption minus generation over all live appliances
    demand: (PhaseValue, PhaseValue),
    /// Net consumption per node or bus
    consumption: HashMap<usize, (PhaseValue, PhaseValue)>,
}

impl PowerBook {
    fn new(symmetry: CalculationSymmetry) -> Self {
        let zero = PhaseValue::zero(symmetry);
        Self {
            symmetry,
            demand: (zero, zero),
            consumption: HashMap::new(),
        }
    }

    fn consume(&mut self, at: usize, p: PhaseValue, q: PhaseValue) {
        let zero = PhaseValue::zero(self.symmetry);
        self.demand = (add(self.demand.0, p), add(self.demand.1, q));
        let entry = self.consumption.entry(at).or_insert((zero, zero));
        *entry = (add(entry.0, p), add(entry.1, q));
    }

    fn generate(&mut self, at: usize, p: PhaseValue, q: PhaseValue) {
        self.consume(at, p.map(|v| -v), q.map(|v| -v));
    }

    /// Equal share of the demand for each of `sources` live sources.
    fn share(&self, sources: usize) -> (PhaseValue, PhaseValue) {
        let n = sources.max(1) as f64;
        (self.demand.0.map(|v| v / n), self.demand.1.map(|v| v / n))
    }

    fn at(&self, at: usize) -> (PhaseValue, PhaseValue) {
        let zero = PhaseValue::zero(self.symmetry);
        self.consumption.get(&at).copied().unwrap_or((zero, zero))
    }
}

/// Canonical-model flat engine.
#[derive(Debug, Clone, Copy, Default)]
pub struct FlatCanonicalSolver;

impl FlatCanonicalSolver {
    fn voltage_factor(kind: Option<LoadGenType>, u_pu: f64) -> f64 {
        match kind {
            Some(LoadGenType::ConstY) => u_pu * u_pu,
            Some(LoadGenType::ConstI) => u_pu,
            _ => 1.0,
        }
    }

    fn appliance(
        id: ComponentId,
        live: bool,
        p: PhaseValue,
        q: PhaseValue,
        u: PhaseValue,
        symmetry: CalculationSymmetry,
    ) -> OutputRecord {
        let zero = PhaseValue::zero(symmetry);
        if !live {
            return OutputRecord::Appliance(ApplianceOutput {
                id,
                energized: 0,
                p: zero,
                q: zero,
                i: zero,
                s: zero,
                pf: zero,
            });
        }
        let s = p.zip_with(q, f64::hypot);
        let phase_factor = match symmetry {
            CalculationSymmetry::Symmetric => 3f64.sqrt(),
            CalculationSymmetry::Asymmetric => 1.0,
        };
        OutputRecord::Appliance(ApplianceOutput {
            id,
            energized: 1,
            p,
            q,
            i: s.zip_with(u, |s, u| if u == 0.0 { 0.0 } else { s / (phase_factor * u) }),
            s,
            pf: p.zip_with(s, |p, s| if s == 0.0 { 0.0 } else { p / s }),
        })
    }
}

impl CanonicalSolver for FlatCanonicalSolver {
    fn name(&self) -> &str {
        "flat"
    }

    fn calculate_power_flow(
        &self,
        network: &Network,
        params: &CalculationParams,
    ) -> Result<ResultSet, SolverError> {
        let symmetry = params.symmetry;
        let energized = energized_nodes(network);
        let u_pu = network
            .source
            .iter()
            .find(|s| status_closed(s.status) && energized.contains(&s.node))
            .map(|s| s.u_ref)
            .unwrap_or(1.0);

        // node slot and voltage magnitude (line-to-line or per phase line-to-neutral)
        let mut nodes: HashMap<ComponentId, (usize, PhaseValue)> = HashMap::new();
        for (slot, node) in network.node.iter().enumerate() {
            let u = match symmetry {
                CalculationSymmetry::Symmetric => u_pu * node.u_rated,
                CalculationSymmetry::Asymmetric => u_pu * node.u_rated / 3f64.sqrt(),
            };
            nodes.insert(node.id, (slot, PhaseValue::splat(symmetry, u)));
        }
        let zero = PhaseValue::zero(symmetry);
        let locate = |node: ComponentId| nodes.get(&node).copied().unwrap_or((usize::MAX, zero));
        let live = |status: i8, node: ComponentId| status_closed(status) && energized.contains(&node);

        let mut book = PowerBook::new(symmetry);
        let mut result = ResultSet::new(symmetry);

        for (category, appliances) in [
            (ComponentType::SymLoad, &network.sym_load),
            (ComponentType::SymGen, &network.sym_gen),
        ] {
            let mut records = Vec::new();
            for appliance in appliances {
                let (slot, u) = locate(appliance.node);
                let on = live(appliance.status, appliance.node);
                let factor = Self::voltage_factor(appliance.kind(), u_pu);
                let p = spread(symmetry, appliance.p_specified * factor);
                let q = spread(symmetry, appliance.q_specified * factor);
                if on {
                    if category == ComponentType::SymLoad {
                        book.consume(slot, p, q);
                    } else {
                        book.generate(slot, p, q);
                    }
                }
                records.push(Self::appliance(appliance.id, on, p, q, u, symmetry));
            }
            if !records.is_empty() {
                result.insert(category, records);
            }
        }

        for (category, appliances) in [
            (ComponentType::AsymLoad, &network.asym_load),
            (ComponentType::AsymGen, &network.asym_gen),
        ] {
            let mut records = Vec::new();
            for appliance in appliances {
                let (slot, u) = locate(appliance.node);
                let on = live(appliance.status, appliance.node);
                let factor = Self::voltage_factor(appliance.kind(), u_pu);
                let p = per_phase(symmetry, appliance.p_specified.map(|v| v * factor));
                let q = per_phase(symmetry, appliance.q_specified.map(|v| v * factor));
                if on {
                    if category == ComponentType::AsymLoad {
                        book.consume(slot, p, q);
                    } else {
                        book.generate(slot, p, q);
                    }
                }
                records.push(Self::appliance(appliance.id, on, p, q, u, symmetry));
            }
            if !records.is_empty() {
                result.insert(category, records);
            }
        }

        let mut shunts = Vec::new();
        for shunt in &network.shunt {
            let (slot, u) = locate(shunt.node);
            let on = live(shunt.status, shunt.node);
            let u_ll = network
                .find_node(shunt.node)
                .map(|n| u_pu * n.u_rated)
                .unwrap_or(0.0);
            let p = spread(symmetry, shunt.g1 * u_ll * u_ll);
            let q = spread(symmetry, -shunt.b1 * u_ll * u_ll);
            if on {
                book.consume(slot, p, q);
            }
            shunts.push(Self::appliance(shunt.id, on, p, q, u, symmetry));
        }
        if !shunts.is_empty() {
            result.insert(ComponentType::Shunt, shunts);
        }

        let live_sources = network
            .source
            .iter()
            .filter(|s| live(s.status, s.node))
            .count();
        let (share_p, share_q) = book.share(live_sources);
        let mut sources = Vec::new();
        for source in &network.source {
            let (slot, u) = locate(source.node);
            let on = live(source.status, source.node);
            if on {
                book.generate(slot, share_p, share_q);
            }
            sources.push(Self::appliance(source.id, on, share_p, share_q, u, symmetry));
        }
        if !sources.is_empty() {
            result.insert(ComponentType::Source, sources);
        }

        let mut node_records = Vec::new();
        for (slot, node) in network.node.iter().enumerate() {
            let record = if energized.contains(&node.id) {
                let (_, u) = locate(node.id);
                let (p, q) = book.at(slot);
                NodeOutput {
                    id: node.id,
                    energized: 1,
                    u_pu: PhaseValue::splat(symmetry, u_pu),
                    u,
                    u_angle: phase_angles(symmetry).map(f64::to_radians),
                    p: p.map(|v| -v),
                    q: q.map(|v| -v),
                }
            } else {
                NodeOutput {
                    id: node.id,
                    energized: 0,
                    u_pu: zero,
                    u: zero,
                    u_angle: zero,
                    p: zero,
                    q: zero,
                }
            };
            node_records.push(OutputRecord::Node(record));
        }
        if !node_records.is_empty() {
            result.insert(ComponentType::Node, node_records);
        }

        let branch = |id, from_status, from_node, to_status, to_node, rated: bool| {
            let on = live(from_status, from_node) || live(to_status, to_node);
            OutputRecord::Branch(BranchOutput {
                id,
                energized: i8::from(on),
                loading: if rated { 0.0 } else { f64::NAN },
                p_from: zero,
                q_from: zero,
                i_from: zero,
                s_from: zero,
                p_to: zero,
                q_to: zero,
                i_to: zero,
                s_to: zero,
            })
        };
        let lines: Vec<_> = network
            .line
            .iter()
            .map(|l| branch(l.id, l.from_status, l.from_node, l.to_status, l.to_node, l.i_n.is_finite()))
            .collect();
        if !lines.is_empty() {
            result.insert(ComponentType::Line, lines);
        }
        let transformers: Vec<_> = network
            .transformer
            .iter()
            .map(|t| branch(t.id, t.from_status, t.from_node, t.to_status, t.to_node, true))
            .collect();
        if !transformers.is_empty() {
            result.insert(ComponentType::Transformer, transformers);
        }

        Ok(result)
    }
}

/// Column names of a result table: per-phase quantities followed by scalars.
fn layout(symmetric: bool, quantities: &[(&str, &str)], scalars: &[&str]) -> Vec<String> {
    let mut columns = Vec::new();
    if symmetric {
        for (prefix, suffix) in quantities {
            columns.push(format!("{}_{}", prefix, suffix));
        }
    } else {
        for phase in PHASES {
            for (prefix, suffix) in quantities {
                columns.push(format!("{}_{}_{}", prefix, phase, suffix));
            }
        }
    }
    columns.extend(scalars.iter().map(|s| s.to_string()));
    columns
}

/// Row values in [`layout`] order.
fn row_values(symmetric: bool, phased: &[PhaseValue], scalars: &[f64]) -> Vec<f64> {
    let mut values = Vec::new();
    let phases = if symmetric { 1 } else { 3 };
    for phase in 0..phases {
        for value in phased {
            values.push(value.values().get(phase).copied().unwrap_or(f64::NAN));
        }
    }
    values.extend_from_slice(scalars);
    values
}

fn new_table(columns: &[String]) -> RawTable {
    let names: Vec<&str> = columns.iter().map(String::as_str).collect();
    RawTable::with_columns(&names)
}

/// Table-model flat engine.
#[derive(Debug, Clone, Copy, Default)]
pub struct FlatAlternateSolver;

impl AlternateSolver for FlatAlternateSolver {
    fn name(&self) -> &str {
        "flat"
    }

    fn run_power_flow(
        &self,
        network: &AltNetwork,
        options: &AltSolverOptions,
    ) -> Result<RawResultSet, SolverError> {
        let symmetric = options.symmetric;
        let symmetry = if symmetric {
            CalculationSymmetry::Symmetric
        } else {
            CalculationSymmetry::Asymmetric
        };
        let energized: BTreeSet<usize> = energized_buses(network);
        let live = |in_service: bool, bus: usize| in_service && energized.contains(&bus);
        let vm = network
            .ext_grid
            .iter()
            .find(|g| live(g.in_service, g.bus))
            .map(|g| g.vm_pu)
            .unwrap_or(1.0);
        let zero = PhaseValue::zero(symmetry);
        let mut book = PowerBook::new(symmetry);
        let mut raw = RawResultSet::new();
        let totals = layout(symmetric, &[], &["p_mw", "q_mvar"]);
        let phased_power = layout(symmetric, &[("p", "mw"), ("q", "mvar")], &[]);

        let mut loads = new_table(&totals);
        for (row, load) in network.load.iter().enumerate() {
            let (p, q) = if live(load.in_service, load.bus) {
                let z = load.const_z_percent / 100.0;
                let i = load.const_i_percent / 100.0;
                let factor = load.scaling * (z * vm * vm + i * vm + (1.0 - z - i));
                let p = spread(symmetry, load.p_mw * factor);
                let q = spread(symmetry, load.q_mvar * factor);
                book.consume(load.bus, p, q);
                (p, q)
            } else {
                (zero, zero)
            };
            loads.push(row, &row_values(symmetric, &[], &[p.total(), q.total()]));
        }
        raw.insert(table_name("load", symmetric), loads);

        let mut sgens = new_table(&totals);
        for (row, sgen) in network.sgen.iter().enumerate() {
            let (p, q) = if live(sgen.in_service, sgen.bus) {
                let p = spread(symmetry, sgen.p_mw * sgen.scaling);
                let q = spread(symmetry, sgen.q_mvar * sgen.scaling);
                book.generate(sgen.bus, p, q);
                (p, q)
            } else {
                (zero, zero)
            };
            sgens.push(row, &row_values(symmetric, &[], &[p.total(), q.total()]));
        }
        raw.insert(table_name("sgen", symmetric), sgens);

        for (name, rows, generating) in [
            ("asymmetric_load", &network.asymmetric_load, false),
            ("asymmetric_sgen", &network.asymmetric_sgen, true),
        ] {
            let mut table = new_table(&phased_power);
            for (row, element) in rows.iter().enumerate() {
                let (p, q) = if live(element.in_service, element.bus) {
                    let p = per_phase(symmetry, element.p_mw().map(|v| v * element.scaling));
                    let q = per_phase(symmetry, element.q_mvar().map(|v| v * element.scaling));
                    if generating {
                        book.generate(element.bus, p, q);
                    } else {
                        book.consume(element.bus, p, q);
                    }
                    (p, q)
                } else {
                    (zero, zero)
                };
                table.push(row, &row_values(symmetric, &[p, q], &[]));
            }
            raw.insert(table_name(name, symmetric), table);
        }

        let mut shunts = new_table(&totals);
        for (row, shunt) in network.shunt.iter().enumerate() {
            let (p, q) = if live(shunt.in_service, shunt.bus) {
                let steps = f64::from(shunt.step);
                let p = spread(symmetry, shunt.p_mw * steps * vm * vm);
                let q = spread(symmetry, shunt.q_mvar * steps * vm * vm);
                book.consume(shunt.bus, p, q);
                (p, q)
            } else {
                (zero, zero)
            };
            shunts.push(row, &row_values(symmetric, &[], &[p.total(), q.total()]));
        }
        raw.insert(table_name("shunt", symmetric), shunts);

        let live_grids = network
            .ext_grid
            .iter()
            .filter(|g| live(g.in_service, g.bus))
            .count();
        let (share_p, share_q) = book.share(live_grids);
        let mut grids = new_table(&phased_power);
        for (row, grid) in network.ext_grid.iter().enumerate() {
            let (p, q) = if live(grid.in_service, grid.bus) {
                book.generate(grid.bus, share_p, share_q);
                (share_p, share_q)
            } else {
                (zero, zero)
            };
            grids.push(row, &row_values(symmetric, &[p, q], &[]));
        }
        raw.insert(table_name("ext_grid", symmetric), grids);

        let mut buses = new_table(&layout(
            symmetric,
            &[("vm", "pu"), ("va", "degree"), ("p", "mw"), ("q", "mvar")],
            &[],
        ));
        for row in 0..network.bus.len() {
            let (vm, va) = if energized.contains(&row) {
                (PhaseValue::splat(symmetry, vm), phase_angles(symmetry))
            } else {
                (PhaseValue::nan(symmetry), PhaseValue::nan(symmetry))
            };
            let (p, q) = book.at(row);
            buses.push(row, &row_values(symmetric, &[vm, va, p, q], &[]));
        }
        raw.insert(table_name("bus", symmetric), buses);

        let branch_table = |from: &str, to: &str, ends: Vec<(usize, bool)>| {
            let p_from = format!("{}_mw", from);
            let q_from = format!("{}_mvar", from);
            let i_from = format!("{}_ka", from);
            let p_to = format!("{}_mw", to);
            let q_to = format!("{}_mvar", to);
            let i_to = format!("{}_ka", to);
            let mut table = new_table(&layout(
                symmetric,
                &[
                    ("p", p_from.as_str()),
                    ("q", q_from.as_str()),
                    ("i", i_from.as_str()),
                    ("p", p_to.as_str()),
                    ("q", q_to.as_str()),
                    ("i", i_to.as_str()),
                ],
                &["loading_percent"],
            ));
            for (row, on) in ends {
                let fill = if on { zero } else { PhaseValue::nan(symmetry) };
                let loading = if on { 0.0 } else { f64::NAN };
                table.push(row, &row_values(symmetric, &[fill; 6], &[loading]));
            }
            table
        };

        let line_ends: Vec<(usize, bool)> = network
            .line
            .iter()
            .enumerate()
            .map(|(row, line)| {
                let from = energized.contains(&line.from_bus) && !network.line_end_open(row, line.from_bus);
                let to = energized.contains(&line.to_bus) && !network.line_end_open(row, line.to_bus);
                (row, line.in_service && (from || to))
            })
            .collect();
        raw.insert(table_name("line", symmetric), branch_table("from", "to", line_ends));

        let trafo_ends: Vec<(usize, bool)> = network
            .trafo
            .iter()
            .enumerate()
            .map(|(row, trafo)| {
                let hv = energized.contains(&trafo.hv_bus) && !network.trafo_end_open(row, trafo.hv_bus);
                let lv = energized.contains(&trafo.lv_bus) && !network.trafo_end_open(row, trafo.lv_bus);
                (row, trafo.in_service && (hv || lv))
            })
            .collect();
        raw.insert(table_name("trafo", symmetric), branch_table("hv", "lv", trafo_ends));

        Ok(raw)
    }
}

fn table_name(table: &str, symmetric: bool) -> String {
    if symmetric {
        format!("res_{}", table)
    } else {
        format!("res_{}_3ph", table)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pfx_core::alternate::{BusRow, ExtGridRow, LoadRow};
    use pfx_core::{Node, Source, SymLoadGen};

    #[test]
    fn canonical_sources_cover_demand() {
        let mut network = Network::new();
        network.node.push(Node::new(ComponentId::new(1), 10e3));
        network
            .source
            .push(Source::new(ComponentId::new(2), ComponentId::new(1), 1.05));
        network.sym_load.push(SymLoadGen::new(
            ComponentId::new(3),
            ComponentId::new(1),
            LoadGenType::ConstY,
            1e6,
            0.0,
        ));
        let params = CalculationParams::new(CalculationSymmetry::Symmetric);
        let result = FlatCanonicalSolver
            .calculate_power_flow(&network, &params)
            .unwrap();

        let load_p = result
            .record(ComponentType::SymLoad, ComponentId::new(3))
            .and_then(|r| r.field("p"))
            .unwrap();
        assert!((load_p.total() - 1e6 * 1.05 * 1.05).abs() < 1e-6);
        let source_p = result
            .record(ComponentType::Source, ComponentId::new(2))
            .and_then(|r| r.field("p"))
            .unwrap();
        assert!((source_p.total() - load_p.total()).abs() < 1e-6);
        let node_p = result
            .record(ComponentType::Node, ComponentId::new(1))
            .and_then(|r| r.field("p"))
            .unwrap();
        assert!(node_p.total().abs() < 1e-6);
    }

    #[test]
    fn alternate_tables_have_phase_columns() {
        let mut network = AltNetwork::default();
        network.add_bus(BusRow {
            name: String::new(),
            vn_kv: 0.4,
            in_service: true,
        });
        network.add_bus(BusRow {
            name: String::new(),
            vn_kv: 0.4,
            in_service: true,
        });
        network.add_ext_grid(ExtGridRow {
            name: String::new(),
            bus: 0,
            vm_pu: 1.0,
            va_degree: 0.0,
            s_sc_max_mva: 1e4,
            rx_max: 0.1,
            r0x0_max: 0.1,
            x0x_max: 1.0,
            in_service: true,
        });
        network.add_load(LoadRow {
            name: String::new(),
            bus: 0,
            p_mw: 0.3,
            q_mvar: 0.0,
            const_z_percent: 0.0,
            const_i_percent: 0.0,
            sn_mva: None,
            scaling: 1.0,
            in_service: true,
            load_type: "wye".to_string(),
        });
        let params = CalculationParams::new(CalculationSymmetry::Asymmetric);
        let options = AltSolverOptions::for_params(&params).unwrap();
        let raw = FlatAlternateSolver.run_power_flow(&network, &options).unwrap();

        let bus = raw.table("res_bus_3ph").unwrap().view();
        assert_eq!(bus.get(0, "va_b_degree"), Some(-120.0));
        // bus 1 has no connection to the grid
        assert!(bus.get(1, "vm_a_pu").unwrap().is_nan());

        let grid = raw.table("res_ext_grid_3ph").unwrap().view();
        assert!((grid.get(0, "p_c_mw").unwrap() - 0.1).abs() < 1e-12);
        let load = raw.table("res_load_3ph").unwrap().view();
        assert!((load.get(0, "p_mw").unwrap() - 0.3).abs() < 1e-12);
    }
}
