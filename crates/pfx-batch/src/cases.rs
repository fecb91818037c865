//! Built-in synthetic cases.
//!
//! Each case exercises one component category on a small network. Cases that
//! use features an asymmetric calculation cannot translate (voltage-dependent
//! loads, vector groups without a zero-sequence model) have a dedicated
//! asymmetric variant. Every asymmetric case runs against a stiff source
//! (`sk = 1e20`) so that source impedance does not mask the component under
//! test.

use pfx_core::{
    AsymLoadGen, CalculationSymmetry, ComponentId, Line, LoadGenType, Network, Node, Shunt,
    Source, SymLoadGen, Transformer, WindingType,
};
use std::fmt;

/// Short-circuit power of the source in asymmetric cases (VA).
pub const ASYM_SOURCE_SK: f64 = 1e20;

const MV: f64 = 10.5e3;
const LV: f64 = 400.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BuiltinCase {
    BasicNode,
    Node,
    Line,
    SymLoad,
    SymGen,
    Source,
    Shunt,
    Transformer,
    AsymLoad,
    AsymGen,
}

impl BuiltinCase {
    pub const ALL: [BuiltinCase; 10] = [
        BuiltinCase::BasicNode,
        BuiltinCase::Node,
        BuiltinCase::Line,
        BuiltinCase::SymLoad,
        BuiltinCase::SymGen,
        BuiltinCase::Source,
        BuiltinCase::Shunt,
        BuiltinCase::Transformer,
        BuiltinCase::AsymLoad,
        BuiltinCase::AsymGen,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            BuiltinCase::BasicNode => "basic-node",
            BuiltinCase::Node => "node",
            BuiltinCase::Line => "line",
            BuiltinCase::SymLoad => "sym_load",
            BuiltinCase::SymGen => "sym_gen",
            BuiltinCase::Source => "source",
            BuiltinCase::Shunt => "shunt",
            BuiltinCase::Transformer => "transformer",
            BuiltinCase::AsymLoad => "asym_load",
            BuiltinCase::AsymGen => "asym_gen",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|case| case.name() == name)
    }

    /// Calculation modes the case is exported in.
    pub fn modes(&self) -> Vec<CalculationSymmetry> {
        match self {
            BuiltinCase::BasicNode => vec![CalculationSymmetry::Symmetric],
            BuiltinCase::AsymLoad | BuiltinCase::AsymGen => vec![CalculationSymmetry::Asymmetric],
            _ => CalculationSymmetry::ALL.to_vec(),
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            BuiltinCase::BasicNode => "single node with a source and one constant power load",
            BuiltinCase::Node => "nodes at two voltage levels including an isolated node",
            BuiltinCase::Line => "rated, unrated and half-open lines",
            BuiltinCase::SymLoad => "symmetric loads of every load type",
            BuiltinCase::SymGen => "symmetric generators of every load type",
            BuiltinCase::Source => "several sources, one out of service",
            BuiltinCase::Shunt => "shunts with conductance and susceptance",
            BuiltinCase::Transformer => "step-down, step-up and half-open transformers",
            BuiltinCase::AsymLoad => "unbalanced and balanced per-phase loads",
            BuiltinCase::AsymGen => "unbalanced and balanced per-phase generators",
        }
    }

    /// Synthesize the network for one calculation mode.
    pub fn network(&self, symmetry: CalculationSymmetry) -> Network {
        let asymmetric = !symmetry.is_symmetric();
        let mut network = match (self, asymmetric) {
            (BuiltinCase::BasicNode, _) => basic_node_case(),
            (BuiltinCase::Node, _) => node_case(),
            (BuiltinCase::Line, _) => line_case(),
            (BuiltinCase::SymLoad, false) => sym_load_case(),
            (BuiltinCase::SymLoad, true) => asymcalc_sym_load_case(),
            (BuiltinCase::SymGen, false) => sym_gen_case(),
            (BuiltinCase::SymGen, true) => asymcalc_sym_gen_case(),
            (BuiltinCase::Source, _) => source_case(),
            (BuiltinCase::Shunt, _) => shunt_case(),
            (BuiltinCase::Transformer, false) => transformer_case(),
            (BuiltinCase::Transformer, true) => asymcalc_transformer_case(),
            (BuiltinCase::AsymLoad, _) => asym_load_case(),
            (BuiltinCase::AsymGen, _) => asym_gen_case(),
        };
        if asymmetric {
            for source in &mut network.source {
                source.sk = ASYM_SOURCE_SK;
            }
        }
        network
    }
}

impl fmt::Display for BuiltinCase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

fn id(value: i32) -> ComponentId {
    ComponentId::new(value)
}

fn source(source_id: i32, node: i32) -> Source {
    Source {
        sk: 1e9,
        rx_ratio: 0.1,
        z01_ratio: 1.0,
        ..Source::new(id(source_id), id(node), 1.0)
    }
}

fn cable(line_id: i32, from: i32, to: i32) -> Line {
    Line {
        id: id(line_id),
        from_node: id(from),
        to_node: id(to),
        from_status: 1,
        to_status: 1,
        r1: 0.206,
        x1: 0.079,
        c1: 0.4e-6,
        tan1: 0.0,
        r0: 0.8,
        x0: 0.35,
        c0: 0.2e-6,
        tan0: 0.0,
        i_n: f64::NAN,
        ..Line::default()
    }
}

fn load(load_id: i32, node: i32, kind: LoadGenType, p: f64, q: f64) -> SymLoadGen {
    SymLoadGen::new(id(load_id), id(node), kind, p, q)
}

fn transformer(t_id: i32, from: i32, to: i32, u1: f64, u2: f64) -> Transformer {
    Transformer {
        id: id(t_id),
        from_node: id(from),
        to_node: id(to),
        from_status: 1,
        to_status: 1,
        u1,
        u2,
        sn: 1e6,
        uk: 0.06,
        pk: 1e4,
        i0: 0.015,
        p0: 1.5e3,
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
    }
}

pub fn basic_node_case() -> Network {
    let mut network = Network::new();
    network.node.push(Node::new(id(1), MV));
    network.source.push(source(2, 1));
    network
        .sym_load
        .push(load(3, 1, LoadGenType::ConstPq, 1e6, 2e5));
    network
}

pub fn node_case() -> Network {
    let mut network = Network::new();
    network.node.push(Node::new(id(1), MV));
    network.node.push(Node::new(id(2), MV));
    network.node.push(Node::new(id(3), LV));
    network.line.push(cable(4, 1, 2));
    network.source.push(source(5, 1));
    network
        .sym_load
        .push(load(6, 2, LoadGenType::ConstPq, 5e5, 1e5));
    network
}

pub fn line_case() -> Network {
    let mut network = Network::new();
    for node in 1..=4 {
        network.node.push(Node::new(id(node), MV));
    }
    network.source.push(source(5, 1));
    network.line.push(Line {
        i_n: 1000.0,
        ..cable(6, 1, 2)
    });
    network.line.push(Line {
        to_status: 0,
        i_n: 500.0,
        ..cable(7, 2, 3)
    });
    network.line.push(Line {
        tan1: 0.001,
        tan0: 0.001,
        ..cable(8, 1, 4)
    });
    network.line.push(Line {
        from_status: 0,
        to_status: 0,
        ..cable(9, 3, 4)
    });
    network
        .sym_load
        .push(load(10, 2, LoadGenType::ConstPq, 4e5, 1e5));
    network
        .sym_load
        .push(load(11, 3, LoadGenType::ConstPq, 2e5, 5e4));
    network
        .sym_load
        .push(load(12, 4, LoadGenType::ConstPq, 3e5, 0.0));
    network
}

pub fn sym_load_case() -> Network {
    let mut network = Network::new();
    network.node.push(Node::new(id(1), MV));
    network.node.push(Node::new(id(2), MV));
    network.line.push(cable(3, 1, 2));
    network.source.push(source(4, 1));
    network
        .sym_load
        .push(load(5, 2, LoadGenType::ConstPq, 5e5, 1e5));
    network
        .sym_load
        .push(load(6, 2, LoadGenType::ConstY, 4e5, 2e5));
    network
        .sym_load
        .push(load(7, 2, LoadGenType::ConstI, 3e5, -1e5));
    network.sym_load.push(SymLoadGen {
        status: 0,
        ..load(8, 2, LoadGenType::ConstPq, 1e6, 0.0)
    });
    network
}

pub fn asymcalc_sym_load_case() -> Network {
    let mut network = Network::new();
    network.node.push(Node::new(id(1), MV));
    network.node.push(Node::new(id(2), MV));
    network.line.push(cable(3, 1, 2));
    network.source.push(source(4, 1));
    network
        .sym_load
        .push(load(5, 2, LoadGenType::ConstPq, 5e5, 1e5));
    network
        .sym_load
        .push(load(6, 2, LoadGenType::ConstPq, 3e5, -1e5));
    network.sym_load.push(SymLoadGen {
        status: 0,
        ..load(7, 2, LoadGenType::ConstPq, 1e6, 0.0)
    });
    network
}

pub fn sym_gen_case() -> Network {
    let mut network = Network::new();
    network.node.push(Node::new(id(1), MV));
    network.node.push(Node::new(id(2), MV));
    network.line.push(cable(3, 1, 2));
    network.source.push(source(4, 1));
    network
        .sym_load
        .push(load(5, 2, LoadGenType::ConstPq, 1e6, 2e5));
    network
        .sym_gen
        .push(load(6, 2, LoadGenType::ConstPq, 3e5, 5e4));
    network
        .sym_gen
        .push(load(7, 2, LoadGenType::ConstY, 2e5, 0.0));
    network
        .sym_gen
        .push(load(8, 2, LoadGenType::ConstI, 1e5, -2e4));
    network.sym_gen.push(SymLoadGen {
        status: 0,
        ..load(9, 2, LoadGenType::ConstPq, 5e5, 0.0)
    });
    network
}

pub fn asymcalc_sym_gen_case() -> Network {
    let mut network = Network::new();
    network.node.push(Node::new(id(1), MV));
    network.node.push(Node::new(id(2), MV));
    network.line.push(cable(3, 1, 2));
    network.source.push(source(4, 1));
    network
        .sym_load
        .push(load(5, 2, LoadGenType::ConstPq, 1e6, 2e5));
    network
        .sym_gen
        .push(load(6, 2, LoadGenType::ConstPq, 3e5, 5e4));
    network.sym_gen.push(SymLoadGen {
        status: 0,
        ..load(7, 2, LoadGenType::ConstPq, 5e5, 0.0)
    });
    network
}

pub fn source_case() -> Network {
    let mut network = Network::new();
    network.node.push(Node::new(id(1), MV));
    network.node.push(Node::new(id(2), MV));
    network.line.push(cable(3, 1, 2));
    network.source.push(source(4, 1));
    network.source.push(Source {
        sk: 5e8,
        rx_ratio: 0.2,
        z01_ratio: 3.0,
        ..source(5, 2)
    });
    network.source.push(Source {
        status: 0,
        ..source(6, 2)
    });
    network
        .sym_load
        .push(load(7, 2, LoadGenType::ConstPq, 1e6, 3e5));
    network
}

pub fn shunt_case() -> Network {
    let mut network = Network::new();
    network.node.push(Node::new(id(1), MV));
    network.node.push(Node::new(id(2), MV));
    network.line.push(cable(3, 1, 2));
    network.source.push(source(4, 1));
    network.shunt.push(Shunt {
        id: id(5),
        node: id(2),
        status: 1,
        g1: 0.01,
        b1: -0.02,
        g0: 0.01,
        b0: -0.02,
        ..Shunt::default()
    });
    network.shunt.push(Shunt {
        id: id(6),
        node: id(2),
        status: 1,
        g1: 0.0,
        b1: 0.015,
        g0: 0.0,
        b0: 0.015,
        ..Shunt::default()
    });
    network.shunt.push(Shunt {
        id: id(7),
        node: id(2),
        status: 0,
        g1: 0.02,
        b1: 0.0,
        g0: 0.02,
        b0: 0.0,
        ..Shunt::default()
    });
    network
}

pub fn transformer_case() -> Network {
    let mut network = Network::new();
    network.node.push(Node::new(id(1), MV));
    network.node.push(Node::new(id(2), LV));
    network.node.push(Node::new(id(3), MV));
    network.node.push(Node::new(id(4), LV));
    network.source.push(source(5, 1));
    network.transformer.push(transformer(6, 1, 2, MV, LV));
    // step-up from the low voltage side, tap on the low voltage winding
    network.transformer.push(Transformer {
        winding_from: WindingType::Wye.code(),
        winding_to: WindingType::Delta.code(),
        clock: 1,
        tap_side: 0,
        tap_size: 10.0,
        ..transformer(7, 2, 3, LV, MV)
    });
    network.transformer.push(Transformer {
        to_status: 0,
        tap_pos: 1,
        ..transformer(8, 1, 4, MV, LV)
    });
    network
        .sym_load
        .push(load(9, 2, LoadGenType::ConstPq, 2e5, 5e4));
    network
        .sym_load
        .push(load(10, 3, LoadGenType::ConstPq, 1e5, 2e4));
    network
        .sym_load
        .push(load(11, 4, LoadGenType::ConstPq, 5e4, 0.0));
    network
}

/// Transformer case restricted to vector groups with a zero-sequence model.
pub fn asymcalc_transformer_case() -> Network {
    let mut network = transformer_case();
    if let Some(step_up) = network.transformer.iter_mut().find(|t| t.id == id(7)) {
        step_up.winding_from = WindingType::WyeN.code();
        step_up.winding_to = WindingType::WyeN.code();
        step_up.clock = 0;
    }
    if let Some(open) = network.transformer.iter_mut().find(|t| t.id == id(8)) {
        open.winding_from = WindingType::WyeN.code();
        open.winding_to = WindingType::Delta.code();
        open.clock = 1;
    }
    network
}

fn per_phase_case(generators: bool) -> Network {
    let mut network = Network::new();
    network.node.push(Node::new(id(1), LV));
    network.node.push(Node::new(id(2), LV));
    network.line.push(cable(3, 1, 2));
    network.source.push(source(4, 1));
    let appliances = vec![
        AsymLoadGen::new(id(5), id(2), [1e4, 2e4, 3e4], [2e3, 0.0, -1e3]),
        AsymLoadGen::new(id(6), id(2), [1.5e4; 3], [5e3; 3]),
        AsymLoadGen {
            status: 0,
            ..AsymLoadGen::new(id(7), id(2), [1e4, 0.0, 0.0], [0.0; 3])
        },
    ];
    if generators {
        network
            .sym_load
            .push(load(8, 2, LoadGenType::ConstPq, 9e4, 1e4));
        network.asym_gen = appliances;
    } else {
        network.asym_load = appliances;
    }
    network
}

pub fn asym_load_case() -> Network {
    per_phase_case(false)
}

pub fn asym_gen_case() -> Network {
    per_phase_case(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pfx_io::helpers::assert_valid_input;
    use pfx_io::translate::translate;

    #[test]
    fn names_round_trip() {
        for case in BuiltinCase::ALL {
            assert_eq!(BuiltinCase::from_name(case.name()), Some(case));
        }
        assert_eq!(BuiltinCase::from_name("link"), None);
    }

    #[test]
    fn mode_restrictions() {
        assert_eq!(BuiltinCase::BasicNode.modes(), vec![CalculationSymmetry::Symmetric]);
        assert_eq!(BuiltinCase::AsymGen.modes(), vec![CalculationSymmetry::Asymmetric]);
        assert_eq!(BuiltinCase::Transformer.modes().len(), 2);
    }

    #[test]
    fn every_case_validates_and_translates() {
        for case in BuiltinCase::ALL {
            for symmetry in case.modes() {
                let network = case.network(symmetry);
                assert_valid_input(&network, symmetry)
                    .unwrap_or_else(|e| panic!("{} ({}): {}", case, symmetry, e));
                translate(&network, symmetry)
                    .unwrap_or_else(|e| panic!("{} ({}): {}", case, symmetry, e));
            }
        }
    }

    #[test]
    fn asymmetric_variants() {
        let network = BuiltinCase::SymLoad.network(CalculationSymmetry::Asymmetric);
        assert!(network
            .sym_load
            .iter()
            .all(|l| l.kind() == Some(LoadGenType::ConstPq)));
        assert!(network.source.iter().all(|s| s.sk == ASYM_SOURCE_SK));

        let network = BuiltinCase::SymLoad.network(CalculationSymmetry::Symmetric);
        assert!(network.source.iter().all(|s| s.sk == 1e9));
    }
}
