//! Topology analysis for both grid representations.
//!
//! Nodes (buses) are graph vertices and closed branches are edges. A node is
//! energized when its island contains an in-service source; the validator uses
//! this to warn about nodes a solver will report as de-energized.

use crate::alternate::AltNetwork;
use crate::{status_closed, ComponentId, Network};
use petgraph::graph::{NodeIndex, UnGraph};
use std::collections::{BTreeSet, HashMap, HashSet, VecDeque};

/// One connected group of nodes.
#[derive(Debug, Clone, PartialEq)]
pub struct Island {
    pub island_id: usize,
    /// Member nodes in ascending id order
    pub nodes: Vec<ComponentId>,
    pub has_source: bool,
}

/// Undirected graph of canonical nodes joined by fully closed branches.
pub struct Topology {
    pub graph: UnGraph<ComponentId, ComponentId>,
    pub index: HashMap<ComponentId, NodeIndex>,
}

impl Topology {
    pub fn from_network(network: &Network) -> Self {
        let mut graph = UnGraph::new_undirected();
        let mut index = HashMap::new();
        for node in &network.node {
            let idx = graph.add_node(node.id);
            index.insert(node.id, idx);
        }

        let branches = network
            .line
            .iter()
            .map(|l| (l.id, l.from_node, l.to_node, l.from_status, l.to_status))
            .chain(
                network
                    .transformer
                    .iter()
                    .map(|t| (t.id, t.from_node, t.to_node, t.from_status, t.to_status)),
            );
        for (id, from, to, from_status, to_status) in branches {
            if !(status_closed(from_status) && status_closed(to_status)) {
                continue;
            }
            if let (Some(a), Some(b)) = (index.get(&from), index.get(&to)) {
                graph.add_edge(*a, *b, id);
            }
        }

        Self { graph, index }
    }

    pub fn degree(&self, node: ComponentId) -> usize {
        self.index
            .get(&node)
            .map(|idx| self.graph.neighbors(*idx).count())
            .unwrap_or(0)
    }
}

/// Labels connected components (breadth-first search) of the canonical network.
pub fn find_islands(network: &Network) -> Vec<Island> {
    let topology = Topology::from_network(network);
    let source_nodes: HashSet<ComponentId> = network
        .source
        .iter()
        .filter(|s| status_closed(s.status))
        .map(|s| s.node)
        .collect();

    let mut visited = HashSet::new();
    let mut islands = Vec::new();
    for start in topology.graph.node_indices() {
        if visited.contains(&start) {
            continue;
        }
        let mut queue = VecDeque::new();
        queue.push_back(start);
        let mut members = Vec::new();
        while let Some(node) = queue.pop_front() {
            if !visited.insert(node) {
                continue;
            }
            members.push(topology.graph[node]);
            for neighbor in topology.graph.neighbors(node) {
                if !visited.contains(&neighbor) {
                    queue.push_back(neighbor);
                }
            }
        }
        members.sort();
        let has_source = members.iter().any(|id| source_nodes.contains(id));
        islands.push(Island {
            island_id: islands.len(),
            nodes: members,
            has_source,
        });
    }
    islands
}

/// Nodes reachable from an in-service source through closed branches.
pub fn energized_nodes(network: &Network) -> BTreeSet<ComponentId> {
    find_islands(network)
        .into_iter()
        .filter(|island| island.has_source)
        .flat_map(|island| island.nodes)
        .collect()
}

/// Bus rows of an alternate network reachable from an in-service external grid.
///
/// Branches must be in service and not cut by an open switch at either end.
pub fn energized_buses(network: &AltNetwork) -> BTreeSet<usize> {
    let mut graph: UnGraph<usize, ()> = UnGraph::new_undirected();
    let nodes: Vec<NodeIndex> = (0..network.bus.len()).map(|i| graph.add_node(i)).collect();

    for (row, line) in network.line.iter().enumerate() {
        if !line.in_service
            || network.line_end_open(row, line.from_bus)
            || network.line_end_open(row, line.to_bus)
        {
            continue;
        }
        if let (Some(a), Some(b)) = (nodes.get(line.from_bus), nodes.get(line.to_bus)) {
            graph.add_edge(*a, *b, ());
        }
    }
    for (row, trafo) in network.trafo.iter().enumerate() {
        if !trafo.in_service
            || network.trafo_end_open(row, trafo.hv_bus)
            || network.trafo_end_open(row, trafo.lv_bus)
        {
            continue;
        }
        if let (Some(a), Some(b)) = (nodes.get(trafo.hv_bus), nodes.get(trafo.lv_bus)) {
            graph.add_edge(*a, *b, ());
        }
    }

    let mut energized = BTreeSet::new();
    let mut queue: VecDeque<NodeIndex> = network
        .ext_grid
        .iter()
        .filter(|g| g.in_service)
        .filter_map(|g| nodes.get(g.bus).copied())
        .collect();
    while let Some(node) = queue.pop_front() {
        if !energized.insert(graph[node]) {
            continue;
        }
        for neighbor in graph.neighbors(node) {
            if !energized.contains(&graph[neighbor]) {
                queue.push_back(neighbor);
            }
        }
    }
    energized
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alternate::{BusRow, ExtGridRow, LineRow, SwitchRow};
    use crate::{Line, Node, Source};

    fn id(v: i32) -> ComponentId {
        ComponentId::new(v)
    }

    fn line(line_id: i32, from: i32, to: i32, to_status: i8) -> Line {
        Line {
            id: id(line_id),
            from_node: id(from),
            to_node: id(to),
            from_status: 1,
            to_status,
            r1: 0.1,
            x1: 0.1,
            c1: 0.0,
            tan1: 0.0,
            ..Line::default()
        }
    }

    #[test]
    fn islands_follow_closed_branches() {
        let mut network = Network::new();
        for n in 1..=4 {
            network.node.push(Node::new(id(n), 400.0));
        }
        network.line.push(line(10, 1, 2, 1));
        network.line.push(line(11, 2, 3, 0));
        network.source.push(Source::new(id(20), id(1), 1.0));

        let islands = find_islands(&network);
        assert_eq!(islands.len(), 3);
        assert_eq!(islands[0].nodes, vec![id(1), id(2)]);
        assert!(islands[0].has_source);
        assert!(!islands[1].has_source);

        let energized = energized_nodes(&network);
        assert!(energized.contains(&id(2)));
        assert!(!energized.contains(&id(3)));
        assert!(!energized.contains(&id(4)));

        let topology = Topology::from_network(&network);
        assert_eq!(topology.degree(id(2)), 1);
        assert_eq!(topology.degree(id(4)), 0);
    }

    #[test]
    fn out_of_service_source_energizes_nothing() {
        let mut network = Network::new();
        network.node.push(Node::new(id(1), 400.0));
        let mut source = Source::new(id(2), id(1), 1.0);
        source.status = 0;
        network.source.push(source);
        assert!(energized_nodes(&network).is_empty());
    }

    fn bus() -> BusRow {
        BusRow {
            name: String::new(),
            vn_kv: 0.4,
            in_service: true,
        }
    }

    fn alt_line(from_bus: usize, to_bus: usize) -> LineRow {
        LineRow {
            name: String::new(),
            from_bus,
            to_bus,
            length_km: 1.0,
            r_ohm_per_km: 0.1,
            x_ohm_per_km: 0.1,
            c_nf_per_km: 0.0,
            g_us_per_km: 0.0,
            r0_ohm_per_km: 0.1,
            x0_ohm_per_km: 0.1,
            c0_nf_per_km: 0.0,
            g0_us_per_km: 0.0,
            max_i_ka: 1e6,
            parallel: 1,
            df: 1.0,
            in_service: true,
        }
    }

    #[test]
    fn open_line_switch_cuts_energization() {
        let mut net = AltNetwork::default();
        for _ in 0..3 {
            net.add_bus(bus());
        }
        net.add_line(alt_line(0, 1));
        net.add_line(alt_line(1, 2));
        net.add_ext_grid(ExtGridRow {
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
        assert_eq!(energized_buses(&net).len(), 3);

        net.add_switch(SwitchRow {
            name: String::new(),
            bus: 2,
            element: 1,
            et: "l".into(),
            closed: false,
        });
        let energized = energized_buses(&net);
        assert!(energized.contains(&1));
        assert!(!energized.contains(&2));
    }
}
