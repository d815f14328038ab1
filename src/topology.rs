//! Node partition and adjacency projections of a connection set.
//!
//! [`GraphTopology`] keeps the `input_map` / `output_map` projections of a
//! genome's connections: for every node, the set of nodes with an edge into it
//! and the set of nodes it has an edge into. Both are rebuilt from the
//! connection map on construction, which keeps
//! `dst ∈ output_map[src] ⇔ src ∈ input_map[dst] ⇔ (src, dst) ∈ connections`
//! true by construction.
//!
//! ## Disabled edges
//!
//! The projections include disabled connections. The activation engine waits
//! on every predecessor regardless of its enabled flag, so the acyclicity
//! check here covers all connections, not only enabled ones.

use std::collections::{BTreeMap, BTreeSet, VecDeque};

use serde::{Deserialize, Serialize};

use crate::error::StructuralError;
use crate::gene::{ConnectionGene, ConnectionKey, NodeId, NodeKind};

/// Partition of a network's nodes into inputs, hidden nodes and outputs.
///
/// Order within each list is meaningful: inputs and outputs keep their
/// declaration order, which is the order [`NeuralNetwork::get_output`]
/// breaks ties in.
///
/// [`NeuralNetwork::get_output`]: crate::network::NeuralNetwork::get_output
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeSets {
    pub inputs: Vec<NodeId>,
    pub hidden: Vec<NodeId>,
    pub outputs: Vec<NodeId>,
}

impl NodeSets {
    /// Total number of declared nodes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inputs.len() + self.hidden.len() + self.outputs.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Every node with its kind, inputs first, then hidden, then outputs.
    pub fn iter(&self) -> impl Iterator<Item = (NodeId, NodeKind)> + '_ {
        let inputs = self.inputs.iter().map(|&id| (id, NodeKind::Input));
        let hidden = self.hidden.iter().map(|&id| (id, NodeKind::Hidden));
        let outputs = self.outputs.iter().map(|&id| (id, NodeKind::Output));
        inputs.chain(hidden).chain(outputs)
    }
}

/// Adjacency view of a network: node kinds plus predecessor and successor sets.
#[derive(Debug, Clone)]
pub struct GraphTopology {
    kinds: BTreeMap<NodeId, NodeKind>,
    input_map: BTreeMap<NodeId, BTreeSet<NodeId>>,
    output_map: BTreeMap<NodeId, BTreeSet<NodeId>>,
}

impl GraphTopology {
    /// Build the projections for `nodes` and `connections`.
    ///
    /// # Errors
    ///
    /// [`StructuralError::OverlappingNodeSets`] if a node is declared twice and
    /// [`StructuralError::DanglingConnection`] if a key names an undeclared node.
    pub fn build(
        nodes: &NodeSets,
        connections: &BTreeMap<ConnectionKey, ConnectionGene>,
    ) -> Result<Self, StructuralError> {
        let mut kinds = BTreeMap::new();
        let mut input_map = BTreeMap::new();
        let mut output_map = BTreeMap::new();

        for (id, kind) in nodes.iter() {
            if kinds.insert(id, kind).is_some() {
                return Err(StructuralError::OverlappingNodeSets(id));
            }
            input_map.insert(id, BTreeSet::new());
            output_map.insert(id, BTreeSet::new());
        }

        for key in connections.keys() {
            for endpoint in [key.source, key.destination] {
                if !kinds.contains_key(&endpoint) {
                    return Err(StructuralError::DanglingConnection {
                        key: *key,
                        missing: endpoint,
                    });
                }
            }
            if let Some(preds) = input_map.get_mut(&key.destination) {
                preds.insert(key.source);
            }
            if let Some(succs) = output_map.get_mut(&key.source) {
                succs.insert(key.destination);
            }
        }

        Ok(Self {
            kinds,
            input_map,
            output_map,
        })
    }

    /// Number of declared nodes.
    #[inline]
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.kinds.len()
    }

    #[inline]
    #[must_use]
    pub fn contains(&self, id: NodeId) -> bool {
        self.kinds.contains_key(&id)
    }

    #[inline]
    #[must_use]
    pub fn kind(&self, id: NodeId) -> Option<NodeKind> {
        self.kinds.get(&id).copied()
    }

    /// All node ids in ascending order.
    pub fn node_ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.kinds.keys().copied()
    }

    /// Nodes with an edge into `id`, ascending.
    pub fn predecessors(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.input_map.get(&id).into_iter().flatten().copied()
    }

    /// Nodes `id` has an edge into, ascending.
    pub fn successors(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.output_map.get(&id).into_iter().flatten().copied()
    }

    /// Number of distinct predecessors of `id`.
    #[inline]
    #[must_use]
    pub fn in_degree(&self, id: NodeId) -> usize {
        self.input_map.get(&id).map_or(0, BTreeSet::len)
    }

    /// The `input_map` projection.
    #[must_use]
    pub fn input_map(&self) -> &BTreeMap<NodeId, BTreeSet<NodeId>> {
        &self.input_map
    }

    /// The `output_map` projection.
    #[must_use]
    pub fn output_map(&self) -> &BTreeMap<NodeId, BTreeSet<NodeId>> {
        &self.output_map
    }

    /// Nodes in dependency order, using Kahn's algorithm.
    ///
    /// Ties are broken by ascending node id.
    ///
    /// # Errors
    ///
    /// [`StructuralError::Cycle`] when some nodes can never be reached with
    /// all of their predecessors resolved.
    pub fn topological_order(&self) -> Result<Vec<NodeId>, StructuralError> {
        let mut in_degree: BTreeMap<NodeId, usize> = self
            .input_map
            .iter()
            .map(|(&id, preds)| (id, preds.len()))
            .collect();

        let mut queue: VecDeque<NodeId> = in_degree
            .iter()
            .filter(|(_, &deg)| deg == 0)
            .map(|(&id, _)| id)
            .collect();

        let mut order = Vec::with_capacity(self.node_count());
        while let Some(u) = queue.pop_front() {
            order.push(u);
            for v in self.successors(u) {
                if let Some(deg) = in_degree.get_mut(&v) {
                    *deg -= 1;
                    if *deg == 0 {
                        queue.push_back(v);
                    }
                }
            }
        }

        if order.len() == self.node_count() {
            Ok(order)
        } else {
            Err(StructuralError::Cycle {
                unresolved: self.node_count() - order.len(),
            })
        }
    }

    /// Whether the graph contains a cycle.
    #[must_use]
    pub fn has_cycle(&self) -> bool {
        self.topological_order().is_err()
    }

    /// Whether adding `source -> destination` would close a cycle.
    ///
    /// True when `destination` already reaches `source`, or for a self-loop.
    #[must_use]
    pub fn would_create_cycle(&self, source: NodeId, destination: NodeId) -> bool {
        if source == destination {
            return true;
        }

        let mut visited = BTreeSet::new();
        let mut queue = VecDeque::from([destination]);
        visited.insert(destination);

        while let Some(current) = queue.pop_front() {
            for succ in self.successors(current) {
                if succ == source {
                    return true;
                }
                if visited.insert(succ) {
                    queue.push_back(succ);
                }
            }
        }

        false
    }
}
