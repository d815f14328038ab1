//! Data-flow activation engine.
//!
//! [`NeuralNetwork`] evaluates an arbitrary acyclic graph of nodes and weighted
//! connections. There are no layers: every node keeps a countdown of
//! predecessors that have not fired yet, and enters a ready queue when the
//! countdown reaches zero. A node's activation is the configured squashing
//! function of the weighted sum over its enabled incoming connections.
//!
//! ## Scheduling
//!
//! The countdown counts *distinct* predecessors, enabled or not. Disabling a
//! connection removes its term from the sum but the destination still waits
//! for the source to fire.
//!
//! ## Determinism
//!
//! Predecessors are summed in ascending node id order, so repeated calls with
//! the same inputs give bit-identical results regardless of queue order.

use std::collections::{BTreeMap, VecDeque};

use rand::Rng;
use tracing::trace;

use crate::config::{NetworkConfig, UnsuppliedSource};
use crate::error::StructuralError;
use crate::gene::{ConnectionGene, ConnectionKey, NodeId};
use crate::topology::{GraphTopology, NodeSets};

/// A validated, evaluation-ready network.
#[derive(Debug, Clone)]
pub struct NeuralNetwork {
    nodes: NodeSets,
    connections: BTreeMap<ConnectionKey, ConnectionGene>,
    topology: GraphTopology,
    config: NetworkConfig,
}

impl NeuralNetwork {
    /// Build a network with the default [`NetworkConfig`].
    ///
    /// # Errors
    ///
    /// See [`with_config`](Self::with_config).
    pub fn new(
        nodes: NodeSets,
        connections: BTreeMap<ConnectionKey, ConnectionGene>,
    ) -> Result<Self, StructuralError> {
        Self::with_config(nodes, connections, NetworkConfig::default())
    }

    /// Build a network, validating its structure up front.
    ///
    /// # Errors
    ///
    /// - [`StructuralError::OverlappingNodeSets`] if a node is declared twice
    /// - [`StructuralError::DanglingConnection`] if a connection names an undeclared node
    /// - [`StructuralError::Cycle`] if the connections are not acyclic
    pub fn with_config(
        nodes: NodeSets,
        connections: BTreeMap<ConnectionKey, ConnectionGene>,
        config: NetworkConfig,
    ) -> Result<Self, StructuralError> {
        let topology = GraphTopology::build(&nodes, &connections)?;
        topology.topological_order()?;

        Ok(Self {
            nodes,
            connections,
            topology,
            config,
        })
    }

    /// A fully connected input→output network with uniform random weights.
    ///
    /// Inputs are numbered `1..=num_inputs` and outputs follow them.
    ///
    /// # Panics
    ///
    /// Panics if `weight_range` is negative or not finite.
    #[must_use]
    pub fn random_simple<R: Rng>(
        num_inputs: usize,
        num_outputs: usize,
        weight_range: f32,
        rng: &mut R,
    ) -> Self {
        assert!(
            weight_range.is_finite() && weight_range >= 0.0,
            "weight_range must be finite and non-negative, got {weight_range}"
        );
        let first_output = num_inputs as u64 + 1;
        let nodes = NodeSets {
            inputs: (1..first_output).map(NodeId).collect(),
            hidden: Vec::new(),
            outputs: (first_output..first_output + num_outputs as u64)
                .map(NodeId)
                .collect(),
        };

        let mut connections = BTreeMap::new();
        for &input in &nodes.inputs {
            for &output in &nodes.outputs {
                let weight = rng.random_range(-weight_range..=weight_range);
                connections.insert(ConnectionKey::new(input, output), ConnectionGene::new(weight));
            }
        }

        let topology = GraphTopology::build(&nodes, &connections)
            .expect("bipartite construction only references declared nodes");

        Self {
            nodes,
            connections,
            topology,
            config: NetworkConfig::default(),
        }
    }

    #[must_use]
    pub fn nodes(&self) -> &NodeSets {
        &self.nodes
    }

    #[must_use]
    pub fn connections(&self) -> &BTreeMap<ConnectionKey, ConnectionGene> {
        &self.connections
    }

    #[must_use]
    pub fn topology(&self) -> &GraphTopology {
        &self.topology
    }

    #[must_use]
    pub fn config(&self) -> NetworkConfig {
        self.config
    }

    /// Propagate `inputs` through the network.
    ///
    /// Supplied nodes take their supplied value directly. Every other node
    /// fires once all of its predecessors have fired. The result holds an
    /// activation for every declared node.
    ///
    /// # Errors
    ///
    /// - [`StructuralError::UnknownNode`] if `inputs` names an undeclared node
    /// - [`StructuralError::MissingInput`] if a source node is unsupplied under
    ///   [`UnsuppliedSource::Reject`]
    /// - [`StructuralError::Stalled`] if the ready queue drains early
    pub fn activate(
        &self,
        inputs: &BTreeMap<NodeId, f32>,
    ) -> Result<BTreeMap<NodeId, f32>, StructuralError> {
        let total = self.topology.node_count();
        let mut pending: BTreeMap<NodeId, usize> = self
            .topology
            .node_ids()
            .map(|id| (id, self.topology.in_degree(id)))
            .collect();
        let mut ready = VecDeque::with_capacity(total);
        let mut activation = BTreeMap::new();

        for &id in inputs.keys() {
            if !self.topology.contains(id) {
                return Err(StructuralError::UnknownNode(id));
            }
            ready.push_back(id);
        }

        for (id, _) in self.nodes.iter() {
            if self.topology.in_degree(id) > 0 || inputs.contains_key(&id) {
                continue;
            }
            match self.config.unsupplied_source {
                UnsuppliedSource::SigmoidOfEmptySum => ready.push_back(id),
                UnsuppliedSource::Reject => return Err(StructuralError::MissingInput(id)),
            }
        }

        while let Some(node) = ready.pop_front() {
            // A supplied node with predecessors is queued twice.
            if activation.contains_key(&node) {
                continue;
            }

            let value = match inputs.get(&node) {
                Some(&value) => value,
                None if self.topology.in_degree(node) == 0 => self.config.activation.at_rest(),
                None => self.config.activation.apply(self.weighted_sum(node, &activation)),
            };
            activation.insert(node, value);

            for succ in self.topology.successors(node) {
                if let Some(count) = pending.get_mut(&succ) {
                    *count = count.saturating_sub(1);
                    if *count == 0 {
                        ready.push_back(succ);
                    }
                }
            }
        }

        if activation.len() < total {
            return Err(StructuralError::Stalled {
                activated: activation.len(),
                total,
            });
        }

        trace!(nodes = total, "network activated");
        Ok(activation)
    }

    /// Index of the output node with the highest activation.
    ///
    /// Ties go to the output declared first. Returns `None` only for a network
    /// without outputs.
    ///
    /// # Errors
    ///
    /// Whatever [`activate`](Self::activate) reports.
    pub fn get_output(
        &self,
        inputs: &BTreeMap<NodeId, f32>,
    ) -> Result<Option<NodeId>, StructuralError> {
        let activation = self.activate(inputs)?;

        let mut best: Option<(NodeId, f32)> = None;
        for &id in &self.nodes.outputs {
            let Some(&value) = activation.get(&id) else {
                continue;
            };
            if best.is_none_or(|(_, max)| value > max) {
                best = Some((id, value));
            }
        }

        Ok(best.map(|(id, _)| id))
    }

    /// Positional convenience over [`activate`](Self::activate): `values[i]`
    /// feeds the i-th declared input, and the result lists outputs in
    /// declaration order.
    ///
    /// # Errors
    ///
    /// Whatever [`activate`](Self::activate) reports.
    ///
    /// # Panics
    ///
    /// Panics if `values.len()` differs from the number of inputs.
    pub fn evaluate(&self, values: &[f32]) -> Result<Vec<f32>, StructuralError> {
        assert_eq!(
            values.len(),
            self.nodes.inputs.len(),
            "Input length mismatch: expected {}, got {}",
            self.nodes.inputs.len(),
            values.len()
        );

        let inputs: BTreeMap<NodeId, f32> = self
            .nodes
            .inputs
            .iter()
            .copied()
            .zip(values.iter().copied())
            .collect();
        let activation = self.activate(&inputs)?;

        Ok(self
            .nodes
            .outputs
            .iter()
            .map(|id| activation.get(id).copied().unwrap_or(f32::NAN))
            .collect())
    }

    fn weighted_sum(&self, node: NodeId, activation: &BTreeMap<NodeId, f32>) -> f32 {
        let mut sum = 0.0;
        for pred in self.topology.predecessors(node) {
            let key = ConnectionKey {
                source: pred,
                destination: node,
            };
            if let (Some(conn), Some(&value)) = (self.connections.get(&key), activation.get(&pred))
            {
                if conn.enabled {
                    sum += value * conn.weight;
                }
            }
        }
        sum
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::activation::{sigmoid, Activation};
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn test_rng() -> ChaCha8Rng {
        ChaCha8Rng::seed_from_u64(42)
    }

    fn ids(raw: &[u64]) -> Vec<NodeId> {
        raw.iter().copied().map(NodeId).collect()
    }

    fn inputs(pairs: &[(u64, f32)]) -> BTreeMap<NodeId, f32> {
        pairs.iter().map(|&(id, v)| (NodeId(id), v)).collect()
    }

    fn two_in_one_out(w13: f32, w23: f32) -> NeuralNetwork {
        let nodes = NodeSets {
            inputs: ids(&[1, 2]),
            hidden: vec![],
            outputs: ids(&[3]),
        };
        let connections = BTreeMap::from([
            (ConnectionKey::new(1, 3), ConnectionGene::new(w13)),
            (ConnectionKey::new(2, 3), ConnectionGene::new(w23)),
        ]);
        NeuralNetwork::new(nodes, connections).unwrap()
    }

    #[test]
    fn test_activate_simple_example() {
        let net = two_in_one_out(1.0, -1.0);
        let act = net.activate(&inputs(&[(1, 1.0), (2, 0.0)])).unwrap();

        assert!((act[&NodeId(3)] - 0.731_058_6).abs() < 1e-5);
        assert!((act[&NodeId(1)] - 1.0).abs() < 1e-6);
        assert!(act[&NodeId(2)].abs() < 1e-6);
    }

    #[test]
    fn test_irregular_topology_waits_for_all_predecessors() {
        // 1 -> 4 -> 5 -> 3, plus skip connections 1 -> 5 and 2 -> 3
        let nodes = NodeSets {
            inputs: ids(&[1, 2]),
            hidden: ids(&[4, 5]),
            outputs: ids(&[3]),
        };
        let connections = BTreeMap::from([
            (ConnectionKey::new(1, 4), ConnectionGene::new(0.5)),
            (ConnectionKey::new(4, 5), ConnectionGene::new(-0.7)),
            (ConnectionKey::new(1, 5), ConnectionGene::new(0.3)),
            (ConnectionKey::new(5, 3), ConnectionGene::new(1.2)),
            (ConnectionKey::new(2, 3), ConnectionGene::new(0.9)),
        ]);
        let net = NeuralNetwork::new(nodes, connections).unwrap();
        let act = net.activate(&inputs(&[(1, 1.0), (2, -1.0)])).unwrap();

        let h4 = sigmoid(0.5);
        let h5 = sigmoid(h4 * -0.7 + 0.3);
        let out = sigmoid(h5 * 1.2 - 0.9);
        assert!((act[&NodeId(4)] - h4).abs() < 1e-6);
        assert!((act[&NodeId(5)] - h5).abs() < 1e-6);
        assert!((act[&NodeId(3)] - out).abs() < 1e-6);
    }

    #[test]
    fn test_all_disabled_gives_sigmoid_of_zero() {
        let nodes = NodeSets {
            inputs: ids(&[1, 2]),
            hidden: ids(&[4]),
            outputs: ids(&[3]),
        };
        let connections = BTreeMap::from([
            (ConnectionKey::new(1, 4), ConnectionGene::disabled(2.0)),
            (ConnectionKey::new(4, 3), ConnectionGene::disabled(-3.0)),
            (ConnectionKey::new(2, 3), ConnectionGene::disabled(1.5)),
        ]);
        let net = NeuralNetwork::new(nodes, connections).unwrap();
        let act = net.activate(&inputs(&[(1, 0.9), (2, -0.4)])).unwrap();

        assert!((act[&NodeId(4)] - 0.5).abs() < 1e-6);
        assert!((act[&NodeId(3)] - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_activate_is_deterministic() {
        let mut rng = test_rng();
        let net = NeuralNetwork::random_simple(4, 3, 1.0, &mut rng);
        let values = inputs(&[(1, 0.2), (2, -0.5), (3, 0.8), (4, 0.0)]);

        let first = net.activate(&values).unwrap();
        for _ in 0..5 {
            assert_eq!(net.activate(&values).unwrap(), first);
        }
    }

    #[test]
    fn test_unsupplied_source_defaults_to_empty_sum() {
        let net = two_in_one_out(2.0, 1.0);
        let act = net.activate(&inputs(&[(1, 1.0)])).unwrap();

        assert!((act[&NodeId(2)] - 0.5).abs() < 1e-6);
        assert!((act[&NodeId(3)] - sigmoid(2.0 + 0.5)).abs() < 1e-6);
    }

    #[test]
    fn test_unsupplied_source_rests_at_activation_of_zero() {
        let net = two_in_one_out(2.0, 1.0);
        let tanh = NeuralNetwork::with_config(
            net.nodes().clone(),
            net.connections().clone(),
            NetworkConfig {
                activation: Activation::Tanh,
                ..NetworkConfig::default()
            },
        )
        .unwrap();
        let act = tanh.activate(&inputs(&[(1, 1.0)])).unwrap();

        assert!(act[&NodeId(2)].abs() < 1e-6);
        assert!((act[&NodeId(3)] - 2.0_f32.tanh()).abs() < 1e-6);
    }

    #[test]
    fn test_unsupplied_source_rejected_when_configured() {
        let net = two_in_one_out(2.0, 1.0);
        let strict = NeuralNetwork::with_config(
            net.nodes().clone(),
            net.connections().clone(),
            NetworkConfig {
                unsupplied_source: UnsuppliedSource::Reject,
                ..NetworkConfig::default()
            },
        )
        .unwrap();

        assert_eq!(
            strict.activate(&inputs(&[(1, 1.0)])),
            Err(StructuralError::MissingInput(NodeId(2)))
        );
    }

    #[test]
    fn test_unknown_input_rejected() {
        let net = two_in_one_out(1.0, 1.0);
        assert_eq!(
            net.activate(&inputs(&[(1, 1.0), (2, 1.0), (7, 1.0)])),
            Err(StructuralError::UnknownNode(NodeId(7)))
        );
    }

    #[test]
    fn test_cycle_rejected_at_construction() {
        let nodes = NodeSets {
            inputs: ids(&[1]),
            hidden: ids(&[4, 5]),
            outputs: ids(&[3]),
        };
        let connections = BTreeMap::from([
            (ConnectionKey::new(1, 4), ConnectionGene::new(1.0)),
            (ConnectionKey::new(4, 5), ConnectionGene::new(1.0)),
            (ConnectionKey::new(5, 4), ConnectionGene::new(1.0)),
            (ConnectionKey::new(5, 3), ConnectionGene::new(1.0)),
        ]);
        assert!(matches!(
            NeuralNetwork::new(nodes, connections),
            Err(StructuralError::Cycle { .. })
        ));
    }

    #[test]
    fn test_dangling_edge_rejected_at_construction() {
        let nodes = NodeSets {
            inputs: ids(&[1]),
            hidden: vec![],
            outputs: ids(&[2]),
        };
        let connections = BTreeMap::from([(ConnectionKey::new(1, 8), ConnectionGene::new(1.0))]);
        assert!(matches!(
            NeuralNetwork::new(nodes, connections),
            Err(StructuralError::DanglingConnection { .. })
        ));
    }

    #[test]
    fn test_get_output_single_output() {
        let mut rng = test_rng();
        for _ in 0..10 {
            let net = NeuralNetwork::random_simple(3, 1, 5.0, &mut rng);
            let best = net
                .get_output(&inputs(&[(1, 1.0), (2, -1.0), (3, 0.3)]))
                .unwrap();
            assert_eq!(best, Some(NodeId(4)));
        }
    }

    #[test]
    fn test_get_output_picks_highest_first_on_tie() {
        let nodes = NodeSets {
            inputs: ids(&[1]),
            hidden: vec![],
            outputs: ids(&[2, 3, 4]),
        };
        let connections = BTreeMap::from([
            (ConnectionKey::new(1, 2), ConnectionGene::new(0.5)),
            (ConnectionKey::new(1, 3), ConnectionGene::new(2.0)),
            (ConnectionKey::new(1, 4), ConnectionGene::new(2.0)),
        ]);
        let net = NeuralNetwork::new(nodes, connections).unwrap();
        assert_eq!(net.get_output(&inputs(&[(1, 1.0)])).unwrap(), Some(NodeId(3)));
        // negative input flips the order
        assert_eq!(net.get_output(&inputs(&[(1, -1.0)])).unwrap(), Some(NodeId(2)));
    }

    #[test]
    fn test_random_simple_layout() {
        let mut rng = test_rng();
        let net = NeuralNetwork::random_simple(4, 4, 1.0, &mut rng);

        assert_eq!(net.nodes().inputs, ids(&[1, 2, 3, 4]));
        assert_eq!(net.nodes().outputs, ids(&[5, 6, 7, 8]));
        assert_eq!(net.connections().len(), 16);
        for conn in net.connections().values() {
            assert!(conn.enabled);
            assert!((-1.0..=1.0).contains(&conn.weight));
        }
    }

    #[test]
    #[should_panic(expected = "weight_range must be finite and non-negative")]
    fn test_random_simple_rejects_negative_range() {
        let mut rng = test_rng();
        let _ = NeuralNetwork::random_simple(2, 1, -1.0, &mut rng);
    }

    #[test]
    fn test_evaluate_positional() {
        let net = two_in_one_out(1.0, -1.0);
        let out = net.evaluate(&[1.0, 0.0]).unwrap();
        assert_eq!(out.len(), 1);
        assert!((out[0] - sigmoid(1.0)).abs() < 1e-6);
    }

    #[test]
    #[should_panic(expected = "Input length mismatch")]
    fn test_evaluate_input_mismatch() {
        let net = two_in_one_out(1.0, -1.0);
        let _ = net.evaluate(&[1.0]);
    }
}
