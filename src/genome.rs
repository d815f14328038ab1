//! NEAT genome: node sets, keyed connection genes and the genetic operators.
//!
//! Connections live in a `BTreeMap` keyed by [`ConnectionKey`]. The key is the
//! structural identity of a gene, so two genomes that grew the same edge align
//! on it without a global innovation counter, and map iteration order is the
//! alignment order used by crossover and compatibility distance.

use std::collections::BTreeMap;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::config::{GenomeConfig, NetworkConfig};
use crate::error::StructuralError;
use crate::gene::{ConnectionGene, ConnectionKey, NodeId, NodeKind};
use crate::innovation::split_node_id;
use crate::network::NeuralNetwork;
use crate::topology::{GraphTopology, NodeSets};

/// Genetic operators a population member must support.
pub trait Genotype: Clone {
    /// Mutate in place; `rate` scales every mutation probability.
    fn mutate<R: Rng>(&mut self, rng: &mut R, rate: f32);

    /// Produce a child. `self` is treated as the fitter parent.
    #[must_use]
    fn crossover<R: Rng>(&self, other: &Self, rng: &mut R) -> Self;
}

/// One candidate network: topology, weights and the config it mutates under.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Genome {
    /// Input, hidden and output node ids.
    pub nodes: NodeSets,
    /// Connection genes keyed by `(source, destination)`.
    #[serde(with = "connection_list")]
    pub connections: BTreeMap<ConnectionKey, ConnectionGene>,
    /// Configuration used for this genome.
    #[serde(default)]
    pub config: GenomeConfig,
}

impl Genome {
    /// The primordial genome: every input connected to every output, all
    /// weights `0.0` until randomized.
    #[must_use]
    pub fn minimal(config: GenomeConfig) -> Self {
        let first_output = config.num_inputs as u64 + 1;
        let nodes = NodeSets {
            inputs: (1..first_output).map(NodeId).collect(),
            hidden: Vec::new(),
            outputs: (first_output..first_output + config.num_outputs as u64)
                .map(NodeId)
                .collect(),
        };

        let mut connections = BTreeMap::new();
        for &input in &nodes.inputs {
            for &output in &nodes.outputs {
                connections.insert(ConnectionKey::new(input, output), ConnectionGene::new(0.0));
            }
        }

        Self {
            nodes,
            connections,
            config,
        }
    }

    /// A minimal genome with every weight drawn at random.
    #[must_use]
    pub fn fully_connected<R: Rng>(config: GenomeConfig, rng: &mut R) -> Self {
        let mut genome = Self::minimal(config);
        genome.randomize_weights(rng);
        genome
    }

    /// `count` independent copies of this genome.
    #[must_use]
    pub fn make_clones(&self, count: usize) -> Vec<Self> {
        std::iter::repeat_with(|| self.clone()).take(count).collect()
    }

    /// A weight drawn uniformly from `[-weight_range, weight_range]`.
    pub fn random_weight<R: Rng>(&self, rng: &mut R) -> f32 {
        let range = self.config.weight_range;
        rng.random_range(-range..=range)
    }

    /// Give the connection at `key` a fresh random weight.
    ///
    /// Returns `false` if the genome has no such connection.
    pub fn randomly_assign_weight<R: Rng>(&mut self, key: ConnectionKey, rng: &mut R) -> bool {
        let weight = self.random_weight(rng);
        match self.connections.get_mut(&key) {
            Some(conn) => {
                conn.weight = weight;
                true
            }
            None => false,
        }
    }

    /// Redraw every connection weight.
    pub fn randomize_weights<R: Rng>(&mut self, rng: &mut R) {
        let keys: Vec<ConnectionKey> = self.connections.keys().copied().collect();
        for key in keys {
            self.randomly_assign_weight(key, rng);
        }
    }

    /// The role of `id`, if the genome declares it.
    #[must_use]
    pub fn node_kind(&self, id: NodeId) -> Option<NodeKind> {
        self.nodes
            .iter()
            .find_map(|(node, kind)| (node == id).then_some(kind))
    }

    /// Get the number of enabled connections.
    #[must_use]
    pub fn num_enabled_connections(&self) -> usize {
        self.connections.values().filter(|c| c.enabled).count()
    }

    /// Adjacency projections of this genome.
    ///
    /// # Errors
    ///
    /// Fails on overlapping node sets or dangling connection keys.
    pub fn topology(&self) -> Result<GraphTopology, StructuralError> {
        GraphTopology::build(&self.nodes, &self.connections)
    }

    /// Check that every key references a declared node and the graph is acyclic.
    ///
    /// # Errors
    ///
    /// The first [`StructuralError`] found.
    pub fn validate(&self) -> Result<(), StructuralError> {
        self.topology()?.topological_order().map(|_| ())
    }

    /// Build the activation engine for this genome.
    ///
    /// # Errors
    ///
    /// See [`NeuralNetwork::with_config`].
    pub fn network(&self, config: NetworkConfig) -> Result<NeuralNetwork, StructuralError> {
        NeuralNetwork::with_config(self.nodes.clone(), self.connections.clone(), config)
    }

    /// Add a new connection with a random weight.
    ///
    /// Returns `None` if either node is missing, the edge enters an input or
    /// leaves an output, it already exists, or it would close a cycle.
    pub fn add_connection<R: Rng>(
        &mut self,
        source: NodeId,
        destination: NodeId,
        rng: &mut R,
    ) -> Option<ConnectionKey> {
        let topology = self.topology().ok()?;
        let source_kind = topology.kind(source)?;
        let destination_kind = topology.kind(destination)?;
        if source_kind == NodeKind::Output || destination_kind == NodeKind::Input {
            return None;
        }

        let key = ConnectionKey {
            source,
            destination,
        };
        if self.connections.contains_key(&key)
            || topology.would_create_cycle(source, destination)
        {
            return None;
        }

        let weight = self.random_weight(rng);
        self.connections.insert(key, ConnectionGene::new(weight));
        Some(key)
    }

    /// Split the connection at `key` with a new hidden node.
    ///
    /// The original connection is disabled, and two new connections are created:
    /// source -> new node (weight 1.0) and new node -> destination (original weight).
    ///
    /// Returns `None` if the connection is missing or disabled, or if this
    /// connection was already split in this genome.
    pub fn add_node(&mut self, key: ConnectionKey) -> Option<NodeId> {
        let new_id = split_node_id(key);
        if self.node_kind(new_id).is_some() {
            return None;
        }

        let conn = self.connections.get_mut(&key)?;
        if !conn.enabled {
            return None;
        }
        conn.enabled = false;
        let original_weight = conn.weight;

        self.nodes.hidden.push(new_id);
        self.connections
            .insert(ConnectionKey::new(key.source, new_id), ConnectionGene::new(1.0));
        self.connections.insert(
            ConnectionKey::new(new_id, key.destination),
            ConnectionGene::new(original_weight),
        );

        Some(new_id)
    }

    /// Compute compatibility distance to another genome for speciation.
    ///
    /// `c1·E/N + c2·D/N + c3·W̄`, where genes are aligned by key, `E` counts
    /// genes past the other genome's last key, `D` the remaining unmatched
    /// genes, `W̄` is the mean weight difference of matching genes, and `N` is
    /// the larger gene count.
    #[must_use]
    pub fn compatibility_distance(&self, other: &Genome) -> f32 {
        let self_max = self.connections.keys().next_back().copied();
        let other_max = other.connections.keys().next_back().copied();

        let mut matching = 0usize;
        let mut disjoint = 0usize;
        let mut excess = 0usize;
        let mut weight_diff_sum = 0.0;

        for (key, conn) in &self.connections {
            if let Some(theirs) = other.connections.get(key) {
                matching += 1;
                weight_diff_sum += (conn.weight - theirs.weight).abs();
            } else if other_max.is_none_or(|max| *key > max) {
                excess += 1;
            } else {
                disjoint += 1;
            }
        }

        for key in other.connections.keys() {
            if self.connections.contains_key(key) {
                continue;
            }
            if self_max.is_none_or(|max| *key > max) {
                excess += 1;
            } else {
                disjoint += 1;
            }
        }

        let n = self.connections.len().max(other.connections.len()).max(1) as f32;
        let avg_weight_diff = if matching > 0 {
            weight_diff_sum / matching as f32
        } else {
            0.0
        };

        (self.config.compatibility_excess_coeff * excess as f32 / n)
            + (self.config.compatibility_disjoint_coeff * disjoint as f32 / n)
            + (self.config.compatibility_weight_coeff * avg_weight_diff)
    }

    /// Perturb or replace connection weights.
    fn mutate_weights<R: Rng>(&mut self, rng: &mut R, rate: f32) {
        let range = self.config.weight_range;
        // keeps repeated perturbation from drifting to inf
        let limit = range * 10.0;
        let power = self.config.weight_mutation_power;

        for conn in self.connections.values_mut() {
            if rng.random::<f32>() >= self.config.weight_mutation_prob * rate {
                continue;
            }
            if rng.random::<f32>() < self.config.weight_replace_prob {
                conn.weight = rng.random_range(-range..=range);
            } else {
                conn.weight += rng.random_range(-1.0_f32..=1.0) * power;
            }
            conn.weight = conn.weight.clamp(-limit, limit);
        }
    }

    fn mutate_toggle_enabled<R: Rng>(&mut self, rng: &mut R, rate: f32) {
        for conn in self.connections.values_mut() {
            if rng.random::<f32>() < self.config.toggle_enabled_prob * rate {
                conn.enabled = !conn.enabled;
            }
        }
    }

    /// Try a handful of random source/destination pairs.
    fn mutate_add_connection<R: Rng>(&mut self, rng: &mut R, rate: f32) {
        if rng.random::<f32>() >= self.config.add_connection_prob * rate {
            return;
        }

        let sources: Vec<NodeId> = self
            .nodes
            .iter()
            .filter(|(_, kind)| *kind != NodeKind::Output)
            .map(|(id, _)| id)
            .collect();
        let destinations: Vec<NodeId> = self
            .nodes
            .iter()
            .filter(|(_, kind)| *kind != NodeKind::Input)
            .map(|(id, _)| id)
            .collect();
        if sources.is_empty() || destinations.is_empty() {
            return;
        }

        for _ in 0..10 {
            let source = sources[rng.random_range(0..sources.len())];
            let destination = destinations[rng.random_range(0..destinations.len())];
            if self.add_connection(source, destination, rng).is_some() {
                return;
            }
        }
    }

    fn mutate_add_node<R: Rng>(&mut self, rng: &mut R, rate: f32) {
        if rng.random::<f32>() >= self.config.add_node_prob * rate {
            return;
        }

        let enabled: Vec<ConnectionKey> = self
            .connections
            .iter()
            .filter(|(_, c)| c.enabled)
            .map(|(key, _)| *key)
            .collect();
        if enabled.is_empty() {
            return;
        }

        let key = enabled[rng.random_range(0..enabled.len())];
        self.add_node(key);
    }
}

impl Genotype for Genome {
    fn mutate<R: Rng>(&mut self, rng: &mut R, rate: f32) {
        self.mutate_weights(rng, rate);
        self.mutate_toggle_enabled(rng, rate);
        self.mutate_add_connection(rng, rate);
        self.mutate_add_node(rng, rate);
    }

    fn crossover<R: Rng>(&self, other: &Self, rng: &mut R) -> Self {
        // The child takes the fitter parent's structure, so it is acyclic
        // whenever that parent is. Only matching genes mix.
        let mut child = self.clone();

        for (key, conn) in &mut child.connections {
            let Some(theirs) = other.connections.get(key) else {
                continue;
            };
            let mine = *conn;
            if rng.random::<bool>() {
                conn.weight = theirs.weight;
            }
            conn.enabled = if !mine.enabled || !theirs.enabled {
                // 75% chance of staying disabled
                rng.random::<f32>() > 0.75
            } else {
                true
            };
        }

        child
    }
}

/// Serializes the connection map as a list of `[key, gene]` pairs, since
/// struct keys can't be JSON object keys.
mod connection_list {
    use std::collections::BTreeMap;

    use serde::{Deserialize, Deserializer, Serializer};

    use crate::gene::{ConnectionGene, ConnectionKey};

    pub fn serialize<S: Serializer>(
        map: &BTreeMap<ConnectionKey, ConnectionGene>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(map.iter())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<BTreeMap<ConnectionKey, ConnectionGene>, D::Error> {
        let pairs = Vec::<(ConnectionKey, ConnectionGene)>::deserialize(deserializer)?;
        Ok(pairs.into_iter().collect())
    }
}
