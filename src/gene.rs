//! Gene types for NEAT genomes.
//!
//! - [`NodeId`]: opaque numeric node identifier
//! - [`ConnectionKey`]: the ordered `(source, destination)` pair a connection is keyed by
//! - [`ConnectionGene`]: the weight and enabled flag stored under a key

use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifier of a node within a genome.
///
/// Inputs are numbered from 1, outputs follow the inputs, and hidden nodes
/// created by splitting a connection get a hashed id (see
/// [`split_node_id`](crate::innovation::split_node_id)).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub u64);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for NodeId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

/// The role of a node in the network.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeKind {
    /// Receives an externally supplied value.
    Input,
    /// Internal node added by structural mutation.
    Hidden,
    /// Produces a network output.
    Output,
}

/// Key of a connection: the edge `source -> destination`.
///
/// Ordering is lexicographic on `(source, destination)`, which doubles as the
/// gene alignment order for crossover and compatibility distance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ConnectionKey {
    /// Node the edge leaves.
    pub source: NodeId,
    /// Node the edge enters.
    pub destination: NodeId,
}

impl ConnectionKey {
    #[must_use]
    pub fn new(source: impl Into<NodeId>, destination: impl Into<NodeId>) -> Self {
        Self {
            source: source.into(),
            destination: destination.into(),
        }
    }
}

impl fmt::Display for ConnectionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}->{}", self.source, self.destination)
    }
}

/// A weighted link between two nodes.
///
/// Disabled connections contribute nothing to activation but stay in the
/// genome so crossover can still align them.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConnectionGene {
    /// The connection weight.
    pub weight: f32,
    /// Whether this connection takes part in activation.
    pub enabled: bool,
}

impl ConnectionGene {
    /// Create a new enabled connection.
    #[must_use]
    pub fn new(weight: f32) -> Self {
        Self {
            weight,
            enabled: true,
        }
    }

    /// Create a connection that is present but switched off.
    #[must_use]
    pub fn disabled(weight: f32) -> Self {
        Self {
            weight,
            enabled: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_key_ordering() {
        let a = ConnectionKey::new(1, 5);
        let b = ConnectionKey::new(2, 3);
        let c = ConnectionKey::new(2, 4);
        assert!(a < b);
        assert!(b < c);
        assert_eq!(a.to_string(), "1->5");
    }

    #[test]
    fn test_connection_gene_creation() {
        let conn = ConnectionGene::new(0.5);
        assert!(conn.enabled);
        assert!((conn.weight - 0.5).abs() < 1e-6);

        let off = ConnectionGene::disabled(-0.25);
        assert!(!off.enabled);
    }
}
