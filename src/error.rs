//! Error types.
//!
//! Structural errors come from the activation engine, distribution errors from
//! the offspring apportionment, and configuration errors from config
//! validation. The control loop wraps any of them in an [`EvolutionError`]
//! carrying the generation number and a species snapshot.

use serde::Serialize;
use thiserror::Error;

use crate::gene::{ConnectionKey, NodeId};

/// A malformed network graph.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StructuralError {
    /// A connection references a node that is not declared.
    #[error("connection {key} references undeclared node {missing}")]
    DanglingConnection {
        /// The offending connection.
        key: ConnectionKey,
        /// The node that could not be found.
        missing: NodeId,
    },
    /// The connections contain a cycle.
    #[error("connections form a cycle; {unresolved} node(s) lie on or behind it")]
    Cycle {
        /// Nodes left over after Kahn's algorithm.
        unresolved: usize,
    },
    /// A node appears in more than one of the input/hidden/output sets.
    #[error("node {0} is declared in more than one node set")]
    OverlappingNodeSets(NodeId),
    /// An activation was supplied for a node the network doesn't have.
    #[error("activation supplied for unknown node {0}")]
    UnknownNode(NodeId),
    /// A source node was not supplied and the network rejects defaults.
    #[error("source node {0} has no incoming edges and no supplied activation")]
    MissingInput(NodeId),
    /// Propagation drained its ready queue before every node fired.
    #[error("activation stalled after {activated} of {total} nodes")]
    Stalled {
        /// Nodes that received an activation.
        activated: usize,
        /// Nodes declared in the network.
        total: usize,
    },
}

/// Offspring apportionment could not produce a valid distribution.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DistributionError {
    /// There are no species to distribute offspring across.
    #[error("no species to distribute offspring across")]
    NoSpecies,
    /// Every species has zero total fitness.
    #[error("total population fitness is zero")]
    ZeroFitness,
    /// A species reported a negative or non-finite fitness.
    #[error("species at position {index} has invalid total fitness {fitness}")]
    InvalidFitness {
        /// Position in the species list.
        index: usize,
        /// The reported value.
        fitness: f32,
    },
    /// Every species fell below the extinction threshold.
    #[error("every species fell below the extinction threshold; {missing} offspring unassigned")]
    AllExtinct {
        /// Offspring that could not be assigned.
        missing: usize,
    },
}

/// An invalid configuration value.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A count that must be positive was zero.
    #[error("{0} must be greater than zero")]
    Zero(&'static str),
    /// A value fell outside its allowed range.
    #[error("{field} = {value} is outside {expected}")]
    OutOfRange {
        /// Config field name.
        field: &'static str,
        /// The rejected value.
        value: f64,
        /// Human-readable range.
        expected: &'static str,
    },
    /// Input and output nodes would spill into the hidden node id space.
    #[error("{inputs} inputs + {outputs} outputs exceed the reserved node id range")]
    TooManyNodes {
        /// Configured input count.
        inputs: usize,
        /// Configured output count.
        outputs: usize,
    },
    /// The extinction threshold can never be met.
    #[error("extinction threshold {threshold} exceeds population size {population}")]
    UnreachableThreshold {
        /// Configured threshold.
        threshold: usize,
        /// Configured population size.
        population: usize,
    },
    /// The configuration document could not be parsed.
    #[error("invalid configuration document: {0}")]
    Parse(#[from] serde_json::Error),
}

/// What went wrong inside an evolutionary step.
#[derive(Debug, Error)]
pub enum EvolutionErrorKind {
    #[error(transparent)]
    Structural(#[from] StructuralError),
    #[error(transparent)]
    Distribution(#[from] DistributionError),
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Summary of one species at the moment an error was raised.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpeciesSnapshot {
    /// Species id (creation order).
    pub id: usize,
    /// Number of members.
    pub members: usize,
    /// Sum of member fitness.
    pub total_fitness: f32,
}

/// An evolutionary step failed; the population state is not advanced.
#[derive(Debug, Error)]
#[error("generation {generation} ({} species): {kind}", .species.len())]
pub struct EvolutionError {
    /// Generation counter at the time of failure.
    pub generation: u64,
    /// Species state at the time of failure.
    pub species: Vec<SpeciesSnapshot>,
    /// Underlying cause.
    #[source]
    pub kind: EvolutionErrorKind,
}
