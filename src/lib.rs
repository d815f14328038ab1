//! # NEAT Engine
//!
//! A NeuroEvolution of Augmenting Topologies (NEAT) engine built around a
//! layer-free, data-flow activation model.
//!
//! ## Features
//!
//! - **Data-Flow Activation**: nodes fire as soon as every predecessor has
//!   fired, so arbitrary acyclic topologies need no layering pass
//! - **Structural Gene Keys**: connections are keyed by `(source, destination)`
//!   and split nodes get ids hashed from the connection they replace, so
//!   genomes align without a global innovation counter
//! - **Speciation**: greedy first-match assignment against species
//!   representatives using the classic compatibility distance
//! - **Exact Offspring Apportionment**: fitness-proportionate counts that
//!   always sum to the population size, with extinction of weak species
//!
//! ## Quick Start
//!
//! ```rust
//! use std::collections::BTreeMap;
//!
//! use neat_engine::{ConnectionGene, ConnectionKey, NeuralNetwork, NodeId, NodeSets};
//!
//! let nodes = NodeSets {
//!     inputs: vec![NodeId(1), NodeId(2)],
//!     hidden: vec![],
//!     outputs: vec![NodeId(3)],
//! };
//! let connections = BTreeMap::from([
//!     (ConnectionKey::new(1, 3), ConnectionGene::new(1.0)),
//!     (ConnectionKey::new(2, 3), ConnectionGene::new(1.0)),
//! ]);
//!
//! let net = NeuralNetwork::new(nodes, connections).unwrap();
//! let out = net.evaluate(&[0.5, 0.5]).unwrap();
//! assert!((out[0] - 0.731).abs() < 1e-3);
//! ```
//!
//! ## Evolving a Population
//!
//! ```rust
//! use neat_engine::{EvolutionConfig, Generation, Genome};
//! use rand::SeedableRng;
//! use rand_chacha::ChaCha8Rng;
//!
//! let config = EvolutionConfig::new(2, 1, 50);
//! let network_config = config.network;
//! let mut rng = ChaCha8Rng::seed_from_u64(42);
//!
//! let fitness = move |genome: &Genome| -> f32 {
//!     let Ok(net) = genome.network(network_config) else {
//!         return 0.0;
//!     };
//!     match net.evaluate(&[1.0, 0.0]) {
//!         Ok(out) => out[0],
//!         Err(_) => 0.0,
//!     }
//! };
//!
//! let mut generation = Generation::new(config).unwrap();
//! generation.evolve(&mut rng).unwrap();
//! for _ in 0..5 {
//!     generation.evaluate(&fitness);
//!     generation.evolve(&mut rng).unwrap();
//! }
//! assert_eq!(generation.population_size(), 50);
//! ```
//!
//! ## Architecture
//!
//! ### Gene Identity
//!
//! A connection gene is identified by its endpoints. A hidden node created by
//! splitting `a -> b` gets `id = Hash(a, b)`, mapped above
//! [`RESERVED_NODE_IDS`] so it never collides with input or output ids. Two
//! lineages that make the same split produce the same node.
//!
//! ### Generation Lifecycle
//!
//! [`Generation::evolve`] seeds and speciates the population on its first
//! call. Every later call apportions offspring, culls and breeds each species,
//! and drops species left empty. Fitness is supplied in between through any
//! [`FitnessEvaluator`], including plain closures.
//!
//! ## Logging
//!
//! The crate emits [`tracing`] events (`debug` per generation, `trace` per
//! species and per activation, `warn` on extinctions and fallbacks) and never
//! installs a subscriber itself.

pub mod activation;
pub mod config;
pub mod distribution;
pub mod error;
pub mod gene;
pub mod generation;
pub mod genome;
pub mod innovation;
pub mod network;
pub mod species;
pub mod topology;

// Re-exports for convenience
pub use activation::{sigmoid, Activation};
pub use config::{
    EvolutionConfig, GenomeConfig, NetworkConfig, UnsuppliedSource, ZeroFitnessPolicy,
};
pub use distribution::offspring_distribution;
pub use error::{
    ConfigError, DistributionError, EvolutionError, EvolutionErrorKind, SpeciesSnapshot,
    StructuralError,
};
pub use gene::{ConnectionGene, ConnectionKey, NodeId, NodeKind};
pub use generation::{step, FitnessEvaluator, Generation};
pub use genome::{Genome, Genotype};
pub use innovation::{split_node_id, RESERVED_NODE_IDS};
pub use network::NeuralNetwork;
pub use species::{Member, MemberId, Species};
pub use topology::{GraphTopology, NodeSets};
