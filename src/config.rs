//! Configuration for genomes, networks and the evolutionary loop.
//!
//! Every struct here is plain data with serde derives and `#[serde(default)]`,
//! so a JSON document only needs to name the fields it changes. Call
//! [`EvolutionConfig::validate`] (or load through
//! [`EvolutionConfig::from_json`]) before handing a config to a
//! [`Generation`](crate::generation::Generation).

use serde::{Deserialize, Serialize};

use crate::activation::Activation;
use crate::error::ConfigError;
use crate::innovation::RESERVED_NODE_IDS;

/// What the activation engine does with a source node that has no supplied value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum UnsuppliedSource {
    /// Activate it from an empty sum, i.e. `activation(0)`; `0.5` for sigmoid.
    #[default]
    SigmoidOfEmptySum,
    /// Fail with [`StructuralError::MissingInput`](crate::error::StructuralError::MissingInput).
    Reject,
}

/// What the offspring distribution does when every species has zero fitness.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum ZeroFitnessPolicy {
    /// Fail with [`DistributionError::ZeroFitness`](crate::error::DistributionError::ZeroFitness).
    #[default]
    Error,
    /// Split the population evenly, remainder to the oldest species.
    Uniform,
}

/// Activation engine settings.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    /// Squashing function for hidden and output nodes.
    pub activation: Activation,
    /// Handling of source nodes missing from the supplied inputs.
    pub unsupplied_source: UnsuppliedSource,
}

/// Genome construction and mutation settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenomeConfig {
    /// Number of input nodes.
    pub num_inputs: usize,
    /// Number of output nodes.
    pub num_outputs: usize,
    /// Random weights are drawn from `[-weight_range, weight_range]`.
    pub weight_range: f32,
    /// Probability of mutating each connection weight.
    pub weight_mutation_prob: f32,
    /// Maximum size of a weight perturbation.
    pub weight_mutation_power: f32,
    /// Probability that a weight mutation replaces instead of perturbs.
    pub weight_replace_prob: f32,
    /// Probability of adding a new connection during mutation.
    pub add_connection_prob: f32,
    /// Probability of splitting a connection during mutation.
    pub add_node_prob: f32,
    /// Probability of flipping each connection's enabled flag.
    pub toggle_enabled_prob: f32,
    /// Coefficient for excess genes in compatibility distance.
    pub compatibility_excess_coeff: f32,
    /// Coefficient for disjoint genes in compatibility distance.
    pub compatibility_disjoint_coeff: f32,
    /// Coefficient for average weight difference in compatibility distance.
    pub compatibility_weight_coeff: f32,
}

impl Default for GenomeConfig {
    fn default() -> Self {
        Self {
            num_inputs: 2,
            num_outputs: 1,
            weight_range: 1.0,
            weight_mutation_prob: 0.8,
            weight_mutation_power: 0.5,
            weight_replace_prob: 0.1,
            add_connection_prob: 0.05,
            add_node_prob: 0.03,
            toggle_enabled_prob: 0.01,
            compatibility_excess_coeff: 1.0,
            compatibility_disjoint_coeff: 1.0,
            compatibility_weight_coeff: 0.4,
        }
    }
}

impl GenomeConfig {
    /// Defaults with the given node counts.
    #[must_use]
    pub fn new(num_inputs: usize, num_outputs: usize) -> Self {
        Self {
            num_inputs,
            num_outputs,
            ..Self::default()
        }
    }

    /// Check counts and ranges.
    ///
    /// # Errors
    ///
    /// Returns the first invalid field found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.num_inputs == 0 {
            return Err(ConfigError::Zero("num_inputs"));
        }
        if self.num_outputs == 0 {
            return Err(ConfigError::Zero("num_outputs"));
        }
        if (self.num_inputs + self.num_outputs) as u64 >= RESERVED_NODE_IDS {
            return Err(ConfigError::TooManyNodes {
                inputs: self.num_inputs,
                outputs: self.num_outputs,
            });
        }
        if !(self.weight_range.is_finite() && self.weight_range > 0.0) {
            return Err(ConfigError::OutOfRange {
                field: "weight_range",
                value: f64::from(self.weight_range),
                expected: "(0, inf)",
            });
        }
        for (field, value) in [
            ("weight_mutation_prob", self.weight_mutation_prob),
            ("weight_replace_prob", self.weight_replace_prob),
            ("add_connection_prob", self.add_connection_prob),
            ("add_node_prob", self.add_node_prob),
            ("toggle_enabled_prob", self.toggle_enabled_prob),
        ] {
            probability(field, value)?;
        }
        Ok(())
    }
}

/// Settings for the generational loop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvolutionConfig {
    /// Genome construction and mutation.
    pub genome: GenomeConfig,
    /// Activation engine used when genomes are turned into networks.
    pub network: NetworkConfig,
    /// Number of genomes per generation.
    pub population_size: usize,
    /// Species allotted fewer offspring than this go extinct.
    pub extinction_threshold: usize,
    /// Fraction of each species' weakest members removed before reproduction.
    pub cull_rate: f32,
    /// Genomes closer than this to a representative join its species.
    pub compatibility_threshold: f32,
    /// Probability that an offspring comes from crossover rather than cloning.
    pub crossover_prob: f32,
    /// Scale applied to mutation probabilities for each offspring.
    pub mutation_rate: f32,
    /// Best members copied unchanged into the next generation of their species.
    pub elitism: usize,
    /// Re-speciate all offspring after reproduction.
    pub respeciate_offspring: bool,
    /// Fallback when total fitness is zero.
    pub zero_fitness_policy: ZeroFitnessPolicy,
}

impl Default for EvolutionConfig {
    fn default() -> Self {
        Self {
            genome: GenomeConfig::default(),
            network: NetworkConfig::default(),
            population_size: 150,
            extinction_threshold: 2,
            cull_rate: 0.5,
            compatibility_threshold: 3.0,
            crossover_prob: 0.75,
            mutation_rate: 1.0,
            elitism: 1,
            respeciate_offspring: false,
            zero_fitness_policy: ZeroFitnessPolicy::Error,
        }
    }
}

impl EvolutionConfig {
    /// Defaults with the given node counts and population size.
    #[must_use]
    pub fn new(num_inputs: usize, num_outputs: usize, population_size: usize) -> Self {
        Self {
            genome: GenomeConfig::new(num_inputs, num_outputs),
            population_size,
            ..Self::default()
        }
    }

    /// Parse a JSON document and validate it.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Parse`] for malformed JSON, otherwise whatever
    /// [`validate`](Self::validate) reports.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Check every field, including the nested genome config.
    ///
    /// # Errors
    ///
    /// Returns the first invalid field found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.genome.validate()?;
        if self.population_size == 0 {
            return Err(ConfigError::Zero("population_size"));
        }
        if self.extinction_threshold > self.population_size {
            return Err(ConfigError::UnreachableThreshold {
                threshold: self.extinction_threshold,
                population: self.population_size,
            });
        }
        probability("cull_rate", self.cull_rate)?;
        probability("crossover_prob", self.crossover_prob)?;
        if !(self.compatibility_threshold.is_finite() && self.compatibility_threshold > 0.0) {
            return Err(ConfigError::OutOfRange {
                field: "compatibility_threshold",
                value: f64::from(self.compatibility_threshold),
                expected: "(0, inf)",
            });
        }
        if !(self.mutation_rate.is_finite() && self.mutation_rate >= 0.0) {
            return Err(ConfigError::OutOfRange {
                field: "mutation_rate",
                value: f64::from(self.mutation_rate),
                expected: "[0, inf)",
            });
        }
        Ok(())
    }
}

fn probability(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::OutOfRange {
            field,
            value: f64::from(value),
            expected: "[0, 1]",
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        EvolutionConfig::default().validate().unwrap();
        GenomeConfig::new(4, 4).validate().unwrap();
    }

    #[test]
    fn test_zero_counts_rejected() {
        let err = GenomeConfig::new(0, 1).validate().unwrap_err();
        assert!(matches!(err, ConfigError::Zero("num_inputs")));

        let err = EvolutionConfig::new(2, 1, 0).validate().unwrap_err();
        assert!(matches!(err, ConfigError::Zero("population_size")));
    }

    #[test]
    fn test_threshold_above_population_rejected() {
        let config = EvolutionConfig {
            extinction_threshold: 11,
            ..EvolutionConfig::new(2, 1, 10)
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::UnreachableThreshold {
                threshold: 11,
                population: 10
            })
        ));
    }

    #[test]
    fn test_cull_rate_range() {
        let config = EvolutionConfig {
            cull_rate: 1.5,
            ..EvolutionConfig::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("cull_rate"), "{err}");
    }

    #[test]
    fn test_from_json_partial_document() {
        let config = EvolutionConfig::from_json(
            r#"{
                "population_size": 40,
                "cull_rate": 0.2,
                "genome": { "num_inputs": 3, "num_outputs": 2 },
                "zero_fitness_policy": "Uniform"
            }"#,
        )
        .unwrap();

        assert_eq!(config.population_size, 40);
        assert_eq!(config.genome.num_inputs, 3);
        assert_eq!(config.genome.num_outputs, 2);
        assert!((config.genome.weight_range - 1.0).abs() < 1e-6);
        assert_eq!(config.zero_fitness_policy, ZeroFitnessPolicy::Uniform);
        assert_eq!(config.extinction_threshold, 2);
    }

    #[test]
    fn test_from_json_rejects_invalid() {
        assert!(matches!(
            EvolutionConfig::from_json("{ not json"),
            Err(ConfigError::Parse(_))
        ));
        assert!(matches!(
            EvolutionConfig::from_json(r#"{ "population_size": 0 }"#),
            Err(ConfigError::Zero("population_size"))
        ));
    }
}
