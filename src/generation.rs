//! The generational control loop.
//!
//! A [`Generation`] owns the species list and the generation counter. Each
//! call to [`Generation::evolve`] performs one step:
//!
//! - **Bootstrap** (counter 0): clone the primordial genome into a full
//!   population, give every clone independently drawn weights, and speciate.
//! - **Steady state** (counter ≥ 1): apportion offspring by species fitness,
//!   then for each species pick a new representative, cull its weakest
//!   members and breed exactly its allotment.
//!
//! Fitness is supplied by the caller between steps through
//! [`Generation::evaluate`]:
//!
//! ```rust
//! use neat_engine::{EvolutionConfig, Generation};
//! use rand::SeedableRng;
//! use rand_chacha::ChaCha8Rng;
//!
//! let mut rng = ChaCha8Rng::seed_from_u64(7);
//! let mut generation = Generation::new(EvolutionConfig::new(2, 1, 20)).unwrap();
//!
//! generation.evolve(&mut rng).unwrap();
//! for _ in 0..3 {
//!     generation.evaluate(&|genome: &neat_engine::Genome| genome.connections.len() as f32);
//!     generation.evolve(&mut rng).unwrap();
//! }
//! assert_eq!(generation.number(), 4);
//! assert_eq!(generation.population_size(), 20);
//! ```

use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace, warn};

use crate::config::EvolutionConfig;
use crate::distribution::offspring_distribution;
use crate::error::{
    ConfigError, DistributionError, EvolutionError, EvolutionErrorKind, SpeciesSnapshot,
};
use crate::genome::Genome;
use crate::species::{Member, Species};

/// Scores a genome. Higher is better; scores must be finite and non-negative.
pub trait FitnessEvaluator {
    fn fitness(&self, genome: &Genome) -> f32;
}

impl<F> FitnessEvaluator for F
where
    F: Fn(&Genome) -> f32,
{
    fn fitness(&self, genome: &Genome) -> f32 {
        self(genome)
    }
}

/// Population state between evolutionary steps.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Generation {
    config: EvolutionConfig,
    species: Vec<Species>,
    number: u64,
    next_species_id: usize,
}

impl Generation {
    /// An empty generation at counter 0.
    ///
    /// # Errors
    ///
    /// Whatever [`EvolutionConfig::validate`] reports.
    pub fn new(config: EvolutionConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            config,
            species: Vec::new(),
            number: 0,
            next_species_id: 0,
        })
    }

    #[must_use]
    pub fn config(&self) -> &EvolutionConfig {
        &self.config
    }

    /// Species in creation order.
    #[must_use]
    pub fn species(&self) -> &[Species] {
        &self.species
    }

    /// Generation counter; 0 until the bootstrap step has run.
    #[must_use]
    pub fn number(&self) -> u64 {
        self.number
    }

    /// Total number of members across all species.
    #[must_use]
    pub fn population_size(&self) -> usize {
        self.species.iter().map(Species::len).sum()
    }

    /// Every member genome, species by species.
    pub fn genomes(&self) -> impl Iterator<Item = &Genome> + '_ {
        self.species
            .iter()
            .flat_map(|s| s.members().values().map(|m| &m.genome))
    }

    /// The highest-fitness member of the whole population.
    #[must_use]
    pub fn champion(&self) -> Option<&Member> {
        self.species
            .iter()
            .filter_map(Species::champion)
            .max_by(|a, b| a.fitness.total_cmp(&b.fitness))
    }

    /// Per-species summary.
    #[must_use]
    pub fn snapshot(&self) -> Vec<SpeciesSnapshot> {
        self.species.iter().map(Species::snapshot).collect()
    }

    /// `population_size` clones of the primordial genome, each with its own
    /// randomly drawn weights.
    pub fn initial_population<R: Rng>(&self, rng: &mut R) -> Vec<Genome> {
        let primordial = Genome::minimal(self.config.genome.clone());
        let mut population = primordial.make_clones(self.config.population_size);
        for genome in &mut population {
            let keys: Vec<_> = genome.connections.keys().copied().collect();
            for key in keys {
                genome.randomly_assign_weight(key, rng);
            }
        }
        population
    }

    /// Assign each genome to the first compatible species, in creation order,
    /// founding a new species when none is compatible.
    pub fn speciate(&mut self, genomes: impl IntoIterator<Item = Genome>) {
        let threshold = self.config.compatibility_threshold;
        let before = self.species.len();

        for genome in genomes {
            match self
                .species
                .iter_mut()
                .find(|s| s.is_compatible(&genome, threshold))
            {
                Some(species) => {
                    species.add_member(genome);
                }
                None => {
                    let id = self.next_species_id;
                    self.next_species_id += 1;
                    trace!(species = id, "founding species");
                    self.species.push(Species::new(id, genome));
                }
            }
        }

        debug!(
            species = self.species.len(),
            founded = self.species.len() - before,
            "speciated population"
        );
    }

    /// Score every member.
    pub fn evaluate<E: FitnessEvaluator + ?Sized>(&mut self, evaluator: &E) {
        for species in &mut self.species {
            species.evaluate(evaluator);
        }
    }

    /// Offspring per species, in species order.
    ///
    /// # Errors
    ///
    /// See [`offspring_distribution`].
    pub fn offspring_distribution(&self) -> Result<Vec<usize>, DistributionError> {
        let fitnesses: Vec<f32> = self.species.iter().map(Species::total_fitness).collect();
        offspring_distribution(
            &fitnesses,
            self.config.population_size,
            self.config.extinction_threshold,
            self.config.zero_fitness_policy,
        )
    }

    /// Run one evolutionary step and advance the counter.
    ///
    /// The config is checked on every call and member genomes on every
    /// steady-state call, since a deserialized generation bypasses
    /// [`Generation::new`]. On error nothing is modified and the counter stays
    /// where it was.
    ///
    /// # Errors
    ///
    /// An [`EvolutionError`] carrying the generation number, a species
    /// snapshot and the underlying config, structural or distribution error.
    pub fn evolve<R: Rng>(&mut self, rng: &mut R) -> Result<(), EvolutionError> {
        self.config
            .validate()
            .map_err(|e| self.error(e.into()))?;

        if self.number == 0 {
            let population = self.initial_population(rng);
            self.speciate(population);
            self.number = 1;
            debug!(
                generation = self.number,
                population = self.population_size(),
                "seeded initial population"
            );
            return Ok(());
        }

        if let Some(err) = self.genomes().find_map(|g| g.validate().err()) {
            return Err(self.error(err.into()));
        }

        let distribution = self
            .offspring_distribution()
            .map_err(|e| self.error(e.into()))?;
        debug!(generation = self.number, ?distribution, "offspring distribution");

        for (species, &count) in self.species.iter_mut().zip(&distribution) {
            species.set_random_representative(rng);
            let culled = species.cull_members(self.config.cull_rate);
            species.reproduce(count, &self.config, rng);
            trace!(species = species.id(), culled, offspring = count, "reproduced");
        }

        self.remove_extinct();

        if self.config.respeciate_offspring {
            let offspring: Vec<Genome> = self
                .species
                .iter_mut()
                .flat_map(Species::take_members)
                .map(|m| m.genome)
                .collect();
            self.speciate(offspring);
            self.remove_extinct();
        }

        self.number += 1;
        debug!(
            generation = self.number,
            species = self.species.len(),
            population = self.population_size(),
            "advanced generation"
        );
        Ok(())
    }

    fn remove_extinct(&mut self) {
        let before = self.species.len();
        self.species.retain(|s| !s.is_empty());
        let extinct = before - self.species.len();
        if extinct > 0 {
            warn!(generation = self.number, extinct, "species went extinct");
        }
    }

    fn error(&self, kind: EvolutionErrorKind) -> EvolutionError {
        EvolutionError {
            generation: self.number,
            species: self.snapshot(),
            kind,
        }
    }
}

/// Consume a generation and return its successor.
///
/// # Errors
///
/// See [`Generation::evolve`].
pub fn step<R: Rng>(mut state: Generation, rng: &mut R) -> Result<Generation, EvolutionError> {
    state.evolve(rng)?;
    Ok(state)
}
