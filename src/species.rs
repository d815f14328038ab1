//! Species: a group of mutually compatible genomes.
//!
//! Members are stored in a `SlotMap` arena. Every member is inserted once and
//! addressed by its [`MemberId`], which gives the member collection set
//! semantics without requiring genomes to be hashable.

use rand::Rng;
use serde::{Deserialize, Serialize};
use slotmap::{new_key_type, SlotMap};

use crate::config::EvolutionConfig;
use crate::error::SpeciesSnapshot;
use crate::generation::FitnessEvaluator;
use crate::genome::{Genome, Genotype};

new_key_type! {
    /// Identifier of a member within its species.
    pub struct MemberId;
}

/// A genome together with its last evaluated fitness.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Member {
    pub genome: Genome,
    /// Non-negative; `0.0` until evaluated.
    pub fitness: f32,
}

impl Member {
    /// An unevaluated member.
    #[must_use]
    pub fn new(genome: Genome) -> Self {
        Self {
            genome,
            fitness: 0.0,
        }
    }
}

/// A set of genomes within the compatibility threshold of a representative.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Species {
    id: usize,
    representative: Genome,
    members: SlotMap<MemberId, Member>,
}

impl Species {
    /// A new species with `seed` as its only member and its representative.
    #[must_use]
    pub fn new(id: usize, seed: Genome) -> Self {
        let mut members = SlotMap::with_key();
        let representative = seed.clone();
        members.insert(Member::new(seed));
        Self {
            id,
            representative,
            members,
        }
    }

    /// Creation-order id, unique within a [`Generation`](crate::generation::Generation).
    #[must_use]
    pub fn id(&self) -> usize {
        self.id
    }

    #[must_use]
    pub fn representative(&self) -> &Genome {
        &self.representative
    }

    #[must_use]
    pub fn members(&self) -> &SlotMap<MemberId, Member> {
        &self.members
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.members.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Add a genome; returns its member id.
    pub fn add_member(&mut self, genome: Genome) -> MemberId {
        self.members.insert(Member::new(genome))
    }

    /// Record a fitness for one member. Returns `false` for an unknown id.
    pub fn set_fitness(&mut self, id: MemberId, fitness: f32) -> bool {
        match self.members.get_mut(id) {
            Some(member) => {
                member.fitness = fitness;
                true
            }
            None => false,
        }
    }

    /// Evaluate every member.
    pub fn evaluate<E: FitnessEvaluator + ?Sized>(&mut self, evaluator: &E) {
        for member in self.members.values_mut() {
            member.fitness = evaluator.fitness(&member.genome);
        }
    }

    /// Whether `genome` is close enough to the representative to join.
    #[must_use]
    pub fn is_compatible(&self, genome: &Genome, threshold: f32) -> bool {
        self.representative.compatibility_distance(genome) < threshold
    }

    /// Sum of member fitness.
    #[must_use]
    pub fn total_fitness(&self) -> f32 {
        self.members.values().map(|m| m.fitness).sum()
    }

    /// The member with the highest fitness.
    #[must_use]
    pub fn champion(&self) -> Option<&Member> {
        self.members
            .values()
            .max_by(|a, b| a.fitness.total_cmp(&b.fitness))
    }

    /// Pick a new representative uniformly among current members.
    ///
    /// Keeps the old representative when the species is empty.
    pub fn set_random_representative<R: Rng>(&mut self, rng: &mut R) {
        if self.members.is_empty() {
            return;
        }
        let pick = rng.random_range(0..self.members.len());
        if let Some(member) = self.members.values().nth(pick) {
            self.representative = member.genome.clone();
        }
    }

    /// Remove the weakest `fraction` of members (rounded down), always
    /// keeping at least one. Returns how many were removed.
    pub fn cull_members(&mut self, fraction: f32) -> usize {
        let len = self.members.len();
        if len == 0 {
            return 0;
        }

        let fraction = fraction.clamp(0.0, 1.0);
        let remove = ((len as f32 * fraction).floor() as usize).min(len - 1);

        let mut ranked: Vec<(MemberId, f32)> = self
            .members
            .iter()
            .map(|(id, m)| (id, m.fitness))
            .collect();
        ranked.sort_by(|a, b| a.1.total_cmp(&b.1));

        for &(id, _) in ranked.iter().take(remove) {
            self.members.remove(id);
        }
        remove
    }

    /// Replace the members with exactly `count` offspring of the current ones.
    ///
    /// The `elitism` best members are copied unchanged. Every other offspring
    /// is a crossover of two random members (with probability
    /// `crossover_prob`, the fitter one as primary parent) or a clone of one,
    /// then mutated at `mutation_rate`. An empty species breeds from its
    /// representative.
    pub fn reproduce<R: Rng>(&mut self, count: usize, config: &EvolutionConfig, rng: &mut R) {
        let fallback = Member::new(self.representative.clone());
        let mut parents: Vec<&Member> = self.members.values().collect();
        parents.sort_by(|a, b| b.fitness.total_cmp(&a.fitness));
        if parents.is_empty() {
            parents.push(&fallback);
        }

        let mut next: SlotMap<MemberId, Member> = SlotMap::with_capacity_and_key(count);
        for elite in parents.iter().take(config.elitism.min(count)) {
            next.insert(Member::new(elite.genome.clone()));
        }

        while next.len() < count {
            let a = parents[rng.random_range(0..parents.len())];
            let mut child = if parents.len() > 1 && rng.random::<f32>() < config.crossover_prob {
                let b = parents[rng.random_range(0..parents.len())];
                if b.fitness > a.fitness {
                    b.genome.crossover(&a.genome, rng)
                } else {
                    a.genome.crossover(&b.genome, rng)
                }
            } else {
                a.genome.clone()
            };
            child.mutate(rng, config.mutation_rate);
            next.insert(Member::new(child));
        }

        self.members = next;
    }

    /// Remove and return every member, leaving the representative in place.
    pub fn take_members(&mut self) -> Vec<Member> {
        self.members.drain().map(|(_, member)| member).collect()
    }

    #[must_use]
    pub fn snapshot(&self) -> SpeciesSnapshot {
        SpeciesSnapshot {
            id: self.id,
            members: self.members.len(),
            total_fitness: self.total_fitness(),
        }
    }
}
