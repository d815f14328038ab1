//! Fitness-proportionate offspring apportionment.
//!
//! Each species is offered `round(population_size × fitness / total)`
//! offspring, rounding half away from zero. Offers below the extinction
//! threshold become zero. Whatever rounding left over (or overshot) is then
//! handed out one at a time, round-robin in species order, to species whose
//! count is still non-zero, so the counts always add up to exactly
//! `population_size`.
//!
//! ## Negative correction
//!
//! When rounding overshoots, each pass takes one offspring from every
//! non-zero species in turn. A species taken down to zero is skipped from then
//! on, so no count ever goes below zero and no extinct species is revived.

use tracing::{trace, warn};

use crate::config::ZeroFitnessPolicy;
use crate::error::DistributionError;

/// Offspring count per species, in the order of `fitnesses`.
///
/// # Errors
///
/// - [`DistributionError::NoSpecies`] for an empty slice
/// - [`DistributionError::InvalidFitness`] for a negative or non-finite entry
/// - [`DistributionError::ZeroFitness`] when all fitness is zero and the
///   policy is [`ZeroFitnessPolicy::Error`]
/// - [`DistributionError::AllExtinct`] when every species falls below the
///   extinction threshold
pub fn offspring_distribution(
    fitnesses: &[f32],
    population_size: usize,
    extinction_threshold: usize,
    zero_policy: ZeroFitnessPolicy,
) -> Result<Vec<usize>, DistributionError> {
    if fitnesses.is_empty() {
        return Err(DistributionError::NoSpecies);
    }
    if let Some((index, &fitness)) = fitnesses
        .iter()
        .enumerate()
        .find(|(_, f)| !f.is_finite() || **f < 0.0)
    {
        return Err(DistributionError::InvalidFitness { index, fitness });
    }

    let total: f64 = fitnesses.iter().map(|&f| f64::from(f)).sum();
    if total == 0.0 {
        return match zero_policy {
            ZeroFitnessPolicy::Error => Err(DistributionError::ZeroFitness),
            ZeroFitnessPolicy::Uniform => {
                warn!(
                    species = fitnesses.len(),
                    "total fitness is zero; splitting offspring evenly"
                );
                Ok(uniform(fitnesses.len(), population_size))
            }
        };
    }

    let mut counts = tentative_counts(fitnesses, total, population_size, extinction_threshold);
    let assigned: usize = counts.iter().sum();
    trace!(?counts, assigned, "tentative offspring counts");

    if assigned < population_size {
        let missing = population_size - assigned;
        if counts.iter().all(|&c| c == 0) {
            return Err(DistributionError::AllExtinct { missing });
        }
        correct(&mut counts, missing, |c| *c += 1);
    } else if assigned > population_size {
        correct(&mut counts, assigned - population_size, |c| *c -= 1);
    }

    Ok(counts)
}

/// Rounded proportional shares with sub-threshold shares zeroed.
#[must_use]
pub fn tentative_counts(
    fitnesses: &[f32],
    total: f64,
    population_size: usize,
    extinction_threshold: usize,
) -> Vec<usize> {
    fitnesses
        .iter()
        .map(|&fitness| {
            let share = (population_size as f64 * f64::from(fitness) / total).round() as usize;
            if share < extinction_threshold {
                0
            } else {
                share
            }
        })
        .collect()
}

/// Apply `adjust` to non-zero entries round-robin, `amount` times.
///
/// Callers guarantee a non-zero entry exists for every adjustment.
fn correct(counts: &mut [usize], amount: usize, adjust: impl Fn(&mut usize)) {
    let mut remaining = amount;
    let mut idx = 0;
    while remaining > 0 {
        let count = &mut counts[idx % counts.len()];
        if *count != 0 {
            adjust(count);
            remaining -= 1;
        }
        idx += 1;
    }
}

fn uniform(species: usize, population_size: usize) -> Vec<usize> {
    let base = population_size / species;
    let remainder = population_size % species;
    (0..species)
        .map(|i| if i < remainder { base + 1 } else { base })
        .collect()
}
