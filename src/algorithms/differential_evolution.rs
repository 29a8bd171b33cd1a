//! Differential Evolution.
//!
//! DE/rand/1/bin: every member proposes one trial vector built from the
//! difference of two other members added to a third, crossed over with the
//! member itself. A trial replaces its parent only if it is at least as good.

use ndarray::Array1;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::Rng;

use super::{clip_to_bounds, random_point, Algorithm, Population};
use crate::options::{AlgorithmKind, DifferentialEvolutionSettings};

/// Differential Evolution algorithm.
#[derive(Debug, Clone)]
pub struct DifferentialEvolution {
    settings: DifferentialEvolutionSettings,
}

impl Default for DifferentialEvolution {
    fn default() -> Self {
        Self::new(DifferentialEvolutionSettings::default())
    }
}

impl DifferentialEvolution {
    pub fn new(settings: DifferentialEvolutionSettings) -> Self {
        Self { settings }
    }

    /// Create a trial individual using differential evolution mutation and crossover.
    ///
    /// With fewer than three other members to draw from, the donor is a random
    /// point in the bounds instead of `a + F * (b - c)`.
    ///
    /// # Arguments
    ///
    /// * `target_idx` - Index of the member the trial competes against
    /// * `population` - The current population
    /// * `bounds` - Parameter bounds
    /// * `rng` - Random number generator
    fn create_trial(
        &self,
        target_idx: usize,
        population: &Population,
        bounds: &[(f64, f64)],
        rng: &mut StdRng,
    ) -> Array1<f64> {
        let target = population.member(target_idx);
        let dim = target.len();

        let mut available_indices: Vec<usize> =
            (0..population.len()).filter(|&i| i != target_idx).collect();

        let donor = if available_indices.len() < 3 {
            random_point(bounds, rng)
        } else {
            available_indices.shuffle(rng);
            let a = population.member(available_indices[0]);
            let b = population.member(available_indices[1]);
            let c = population.member(available_indices[2]);
            a + &((b - c) * self.settings.differential_weight)
        };

        let mut trial = target.clone();

        // at least one component always comes from the donor
        let j_rand = rng.gen_range(0..dim);

        for j in 0..dim {
            if j == j_rand || rng.gen::<f64>() < self.settings.crossover_prob {
                trial[j] = donor[j];
            }
        }

        clip_to_bounds(&trial, bounds)
    }
}

impl Algorithm for DifferentialEvolution {
    fn kind(&self) -> AlgorithmKind {
        AlgorithmKind::DifferentialEvolution
    }

    fn propose(
        &mut self,
        population: &Population,
        bounds: &[(f64, f64)],
        rng: &mut StdRng,
    ) -> Vec<Array1<f64>> {
        (0..population.len())
            .map(|i| self.create_trial(i, population, bounds, rng))
            .collect()
    }

    fn absorb(
        &mut self,
        population: &mut Population,
        candidates: Vec<Array1<f64>>,
        fitness: Vec<f64>,
    ) {
        for (i, (trial, trial_cost)) in candidates.into_iter().zip(fitness).enumerate() {
            if i < population.len() && trial_cost <= population.fitness()[i] {
                population.replace(i, trial, trial_cost);
            }
        }
    }
}
