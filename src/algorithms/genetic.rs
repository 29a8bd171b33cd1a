//! Real-coded genetic algorithm.
//!
//! Parents are picked by tournament, recombined with blend (BLX-0.5) crossover
//! and mutated per gene with Gaussian noise scaled to the bound width. The
//! `elitism` best current members compete with the offspring for the next
//! population, so the best member is never lost.

use ndarray::Array1;
use rand::rngs::StdRng;
use rand::Rng;
use rand_distr::{Distribution, Normal};

use super::{clip_to_bounds, cmp_fitness, Algorithm, Population};
use crate::options::{AlgorithmKind, GeneticSettings};

const BLEND_ALPHA: f64 = 0.5;

/// Genetic algorithm with elitist replacement.
#[derive(Debug, Clone)]
pub struct GeneticAlgorithm {
    settings: GeneticSettings,
}

impl Default for GeneticAlgorithm {
    fn default() -> Self {
        Self::new(GeneticSettings::default())
    }
}

impl GeneticAlgorithm {
    pub fn new(settings: GeneticSettings) -> Self {
        Self { settings }
    }

    /// Number of members carried over; at least one so the best is never lost.
    fn elites(&self, population_size: usize) -> usize {
        self.settings.elitism.clamp(1, population_size.max(1))
    }

    fn tournament(&self, population: &Population, rng: &mut StdRng) -> usize {
        let mut winner = rng.gen_range(0..population.len());
        for _ in 1..self.settings.tournament_size {
            let challenger = rng.gen_range(0..population.len());
            if population.fitness()[challenger] < population.fitness()[winner] {
                winner = challenger;
            }
        }
        winner
    }

    /// Blend crossover: each gene drawn uniformly from the parents' interval
    /// widened by `BLEND_ALPHA` on both sides.
    fn crossover(a: &Array1<f64>, b: &Array1<f64>, rng: &mut StdRng) -> Array1<f64> {
        a.iter()
            .zip(b.iter())
            .map(|(&x, &y)| {
                let (lo, hi) = if x <= y { (x, y) } else { (y, x) };
                let span = hi - lo;
                if span == 0.0 {
                    x
                } else {
                    rng.gen_range((lo - BLEND_ALPHA * span)..=(hi + BLEND_ALPHA * span))
                }
            })
            .collect()
    }

    fn mutate(&self, child: &mut Array1<f64>, bounds: &[(f64, f64)], rng: &mut StdRng) {
        for (j, &(min, max)) in bounds.iter().enumerate() {
            if rng.gen::<f64>() < self.settings.mutation_prob {
                let sigma = self.settings.mutation_width * (max - min);
                if let Ok(normal) = Normal::new(0.0, sigma) {
                    child[j] += normal.sample(rng);
                }
            }
        }
    }
}

impl Algorithm for GeneticAlgorithm {
    fn kind(&self) -> AlgorithmKind {
        AlgorithmKind::GeneticAlgorithm
    }

    fn propose(
        &mut self,
        population: &Population,
        bounds: &[(f64, f64)],
        rng: &mut StdRng,
    ) -> Vec<Array1<f64>> {
        if population.is_empty() {
            return Vec::new();
        }
        let offspring = population.len() - self.elites(population.len()).min(population.len() - 1);

        (0..offspring)
            .map(|_| {
                let a = self.tournament(population, rng);
                let mut child = if rng.gen::<f64>() < self.settings.crossover_prob {
                    let b = self.tournament(population, rng);
                    Self::crossover(population.member(a), population.member(b), rng)
                } else {
                    population.member(a).clone()
                };
                self.mutate(&mut child, bounds, rng);
                clip_to_bounds(&child, bounds)
            })
            .collect()
    }

    fn absorb(
        &mut self,
        population: &mut Population,
        candidates: Vec<Array1<f64>>,
        fitness: Vec<f64>,
    ) {
        let size = population.len();
        let elites = self.elites(size);

        let mut pool: Vec<(Array1<f64>, f64)> = population
            .ranking()
            .into_iter()
            .take(elites)
            .map(|i| (population.member(i).clone(), population.fitness()[i]))
            .collect();

        pool.extend(candidates.into_iter().zip(fitness));
        pool.sort_by(|a, b| cmp_fitness(&a.1, &b.1));

        // elites plus children can fall short if fewer were proposed; refill
        // from the rest of the current ranking
        if pool.len() < size {
            for i in population.ranking().into_iter().skip(elites) {
                if pool.len() == size {
                    break;
                }
                pool.push((population.member(i).clone(), population.fitness()[i]));
            }
        }
        pool.truncate(size);

        for (i, (member, cost)) in pool.into_iter().enumerate() {
            population.replace(i, member, cost);
        }
    }
}
