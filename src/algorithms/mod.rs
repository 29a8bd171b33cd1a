//! Population algorithms for bounded global search.
//!
//! Each algorithm implements [`Algorithm`]: it proposes candidate parameter
//! vectors from the current [`Population`] and absorbs their fitness values. One
//! propose/evaluate/absorb cycle is a generation. Evaluation is not the
//! algorithm's business; the island driving it evaluates candidates (in
//! parallel) between the two calls.
//!
//! Every algorithm keeps the best member of its population across `absorb`, so the
//! best fitness of an island never gets worse.

use ndarray::Array1;
use rand::rngs::StdRng;
use rand::Rng;
use std::cmp::Ordering;

use crate::error::{OptError, Result};
use crate::options::{AlgorithmConfig, AlgorithmKind};

mod bee_colony;
mod differential_evolution;
mod genetic;
mod particle_swarm;

pub use bee_colony::ArtificialBeeColony;
pub use differential_evolution::DifferentialEvolution;
pub use genetic::GeneticAlgorithm;
pub use particle_swarm::ParticleSwarm;

/// A population of evaluated parameter vectors.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Population {
    members: Vec<Array1<f64>>,
    fitness: Vec<f64>,
}

impl Population {
    /// Create a population from members and their fitness values.
    pub fn new(members: Vec<Array1<f64>>, fitness: Vec<f64>) -> Result<Self> {
        if members.len() != fitness.len() {
            return Err(OptError::DimensionMismatch(format!(
                "{} members but {} fitness values",
                members.len(),
                fitness.len()
            )));
        }
        Ok(Self { members, fitness })
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn members(&self) -> &[Array1<f64>] {
        &self.members
    }

    pub fn fitness(&self) -> &[f64] {
        &self.fitness
    }

    pub fn member(&self, index: usize) -> &Array1<f64> {
        &self.members[index]
    }

    /// Index of the member with the lowest fitness.
    pub fn best_index(&self) -> Option<usize> {
        self.fitness
            .iter()
            .enumerate()
            .min_by(|(_, a), (_, b)| a.total_cmp(b))
            .map(|(i, _)| i)
    }

    /// Index of the member with the highest fitness.
    pub fn worst_index(&self) -> Option<usize> {
        self.fitness
            .iter()
            .enumerate()
            .max_by(|(_, a), (_, b)| a.total_cmp(b))
            .map(|(i, _)| i)
    }

    /// Best member and its fitness.
    pub fn best(&self) -> Option<(&Array1<f64>, f64)> {
        self.best_index()
            .map(|i| (&self.members[i], self.fitness[i]))
    }

    pub fn best_fitness(&self) -> Option<f64> {
        self.best().map(|(_, f)| f)
    }

    /// Member indices ordered from best to worst.
    pub fn ranking(&self) -> Vec<usize> {
        let mut order: Vec<usize> = (0..self.len()).collect();
        order.sort_by(|&a, &b| self.fitness[a].total_cmp(&self.fitness[b]));
        order
    }

    /// Overwrite a member.
    pub fn replace(&mut self, index: usize, member: Array1<f64>, fitness: f64) {
        self.members[index] = member;
        self.fitness[index] = fitness;
    }
}

/// A population-based search strategy.
///
/// Implementations own all their algorithm-specific state (velocities, trial
/// counters, pending parent indices) and must only ever propose points inside
/// `bounds`.
pub trait Algorithm: Send {
    /// Which algorithm this is.
    fn kind(&self) -> AlgorithmKind;

    /// Propose the candidates to evaluate this generation.
    ///
    /// # Arguments
    ///
    /// * `population` - The current, evaluated population
    /// * `bounds` - Lower and upper bounds for each parameter
    /// * `rng` - The island's random number generator
    fn propose(
        &mut self,
        population: &Population,
        bounds: &[(f64, f64)],
        rng: &mut StdRng,
    ) -> Vec<Array1<f64>>;

    /// Fold evaluated candidates back into the population.
    ///
    /// `candidates` and `fitness` are exactly what the preceding
    /// [`Algorithm::propose`] returned, with one fitness per candidate.
    fn absorb(
        &mut self,
        population: &mut Population,
        candidates: Vec<Array1<f64>>,
        fitness: Vec<f64>,
    );

    /// Called after migration overwrote member `index`.
    fn on_migrant(&mut self, _index: usize, _population: &Population) {}
}

/// Create the algorithm selected by `config`.
pub fn create_algorithm(config: &AlgorithmConfig) -> Box<dyn Algorithm> {
    match config.kind {
        AlgorithmKind::DifferentialEvolution => Box::new(DifferentialEvolution::new(
            config.differential_evolution.clone(),
        )),
        AlgorithmKind::ParticleSwarm => {
            Box::new(ParticleSwarm::new(config.particle_swarm.clone()))
        }
        AlgorithmKind::ArtificialBeeColony => {
            Box::new(ArtificialBeeColony::new(config.bee_colony.clone()))
        }
        AlgorithmKind::GeneticAlgorithm => {
            Box::new(GeneticAlgorithm::new(config.genetic.clone()))
        }
    }
}

/// Generate a random point within the given bounds.
///
/// # Arguments
///
/// * `bounds` - Lower and upper bounds for each parameter
/// * `rng` - Random number generator
///
/// # Returns
///
/// * A random point within the bounds
pub fn random_point(bounds: &[(f64, f64)], rng: &mut impl Rng) -> Array1<f64> {
    bounds
        .iter()
        .map(|&(min, max)| rng.gen_range(min..=max))
        .collect()
}

/// Clip a point to the given bounds.
///
/// NaN components are moved to the lower bound.
pub fn clip_to_bounds(point: &Array1<f64>, bounds: &[(f64, f64)]) -> Array1<f64> {
    let mut clipped = point.clone();

    for (i, &(min, max)) in bounds.iter().enumerate() {
        if i < clipped.len() {
            let value = clipped[i];
            clipped[i] = if value.is_nan() { min } else { value.clamp(min, max) };
        }
    }

    clipped
}

/// Whether every component of `point` lies inside its bounds.
pub fn within_bounds(point: &Array1<f64>, bounds: &[(f64, f64)]) -> bool {
    point.len() == bounds.len()
        && point
            .iter()
            .zip(bounds)
            .all(|(&x, &(min, max))| x >= min && x <= max)
}

/// Create a population of random points within the given bounds.
pub fn create_population(
    bounds: &[(f64, f64)],
    pop_size: usize,
    rng: &mut impl Rng,
) -> Vec<Array1<f64>> {
    (0..pop_size).map(|_| random_point(bounds, rng)).collect()
}

/// Total order on fitness values for sorting.
pub(crate) fn cmp_fitness(a: &f64, b: &f64) -> Ordering {
    a.total_cmp(b)
}
