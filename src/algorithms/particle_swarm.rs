//! Particle Swarm Optimization.
//!
//! Each particle has a position and velocity. The [`Population`] holds the
//! particles' personal bests, so the population's best member is the swarm's
//! global best and never gets worse. Proposals are the particles' new positions.

use ndarray::Array1;
use rand::rngs::StdRng;
use rand::Rng;

use super::{random_point, Algorithm, Population};
use crate::options::{AlgorithmKind, ParticleSwarmSettings};

/// Inertia-weight particle swarm.
#[derive(Debug, Clone)]
pub struct ParticleSwarm {
    settings: ParticleSwarmSettings,
    positions: Vec<Array1<f64>>,
    velocities: Vec<Array1<f64>>,
}

impl Default for ParticleSwarm {
    fn default() -> Self {
        Self::new(ParticleSwarmSettings::default())
    }
}

impl ParticleSwarm {
    pub fn new(settings: ParticleSwarmSettings) -> Self {
        Self {
            settings,
            positions: Vec::new(),
            velocities: Vec::new(),
        }
    }

    /// Start every particle at its personal best with a small random velocity.
    fn initialize(&mut self, population: &Population, bounds: &[(f64, f64)], rng: &mut StdRng) {
        self.positions = population.members().to_vec();
        self.velocities = (0..population.len())
            .map(|_| {
                let target = random_point(bounds, rng);
                bounds
                    .iter()
                    .zip(target.iter())
                    .map(|(&(min, max), &t)| {
                        let limit = self.max_velocity(min, max);
                        ((t - (min + max) / 2.0) * 0.5).clamp(-limit, limit)
                    })
                    .collect()
            })
            .collect();
    }

    fn max_velocity(&self, min: f64, max: f64) -> f64 {
        self.settings.max_velocity_fraction * (max - min)
    }

    /// Move particle `i` one step.
    fn step(
        &mut self,
        i: usize,
        personal_best: &Array1<f64>,
        global_best: &Array1<f64>,
        bounds: &[(f64, f64)],
        rng: &mut StdRng,
    ) -> Array1<f64> {
        let w = self.settings.inertia_weight;
        let c1 = self.settings.cognitive_coefficient;
        let c2 = self.settings.social_coefficient;

        for (j, &(min, max)) in bounds.iter().enumerate() {
            let x = self.positions[i][j];
            let r1: f64 = rng.gen();
            let r2: f64 = rng.gen();
            let limit = self.max_velocity(min, max);

            let mut v = w * self.velocities[i][j]
                + c1 * r1 * (personal_best[j] - x)
                + c2 * r2 * (global_best[j] - x);
            v = v.clamp(-limit, limit);

            let mut next = x + v;
            // stop at the wall instead of bouncing out
            if next < min {
                next = min;
                v = 0.0;
            } else if next > max {
                next = max;
                v = 0.0;
            }

            self.velocities[i][j] = v;
            self.positions[i][j] = next;
        }

        self.positions[i].clone()
    }
}

impl Algorithm for ParticleSwarm {
    fn kind(&self) -> AlgorithmKind {
        AlgorithmKind::ParticleSwarm
    }

    fn propose(
        &mut self,
        population: &Population,
        bounds: &[(f64, f64)],
        rng: &mut StdRng,
    ) -> Vec<Array1<f64>> {
        if self.positions.len() != population.len() {
            self.initialize(population, bounds, rng);
        }

        let global_best = match population.best() {
            Some((member, _)) => member.clone(),
            None => return Vec::new(),
        };

        (0..population.len())
            .map(|i| self.step(i, population.member(i), &global_best, bounds, rng))
            .collect()
    }

    fn absorb(
        &mut self,
        population: &mut Population,
        candidates: Vec<Array1<f64>>,
        fitness: Vec<f64>,
    ) {
        for (i, (position, cost)) in candidates.into_iter().zip(fitness).enumerate() {
            if i < population.len() && cost <= population.fitness()[i] {
                population.replace(i, position, cost);
            }
        }
    }

    fn on_migrant(&mut self, index: usize, population: &Population) {
        if index < self.positions.len() {
            self.positions[index] = population.member(index).clone();
            self.velocities[index].fill(0.0);
        }
    }
}
