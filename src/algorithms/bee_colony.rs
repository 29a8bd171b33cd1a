//! Artificial Bee Colony.
//!
//! Each population member is a food source. A generation sends out:
//!
//! - one employed bee per source, perturbing one component towards or away
//!   from a random neighbour source;
//! - one onlooker bee per source, choosing the source to perturb with
//!   probability proportional to its quality;
//! - a scout for every source that failed to improve `limit` times in a row,
//!   which proposes a fresh random point and replaces the source outright.
//!
//! Employed and onlooker proposals are greedy. The current best source is
//! never abandoned.

use ndarray::Array1;
use rand::rngs::StdRng;
use rand::Rng;

use super::{random_point, Algorithm, Population};
use crate::options::{AlgorithmKind, BeeColonySettings};

#[derive(Debug, Clone, Copy, PartialEq)]
enum Bee {
    /// Greedy perturbation of the source
    Forager(usize),

    /// Unconditional replacement of an exhausted source
    Scout(usize),
}

/// Artificial bee colony.
#[derive(Debug, Clone)]
pub struct ArtificialBeeColony {
    settings: BeeColonySettings,
    trials: Vec<usize>,
    pending: Vec<Bee>,
}

impl Default for ArtificialBeeColony {
    fn default() -> Self {
        Self::new(BeeColonySettings::default())
    }
}

impl ArtificialBeeColony {
    pub fn new(settings: BeeColonySettings) -> Self {
        Self {
            settings,
            trials: Vec::new(),
            pending: Vec::new(),
        }
    }

    /// `x_i` with one random component moved by `phi * (x_i - x_k)`.
    fn neighbour(
        population: &Population,
        source: usize,
        bounds: &[(f64, f64)],
        rng: &mut StdRng,
    ) -> Array1<f64> {
        let x = population.member(source);
        let mut candidate = x.clone();
        let j = rng.gen_range(0..x.len());
        let (min, max) = bounds[j];

        if population.len() < 2 {
            candidate[j] = rng.gen_range(min..=max);
            return candidate;
        }

        let mut k = rng.gen_range(0..population.len() - 1);
        if k >= source {
            k += 1;
        }
        let phi: f64 = rng.gen_range(-1.0..=1.0);
        candidate[j] = (x[j] + phi * (x[j] - population.member(k)[j])).clamp(min, max);
        candidate
    }

    /// Selection weight of a source; higher is better.
    fn quality(fitness: f64) -> f64 {
        if fitness >= 0.0 {
            1.0 / (1.0 + fitness)
        } else {
            1.0 + fitness.abs()
        }
    }

    /// Roulette-wheel choice of a source for an onlooker.
    fn choose_source(population: &Population, rng: &mut StdRng) -> usize {
        let weights: Vec<f64> = population.fitness().iter().map(|&f| Self::quality(f)).collect();
        let total: f64 = weights.iter().sum();
        if !(total > 0.0 && total.is_finite()) {
            return rng.gen_range(0..population.len());
        }

        let mut pick = rng.gen::<f64>() * total;
        for (i, w) in weights.iter().enumerate() {
            if pick < *w {
                return i;
            }
            pick -= w;
        }
        population.len() - 1
    }
}

impl Algorithm for ArtificialBeeColony {
    fn kind(&self) -> AlgorithmKind {
        AlgorithmKind::ArtificialBeeColony
    }

    fn propose(
        &mut self,
        population: &Population,
        bounds: &[(f64, f64)],
        rng: &mut StdRng,
    ) -> Vec<Array1<f64>> {
        if self.trials.len() != population.len() {
            self.trials = vec![0; population.len()];
        }
        let best = population.best_index();

        self.pending.clear();
        let mut candidates = Vec::with_capacity(2 * population.len());

        for i in 0..population.len() {
            if self.trials[i] >= self.settings.limit && Some(i) != best {
                self.pending.push(Bee::Scout(i));
                candidates.push(random_point(bounds, rng));
            } else {
                self.pending.push(Bee::Forager(i));
                candidates.push(Self::neighbour(population, i, bounds, rng));
            }
        }

        for _ in 0..population.len() {
            let i = Self::choose_source(population, rng);
            self.pending.push(Bee::Forager(i));
            candidates.push(Self::neighbour(population, i, bounds, rng));
        }

        candidates
    }

    fn absorb(
        &mut self,
        population: &mut Population,
        candidates: Vec<Array1<f64>>,
        fitness: Vec<f64>,
    ) {
        let pending = std::mem::take(&mut self.pending);
        let evaluated = candidates.into_iter().zip(fitness);
        for (bee, (candidate, cost)) in pending.into_iter().zip(evaluated) {
            match bee {
                Bee::Scout(i) => {
                    population.replace(i, candidate, cost);
                    self.trials[i] = 0;
                }
                Bee::Forager(i) => {
                    if cost < population.fitness()[i] {
                        population.replace(i, candidate, cost);
                        self.trials[i] = 0;
                    } else {
                        self.trials[i] += 1;
                    }
                }
            }
        }
    }

    fn on_migrant(&mut self, index: usize, _population: &Population) {
        if let Some(t) = self.trials.get_mut(index) {
            *t = 0;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algorithms::test_support;
    use ndarray::array;
    use rand::SeedableRng;

    #[test]
    fn test_bee_colony_converges() {
        let mut abc = ArtificialBeeColony::default();
        let population = test_support::run(&mut abc, 10, 80);
        assert!(population.best_fitness().unwrap() < 5e-2);
    }

    #[test]
    fn test_proposes_employed_and_onlookers() {
        let mut abc = ArtificialBeeColony::default();
        let bounds = test_support::bounds(2);
        let mut rng = StdRng::seed_from_u64(9);
        let population = test_support::population(&bounds, 5, &mut rng);
        assert_eq!(abc.propose(&population, &bounds, &mut rng).len(), 10);
    }

    #[test]
    fn test_scout_replaces_exhausted_source_but_not_best() {
        let mut abc = ArtificialBeeColony::new(BeeColonySettings { limit: 1 });
        let bounds = vec![(0.0, 1.0)];
        let mut rng = StdRng::seed_from_u64(11);
        let mut population =
            Population::new(vec![array![0.1], array![0.9]], vec![0.0, 5.0]).unwrap();

        // no candidate improves, so both sources become exhausted
        let candidates = abc.propose(&population, &bounds, &mut rng);
        let n = candidates.len();
        abc.absorb(&mut population, candidates, vec![10.0; n]);
        assert!(abc.trials.iter().all(|&t| t >= 1));

        let candidates = abc.propose(&population, &bounds, &mut rng);
        assert_eq!(abc.pending[0], Bee::Forager(0));
        assert_eq!(abc.pending[1], Bee::Scout(1));

        let n = candidates.len();
        abc.absorb(&mut population, candidates, vec![7.0; n]);
        assert_eq!(population.fitness()[0], 0.0);
        assert_eq!(population.fitness()[1], 7.0);
    }
}
