//! Islands and migration.
//!
//! An [`Island`] couples one [`Algorithm`] instance with its population and
//! random number generator. Islands evolve in isolation; after each generation
//! [`migrate`] copies the single globally best member into every other island
//! whose worst member it beats.

use ndarray::Array1;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::debug;

use crate::algorithms::{clip_to_bounds, within_bounds, Algorithm, Population};

/// One independently evolving population.
pub struct Island {
    id: usize,
    algorithm: Box<dyn Algorithm>,
    population: Population,
    rng: StdRng,
}

impl Island {
    /// Create an island from an already evaluated population.
    ///
    /// # Arguments
    ///
    /// * `id` - Island index, used in logs
    /// * `algorithm` - The search strategy
    /// * `population` - Initial members and their fitness
    /// * `seed` - Seed for this island's random number generator
    pub fn new(
        id: usize,
        algorithm: Box<dyn Algorithm>,
        population: Population,
        seed: u64,
    ) -> Self {
        Self {
            id,
            algorithm,
            population,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn id(&self) -> usize {
        self.id
    }

    pub fn population(&self) -> &Population {
        &self.population
    }

    pub fn best(&self) -> Option<(&Array1<f64>, f64)> {
        self.population.best()
    }

    pub fn best_fitness(&self) -> Option<f64> {
        self.population.best_fitness()
    }

    /// First half of a generation: candidates to evaluate.
    ///
    /// Candidates are clipped to `bounds` again in release builds; debug builds
    /// assert that the algorithm kept them in bounds itself.
    pub fn propose(&mut self, bounds: &[(f64, f64)]) -> Vec<Array1<f64>> {
        self.algorithm
            .propose(&self.population, bounds, &mut self.rng)
            .into_iter()
            .map(|candidate| {
                debug_assert!(
                    within_bounds(&candidate, bounds),
                    "{} proposed an out-of-bounds point",
                    self.algorithm.kind()
                );
                clip_to_bounds(&candidate, bounds)
            })
            .collect()
    }

    /// Second half of a generation: fold the evaluated candidates back in.
    pub fn absorb(&mut self, candidates: Vec<Array1<f64>>, fitness: Vec<f64>) {
        self.algorithm.absorb(&mut self.population, candidates, fitness);
    }

    /// Replace the worst member with `migrant` if the migrant is strictly better.
    ///
    /// Returns whether the migrant was accepted.
    pub fn receive_migrant(&mut self, migrant: &Array1<f64>, fitness: f64) -> bool {
        let worst = match self.population.worst_index() {
            Some(i) => i,
            None => return false,
        };
        if fitness < self.population.fitness()[worst] {
            self.population.replace(worst, migrant.clone(), fitness);
            self.algorithm.on_migrant(worst, &self.population);
            true
        } else {
            false
        }
    }
}

/// Copy the globally best member into every other island.
///
/// Each receiving island only replaces its worst member, and only when the
/// migrant is strictly better, so no island's best fitness gets worse.
///
/// # Returns
///
/// * The number of islands that accepted the migrant
pub fn migrate(islands: &mut [Island]) -> usize {
    if islands.len() < 2 {
        return 0;
    }

    let source = islands
        .iter()
        .enumerate()
        .filter_map(|(i, island)| island.best_fitness().map(|f| (i, f)))
        .min_by(|(_, a), (_, b)| a.total_cmp(b))
        .map(|(i, _)| i);
    let source = match source {
        Some(i) => i,
        None => return 0,
    };

    let (migrant, fitness) = match islands[source].best() {
        Some((member, fitness)) => (member.clone(), fitness),
        None => return 0,
    };

    let mut accepted = 0;
    for (i, island) in islands.iter_mut().enumerate() {
        if i != source && island.receive_migrant(&migrant, fitness) {
            accepted += 1;
        }
    }

    debug!(source, fitness, accepted, "migrated best candidate");
    accepted
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algorithms::DifferentialEvolution;
    use ndarray::array;

    fn island(id: usize, fitness: Vec<f64>) -> Island {
        let members = fitness.iter().map(|&f| array![f]).collect();
        Island::new(
            id,
            Box::new(DifferentialEvolution::default()),
            Population::new(members, fitness).unwrap(),
            id as u64,
        )
    }

    #[test]
    fn test_migration_replaces_worst() {
        let mut islands = vec![island(0, vec![5.0, 1.0, 3.0]), island(1, vec![0.5, 4.0, 2.0])];
        let accepted = migrate(&mut islands);
        assert_eq!(accepted, 1);

        // island 1 holds the global best and is left alone
        assert_eq!(islands[1].population().fitness(), &[0.5, 4.0, 2.0]);
        // island 0 lost its worst member (5.0) to the migrant
        assert_eq!(islands[0].population().fitness(), &[0.5, 1.0, 3.0]);
        assert_eq!(islands[0].population().member(0), &array![0.5]);
    }

    #[test]
    fn test_migration_never_worsens_best() {
        let mut islands = vec![
            island(0, vec![2.0, 2.0]),
            island(1, vec![1.0, 9.0]),
            island(2, vec![0.1, 0.2]),
        ];
        let before: Vec<f64> = islands.iter().map(|i| i.best_fitness().unwrap()).collect();
        migrate(&mut islands);
        for (island, old) in islands.iter().zip(before) {
            assert!(island.best_fitness().unwrap() <= old);
        }
        assert_eq!(islands[0].best_fitness(), Some(0.1));
        assert_eq!(islands[1].best_fitness(), Some(0.1));
    }

    #[test]
    fn test_migrant_must_be_strictly_better() {
        let mut islands = vec![island(0, vec![1.0, 1.0]), island(1, vec![1.0, 1.0])];
        assert_eq!(migrate(&mut islands), 0);
    }

    #[test]
    fn test_single_island_skips_migration() {
        let mut islands = vec![island(0, vec![1.0, 2.0])];
        assert_eq!(migrate(&mut islands), 0);
        assert_eq!(islands[0].population().fitness(), &[1.0, 2.0]);
    }

    #[test]
    fn test_propose_stays_in_bounds() {
        let mut isl = island(0, vec![0.1, 0.2, 0.3, 0.4]);
        let bounds = vec![(0.0, 1.0)];
        for _ in 0..20 {
            let candidates = isl.propose(&bounds);
            assert_eq!(candidates.len(), 4);
            assert!(candidates.iter().all(|c| within_bounds(c, &bounds)));
            let fitness = candidates.iter().map(|c| c[0]).collect();
            isl.absorb(candidates, fitness);
        }
        assert!(isl.best_fitness().unwrap() <= 0.1);
    }
}
