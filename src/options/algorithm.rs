//! Search algorithm configuration.
//!
//! This module defines which population algorithm runs on each island, how many
//! islands and members there are, and the per-algorithm hyperparameters.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{OptError, Result};

/// Population algorithm run on every island.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AlgorithmKind {
    /// DE/rand/1/bin with greedy one-to-one replacement
    DifferentialEvolution,

    /// Inertia-weight particle swarm; the population holds personal bests
    ParticleSwarm,

    /// Artificial bee colony with employed, onlooker and scout phases
    ArtificialBeeColony,

    /// Tournament selection, blend crossover, Gaussian mutation, elitism
    GeneticAlgorithm,
}

impl AlgorithmKind {
    /// Every available algorithm.
    pub const ALL: [AlgorithmKind; 4] = [
        AlgorithmKind::DifferentialEvolution,
        AlgorithmKind::ParticleSwarm,
        AlgorithmKind::ArtificialBeeColony,
        AlgorithmKind::GeneticAlgorithm,
    ];
}

impl fmt::Display for AlgorithmKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AlgorithmKind::DifferentialEvolution => "Differential Evolution",
            AlgorithmKind::ParticleSwarm => "Particle Swarm",
            AlgorithmKind::ArtificialBeeColony => "Artificial Bee Colony",
            AlgorithmKind::GeneticAlgorithm => "Genetic Algorithm",
        };
        write!(f, "{}", name)
    }
}

/// Differential evolution settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DifferentialEvolutionSettings {
    /// Differential weight (F) in range (0, 2]. Default: 0.8
    pub differential_weight: f64,

    /// Crossover probability (CR) in range [0, 1]. Default: 0.9
    pub crossover_prob: f64,
}

impl Default for DifferentialEvolutionSettings {
    fn default() -> Self {
        Self {
            differential_weight: 0.8,
            crossover_prob: 0.9,
        }
    }
}

/// Particle swarm settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParticleSwarmSettings {
    /// Inertia weight. Default: 0.7298
    pub inertia_weight: f64,

    /// Attraction towards the particle's own best. Default: 1.49618
    pub cognitive_coefficient: f64,

    /// Attraction towards the swarm's best. Default: 1.49618
    pub social_coefficient: f64,

    /// Maximum speed per dimension as a fraction of the bound width. Default: 0.5
    pub max_velocity_fraction: f64,
}

impl Default for ParticleSwarmSettings {
    fn default() -> Self {
        Self {
            inertia_weight: 0.7298,
            cognitive_coefficient: 1.49618,
            social_coefficient: 1.49618,
            max_velocity_fraction: 0.5,
        }
    }
}

/// Artificial bee colony settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BeeColonySettings {
    /// Failed improvement attempts before a food source is abandoned. Default: 20
    pub limit: usize,
}

impl Default for BeeColonySettings {
    fn default() -> Self {
        Self { limit: 20 }
    }
}

/// Genetic algorithm settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneticSettings {
    /// Probability that two parents are recombined. Default: 0.9
    pub crossover_prob: f64,

    /// Per-gene mutation probability. Default: 0.1
    pub mutation_prob: f64,

    /// Standard deviation of the Gaussian mutation as a fraction of the bound width. Default: 0.1
    pub mutation_width: f64,

    /// Number of members competing in each tournament. Default: 2
    pub tournament_size: usize,

    /// Number of best members carried over unchanged. Default: 1
    pub elitism: usize,
}

impl Default for GeneticSettings {
    fn default() -> Self {
        Self {
            crossover_prob: 0.9,
            mutation_prob: 0.1,
            mutation_width: 0.1,
            tournament_size: 2,
            elitism: 1,
        }
    }
}

/// Configuration of the island model and its algorithm.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlgorithmConfig {
    /// Algorithm run on every island. Default: ParticleSwarm
    pub kind: AlgorithmKind,

    /// Number of independently evolving islands. Default: 1
    pub islands: usize,

    /// Members per island. Default: 10
    pub population: usize,

    /// RNG seed; island `i` uses `seed + i`. Default: None (entropy)
    #[serde(default)]
    pub seed: Option<u64>,

    #[serde(default)]
    pub differential_evolution: DifferentialEvolutionSettings,

    #[serde(default)]
    pub particle_swarm: ParticleSwarmSettings,

    #[serde(default)]
    pub bee_colony: BeeColonySettings,

    #[serde(default)]
    pub genetic: GeneticSettings,
}

impl Default for AlgorithmConfig {
    fn default() -> Self {
        Self {
            kind: AlgorithmKind::ParticleSwarm,
            islands: 1,
            population: 10,
            seed: None,
            differential_evolution: DifferentialEvolutionSettings::default(),
            particle_swarm: ParticleSwarmSettings::default(),
            bee_colony: BeeColonySettings::default(),
            genetic: GeneticSettings::default(),
        }
    }
}

impl AlgorithmConfig {
    /// Create a configuration for the given algorithm with default settings.
    pub fn new(kind: AlgorithmKind) -> Self {
        Self {
            kind,
            ..Self::default()
        }
    }

    /// Set the number of islands.
    pub fn with_islands(mut self, islands: usize) -> Self {
        self.islands = islands;
        self
    }

    /// Set the number of members per island.
    pub fn with_population(mut self, population: usize) -> Self {
        self.population = population;
        self
    }

    /// Set the random seed for reproducibility.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Validate island count, population size and hyperparameters.
    pub fn validate(&self) -> Result<()> {
        let invalid = |msg: String| Err(OptError::InvalidAlgorithmConfig(msg));

        if self.islands == 0 {
            return invalid("at least one island is required".to_string());
        }
        if self.population == 0 {
            return invalid("population size must be at least 1".to_string());
        }

        let de = &self.differential_evolution;
        if !(de.differential_weight > 0.0 && de.differential_weight <= 2.0) {
            return invalid(format!(
                "differential weight {} outside (0, 2]",
                de.differential_weight
            ));
        }
        if !(0.0..=1.0).contains(&de.crossover_prob) {
            return invalid(format!(
                "DE crossover probability {} outside [0, 1]",
                de.crossover_prob
            ));
        }

        let pso = &self.particle_swarm;
        for (label, value) in [
            ("inertia weight", pso.inertia_weight),
            ("cognitive coefficient", pso.cognitive_coefficient),
            ("social coefficient", pso.social_coefficient),
        ] {
            if !value.is_finite() || value < 0.0 {
                return invalid(format!("PSO {} must be non-negative, got {}", label, value));
            }
        }
        if !(pso.max_velocity_fraction > 0.0 && pso.max_velocity_fraction <= 1.0) {
            return invalid(format!(
                "PSO max velocity fraction {} outside (0, 1]",
                pso.max_velocity_fraction
            ));
        }

        if self.bee_colony.limit == 0 {
            return invalid("bee colony limit must be at least 1".to_string());
        }

        let ga = &self.genetic;
        if !(0.0..=1.0).contains(&ga.crossover_prob) || !(0.0..=1.0).contains(&ga.mutation_prob) {
            return invalid("GA probabilities must lie in [0, 1]".to_string());
        }
        if !(ga.mutation_width > 0.0 && ga.mutation_width.is_finite()) {
            return invalid(format!("GA mutation width {} must be positive", ga.mutation_width));
        }
        if ga.tournament_size == 0 {
            return invalid("GA tournament size must be at least 1".to_string());
        }

        Ok(())
    }
}
