//! Shared fixtures for integration tests.
//!
//! [`AbToC`] is a closed-form stand-in for a spatial simulation of the reaction
//! `A + B -> C` with rate `k1` (reaction `r1`) in a single compartment. Each
//! pixel starts with equal amounts of A and B and no C, so
//!
//! `A(t) = B(t) = A0 / (1 + k1 * A0 * t)` and `C(t) = A0 - A(t)`.

#![allow(dead_code)]

use std::thread;
use std::time::Duration;

use spatialopt_rs::{
    AlgorithmConfig, AlgorithmKind, DiffMode, OptCost, OptCostKind, OptError, OptParam,
    OptimizeOptions, ParameterTable, QuantityKey, Result, SimulationFrame, Simulator,
};

pub const SPECIES_A: usize = 0;
pub const SPECIES_B: usize = 1;
pub const SPECIES_C: usize = 2;

/// Number of pixels in the compartment.
pub const PIXELS: usize = 16;

/// Closed-form A + B -> C simulator.
#[derive(Debug, Clone)]
pub struct AbToC {
    initial: Vec<f64>,
    delay: Option<Duration>,
    fail_above: Option<f64>,
}

impl Default for AbToC {
    fn default() -> Self {
        Self {
            initial: (0..PIXELS).map(|i| 1.0 + 0.1 * i as f64).collect(),
            delay: None,
            fail_above: None,
        }
    }
}

impl AbToC {
    /// Sleep for `delay` on every simulation.
    pub fn slow(delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Self::default()
        }
    }

    /// Fail every simulation with `k1 > limit`.
    pub fn failing_above(limit: f64) -> Self {
        Self {
            fail_above: Some(limit),
            ..Self::default()
        }
    }

    /// Concentration of A in every pixel at time `t`.
    pub fn species_a(&self, k1: f64, t: f64) -> Vec<f64> {
        self.initial
            .iter()
            .map(|&a0| a0 / (1.0 + k1 * a0 * t))
            .collect()
    }

    fn frame(&self, k1: f64, t: f64) -> SimulationFrame {
        let a = self.species_a(k1, t);
        let c: Vec<f64> = self.initial.iter().zip(&a).map(|(a0, a)| a0 - a).collect();
        let rate: Vec<f64> = a.iter().map(|a| k1 * a * a).collect();
        let loss: Vec<f64> = rate.iter().map(|r| -r).collect();

        let concentration = |species| QuantityKey::new(OptCostKind::Concentration, 0, species);
        let dcdt = |species| QuantityKey::new(OptCostKind::ConcentrationDcdt, 0, species);
        SimulationFrame::new(t)
            .with_field(concentration(SPECIES_A), a.clone())
            .with_field(concentration(SPECIES_B), a)
            .with_field(concentration(SPECIES_C), c)
            .with_field(dcdt(SPECIES_A), loss.clone())
            .with_field(dcdt(SPECIES_B), loss)
            .with_field(dcdt(SPECIES_C), rate)
    }
}

impl Simulator<ParameterTable> for AbToC {
    fn simulate(&self, model: &ParameterTable, times: &[f64]) -> Result<Vec<SimulationFrame>> {
        if let Some(delay) = self.delay {
            thread::sleep(delay);
        }
        let k1 = model
            .reaction_parameter("r1", "k1")
            .ok_or_else(|| OptError::UnknownParameter("r1/k1".to_string()))?;
        if let Some(limit) = self.fail_above {
            if k1 > limit {
                return Err(OptError::SimulationFailed(format!(
                    "solver diverged for k1 = {}",
                    k1
                )));
            }
        }
        Ok(times.iter().map(|&t| self.frame(k1, t)).collect())
    }

    fn output_len(&self, _model: &ParameterTable, key: QuantityKey) -> Option<usize> {
        (key.compartment_index == 0 && key.species_index <= SPECIES_C)
            .then_some(self.initial.len())
    }
}

/// Model with `r1/k1 = 0.1`.
pub fn abtoc_model() -> ParameterTable {
    ParameterTable::new().with_reaction_parameter("r1", "k1", 0.1)
}

pub fn k1(model: &ParameterTable) -> f64 {
    model.reaction_parameter("r1", "k1").unwrap()
}

pub fn k1_param(lower: f64, upper: f64) -> OptParam {
    OptParam::reaction_parameter("k1", "k1", "r1", lower, upper).unwrap()
}

/// Absolute concentration cost of one species.
pub fn concentration_cost(name: &str, species: usize, time: f64, weight: f64) -> OptCost {
    OptCost::new(
        OptCostKind::Concentration,
        DiffMode::Absolute,
        name,
        name,
        time,
        weight,
        0,
        species,
        Vec::new(),
    )
}

/// Minimize the amount of A left at `t = 10`.
pub fn minimize_a_options(kind: AlgorithmKind) -> OptimizeOptions {
    OptimizeOptions::new(
        vec![k1_param(0.05, 0.21)],
        vec![concentration_cost("A", SPECIES_A, 10.0, 1.0)],
        AlgorithmConfig::new(kind)
            .with_islands(2)
            .with_population(3)
            .with_seed(7),
    )
}

/// Minimize the amount of C produced by `t = 1`.
pub fn minimize_c_options(kind: AlgorithmKind) -> OptimizeOptions {
    OptimizeOptions::new(
        vec![k1_param(0.02, 0.88)],
        vec![concentration_cost("C", SPECIES_C, 1.0, 0.23)],
        AlgorithmConfig::new(kind)
            .with_islands(1)
            .with_population(3)
            .with_seed(11),
    )
}

/// Assert that a history of best fitness values never increases.
pub fn assert_non_increasing(fitness: &[f64]) {
    for pair in fitness.windows(2) {
        assert!(
            pair[1] <= pair[0],
            "fitness increased from {} to {}",
            pair[0],
            pair[1]
        );
    }
}
