//! Objective term descriptions.

use serde::{Deserialize, Serialize};

use crate::error::{OptError, Result};

/// Default epsilon added to the denominator of relative differences.
pub const DEFAULT_EPSILON: f64 = 1e-14;

/// Simulation time used by [`OptCost::default_concentration`].
pub const DEFAULT_SIMULATION_TIME: f64 = 100.0;

/// Which simulated quantity a cost term samples.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OptCostKind {
    /// Species concentration field.
    Concentration,

    /// Rate of change of the species concentration field.
    ConcentrationDcdt,
}

/// How the simulated values are compared against the reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DiffMode {
    /// `|simulated - reference|`
    Absolute,

    /// `|simulated - reference| / (|reference| + epsilon)`
    ///
    /// Requires non-empty target values.
    Relative,
}

/// One term of the aggregate objective.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptCost {
    pub kind: OptCostKind,
    pub diff_mode: DiffMode,

    /// Display label.
    pub name: String,

    /// Id of the simulated species.
    pub target_id: String,

    /// Simulated time at which the quantity is sampled.
    pub simulation_time: f64,

    /// Multiplier on this term's contribution to the total fitness.
    pub weight: f64,

    pub compartment_index: usize,
    pub species_index: usize,

    /// Per-location reference values; empty means a reference of zero everywhere.
    #[serde(default)]
    pub target_values: Vec<f64>,

    /// Only used in [`DiffMode::Relative`].
    #[serde(default = "default_epsilon")]
    pub epsilon: f64,
}

fn default_epsilon() -> f64 {
    DEFAULT_EPSILON
}

impl OptCost {
    /// Create a cost term with the default epsilon.
    ///
    /// # Arguments
    ///
    /// * `kind` - Sampled quantity
    /// * `diff_mode` - Absolute or relative difference
    /// * `name` - Display label
    /// * `target_id` - Species id
    /// * `simulation_time` - Time at which to sample
    /// * `weight` - Scale factor for this term
    /// * `compartment_index` - Compartment index in the simulator output
    /// * `species_index` - Species index within the compartment
    /// * `target_values` - Reference field, or empty for zero
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        kind: OptCostKind,
        diff_mode: DiffMode,
        name: impl Into<String>,
        target_id: impl Into<String>,
        simulation_time: f64,
        weight: f64,
        compartment_index: usize,
        species_index: usize,
        target_values: Vec<f64>,
    ) -> Self {
        Self {
            kind,
            diff_mode,
            name: name.into(),
            target_id: target_id.into(),
            simulation_time,
            weight,
            compartment_index,
            species_index,
            target_values,
            epsilon: DEFAULT_EPSILON,
        }
    }

    /// The default suggestion for a species: absolute distance of its
    /// concentration from zero at t = 100, weight 1.
    pub fn default_concentration(
        name: impl Into<String>,
        target_id: impl Into<String>,
        compartment_index: usize,
        species_index: usize,
    ) -> Self {
        Self::new(
            OptCostKind::Concentration,
            DiffMode::Absolute,
            name,
            target_id,
            DEFAULT_SIMULATION_TIME,
            1.0,
            compartment_index,
            species_index,
            Vec::new(),
        )
    }

    /// Set the epsilon used by relative differences.
    pub fn with_epsilon(mut self, epsilon: f64) -> Self {
        self.epsilon = epsilon;
        self
    }

    /// Set the reference field.
    pub fn with_target_values(mut self, target_values: Vec<f64>) -> Self {
        self.target_values = target_values;
        self
    }

    /// Validate everything that can be checked without a simulator.
    pub fn validate(&self) -> Result<()> {
        if !self.weight.is_finite() || self.weight < 0.0 {
            return Err(OptError::NegativeWeight {
                name: self.name.clone(),
                weight: self.weight,
            });
        }
        if !self.simulation_time.is_finite() || self.simulation_time < 0.0 {
            return Err(OptError::NegativeSimulationTime {
                name: self.name.clone(),
                time: self.simulation_time,
            });
        }
        if self.diff_mode == DiffMode::Relative
            && (!self.epsilon.is_finite() || self.epsilon <= 0.0)
        {
            return Err(OptError::InvalidEpsilon {
                name: self.name.clone(),
                epsilon: self.epsilon,
            });
        }
        if self.diff_mode == DiffMode::Relative && self.target_values.is_empty() {
            return Err(OptError::InvalidTargetValues {
                name: self.name.clone(),
                reason: "a relative difference needs a reference field".to_string(),
            });
        }
        if let Some(i) = self.target_values.iter().position(|v| !v.is_finite()) {
            return Err(OptError::InvalidTargetValues {
                name: self.name.clone(),
                reason: format!("{} at location {}", self.target_values[i], i),
            });
        }
        Ok(())
    }

    /// Compute this term's unweighted cost for a simulated field.
    ///
    /// Per-location differences are summed. With no target values every
    /// location is compared against zero.
    ///
    /// # Arguments
    ///
    /// * `simulated` - The simulated field for the addressed quantity
    ///
    /// # Returns
    ///
    /// * The cost, or an error if the field does not match the target values
    ///   or contains non-finite values
    pub fn cost(&self, simulated: &[f64]) -> Result<f64> {
        if !self.target_values.is_empty() && self.target_values.len() != simulated.len() {
            return Err(OptError::DimensionMismatch(format!(
                "cost '{}' expects {} values, simulator produced {}",
                self.name,
                self.target_values.len(),
                simulated.len()
            )));
        }
        if simulated.iter().any(|v| !v.is_finite()) {
            return Err(OptError::SimulationFailed(format!(
                "non-finite value in output for cost '{}'",
                self.name
            )));
        }

        let reference = |i: usize| self.target_values.get(i).copied().unwrap_or(0.0);
        let total = simulated
            .iter()
            .enumerate()
            .map(|(i, s)| {
                let r = reference(i);
                let diff = (s - r).abs();
                match self.diff_mode {
                    DiffMode::Absolute => diff,
                    DiffMode::Relative => diff / (r.abs() + self.epsilon),
                }
            })
            .sum();
        Ok(total)
    }
}
