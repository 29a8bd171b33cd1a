//! Fitness evaluation.
//!
//! The [`Evaluator`] turns a parameter vector into one scalar fitness (lower is
//! better): it writes the vector into a private copy of the model, runs the
//! simulator once for the distinct sampling times of all cost terms, and sums
//! the weighted cost terms.
//!
//! Failures for a single candidate never abort a search. [`Evaluator::fitness`]
//! maps them to [`WORST_FITNESS`], logs them and counts them.

use ndarray::Array1;
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::warn;

use crate::error::{OptError, Result};
use crate::model::ParameterModel;
use crate::options::{OptCost, OptParam, OptimizeOptions};
use crate::simulator::{QuantityKey, Simulator};

/// Fitness assigned to candidates whose evaluation failed.
pub const WORST_FITNESS: f64 = f64::MAX;

/// Evaluates candidate parameter vectors against a fixed model snapshot.
pub struct Evaluator<M, S> {
    model: M,
    simulator: S,
    params: Vec<OptParam>,
    costs: Vec<OptCost>,

    /// Distinct sampling times, ascending
    times: Vec<f64>,

    /// Index into `times` for each cost term
    time_index: Vec<usize>,

    evaluations: AtomicUsize,
    failures: AtomicUsize,
}

impl<M: ParameterModel, S: Simulator<M>> Evaluator<M, S> {
    /// Bind options to a model snapshot and simulator.
    ///
    /// Every parameter must exist in `model`, every cost term must address a
    /// quantity the simulator produces, and non-empty target values must have
    /// exactly the simulator's output length.
    ///
    /// # Arguments
    ///
    /// * `model` - The snapshot to evaluate against; copied for each evaluation
    /// * `simulator` - The simulator
    /// * `options` - Options, already validated with [`OptimizeOptions::validate`]
    pub fn new(model: M, simulator: S, options: &OptimizeOptions) -> Result<Self> {
        for param in &options.opt_params {
            if model.parameter_value(param).is_none() {
                return Err(OptError::UnknownParameter(param.path()));
            }
        }

        for cost in &options.opt_costs {
            let expected = simulator
                .output_len(&model, QuantityKey::of(cost))
                .ok_or_else(|| {
                    OptError::UnknownQuantity(format!(
                        "{} ({:?}, compartment {}, species {})",
                        cost.target_id, cost.kind, cost.compartment_index, cost.species_index
                    ))
                })?;
            if !cost.target_values.is_empty() && cost.target_values.len() != expected {
                return Err(OptError::TargetLengthMismatch {
                    name: cost.name.clone(),
                    expected,
                    actual: cost.target_values.len(),
                });
            }
        }

        let (times, time_index) = sampling_times(&options.opt_costs);

        Ok(Self {
            model,
            simulator,
            params: options.opt_params.clone(),
            costs: options.opt_costs.clone(),
            times,
            time_index,
            evaluations: AtomicUsize::new(0),
            failures: AtomicUsize::new(0),
        })
    }

    /// The distinct times the simulator is asked for, ascending.
    pub fn simulation_times(&self) -> &[f64] {
        &self.times
    }

    /// The model snapshot evaluations start from.
    pub fn model(&self) -> &M {
        &self.model
    }

    /// Evaluate a candidate, propagating any failure.
    ///
    /// # Arguments
    ///
    /// * `params` - Parameter vector in `opt_params` order
    ///
    /// # Returns
    ///
    /// * The aggregated fitness `sum(weight * cost)`
    pub fn try_fitness(&self, params: &Array1<f64>) -> Result<f64> {
        if params.len() != self.params.len() {
            return Err(OptError::DimensionMismatch(format!(
                "Expected {} parameters, got {}",
                self.params.len(),
                params.len()
            )));
        }

        let mut model = self.model.clone();
        for (param, &value) in self.params.iter().zip(params.iter()) {
            model.set_parameter_value(param, value)?;
        }

        let frames = self.simulator.simulate(&model, &self.times)?;
        if frames.len() != self.times.len() {
            return Err(OptError::SimulationFailed(format!(
                "requested {} time points, simulator returned {}",
                self.times.len(),
                frames.len()
            )));
        }

        let mut fitness = 0.0;
        for (cost, &t) in self.costs.iter().zip(&self.time_index) {
            let key = QuantityKey::of(cost);
            let field = frames[t].field(&key).ok_or_else(|| {
                OptError::SimulationFailed(format!(
                    "no output for '{}' at t = {}",
                    cost.target_id, self.times[t]
                ))
            })?;
            // zero weights still evaluate so malformed output is caught
            let term = cost.cost(field)?;
            fitness += cost.weight * term;
        }

        if !fitness.is_finite() {
            return Err(OptError::SimulationFailed(format!(
                "non-finite fitness {}",
                fitness
            )));
        }
        Ok(fitness)
    }

    /// Evaluate a candidate; failures yield [`WORST_FITNESS`].
    pub fn fitness(&self, params: &Array1<f64>) -> f64 {
        self.evaluations.fetch_add(1, Ordering::Relaxed);
        match self.try_fitness(params) {
            Ok(fitness) => fitness,
            Err(err) => {
                self.failures.fetch_add(1, Ordering::Relaxed);
                warn!(params = ?params.to_vec(), error = %err, "candidate evaluation failed");
                WORST_FITNESS
            }
        }
    }

    /// Number of calls to [`Evaluator::fitness`].
    pub fn evaluation_count(&self) -> usize {
        self.evaluations.load(Ordering::Relaxed)
    }

    /// Number of calls to [`Evaluator::fitness`] that failed.
    pub fn failure_count(&self) -> usize {
        self.failures.load(Ordering::Relaxed)
    }
}

/// Deduplicate the sampling times of the cost terms.
///
/// Returns the sorted distinct times and, for each cost, the index of its time.
fn sampling_times(costs: &[OptCost]) -> (Vec<f64>, Vec<usize>) {
    let mut times: Vec<f64> = costs.iter().map(|c| c.simulation_time).collect();
    times.sort_by(f64::total_cmp);
    times.dedup();

    let index = costs
        .iter()
        .map(|c| {
            times
                .binary_search_by(|t| t.total_cmp(&c.simulation_time))
                .unwrap_or_else(|i| i.min(times.len().saturating_sub(1)))
        })
        .collect();
    (times, index)
}
