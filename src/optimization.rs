//! The optimization controller.
//!
//! [`Optimization`] owns the islands of one run and drives them generation by
//! generation. It records the best fitness and parameter vector after every
//! completed generation, supports cooperative cancellation, and can write the
//! best parameters back into a live model.
//!
//! All methods take `&self`, so a run can be driven from a background thread
//! (see [`Optimization::spawn_evolve`]) while another thread polls
//! [`Optimization::iterations`], [`Optimization::fitness`] and
//! [`Optimization::params`].
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use spatialopt_rs::{
//!     AlgorithmConfig, AlgorithmKind, OptCost, OptCostKind, OptParam, Optimization,
//!     OptimizeOptions, ParameterTable, QuantityKey, Result, SimulationFrame, Simulator,
//! };
//!
//! /// Concentration of species 0 decays at rate `r1/k1`.
//! struct Decay;
//!
//! impl Simulator<ParameterTable> for Decay {
//!     fn simulate(&self, model: &ParameterTable, times: &[f64]) -> Result<Vec<SimulationFrame>> {
//!         let k1 = model.reaction_parameter("r1", "k1").unwrap_or(0.0);
//!         let key = QuantityKey::new(OptCostKind::Concentration, 0, 0);
//!         Ok(times
//!             .iter()
//!             .map(|&t| SimulationFrame::new(t).with_field(key, vec![(-k1 * t).exp()]))
//!             .collect())
//!     }
//!
//!     fn output_len(&self, _model: &ParameterTable, _key: QuantityKey) -> Option<usize> {
//!         Some(1)
//!     }
//! }
//!
//! fn main() -> Result<()> {
//!     let mut model = ParameterTable::new().with_reaction_parameter("r1", "k1", 0.1);
//!     let options = OptimizeOptions::new(
//!         vec![OptParam::reaction_parameter("k1", "k1", "r1", 0.05, 0.21)?],
//!         vec![OptCost::default_concentration("A", "A", 0, 0)],
//!         AlgorithmConfig::new(AlgorithmKind::ParticleSwarm).with_islands(2),
//!     );
//!
//!     let optimization = Arc::new(Optimization::new(&model, Decay, options)?);
//!     let handle = optimization.spawn_evolve(1024)?;
//!     // ... poll optimization.fitness() while it runs ...
//!     optimization.request_stop();
//!     let completed = handle.join().expect("evolve thread panicked")?;
//!     println!("{} generations", completed);
//!
//!     optimization.apply_parameters_to_model(&mut model)?;
//!     Ok(())
//! }
//! ```

use ndarray::Array1;
use parking_lot::{Mutex, RwLock};
use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};
use rayon::prelude::*;
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use tracing::{debug, info, warn};

use crate::algorithms::{create_algorithm, create_population, Population};
use crate::error::{OptError, Result};
use crate::evaluator::Evaluator;
use crate::island::{migrate, Island};
use crate::model::ParameterModel;
use crate::options::OptimizeOptions;
use crate::simulator::Simulator;

/// Best fitness and parameters, one entry per completed generation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct History {
    pub fitness: Vec<f64>,
    pub params: Vec<Vec<f64>>,
}

impl History {
    pub fn len(&self) -> usize {
        self.fitness.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fitness.is_empty()
    }

    /// The most recent entry.
    pub fn last(&self) -> Option<(f64, &[f64])> {
        match (self.fitness.last(), self.params.last()) {
            (Some(&f), Some(p)) => Some((f, p.as_slice())),
            _ => None,
        }
    }
}

/// Snapshot of a run's progress.
#[derive(Debug, Clone)]
pub struct OptimizationSummary {
    pub iterations: usize,
    pub best_fitness: Option<f64>,
    pub best_params: Option<Vec<f64>>,
    pub param_names: Vec<String>,
    pub evaluations: usize,
    pub failed_evaluations: usize,
    pub is_running: bool,
}

impl fmt::Display for OptimizationSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Optimization Summary:")?;
        writeln!(f, "  Running: {}", self.is_running)?;
        writeln!(f, "  Iterations: {}", self.iterations)?;
        writeln!(
            f,
            "  Evaluations: {} ({} failed)",
            self.evaluations, self.failed_evaluations
        )?;
        match (self.best_fitness, &self.best_params) {
            (Some(fitness), Some(params)) => {
                writeln!(f, "  Best fitness: {:.6e}", fitness)?;
                for (name, value) in self.param_names.iter().zip(params) {
                    writeln!(f, "    {} = {:.6e}", name, value)?;
                }
            }
            _ => writeln!(f, "  Best fitness: none yet")?,
        }
        Ok(())
    }
}

/// Lifecycle of an [`Optimization`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptimizationState {
    /// Not running; the last `evolve` (if any) ran to completion.
    Idle,

    /// An `evolve` call is in progress.
    Running,

    /// Not running; the last `evolve` ended early on a stop request.
    Stopped,
}

/// Clears the running flag when `evolve` returns, including by panic.
struct RunningGuard<'a>(&'a AtomicBool);

impl Drop for RunningGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// An island-model optimization bound to one model snapshot.
pub struct Optimization<M, S> {
    options: OptimizeOptions,
    bounds: Vec<(f64, f64)>,
    evaluator: Evaluator<M, S>,
    islands: Mutex<Vec<Island>>,
    history: RwLock<History>,
    iterations: AtomicUsize,
    is_running: AtomicBool,
    stop_requested: AtomicBool,
    stopped: AtomicBool,
}

impl<M, S> Optimization<M, S>
where
    M: ParameterModel,
    S: Simulator<M>,
{
    /// Set up an optimization run.
    ///
    /// Validates `options` against `model` and `simulator`, takes a private
    /// snapshot of `model`, and creates and evaluates the initial population of
    /// every island. The first member of island 0 is the model's current
    /// parameter vector (clamped to the bounds).
    ///
    /// # Arguments
    ///
    /// * `model` - The model to optimize; only read here
    /// * `simulator` - The simulator used for every evaluation
    /// * `options` - Parameters, costs and algorithm settings
    ///
    /// # Returns
    ///
    /// * The optimization, or a configuration error
    pub fn new(model: &M, simulator: S, options: OptimizeOptions) -> Result<Self> {
        options.validate()?;
        let evaluator = Evaluator::new(model.clone(), simulator, &options)?;
        let bounds = options.bounds();
        let config = &options.algorithm;

        if config.population < 4 {
            warn!(
                population = config.population,
                "population below 4; search operators fall back to random sampling"
            );
        }

        let base_seed = config
            .seed
            .unwrap_or_else(|| StdRng::from_entropy().next_u64());

        let initial_values: Array1<f64> = options
            .opt_params
            .iter()
            .map(|p| p.clamp(model.parameter_value(p).unwrap_or(p.lower_bound)))
            .collect();

        let mut members: Vec<Vec<Array1<f64>>> = (0..config.islands)
            .map(|i| {
                let seed = base_seed.wrapping_add(i as u64).rotate_left(17);
                let mut rng = StdRng::seed_from_u64(seed);
                create_population(&bounds, config.population, &mut rng)
            })
            .collect();
        members[0][0] = initial_values;

        let fitness: Vec<Vec<f64>> = members
            .par_iter()
            .map(|island| island.par_iter().map(|x| evaluator.fitness(x)).collect())
            .collect();

        let islands = members
            .into_iter()
            .zip(fitness)
            .enumerate()
            .map(|(i, (members, fitness))| {
                let population = Population::new(members, fitness)?;
                Ok(Island::new(
                    i,
                    create_algorithm(config),
                    population,
                    base_seed.wrapping_add(i as u64),
                ))
            })
            .collect::<Result<Vec<_>>>()?;

        info!(
            algorithm = %config.kind,
            islands = config.islands,
            population = config.population,
            params = options.opt_params.len(),
            costs = options.opt_costs.len(),
            times = ?evaluator.simulation_times(),
            "optimization initialized"
        );

        Ok(Self {
            bounds,
            evaluator,
            islands: Mutex::new(islands),
            history: RwLock::new(History::default()),
            iterations: AtomicUsize::new(0),
            is_running: AtomicBool::new(false),
            stop_requested: AtomicBool::new(false),
            stopped: AtomicBool::new(false),
            options,
        })
    }

    /// Run up to `n` generations.
    ///
    /// A stop request is checked before each generation; a generation that has
    /// started always completes, so history and iteration count stay
    /// consistent. A pending stop request is consumed when this returns.
    ///
    /// # Returns
    ///
    /// * The number of generations completed, or [`OptError::AlreadyRunning`]
    ///   if another `evolve` is in progress
    pub fn evolve(&self, n: usize) -> Result<usize> {
        if self
            .is_running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(OptError::AlreadyRunning);
        }
        let _running = RunningGuard(&self.is_running);
        self.stopped.store(false, Ordering::Release);

        let mut completed = 0;
        for _ in 0..n {
            if self.stop_requested.load(Ordering::Acquire) {
                info!(completed, "optimization stopped on request");
                self.stopped.store(true, Ordering::Release);
                break;
            }
            self.run_generation();
            completed += 1;
        }

        self.stop_requested.store(false, Ordering::Release);
        Ok(completed)
    }

    /// One propose / evaluate / absorb cycle on every island, then migration
    /// and bookkeeping.
    fn run_generation(&self) {
        let mut islands = self.islands.lock();

        let proposals: Vec<Vec<Array1<f64>>> = islands
            .iter_mut()
            .map(|island| island.propose(&self.bounds))
            .collect();

        // generation barrier: every evaluation finishes before any island moves on
        let fitness: Vec<Vec<f64>> = proposals
            .par_iter()
            .map(|candidates| {
                candidates
                    .par_iter()
                    .map(|x| self.evaluator.fitness(x))
                    .collect()
            })
            .collect();

        for ((island, candidates), fitness) in islands.iter_mut().zip(proposals).zip(fitness) {
            island.absorb(candidates, fitness);
        }

        migrate(&mut islands);

        let best = islands
            .iter()
            .filter_map(|island| island.best())
            .min_by(|(_, a), (_, b)| a.total_cmp(b))
            .map(|(params, fitness)| (fitness, params.to_vec()));
        drop(islands);

        self.record(best);
    }

    /// Append one history entry and bump the iteration counter.
    ///
    /// The entry repeats the previous one unless the new best is at least as good.
    fn record(&self, best: Option<(f64, Vec<f64>)>) {
        let mut history = self.history.write();

        let entry = match (best, history.last()) {
            (Some((fitness, params)), Some((previous, _))) if fitness <= previous => {
                Some((fitness, params))
            }
            (Some(candidate), None) => Some(candidate),
            (_, Some((previous, params))) => Some((previous, params.to_vec())),
            (None, None) => None,
        };

        if let Some((fitness, params)) = entry {
            history.fitness.push(fitness);
            history.params.push(params);
        }
        let iteration = self.iterations.fetch_add(1, Ordering::AcqRel) + 1;
        drop(history);

        debug!(iteration, best_fitness = ?self.best().map(|(f, _)| f), "generation complete");
    }

    /// Run `evolve(n)` on a new thread.
    ///
    /// Progress can be polled from any thread while it runs.
    pub fn spawn_evolve(self: &Arc<Self>, n: usize) -> Result<JoinHandle<Result<usize>>>
    where
        M: 'static,
        S: 'static,
    {
        let optimization = Arc::clone(self);
        let handle = thread::Builder::new()
            .name("spatialopt-evolve".to_string())
            .spawn(move || optimization.evolve(n))?;
        Ok(handle)
    }

    /// Ask a running `evolve` to stop before its next generation.
    pub fn request_stop(&self) {
        info!("stop requested");
        self.stop_requested.store(true, Ordering::Release);
    }

    pub fn is_running(&self) -> bool {
        self.is_running.load(Ordering::Acquire)
    }

    pub fn state(&self) -> OptimizationState {
        if self.is_running() {
            OptimizationState::Running
        } else if self.stopped.load(Ordering::Acquire) {
            OptimizationState::Stopped
        } else {
            OptimizationState::Idle
        }
    }

    /// Number of completed generations.
    pub fn iterations(&self) -> usize {
        self.iterations.load(Ordering::Acquire)
    }

    /// Best fitness after each completed generation; non-increasing.
    pub fn fitness(&self) -> Vec<f64> {
        self.history.read().fitness.clone()
    }

    /// Best parameter vector after each completed generation.
    pub fn params(&self) -> Vec<Vec<f64>> {
        self.history.read().params.clone()
    }

    /// Fitness and parameter history as one consistent snapshot.
    pub fn history(&self) -> History {
        self.history.read().clone()
    }

    /// Latest best fitness and parameters.
    pub fn best(&self) -> Option<(f64, Vec<f64>)> {
        self.history
            .read()
            .last()
            .map(|(fitness, params)| (fitness, params.to_vec()))
    }

    /// Display names of the parameters, in parameter-vector order.
    pub fn param_names(&self) -> Vec<String> {
        self.options
            .opt_params
            .iter()
            .map(|p| p.name.clone())
            .collect()
    }

    /// The validated options this run was built from.
    pub fn options(&self) -> &OptimizeOptions {
        &self.options
    }

    pub fn evaluation_count(&self) -> usize {
        self.evaluator.evaluation_count()
    }

    pub fn failed_evaluation_count(&self) -> usize {
        self.evaluator.failure_count()
    }

    /// Write the latest best parameters into `model`.
    ///
    /// Must not be called while `evolve` runs on another thread if `model` is
    /// shared with it; the embedding application serializes the two.
    ///
    /// # Returns
    ///
    /// * [`OptError::NoCompletedIterations`] and no change to `model` if no
    ///   generation has completed yet
    pub fn apply_parameters_to_model(&self, model: &mut M) -> Result<()> {
        let (fitness, params) = match self.best() {
            Some(best) => best,
            None => {
                warn!("no completed iterations; model left unchanged");
                return Err(OptError::NoCompletedIterations);
            }
        };

        model.apply_parameters(&self.options.opt_params, &params)?;
        info!(fitness, params = ?params, "applied best parameters to model");
        Ok(())
    }

    /// Snapshot of the run's progress.
    pub fn summary(&self) -> OptimizationSummary {
        let best = self.best();
        OptimizationSummary {
            iterations: self.iterations(),
            best_fitness: best.as_ref().map(|(f, _)| *f),
            best_params: best.map(|(_, p)| p),
            param_names: self.param_names(),
            evaluations: self.evaluation_count(),
            failed_evaluations: self.failed_evaluation_count(),
            is_running: self.is_running(),
        }
    }
}

impl<M, S> fmt::Debug for Optimization<M, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Optimization")
            .field("algorithm", &self.options.algorithm.kind)
            .field("iterations", &self.iterations.load(Ordering::Acquire))
            .field("is_running", &self.is_running.load(Ordering::Acquire))
            .finish()
    }
}
