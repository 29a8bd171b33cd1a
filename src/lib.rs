//! # spatialopt-rs
//!
//! `spatialopt-rs` searches a bounded parameter space (e.g. reaction rate
//! constants) of a spatial biochemical model to minimize a simulation-derived
//! cost, such as the deviation of a species' concentration field from a target
//! at a given time.
//!
//! The library provides:
//! - A typed, serializable description of the problem ([`options`])
//! - An [`Evaluator`] that turns a parameter vector into one fitness value using
//!   an injected [`Simulator`]
//! - Population algorithms (differential evolution, particle swarm, artificial
//!   bee colony, genetic algorithm) behind one [`Algorithm`] trait
//! - An island model with elitist migration, driven by the [`Optimization`]
//!   controller, which records monotonically improving progress, can run in the
//!   background and can be stopped cooperatively
//!
//! The simulator and the model type belong to the embedding application; they
//! are plugged in through [`Simulator`] and [`ParameterModel`].

// Public modules
pub mod error;

// Problem description
pub mod options;

// Collaborator interfaces
pub mod model;
pub mod simulator;

// Search
pub mod algorithms;
pub mod evaluator;
pub mod island;
pub mod optimization;

// Re-exports for convenience
pub use algorithms::{Algorithm, Population};
pub use error::{OptError, Result};
pub use evaluator::{Evaluator, WORST_FITNESS};
pub use model::{ParameterModel, ParameterTable};
pub use optimization::{History, Optimization, OptimizationState, OptimizationSummary};
pub use options::{
    AlgorithmConfig, AlgorithmKind, DiffMode, OptCost, OptCostKind, OptParam, OptParamKind,
    OptimizeOptions,
};
pub use simulator::{QuantityKey, SimulationFrame, Simulator};

/// Version of the library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
