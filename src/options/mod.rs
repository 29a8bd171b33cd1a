//! # Optimization settings
//!
//! Typed description of an optimization problem: the parameters to vary
//! ([`OptParam`]), the objective terms ([`OptCost`]) and the island/algorithm
//! configuration ([`AlgorithmConfig`]).
//!
//! Settings are plain serde data so that the embedding application can persist
//! them alongside its model. Round-tripping through JSON reproduces every field
//! exactly.
//!
//! ```rust
//! use spatialopt_rs::options::{
//!     AlgorithmConfig, AlgorithmKind, OptCost, OptParam, OptimizeOptions,
//! };
//!
//! let options = OptimizeOptions::new(
//!     vec![OptParam::reaction_parameter("k1", "k1", "r1", 0.05, 0.21).unwrap()],
//!     vec![OptCost::default_concentration("A", "A", 0, 0)],
//!     AlgorithmConfig::new(AlgorithmKind::DifferentialEvolution).with_islands(2),
//! );
//! assert!(options.validate().is_ok());
//!
//! let json = options.to_json().unwrap();
//! assert_eq!(OptimizeOptions::from_json(&json).unwrap(), options);
//! ```

pub mod algorithm;
pub mod cost;
pub mod param;

pub use algorithm::{
    AlgorithmConfig, AlgorithmKind, BeeColonySettings, DifferentialEvolutionSettings,
    GeneticSettings, ParticleSwarmSettings,
};
pub use cost::{DiffMode, OptCost, OptCostKind, DEFAULT_EPSILON};
pub use param::{OptParam, OptParamKind};

use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use crate::error::{OptError, Result};

/// Everything needed to set up one optimization run.
///
/// The order of `opt_params` defines the layout of every parameter vector;
/// the order of `opt_costs` defines evaluation order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OptimizeOptions {
    pub opt_params: Vec<OptParam>,
    pub opt_costs: Vec<OptCost>,
    pub algorithm: AlgorithmConfig,
}

impl OptimizeOptions {
    pub fn new(
        opt_params: Vec<OptParam>,
        opt_costs: Vec<OptCost>,
        algorithm: AlgorithmConfig,
    ) -> Self {
        Self {
            opt_params,
            opt_costs,
            algorithm,
        }
    }

    /// Validate everything that can be checked without a model or simulator.
    ///
    /// Target-value lengths and parameter existence are checked later, when an
    /// [`Optimization`](crate::Optimization) binds the options to a model.
    pub fn validate(&self) -> Result<()> {
        if self.opt_params.is_empty() {
            return Err(OptError::EmptyParameters);
        }
        if self.opt_costs.is_empty() {
            return Err(OptError::EmptyCosts);
        }
        for param in &self.opt_params {
            param.validate()?;
        }
        for cost in &self.opt_costs {
            cost.validate()?;
        }
        self.algorithm.validate()
    }

    /// Per-parameter `(min, max)` bounds in parameter-vector order.
    pub fn bounds(&self) -> Vec<(f64, f64)> {
        self.opt_params.iter().map(OptParam::bounds).collect()
    }

    /// Save the options to a JSON string
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Load options from a JSON string
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Save the options to a JSON file
    pub fn save_json<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let file = File::create(path)?;
        serde_json::to_writer_pretty(BufWriter::new(file), self)?;
        Ok(())
    }

    /// Load options from a JSON file
    pub fn load_json<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path)?;
        Ok(serde_json::from_reader(BufReader::new(file))?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options() -> OptimizeOptions {
        OptimizeOptions::new(
            vec![OptParam::reaction_parameter("k1", "k1", "r1", 0.05, 0.21).unwrap()],
            vec![OptCost::default_concentration("A", "A", 0, 0)],
            AlgorithmConfig::default(),
        )
    }

    #[test]
    fn test_validate_ok() {
        assert!(options().validate().is_ok());
        assert_eq!(options().bounds(), vec![(0.05, 0.21)]);
    }

    #[test]
    fn test_validate_empty() {
        let mut opts = options();
        opts.opt_params.clear();
        assert!(matches!(opts.validate(), Err(OptError::EmptyParameters)));

        let mut opts = options();
        opts.opt_costs.clear();
        assert!(matches!(opts.validate(), Err(OptError::EmptyCosts)));
    }

    #[test]
    fn test_validate_catches_deserialized_bounds() {
        let mut opts = options();
        opts.opt_params[0].lower_bound = 1.0;
        opts.opt_params[0].upper_bound = 0.5;
        let json = opts.to_json().unwrap();
        let reloaded = OptimizeOptions::from_json(&json).unwrap();
        assert!(matches!(
            reloaded.validate(),
            Err(OptError::InvalidBounds { .. })
        ));
    }

    #[test]
    fn test_missing_optional_fields_use_defaults() {
        let json = r#"{
            "opt_params": [],
            "opt_costs": [{
                "kind": "Concentration",
                "diff_mode": "Absolute",
                "name": "A",
                "target_id": "A",
                "simulation_time": 1.0,
                "weight": 1.0,
                "compartment_index": 0,
                "species_index": 0
            }],
            "algorithm": {"kind": "GeneticAlgorithm", "islands": 1, "population": 4}
        }"#;
        let opts = OptimizeOptions::from_json(json).unwrap();
        assert_eq!(opts.opt_costs[0].epsilon, DEFAULT_EPSILON);
        assert!(opts.opt_costs[0].target_values.is_empty());
        assert_eq!(opts.algorithm.seed, None);
        assert_eq!(opts.algorithm.genetic, GeneticSettings::default());
    }
}
