//! Access to tunable values in a model.
//!
//! The optimizer never owns the embedding application's model type. It only needs
//! to read and write the scalar addressed by an [`OptParam`], and to take private
//! copies for evaluation. [`ParameterTable`] is a minimal in-memory model for
//! applications (and tests) that keep parameters in a flat table.

use std::collections::HashMap;

use crate::error::{OptError, Result};
use crate::options::{OptParam, OptParamKind};

/// A model whose parameters can be read and written by id.
///
/// `Clone` is used to take the private snapshot each evaluation works on, so the
/// caller's live model is only touched by
/// [`Optimization::apply_parameters_to_model`](crate::Optimization::apply_parameters_to_model).
pub trait ParameterModel: Clone + Send + Sync {
    /// Current value of the parameter, or `None` if the model has no such parameter.
    fn parameter_value(&self, param: &OptParam) -> Option<f64>;

    /// Overwrite the value of the parameter.
    fn set_parameter_value(&mut self, param: &OptParam, value: f64) -> Result<()>;

    /// Write a whole parameter vector, positionally matching `params`.
    fn apply_parameters(&mut self, params: &[OptParam], values: &[f64]) -> Result<()> {
        if params.len() != values.len() {
            return Err(OptError::DimensionMismatch(format!(
                "Expected {} parameter values, got {}",
                params.len(),
                values.len()
            )));
        }
        for (param, &value) in params.iter().zip(values) {
            self.set_parameter_value(param, value)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct ParameterKey {
    kind: OptParamKind,
    parent_id: String,
    target_id: String,
}

impl ParameterKey {
    fn of(param: &OptParam) -> Self {
        Self {
            kind: param.kind,
            parent_id: param.parent_id.clone(),
            target_id: param.target_id.clone(),
        }
    }
}

/// Flat table of model and reaction parameters.
#[derive(Debug, Clone, Default)]
pub struct ParameterTable {
    values: HashMap<ParameterKey, f64>,
}

impl ParameterTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a global model parameter.
    pub fn set_model_parameter(&mut self, id: &str, value: f64) {
        self.values.insert(
            ParameterKey {
                kind: OptParamKind::ModelParameter,
                parent_id: String::new(),
                target_id: id.to_string(),
            },
            value,
        );
    }

    /// Set a parameter local to a reaction.
    pub fn set_reaction_parameter(&mut self, reaction_id: &str, id: &str, value: f64) {
        self.values.insert(
            ParameterKey {
                kind: OptParamKind::ReactionParameter,
                parent_id: reaction_id.to_string(),
                target_id: id.to_string(),
            },
            value,
        );
    }

    /// Builder form of [`ParameterTable::set_reaction_parameter`].
    pub fn with_reaction_parameter(mut self, reaction_id: &str, id: &str, value: f64) -> Self {
        self.set_reaction_parameter(reaction_id, id, value);
        self
    }

    /// Builder form of [`ParameterTable::set_model_parameter`].
    pub fn with_model_parameter(mut self, id: &str, value: f64) -> Self {
        self.set_model_parameter(id, value);
        self
    }

    pub fn model_parameter(&self, id: &str) -> Option<f64> {
        self.values
            .get(&ParameterKey {
                kind: OptParamKind::ModelParameter,
                parent_id: String::new(),
                target_id: id.to_string(),
            })
            .copied()
    }

    pub fn reaction_parameter(&self, reaction_id: &str, id: &str) -> Option<f64> {
        self.values
            .get(&ParameterKey {
                kind: OptParamKind::ReactionParameter,
                parent_id: reaction_id.to_string(),
                target_id: id.to_string(),
            })
            .copied()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl ParameterModel for ParameterTable {
    fn parameter_value(&self, param: &OptParam) -> Option<f64> {
        self.values.get(&ParameterKey::of(param)).copied()
    }

    fn set_parameter_value(&mut self, param: &OptParam, value: f64) -> Result<()> {
        match self.values.get_mut(&ParameterKey::of(param)) {
            Some(slot) => {
                *slot = value;
                Ok(())
            }
            None => Err(OptError::UnknownParameter(param.path())),
        }
    }
}
