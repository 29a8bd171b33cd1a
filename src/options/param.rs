//! Tunable parameter descriptions.

use serde::{Deserialize, Serialize};

use crate::error::{OptError, Result};

/// What kind of model quantity an [`OptParam`] controls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OptParamKind {
    /// A global model parameter; `parent_id` is empty.
    ModelParameter,

    /// A parameter local to a reaction; `parent_id` is the reaction id.
    ReactionParameter,
}

/// One tunable scalar and its admissible closed interval.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptParam {
    pub kind: OptParamKind,

    /// Display label, used by [`Optimization::param_names`](crate::Optimization::param_names).
    pub name: String,

    /// Id of the parameter itself.
    pub target_id: String,

    /// Id of the owning entity (e.g. the reaction), empty for model parameters.
    pub parent_id: String,

    pub lower_bound: f64,
    pub upper_bound: f64,
}

impl OptParam {
    /// Create a new parameter description, validating its bounds.
    ///
    /// # Arguments
    ///
    /// * `kind` - What the parameter controls
    /// * `name` - Display label
    /// * `target_id` - Id of the parameter
    /// * `parent_id` - Id of the owning entity
    /// * `lower_bound` - Lower end of the search interval
    /// * `upper_bound` - Upper end of the search interval
    ///
    /// # Returns
    ///
    /// The parameter, or [`OptError::InvalidBounds`] unless `lower_bound < upper_bound`
    /// with both ends finite.
    pub fn new(
        kind: OptParamKind,
        name: impl Into<String>,
        target_id: impl Into<String>,
        parent_id: impl Into<String>,
        lower_bound: f64,
        upper_bound: f64,
    ) -> Result<Self> {
        let param = Self {
            kind,
            name: name.into(),
            target_id: target_id.into(),
            parent_id: parent_id.into(),
            lower_bound,
            upper_bound,
        };
        param.validate()?;
        Ok(param)
    }

    /// Shorthand for a reaction-local rate constant.
    pub fn reaction_parameter(
        name: impl Into<String>,
        target_id: impl Into<String>,
        reaction_id: impl Into<String>,
        lower_bound: f64,
        upper_bound: f64,
    ) -> Result<Self> {
        Self::new(
            OptParamKind::ReactionParameter,
            name,
            target_id,
            reaction_id,
            lower_bound,
            upper_bound,
        )
    }

    /// Shorthand for a global model parameter.
    pub fn model_parameter(
        name: impl Into<String>,
        target_id: impl Into<String>,
        lower_bound: f64,
        upper_bound: f64,
    ) -> Result<Self> {
        Self::new(
            OptParamKind::ModelParameter,
            name,
            target_id,
            "",
            lower_bound,
            upper_bound,
        )
    }

    /// Check the bounds invariant.
    ///
    /// Deserialized values bypass [`OptParam::new`], so this is re-run when
    /// the whole options set is validated.
    pub fn validate(&self) -> Result<()> {
        let finite = self.lower_bound.is_finite() && self.upper_bound.is_finite();
        if !finite || self.lower_bound >= self.upper_bound {
            return Err(OptError::InvalidBounds {
                name: self.name.clone(),
                lower: self.lower_bound,
                upper: self.upper_bound,
            });
        }
        Ok(())
    }

    /// The search interval as a `(min, max)` pair.
    pub fn bounds(&self) -> (f64, f64) {
        (self.lower_bound, self.upper_bound)
    }

    /// Clamp a value into the search interval.
    pub fn clamp(&self, value: f64) -> f64 {
        value.clamp(self.lower_bound, self.upper_bound)
    }

    /// Human readable location of the parameter, e.g. `r1/k1`.
    pub fn path(&self) -> String {
        if self.parent_id.is_empty() {
            self.target_id.clone()
        } else {
            format!("{}/{}", self.parent_id, self.target_id)
        }
    }
}
