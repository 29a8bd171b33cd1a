//! Interface to the external spatial simulator.
//!
//! The optimizer treats the simulator as a black box: given a model (with the
//! candidate parameters already written into a private copy) and a list of
//! times, it returns one frame of output fields per requested time.

use std::collections::HashMap;

use crate::error::Result;
use crate::options::{OptCost, OptCostKind};

/// Address of one simulated field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct QuantityKey {
    pub kind: OptCostKind,
    pub compartment_index: usize,
    pub species_index: usize,
}

impl QuantityKey {
    pub fn new(kind: OptCostKind, compartment_index: usize, species_index: usize) -> Self {
        Self {
            kind,
            compartment_index,
            species_index,
        }
    }

    /// Key of the field a cost term samples.
    pub fn of(cost: &OptCost) -> Self {
        Self::new(cost.kind, cost.compartment_index, cost.species_index)
    }
}

/// Simulator output at one time point.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SimulationFrame {
    pub time: f64,
    fields: HashMap<QuantityKey, Vec<f64>>,
}

impl SimulationFrame {
    pub fn new(time: f64) -> Self {
        Self {
            time,
            fields: HashMap::new(),
        }
    }

    pub fn insert(&mut self, key: QuantityKey, values: Vec<f64>) {
        self.fields.insert(key, values);
    }

    pub fn with_field(mut self, key: QuantityKey, values: Vec<f64>) -> Self {
        self.insert(key, values);
        self
    }

    pub fn field(&self, key: &QuantityKey) -> Option<&[f64]> {
        self.fields.get(key).map(Vec::as_slice)
    }
}

/// A deterministic spatial simulator.
///
/// Implementations must not mutate shared state: evaluations run concurrently
/// from several rayon workers.
pub trait Simulator<M>: Send + Sync {
    /// Simulate `model` and return one frame per entry of `times`, in order.
    ///
    /// `times` is sorted ascending and contains no duplicates.
    fn simulate(&self, model: &M, times: &[f64]) -> Result<Vec<SimulationFrame>>;

    /// Number of values the simulator produces for `key`, or `None` if the
    /// quantity does not exist in this model.
    ///
    /// Used once, when an optimization is constructed, to validate target values.
    fn output_len(&self, model: &M, key: QuantityKey) -> Option<usize>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::DiffMode;

    #[test]
    fn test_frame_fields() {
        let key = QuantityKey::new(OptCostKind::Concentration, 0, 2);
        let frame = SimulationFrame::new(1.0).with_field(key, vec![1.0, 2.0]);
        assert_eq!(frame.field(&key), Some(&[1.0, 2.0][..]));

        let dcdt = QuantityKey::new(OptCostKind::ConcentrationDcdt, 0, 2);
        assert!(frame.field(&dcdt).is_none());
    }

    #[test]
    fn test_key_of_cost() {
        let cost = OptCost::new(
            OptCostKind::ConcentrationDcdt,
            DiffMode::Absolute,
            "C",
            "C",
            1.0,
            0.23,
            1,
            2,
            vec![],
        );
        assert_eq!(
            QuantityKey::of(&cost),
            QuantityKey::new(OptCostKind::ConcentrationDcdt, 1, 2)
        );
    }
}
