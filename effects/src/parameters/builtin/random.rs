//! Per-draw random values.

use std::sync::Arc;

use lilium_core::math::Vec4;
use parking_lot::Mutex;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::bind_name::BindName;
use crate::constant::ConstantFieldType;
use crate::variability::MaterialVariability;

use super::{EvalContext, MaterialParameter, ParamRef, ParameterState, ParameterValue};

/// Uniform values in `[0, 1)`, regenerated on every evaluation.
///
/// Seeded from the parameter name so runs are reproducible.
#[derive(Debug)]
pub struct RandomParameter {
    state: ParameterState,
    rng: Mutex<ChaCha8Rng>,
    value: Mutex<ParameterValue>,
}

impl RandomParameter {
    /// `field_type` must be `Float` or `Float4`.
    pub fn new(field_type: ConstantFieldType, seed: u64) -> Self {
        debug_assert!(
            matches!(field_type, ConstantFieldType::Float | ConstantFieldType::Float4),
            "random {field_type} is not supported"
        );
        Self {
            state: ParameterState::new(field_type, MaterialVariability::Always),
            rng: Mutex::new(ChaCha8Rng::seed_from_u64(seed)),
            value: Mutex::new(ParameterValue::default_for(field_type)),
        }
    }

    fn sample(&self) -> ParameterValue {
        let mut rng = self.rng.lock();
        match self.state.field_type() {
            ConstantFieldType::Float4 => Vec4::from_fn(|_, _| rng.r#gen::<f32>()).into(),
            _ => rng.r#gen::<f32>().into(),
        }
    }
}

impl MaterialParameter for RandomParameter {
    fn state(&self) -> &ParameterState {
        &self.state
    }

    fn eval_if_changed(&self, _ctx: &EvalContext<'_>) -> bool {
        let next = self.sample();
        let mut value = self.value.lock();
        let changed = *value != next;
        *value = next;
        changed
    }

    fn value_assume_evaluated(&self) -> ParameterValue {
        *self.value.lock()
    }
}

pub(super) fn create_all() -> Vec<(BindName, ParamRef)> {
    [
        ("uniRandomFloat", ConstantFieldType::Float),
        ("uniRandomFloat4", ConstantFieldType::Float4),
    ]
    .into_iter()
    .map(|(name, field_type)| {
        let name = BindName::new(name);
        let param: ParamRef = Arc::new(RandomParameter::new(field_type, name.hash_value()));
        (name, param)
    })
    .collect()
}
