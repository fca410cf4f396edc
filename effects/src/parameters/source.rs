//! Leaf parameters holding values set by materials and databases.

use std::sync::atomic::{AtomicBool, Ordering};

use lilium_core::thread::ThreadAffinity;
use parking_lot::Mutex;

use crate::constant::ConstantFieldType;
use crate::error::{EffectError, EffectResult};
use crate::variability::MaterialVariability;

use super::{EvalContext, MaterialParameter, ParameterState, ParameterValue};

/// A value fixed at construction.
#[derive(Debug)]
pub struct ConstantParameter {
    state: ParameterState,
    value: ParameterValue,
}

impl ConstantParameter {
    pub fn new(value: impl Into<ParameterValue>) -> Self {
        let value = value.into();
        Self {
            state: ParameterState::new(value.field_type(), MaterialVariability::Once),
            value,
        }
    }

    /// Zero, `false`, or identity for `field_type`.
    pub fn default_for(field_type: ConstantFieldType) -> Self {
        Self::new(ParameterValue::default_for(field_type))
    }
}

impl MaterialParameter for ConstantParameter {
    fn state(&self) -> &ParameterState {
        &self.state
    }

    fn eval_if_changed(&self, _ctx: &EvalContext<'_>) -> bool {
        self.state.is_dirty()
    }

    fn value_assume_evaluated(&self) -> ParameterValue {
        self.value
    }
}

/// A value the owning thread may replace at runtime.
///
/// The tier tells buffers how often to look at the value. A variable at a tier
/// below `Frame` is only picked up once the caller advances that tier.
#[derive(Debug)]
pub struct VariableParameter {
    state: ParameterState,
    value: Mutex<ParameterValue>,
    pending: AtomicBool,
    affinity: ThreadAffinity,
}

impl VariableParameter {
    /// A variable re-read every frame.
    pub fn new(value: impl Into<ParameterValue>) -> Self {
        Self::with_variability(value, MaterialVariability::Frame)
    }

    pub fn with_variability(value: impl Into<ParameterValue>, variability: MaterialVariability) -> Self {
        let value = value.into();
        Self {
            state: ParameterState::new(value.field_type(), variability),
            value: Mutex::new(value),
            pending: AtomicBool::new(true),
            affinity: ThreadAffinity::current(),
        }
    }

    /// Replace the value. The field type cannot change.
    pub fn set_value(&self, value: impl Into<ParameterValue>) -> EffectResult<()> {
        self.affinity.check("VariableParameter");
        let value = value.into();
        let expected = self.state.field_type();
        if value.field_type() != expected {
            return Err(EffectError::ValueTypeMismatch {
                expected,
                found: value.field_type(),
            });
        }

        let mut current = self.value.lock();
        if *current != value {
            *current = value;
            self.pending.store(true, Ordering::Release);
        }
        Ok(())
    }

    pub fn get(&self) -> ParameterValue {
        *self.value.lock()
    }
}

impl MaterialParameter for VariableParameter {
    fn state(&self) -> &ParameterState {
        &self.state
    }

    fn eval_if_changed(&self, _ctx: &EvalContext<'_>) -> bool {
        self.pending.swap(false, Ordering::AcqRel)
    }

    fn value_assume_evaluated(&self) -> ParameterValue {
        *self.value.lock()
    }
}

/// A value decoded from raw constant-buffer bytes, as stored in material files.
#[derive(Debug)]
pub struct BlockParameter {
    state: ParameterState,
    value: ParameterValue,
}

impl BlockParameter {
    /// Decode `bytes` as `field_type`. Returns `None` if the block is too short.
    pub fn new(field_type: ConstantFieldType, bytes: &[u8]) -> Option<Self> {
        let value = ParameterValue::from_bytes(field_type, bytes)?;
        Some(Self {
            state: ParameterState::new(field_type, MaterialVariability::Once),
            value,
        })
    }
}

impl MaterialParameter for BlockParameter {
    fn state(&self) -> &ParameterState {
        &self.state
    }

    fn eval_if_changed(&self, _ctx: &EvalContext<'_>) -> bool {
        self.state.is_dirty()
    }

    fn value_assume_evaluated(&self) -> ParameterValue {
        self.value
    }
}

static_assertions::assert_impl_all!(ConstantParameter: Send, Sync);
static_assertions::assert_impl_all!(VariableParameter: Send, Sync);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parameters::ParamRef;
    use crate::scene::FrameState;
    use crate::variability::VariabilitySeeds;
    use lilium_core::math::{Mat4, Vec3, Vec4};
    use std::sync::Arc;

    fn eval(param: &ParamRef) -> bool {
        let seeds = VariabilitySeeds::new();
        let frame = FrameState::default();
        param.eval(&EvalContext::new(&seeds, &frame))
    }

    #[test]
    fn constant_changes_only_once() {
        let param: ParamRef = Arc::new(ConstantParameter::new(Vec3::new(1.0, 2.0, 3.0)));
        assert_eq!(param.variability(), MaterialVariability::Once);
        assert!(eval(&param));
        assert!(!eval(&param));
    }

    #[test]
    fn constant_default_matrix_is_identity() {
        let param: ParamRef = Arc::new(ConstantParameter::default_for(ConstantFieldType::Float4x4));
        eval(&param);
        assert_eq!(param.value(), Some(ParameterValue::Float4x4(Mat4::identity())));
    }

    #[test]
    fn variable_reports_changes() {
        let variable = Arc::new(VariableParameter::new(1.0f32));
        let param: ParamRef = variable.clone();
        assert_eq!(param.variability(), MaterialVariability::Frame);
        assert!(eval(&param));
        assert!(!eval(&param));

        variable.set_value(2.0f32).unwrap();
        assert!(eval(&param));
        assert_eq!(param.value(), Some(ParameterValue::Float(2.0)));

        variable.set_value(2.0f32).unwrap();
        assert!(!eval(&param));
    }

    #[test]
    fn variable_rejects_other_types() {
        let variable = VariableParameter::with_variability(1.0f32, MaterialVariability::Material);
        let err = variable.set_value(Vec4::zeros()).unwrap_err();
        assert_eq!(
            err,
            EffectError::ValueTypeMismatch {
                expected: ConstantFieldType::Float,
                found: ConstantFieldType::Float4,
            }
        );
        assert_eq!(variable.get(), ParameterValue::Float(1.0));
    }

    #[test]
    fn block_decodes_bytes() {
        let bytes: Vec<u8> = [1.0f32, 2.0, 3.0, 4.0]
            .iter()
            .flat_map(|f| f.to_ne_bytes())
            .collect();
        let param: ParamRef = Arc::new(BlockParameter::new(ConstantFieldType::Float4, &bytes).unwrap());
        eval(&param);
        assert_eq!(param.value(), Some(ParameterValue::Float4(Vec4::new(1.0, 2.0, 3.0, 4.0))));
        assert!(BlockParameter::new(ConstantFieldType::Float4x4, &bytes).is_none());
    }
}
