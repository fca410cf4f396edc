//! Engine-provided parameters registered in the root material database.
//!
//! Each namespace module exposes a table of [`BuiltinSpec`]s. A builtin is a
//! plain function of the [`FrameState`] memoized at its tier, so a camera
//! matrix is computed once per frame no matter how many buffers read it.

mod boolean;
mod camera;
mod lighting;
mod math;
mod mouse;
mod random;
mod texture;
mod time;

use std::sync::Arc;

use crate::bind_name::BindName;
use crate::constant::ConstantFieldType;
use crate::scene::FrameState;
use crate::variability::MaterialVariability;

use super::{EvalContext, MaterialParameter, Memo, ParamRef, ParameterState, ParameterValue};

pub use random::RandomParameter;

/// Computes a builtin value from the frame.
pub type BuiltinFn = fn(&FrameState) -> ParameterValue;

/// Static description of one builtin.
#[derive(Debug, Clone, Copy)]
pub struct BuiltinSpec {
    pub name: &'static str,
    pub field_type: ConstantFieldType,
    pub variability: MaterialVariability,
    pub compute: BuiltinFn,
}

/// A memoized builtin.
#[derive(Debug)]
pub struct BuiltinParameter {
    state: ParameterState,
    name: &'static str,
    compute: BuiltinFn,
    memo: Memo,
}

impl BuiltinParameter {
    pub fn new(spec: &BuiltinSpec) -> Self {
        Self {
            state: ParameterState::new(spec.field_type, spec.variability),
            name: spec.name,
            compute: spec.compute,
            memo: Memo::new(),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl MaterialParameter for BuiltinParameter {
    fn state(&self) -> &ParameterState {
        &self.state
    }

    fn eval_if_changed(&self, ctx: &EvalContext<'_>) -> bool {
        self.memo
            .refresh(self.state.variability(), ctx, || (self.compute)(ctx.frame))
    }

    fn value_assume_evaluated(&self) -> ParameterValue {
        self.memo
            .value_or(ParameterValue::default_for(self.state.field_type()))
    }
}

/// Every function-backed builtin, grouped by namespace.
pub fn specs() -> impl Iterator<Item = &'static BuiltinSpec> {
    [
        camera::BUILTINS,
        lighting::BUILTINS,
        math::BUILTINS,
        time::BUILTINS,
        mouse::BUILTINS,
        texture::BUILTINS,
        boolean::BUILTINS,
    ]
    .into_iter()
    .flatten()
}

/// Instantiate every builtin, random generators included.
pub fn create_all() -> Vec<(BindName, ParamRef)> {
    let mut parameters: Vec<(BindName, ParamRef)> = specs()
        .map(|spec| {
            let param: ParamRef = Arc::new(BuiltinParameter::new(spec));
            (BindName::new(spec.name), param)
        })
        .collect();
    parameters.extend(random::create_all());
    parameters
}
