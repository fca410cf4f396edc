//! Material parameters.
//!
//! A material parameter produces one typed value for a constant-buffer field.
//! Parameters are shared (`Arc`) between every buffer slot that resolved to
//! the same name, and memoize their value per [`MaterialVariability`] tier so
//! a fan-out to many slots still recomputes at most once per seed advance.
//!
//! Concrete parameters implement the two evaluation hooks of
//! [`MaterialParameter`]; the dirty/changed bookkeeping lives in the
//! inherent methods on `dyn MaterialParameter` and is shared by all of them.
//!
//! Names are resolved into parameters by [`resolve`]. Names carrying a
//! [`Modifier`] prefix such as `uniInvert_` are derived from the parameter
//! behind the stripped name.

pub mod builtin;
mod memo;
mod modifier;
mod resolve;
mod source;
mod texture;
mod value;

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use crate::constant::ConstantFieldType;
use crate::scene::FrameState;
use crate::variability::{MaterialVariability, VariabilitySeeds};

pub use builtin::{BuiltinParameter, RandomParameter};
pub(crate) use memo::Memo;
pub use modifier::{MODIFIER_PREFIXES, Modifier, ModifierParameter};
pub use resolve::{LocalBindings, ResolveContext, resolve, resolve_texture_path};
pub use source::{BlockParameter, ConstantParameter, VariableParameter};
pub use texture::{TextureDimensions, TextureDimensionsParameter};
pub use value::ParameterValue;

/// Shared handle to a parameter.
pub type ParamRef = Arc<dyn MaterialParameter>;

/// Everything a parameter may read while evaluating.
#[derive(Clone, Copy)]
pub struct EvalContext<'a> {
    pub seeds: &'a VariabilitySeeds,
    pub frame: &'a FrameState,
}

impl<'a> EvalContext<'a> {
    pub fn new(seeds: &'a VariabilitySeeds, frame: &'a FrameState) -> Self {
        Self { seeds, frame }
    }
}

const CHANGED_BIT: u32 = 1 << 0;
const DIRTY_BIT: u32 = 1 << 1;
const VARIABILITY_SHIFT: u32 = 2;
const VARIABILITY_MASK: u32 = 0b111;
const FIELD_TYPE_SHIFT: u32 = 5;

/// Packed parameter state: bit 0 changed, bit 1 dirty, bits 2..=4 variability,
/// remaining bits the field type.
pub struct ParameterState(AtomicU32);

static_assertions::const_assert!(MaterialVariability::COUNT <= VARIABILITY_MASK as usize + 1);

impl ParameterState {
    /// A dirty state that has never been evaluated.
    pub fn new(field_type: ConstantFieldType, variability: MaterialVariability) -> Self {
        let bits = DIRTY_BIT
            | ((variability.bits() as u32) << VARIABILITY_SHIFT)
            | (field_type.index() << FIELD_TYPE_SHIFT);
        Self(AtomicU32::new(bits))
    }

    pub fn bits(&self) -> u32 {
        self.0.load(Ordering::Acquire)
    }

    pub fn field_type(&self) -> ConstantFieldType {
        ConstantFieldType::from_index(self.bits() >> FIELD_TYPE_SHIFT)
            .unwrap_or(ConstantFieldType::Bool)
    }

    pub fn variability(&self) -> MaterialVariability {
        MaterialVariability::from_bits(((self.bits() >> VARIABILITY_SHIFT) & VARIABILITY_MASK) as u8)
            .unwrap_or(MaterialVariability::Always)
    }

    /// True until the first evaluation.
    pub fn is_dirty(&self) -> bool {
        self.bits() & DIRTY_BIT != 0
    }

    /// Whether the last evaluation produced a new value.
    pub fn has_changed(&self) -> bool {
        self.bits() & CHANGED_BIT != 0
    }

    fn mark_evaluated(&self, changed: bool) {
        if changed {
            self.0.fetch_or(CHANGED_BIT, Ordering::AcqRel);
        } else {
            self.0.fetch_and(!CHANGED_BIT, Ordering::AcqRel);
        }
        self.0.fetch_and(!DIRTY_BIT, Ordering::AcqRel);
    }
}

impl fmt::Debug for ParameterState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParameterState")
            .field("field_type", &self.field_type())
            .field("variability", &self.variability())
            .field("dirty", &self.is_dirty())
            .field("changed", &self.has_changed())
            .finish()
    }
}

/// A source of one constant-buffer value.
pub trait MaterialParameter: Send + Sync + fmt::Debug {
    /// Shared bookkeeping.
    fn state(&self) -> &ParameterState;

    /// Bring the value up to date for `ctx`, returning whether it changed.
    fn eval_if_changed(&self, ctx: &EvalContext<'_>) -> bool;

    /// The current value. Only meaningful after an evaluation.
    fn value_assume_evaluated(&self) -> ParameterValue;
}

impl dyn MaterialParameter {
    /// Evaluate and record the outcome in the state word.
    pub fn eval(&self, ctx: &EvalContext<'_>) -> bool {
        let changed = self.eval_if_changed(ctx);
        self.state().mark_evaluated(changed);
        changed
    }

    /// The value, or `None` before the first evaluation.
    pub fn value(&self) -> Option<ParameterValue> {
        (!self.state().is_dirty()).then(|| self.value_assume_evaluated())
    }

    /// Encode the evaluated value into a constant-buffer slice.
    pub fn copy_to(&self, out: &mut [u8]) {
        debug_assert!(!self.state().is_dirty(), "copy_to before eval on {self:?}");
        self.value_assume_evaluated().write_to(out);
    }

    pub fn field_type(&self) -> ConstantFieldType {
        self.state().field_type()
    }

    pub fn variability(&self) -> MaterialVariability {
        self.state().variability()
    }

    /// Address-based identity, stable for the parameter's lifetime.
    pub fn identity(&self) -> usize {
        self as *const Self as *const () as usize
    }
}
