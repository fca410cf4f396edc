//! Parameters derived from the size of a bound texture.

use std::sync::Arc;

use lilium_core::math::{Vec2, Vec4};

use crate::constant::ConstantFieldType;
use crate::texture::TextureBinding;
use crate::variability::MaterialVariability;

use super::{EvalContext, MaterialParameter, Memo, ParameterState, ParameterValue};

/// Which texel-size vector to produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextureDimensions {
    /// `(1/w, 1/h)`
    DuDv,
    /// `(1/w, 1/h, w, h)`
    DuDvDimensions,
}

impl TextureDimensions {
    pub fn field_type(self) -> ConstantFieldType {
        match self {
            Self::DuDv => ConstantFieldType::Float2,
            Self::DuDvDimensions => ConstantFieldType::Float4,
        }
    }

    fn compute(self, width: u32, height: u32) -> ParameterValue {
        let (w, h) = (width.max(1) as f32, height.max(1) as f32);
        match self {
            Self::DuDv => Vec2::new(1.0 / w, 1.0 / h).into(),
            Self::DuDvDimensions => Vec4::new(1.0 / w, 1.0 / h, w, h).into(),
        }
    }
}

/// Texel size of the texture currently bound to a slot.
///
/// Re-read every frame since the binding is refreshed on prepare. An expired
/// binding reads as a 1x1 texture.
#[derive(Debug)]
pub struct TextureDimensionsParameter {
    state: ParameterState,
    kind: TextureDimensions,
    binding: Arc<TextureBinding>,
    memo: Memo,
}

impl TextureDimensionsParameter {
    pub fn new(kind: TextureDimensions, binding: Arc<TextureBinding>) -> Self {
        Self {
            state: ParameterState::new(kind.field_type(), MaterialVariability::Frame),
            kind,
            binding,
            memo: Memo::new(),
        }
    }
}

impl MaterialParameter for TextureDimensionsParameter {
    fn state(&self) -> &ParameterState {
        &self.state
    }

    fn eval_if_changed(&self, ctx: &EvalContext<'_>) -> bool {
        self.memo.refresh(MaterialVariability::Frame, ctx, || {
            let (width, height) = self
                .binding
                .texture()
                .map(|texture| (texture.width(), texture.height()))
                .unwrap_or((1, 1));
            self.kind.compute(width, height)
        })
    }

    fn value_assume_evaluated(&self) -> ParameterValue {
        self.memo.value_or(self.kind.compute(1, 1))
    }
}
