//! Name-prefix modifiers deriving one parameter from another.
//!
//! `uniRcp_uniColor` resolves `uniColor` and takes the component-wise
//! reciprocal. Prefixes are matched longest first so `uniInvertTranspose_`
//! is never read as `uniInvert_`.

use lilium_core::color::{srgb_to_linear, srgb_to_linear_rgba};
use lilium_core::math::{mat3_inverse_or_identity, mat4_inverse_or_identity};

use crate::bind_name::BindName;
use crate::constant::ConstantFieldType;

use super::{
    EvalContext, MaterialParameter, Memo, ParamRef, ParameterState, ParameterValue,
    TextureDimensions,
};

/// A recognised name prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Modifier {
    /// Logical not for `bool`, bitwise complement for integers.
    Not,
    Invert,
    InvertTranspose,
    Transpose,
    /// Component-wise reciprocal.
    Rcp,
    /// sRGB to linear, alpha untouched.
    Srgb,
    /// Texel size of a bound texture.
    DuDv,
    /// Texel size and dimensions of a bound texture.
    DuDvDimensions,
    /// Zero or identity when the inner name resolves nowhere.
    Optional,
}

/// Every prefix, longest first.
pub const MODIFIER_PREFIXES: [(&str, Modifier); 9] = [
    ("uniInvertTranspose_", Modifier::InvertTranspose),
    ("uniDuDvDimensions_", Modifier::DuDvDimensions),
    ("uniTranspose_", Modifier::Transpose),
    ("uniOptional_", Modifier::Optional),
    ("uniInvert_", Modifier::Invert),
    ("uniDuDv_", Modifier::DuDv),
    ("uniSRGB_", Modifier::Srgb),
    ("uniRcp_", Modifier::Rcp),
    ("uniNot_", Modifier::Not),
];

impl Modifier {
    pub fn prefix(self) -> &'static str {
        MODIFIER_PREFIXES
            .iter()
            .find(|(_, modifier)| *modifier == self)
            .map(|(prefix, _)| *prefix)
            .unwrap_or_default()
    }

    /// Split the outermost modifier off `name`.
    pub fn parse(name: &BindName) -> Option<(Modifier, BindName)> {
        MODIFIER_PREFIXES.iter().find_map(|(prefix, modifier)| {
            name.strip_prefix(prefix)
                .filter(|inner| !inner.is_empty())
                .map(|inner| (*modifier, inner))
        })
    }

    /// Whether this modifier can produce a field of `field_type`.
    pub fn supports(self, field_type: ConstantFieldType) -> bool {
        use ConstantFieldType as T;
        match self {
            Self::Not => field_type.is_integral(),
            Self::Invert | Self::InvertTranspose | Self::Transpose => {
                matches!(field_type, T::Float3x3 | T::Float4x4)
            }
            Self::Rcp => field_type.is_float_vector(),
            Self::Srgb => matches!(field_type, T::Float3 | T::Float4),
            Self::DuDv => field_type == T::Float2,
            Self::DuDvDimensions => field_type == T::Float4,
            Self::Optional => true,
        }
    }

    /// The texture query behind `DuDv` modifiers.
    pub fn texture_dimensions(self) -> Option<TextureDimensions> {
        match self {
            Self::DuDv => Some(TextureDimensions::DuDv),
            Self::DuDvDimensions => Some(TextureDimensions::DuDvDimensions),
            _ => None,
        }
    }

    /// Whether [`apply`](Self::apply) transforms values of the inner parameter.
    pub fn is_value_transform(self) -> bool {
        !matches!(self, Self::Optional | Self::DuDv | Self::DuDvDimensions)
    }

    /// The pure transform. Values this modifier does not support pass through.
    pub fn apply(self, value: ParameterValue) -> ParameterValue {
        use ParameterValue as V;
        match (self, value) {
            (Self::Not, V::Bool(v)) => V::Bool(!v),
            (Self::Not, V::Int(v)) => V::Int(!v),
            (Self::Not, V::Int2(v)) => V::Int2(v.map(|c| !c)),
            (Self::Not, V::Int3(v)) => V::Int3(v.map(|c| !c)),
            (Self::Not, V::Int4(v)) => V::Int4(v.map(|c| !c)),
            (Self::Not, V::UInt(v)) => V::UInt(!v),
            (Self::Not, V::UInt2(v)) => V::UInt2(v.map(|c| !c)),
            (Self::Not, V::UInt3(v)) => V::UInt3(v.map(|c| !c)),
            (Self::Not, V::UInt4(v)) => V::UInt4(v.map(|c| !c)),

            (Self::Invert, V::Float3x3(m)) => V::Float3x3(mat3_inverse_or_identity(&m)),
            (Self::Invert, V::Float4x4(m)) => V::Float4x4(mat4_inverse_or_identity(&m)),
            (Self::InvertTranspose, V::Float3x3(m)) => {
                V::Float3x3(mat3_inverse_or_identity(&m).transpose())
            }
            (Self::InvertTranspose, V::Float4x4(m)) => {
                V::Float4x4(mat4_inverse_or_identity(&m).transpose())
            }
            (Self::Transpose, V::Float3x3(m)) => V::Float3x3(m.transpose()),
            (Self::Transpose, V::Float4x4(m)) => V::Float4x4(m.transpose()),

            (Self::Rcp, V::Float(v)) => V::Float(1.0 / v),
            (Self::Rcp, V::Float2(v)) => V::Float2(v.map(|c| 1.0 / c)),
            (Self::Rcp, V::Float3(v)) => V::Float3(v.map(|c| 1.0 / c)),
            (Self::Rcp, V::Float4(v)) => V::Float4(v.map(|c| 1.0 / c)),

            (Self::Srgb, V::Float3(v)) => V::Float3(v.map(srgb_to_linear)),
            (Self::Srgb, V::Float4(v)) => V::Float4(srgb_to_linear_rgba(v.into()).into()),

            (_, other) => other,
        }
    }
}

/// Applies a value [`Modifier`] to a source parameter.
///
/// Inherits the source's tier, so it is refreshed exactly when the source
/// may have changed.
#[derive(Debug)]
pub struct ModifierParameter {
    state: ParameterState,
    modifier: Modifier,
    source: ParamRef,
    memo: Memo,
}

impl ModifierParameter {
    pub fn new(modifier: Modifier, source: ParamRef) -> Self {
        debug_assert!(modifier.is_value_transform(), "{modifier:?} has no value transform");
        Self {
            state: ParameterState::new(source.field_type(), source.variability()),
            modifier,
            source,
            memo: Memo::new(),
        }
    }

    pub fn modifier(&self) -> Modifier {
        self.modifier
    }

    pub fn source(&self) -> &ParamRef {
        &self.source
    }
}

impl MaterialParameter for ModifierParameter {
    fn state(&self) -> &ParameterState {
        &self.state
    }

    fn eval_if_changed(&self, ctx: &EvalContext<'_>) -> bool {
        self.memo.refresh(self.state.variability(), ctx, || {
            self.source.eval(ctx);
            self.modifier.apply(self.source.value_assume_evaluated())
        })
    }

    fn value_assume_evaluated(&self) -> ParameterValue {
        self.memo
            .value_or(ParameterValue::default_for(self.state.field_type()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parameters::{ConstantParameter, VariableParameter};
    use crate::scene::FrameState;
    use crate::variability::{MaterialVariability, VariabilitySeeds};
    use lilium_core::math::{Mat3, Mat4, Vec3, Vec4};
    use std::sync::Arc;

    #[test]
    fn longest_prefix_wins() {
        let (modifier, inner) = Modifier::parse(&"uniInvertTranspose_uniWorld".into()).unwrap();
        assert_eq!(modifier, Modifier::InvertTranspose);
        assert_eq!(inner, "uniWorld");

        let (modifier, inner) = Modifier::parse(&"uniDuDvDimensions_uniTex".into()).unwrap();
        assert_eq!(modifier, Modifier::DuDvDimensions);
        assert_eq!(inner, "uniTex");
    }

    #[test]
    fn nested_prefixes_strip_one_at_a_time() {
        let (outer, inner) = Modifier::parse(&"uniOptional_uniRcp_uniScale".into()).unwrap();
        assert_eq!(outer, Modifier::Optional);
        let (next, base) = Modifier::parse(&inner).unwrap();
        assert_eq!(next, Modifier::Rcp);
        assert_eq!(base, "uniScale");
    }

    #[test]
    fn plain_names_do_not_parse() {
        assert!(Modifier::parse(&"uniColor".into()).is_none());
        assert!(Modifier::parse(&"uniRcp_".into()).is_none());
    }

    #[test]
    fn prefixes_sorted_longest_first() {
        for pair in MODIFIER_PREFIXES.windows(2) {
            assert!(pair[0].0.len() >= pair[1].0.len());
        }
        assert_eq!(Modifier::Srgb.prefix(), "uniSRGB_");
    }

    #[test]
    fn matrix_modifiers_skip_rectangular_types() {
        for modifier in [Modifier::Invert, Modifier::InvertTranspose, Modifier::Transpose] {
            assert!(modifier.supports(ConstantFieldType::Float3x3));
            assert!(modifier.supports(ConstantFieldType::Float4x4));
            assert!(!modifier.supports(ConstantFieldType::Float3x4));
            assert!(!modifier.supports(ConstantFieldType::Float4x3));
            assert!(!modifier.supports(ConstantFieldType::Float4));
        }
    }

    #[test]
    fn rcp_is_component_wise() {
        let value = Modifier::Rcp.apply(Vec4::new(1.0, 0.0, 0.0, 1.0).into());
        assert_eq!(
            value,
            ParameterValue::Float4(Vec4::new(1.0, f32::INFINITY, f32::INFINITY, 1.0))
        );
    }

    #[test]
    fn not_complements() {
        assert_eq!(Modifier::Not.apply(true.into()), ParameterValue::Bool(false));
        assert_eq!(Modifier::Not.apply(0u32.into()), ParameterValue::UInt(u32::MAX));
        assert_eq!(Modifier::Not.apply([0i32, -1].into()), ParameterValue::Int2([-1, 0]));
    }

    #[test]
    fn srgb_keeps_alpha() {
        let value = Modifier::Srgb.apply(Vec4::new(0.5, 0.5, 0.5, 0.5).into());
        let v = value.as_float4().unwrap();
        assert!((v.x - 0.214_041).abs() < 1e-5);
        assert_eq!(v.w, 0.5);
    }

    #[test]
    fn singular_invert_is_identity() {
        assert_eq!(
            Modifier::Invert.apply(Mat4::zeros().into()),
            ParameterValue::Float4x4(Mat4::identity())
        );
    }

    #[test]
    fn invert_transpose_of_scale() {
        let m = Mat3::from_diagonal(&Vec3::new(2.0, 4.0, 8.0));
        let value = Modifier::InvertTranspose.apply(m.into()).as_mat3().unwrap();
        assert!((value - Mat3::from_diagonal(&Vec3::new(0.5, 0.25, 0.125))).norm() < 1e-6);
    }

    #[test]
    fn modifier_parameter_follows_source() {
        let variable = Arc::new(VariableParameter::new(2.0f32));
        let rcp: ParamRef = Arc::new(ModifierParameter::new(Modifier::Rcp, variable.clone()));
        assert_eq!(rcp.variability(), MaterialVariability::Frame);

        let mut seeds = VariabilitySeeds::new();
        let frame = FrameState::default();
        assert!(rcp.eval(&EvalContext::new(&seeds, &frame)));
        assert_eq!(rcp.value(), Some(ParameterValue::Float(0.5)));

        variable.set_value(4.0f32).unwrap();
        seeds.next_frame();
        assert!(rcp.eval(&EvalContext::new(&seeds, &frame)));
        assert_eq!(rcp.value(), Some(ParameterValue::Float(0.25)));
    }

    #[test]
    fn modifier_of_constant_is_once() {
        let source: ParamRef = Arc::new(ConstantParameter::new(Mat4::identity()));
        let transposed = ModifierParameter::new(Modifier::Transpose, source);
        assert_eq!(transposed.state().variability(), MaterialVariability::Once);
        assert_eq!(transposed.modifier(), Modifier::Transpose);
    }
}
