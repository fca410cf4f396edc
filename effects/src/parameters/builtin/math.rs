use lilium_core::math::{Mat3, Mat4};

use crate::constant::ConstantFieldType;
use crate::scene::FrameState;
use crate::variability::MaterialVariability;

use super::{BuiltinSpec, ParameterValue};

pub(super) const BUILTINS: &[BuiltinSpec] = &[
    BuiltinSpec {
        name: "uniPi",
        field_type: ConstantFieldType::Float,
        variability: MaterialVariability::Once,
        compute: pi,
    },
    BuiltinSpec {
        name: "uniTwoPi",
        field_type: ConstantFieldType::Float,
        variability: MaterialVariability::Once,
        compute: two_pi,
    },
    BuiltinSpec {
        name: "uniHalfPi",
        field_type: ConstantFieldType::Float,
        variability: MaterialVariability::Once,
        compute: half_pi,
    },
    BuiltinSpec {
        name: "uniIdentity3x3",
        field_type: ConstantFieldType::Float3x3,
        variability: MaterialVariability::Once,
        compute: identity3x3,
    },
    BuiltinSpec {
        name: "uniIdentity4x4",
        field_type: ConstantFieldType::Float4x4,
        variability: MaterialVariability::Once,
        compute: identity4x4,
    },
];

fn pi(_: &FrameState) -> ParameterValue {
    std::f32::consts::PI.into()
}

fn two_pi(_: &FrameState) -> ParameterValue {
    std::f32::consts::TAU.into()
}

fn half_pi(_: &FrameState) -> ParameterValue {
    std::f32::consts::FRAC_PI_2.into()
}

fn identity3x3(_: &FrameState) -> ParameterValue {
    Mat3::identity().into()
}

fn identity4x4(_: &FrameState) -> ParameterValue {
    Mat4::identity().into()
}
