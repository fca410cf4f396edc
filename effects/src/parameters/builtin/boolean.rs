use crate::constant::ConstantFieldType;
use crate::scene::FrameState;
use crate::variability::MaterialVariability;

use super::{BuiltinSpec, ParameterValue};

pub(super) const BUILTINS: &[BuiltinSpec] = &[
    BuiltinSpec {
        name: "uniTrue",
        field_type: ConstantFieldType::Bool,
        variability: MaterialVariability::Once,
        compute: always_true,
    },
    BuiltinSpec {
        name: "uniFalse",
        field_type: ConstantFieldType::Bool,
        variability: MaterialVariability::Once,
        compute: always_false,
    },
];

fn always_true(_: &FrameState) -> ParameterValue {
    true.into()
}

fn always_false(_: &FrameState) -> ParameterValue {
    false.into()
}
