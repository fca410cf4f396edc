use crate::constant::ConstantFieldType;
use crate::scene::FrameState;
use crate::variability::MaterialVariability;

use super::{BuiltinSpec, ParameterValue};

pub(super) const BUILTINS: &[BuiltinSpec] = &[
    BuiltinSpec {
        name: "uniMousePosition",
        field_type: ConstantFieldType::Float2,
        variability: MaterialVariability::Frame,
        compute: mouse_position,
    },
    BuiltinSpec {
        name: "uniMouseButtons",
        field_type: ConstantFieldType::UInt,
        variability: MaterialVariability::Frame,
        compute: mouse_buttons,
    },
];

fn mouse_position(frame: &FrameState) -> ParameterValue {
    frame.mouse.position.into()
}

fn mouse_buttons(frame: &FrameState) -> ParameterValue {
    frame.mouse.buttons.into()
}
