use crate::constant::ConstantFieldType;
use crate::scene::FrameState;
use crate::variability::MaterialVariability;

use super::{BuiltinSpec, ParameterValue};

pub(super) const BUILTINS: &[BuiltinSpec] = &[
    BuiltinSpec {
        name: "uniViewMatrix",
        field_type: ConstantFieldType::Float4x4,
        variability: MaterialVariability::Frame,
        compute: view_matrix,
    },
    BuiltinSpec {
        name: "uniProjectionMatrix",
        field_type: ConstantFieldType::Float4x4,
        variability: MaterialVariability::Frame,
        compute: projection_matrix,
    },
    BuiltinSpec {
        name: "uniViewProjectionMatrix",
        field_type: ConstantFieldType::Float4x4,
        variability: MaterialVariability::Frame,
        compute: view_projection_matrix,
    },
    BuiltinSpec {
        name: "uniCameraPosition",
        field_type: ConstantFieldType::Float3,
        variability: MaterialVariability::Frame,
        compute: camera_position,
    },
    BuiltinSpec {
        name: "uniCameraNearFar",
        field_type: ConstantFieldType::Float2,
        variability: MaterialVariability::Frame,
        compute: camera_near_far,
    },
];

fn view_matrix(frame: &FrameState) -> ParameterValue {
    frame.camera.view.into()
}

fn projection_matrix(frame: &FrameState) -> ParameterValue {
    frame.camera.projection.into()
}

fn view_projection_matrix(frame: &FrameState) -> ParameterValue {
    (frame.camera.projection * frame.camera.view).into()
}

fn camera_position(frame: &FrameState) -> ParameterValue {
    frame.camera.position.into()
}

fn camera_near_far(frame: &FrameState) -> ParameterValue {
    lilium_core::math::Vec2::new(frame.camera.near, frame.camera.far).into()
}
