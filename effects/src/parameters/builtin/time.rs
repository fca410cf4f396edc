use lilium_core::math::Vec2;

use crate::constant::ConstantFieldType;
use crate::scene::FrameState;
use crate::variability::MaterialVariability;

use super::{BuiltinSpec, ParameterValue};

pub(super) const BUILTINS: &[BuiltinSpec] = &[
    BuiltinSpec {
        name: "uniTime",
        field_type: ConstantFieldType::Float,
        variability: MaterialVariability::Frame,
        compute: time,
    },
    BuiltinSpec {
        name: "uniDeltaTime",
        field_type: ConstantFieldType::Float,
        variability: MaterialVariability::Frame,
        compute: delta_time,
    },
    BuiltinSpec {
        name: "uniTimeSinCos",
        field_type: ConstantFieldType::Float2,
        variability: MaterialVariability::Frame,
        compute: time_sin_cos,
    },
    BuiltinSpec {
        name: "uniFrameIndex",
        field_type: ConstantFieldType::UInt,
        variability: MaterialVariability::Frame,
        compute: frame_index,
    },
];

fn time(frame: &FrameState) -> ParameterValue {
    frame.time.time.into()
}

fn delta_time(frame: &FrameState) -> ParameterValue {
    frame.time.delta_time.into()
}

fn time_sin_cos(frame: &FrameState) -> ParameterValue {
    let (sin, cos) = frame.time.time.sin_cos();
    Vec2::new(sin, cos).into()
}

fn frame_index(frame: &FrameState) -> ParameterValue {
    frame.time.frame_index.into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sin_cos_of_zero() {
        let frame = FrameState::default();
        assert_eq!(time_sin_cos(&frame), ParameterValue::Float2(Vec2::new(0.0, 1.0)));
    }
}
