use crate::constant::ConstantFieldType;
use crate::scene::FrameState;
use crate::variability::MaterialVariability;

use super::{BuiltinSpec, ParameterValue};

pub(super) const BUILTINS: &[BuiltinSpec] = &[
    BuiltinSpec {
        name: "uniSunDirection",
        field_type: ConstantFieldType::Float3,
        variability: MaterialVariability::Frame,
        compute: sun_direction,
    },
    BuiltinSpec {
        name: "uniSunColor",
        field_type: ConstantFieldType::Float3,
        variability: MaterialVariability::Frame,
        compute: sun_color,
    },
    BuiltinSpec {
        name: "uniAmbientColor",
        field_type: ConstantFieldType::Float3,
        variability: MaterialVariability::Frame,
        compute: ambient_color,
    },
];

// Normalized so shaders can dot against it directly.
fn sun_direction(frame: &FrameState) -> ParameterValue {
    let direction = frame.lighting.sun_direction;
    direction
        .try_normalize(f32::EPSILON)
        .unwrap_or(direction)
        .into()
}

fn sun_color(frame: &FrameState) -> ParameterValue {
    frame.lighting.sun_color.into()
}

fn ambient_color(frame: &FrameState) -> ParameterValue {
    frame.lighting.ambient_color.into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use lilium_core::math::Vec3;

    #[test]
    fn sun_direction_is_normalized() {
        let mut frame = FrameState::default();
        frame.lighting.sun_direction = Vec3::new(0.0, -3.0, 4.0);
        let v = sun_direction(&frame).as_float3().unwrap();
        assert!((v.norm() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn zero_direction_passes_through() {
        let mut frame = FrameState::default();
        frame.lighting.sun_direction = Vec3::zeros();
        assert_eq!(sun_direction(&frame), ParameterValue::Float3(Vec3::zeros()));
    }
}
