use lilium_core::math::Vec2;

use crate::constant::ConstantFieldType;
use crate::scene::FrameState;
use crate::variability::MaterialVariability;

use super::{BuiltinSpec, ParameterValue};

pub(super) const BUILTINS: &[BuiltinSpec] = &[
    BuiltinSpec {
        name: "uniScreenSize",
        field_type: ConstantFieldType::Float2,
        variability: MaterialVariability::Frame,
        compute: screen_size,
    },
    BuiltinSpec {
        name: "uniScreenDuDv",
        field_type: ConstantFieldType::Float2,
        variability: MaterialVariability::Frame,
        compute: screen_dudv,
    },
];

fn viewport(frame: &FrameState) -> Vec2 {
    let [width, height] = frame.viewport;
    Vec2::new(width.max(1) as f32, height.max(1) as f32)
}

fn screen_size(frame: &FrameState) -> ParameterValue {
    viewport(frame).into()
}

fn screen_dudv(frame: &FrameState) -> ParameterValue {
    viewport(frame).map(|c| 1.0 / c).into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dudv_of_viewport() {
        let frame = FrameState {
            viewport: [1920, 1080],
            ..FrameState::default()
        };
        assert_eq!(screen_size(&frame), ParameterValue::Float2(Vec2::new(1920.0, 1080.0)));
        assert_eq!(
            screen_dudv(&frame),
            ParameterValue::Float2(Vec2::new(1.0 / 1920.0, 1.0 / 1080.0))
        );
    }
}
