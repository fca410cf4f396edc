//! Fixed-function render state derived from effect descriptors.

use serde::{Deserialize, Serialize};

/// Blend factor for blending operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum BlendFactor {
    /// 0.0
    #[default]
    Zero,
    /// 1.0
    One,
    /// Source color
    Src,
    /// 1 - source color
    OneMinusSrc,
    /// Source alpha
    SrcAlpha,
    /// 1 - source alpha
    OneMinusSrcAlpha,
    /// Destination color
    Dst,
    /// 1 - destination color
    OneMinusDst,
    /// Destination alpha
    DstAlpha,
    /// 1 - destination alpha
    OneMinusDstAlpha,
}

/// Blend operation for combining colors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum BlendOperation {
    /// source + destination
    #[default]
    Add,
    /// source - destination
    Subtract,
    /// destination - source
    ReverseSubtract,
    Min,
    Max,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BlendComponent {
    pub src_factor: BlendFactor,
    pub dst_factor: BlendFactor,
    pub operation: BlendOperation,
}

impl Default for BlendComponent {
    fn default() -> Self {
        Self {
            src_factor: BlendFactor::One,
            dst_factor: BlendFactor::Zero,
            operation: BlendOperation::Add,
        }
    }
}

impl BlendComponent {
    /// Standard alpha blending (src over dst).
    pub const fn over() -> Self {
        Self {
            src_factor: BlendFactor::SrcAlpha,
            dst_factor: BlendFactor::OneMinusSrcAlpha,
            operation: BlendOperation::Add,
        }
    }

    pub const fn premultiplied() -> Self {
        Self {
            src_factor: BlendFactor::One,
            dst_factor: BlendFactor::OneMinusSrcAlpha,
            operation: BlendOperation::Add,
        }
    }

    pub const fn additive() -> Self {
        Self {
            src_factor: BlendFactor::One,
            dst_factor: BlendFactor::One,
            operation: BlendOperation::Add,
        }
    }
}

/// Color and alpha blending.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct BlendState {
    pub color: BlendComponent,
    pub alpha: BlendComponent,
}

/// How an effect composites onto the target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum BlendMode {
    /// Blending disabled.
    #[default]
    Opaque,
    AlphaBlend,
    PremultipliedAlpha,
    Additive,
}

impl BlendMode {
    /// The blend state to bind, `None` when blending is disabled.
    pub fn blend_state(self) -> Option<BlendState> {
        let component = match self {
            Self::Opaque => return None,
            Self::AlphaBlend => BlendComponent::over(),
            Self::PremultipliedAlpha => BlendComponent::premultiplied(),
            Self::Additive => BlendComponent::additive(),
        };
        Some(BlendState {
            color: component,
            alpha: component,
        })
    }
}

/// Depth comparison function.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum CompareFunction {
    Never,
    Less,
    Equal,
    #[default]
    LessEqual,
    Greater,
    NotEqual,
    GreaterEqual,
    Always,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct DepthStencilState {
    pub depth_test: bool,
    pub depth_write: bool,
    pub compare: CompareFunction,
}

impl Default for DepthStencilState {
    fn default() -> Self {
        Self {
            depth_test: true,
            depth_write: true,
            compare: CompareFunction::LessEqual,
        }
    }
}

impl DepthStencilState {
    /// Depth test without writes, for transparent geometry.
    pub const fn read_only() -> Self {
        Self {
            depth_test: true,
            depth_write: false,
            compare: CompareFunction::LessEqual,
        }
    }

    pub const fn disabled() -> Self {
        Self {
            depth_test: false,
            depth_write: false,
            compare: CompareFunction::Always,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum FillMode {
    #[default]
    Solid,
    Wireframe,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum CullMode {
    None,
    Front,
    #[default]
    Back,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RasterizerState {
    pub fill_mode: FillMode,
    pub cull_mode: CullMode,
    pub depth_bias: i32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opaque_disables_blending() {
        assert_eq!(BlendMode::Opaque.blend_state(), None);
    }

    #[test]
    fn alpha_blend_is_over() {
        let state = BlendMode::AlphaBlend.blend_state().unwrap();
        assert_eq!(state.color.src_factor, BlendFactor::SrcAlpha);
        assert_eq!(state.alpha.dst_factor, BlendFactor::OneMinusSrcAlpha);
    }

    #[test]
    fn additive_uses_one_one() {
        let state = BlendMode::Additive.blend_state().unwrap();
        assert_eq!(state.color.src_factor, BlendFactor::One);
        assert_eq!(state.color.dst_factor, BlendFactor::One);
    }

    #[test]
    fn default_depth_writes() {
        let depth = DepthStencilState::default();
        assert!(depth.depth_test && depth.depth_write);
        assert!(!DepthStencilState::read_only().depth_write);
    }
}
