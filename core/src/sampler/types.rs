//! Sampler filter/address mode definitions.

use serde::{Deserialize, Serialize};

/// Texture filtering mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum FilterMode {
    /// Nearest neighbor filtering.
    #[default]
    Nearest,
    /// Linear filtering.
    Linear,
}

/// Texture address mode (wrapping behavior).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum AddressMode {
    /// Clamp to edge.
    #[default]
    ClampToEdge,
    /// Repeat.
    Repeat,
    /// Mirrored repeat.
    MirrorRepeat,
}

/// Sampler configuration bound next to a texture slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SamplerState {
    /// Address mode applied to every coordinate.
    pub address_mode: AddressMode,
    /// Magnification filter.
    pub mag_filter: FilterMode,
    /// Minification filter.
    pub min_filter: FilterMode,
    /// Mipmap filter.
    pub mipmap_filter: FilterMode,
    /// Maximum anisotropy level, 1 disables anisotropic filtering.
    pub anisotropy_clamp: u16,
}

impl SamplerState {
    /// Maximum anisotropy used by the anisotropic presets.
    pub const MAX_ANISOTROPY: u16 = 16;

    /// Nearest filtering, clamped.
    pub const fn point_clamp() -> Self {
        Self::filtered(FilterMode::Nearest, AddressMode::ClampToEdge, 1)
    }

    /// Nearest filtering, repeating.
    pub const fn point_wrap() -> Self {
        Self::filtered(FilterMode::Nearest, AddressMode::Repeat, 1)
    }

    /// Trilinear filtering, clamped.
    pub const fn linear_clamp() -> Self {
        Self::filtered(FilterMode::Linear, AddressMode::ClampToEdge, 1)
    }

    /// Trilinear filtering, repeating.
    pub const fn linear_wrap() -> Self {
        Self::filtered(FilterMode::Linear, AddressMode::Repeat, 1)
    }

    /// Anisotropic filtering, clamped.
    pub const fn anisotropic_clamp() -> Self {
        Self::filtered(
            FilterMode::Linear,
            AddressMode::ClampToEdge,
            Self::MAX_ANISOTROPY,
        )
    }

    /// Anisotropic filtering, repeating.
    pub const fn anisotropic_wrap() -> Self {
        Self::filtered(FilterMode::Linear, AddressMode::Repeat, Self::MAX_ANISOTROPY)
    }

    const fn filtered(filter: FilterMode, address_mode: AddressMode, anisotropy_clamp: u16) -> Self {
        Self {
            address_mode,
            mag_filter: filter,
            min_filter: filter,
            mipmap_filter: filter,
            anisotropy_clamp,
        }
    }

    /// Whether anisotropic filtering is enabled.
    pub fn is_anisotropic(&self) -> bool {
        self.anisotropy_clamp > 1
    }
}

impl Default for SamplerState {
    fn default() -> Self {
        Self::linear_wrap()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn presets() {
        assert_eq!(SamplerState::point_clamp().mag_filter, FilterMode::Nearest);
        assert_eq!(SamplerState::linear_wrap().address_mode, AddressMode::Repeat);
        assert!(SamplerState::anisotropic_clamp().is_anisotropic());
        assert!(!SamplerState::linear_clamp().is_anisotropic());
    }

    #[test]
    fn default_is_linear_wrap() {
        assert_eq!(SamplerState::default(), SamplerState::linear_wrap());
    }
}
