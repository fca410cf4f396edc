//! Texture references and texture slots of an effect.
//!
//! Textures are owned by the scene's texture cache. A material effect only
//! keeps a [`TextureBinding`] holding a weak reference, so clearing the cache
//! invalidates bindings until the effect is prepared again.

use std::sync::{Arc, Weak};

use lilium_core::sampler::SamplerState;
use parking_lot::RwLock;

use crate::backend::TextureHandle;
use crate::bind_name::BindName;
use crate::effect::ShaderStage;

/// A texture loaded by the scene.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Texture {
    path: String,
    width: u32,
    height: u32,
    srgb: bool,
    handle: TextureHandle,
}

impl Texture {
    pub fn new(path: impl Into<String>, width: u32, height: u32, srgb: bool, handle: TextureHandle) -> Self {
        Self {
            path: path.into(),
            width,
            height,
            srgb,
            handle,
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn is_srgb(&self) -> bool {
        self.srgb
    }

    pub fn handle(&self) -> TextureHandle {
        self.handle
    }
}

/// Identifies a render target or depth-stencil surface in the scene.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SurfaceId(pub u32);

/// Where a texture slot gets its texture from.
#[derive(Debug)]
pub struct TextureBinding {
    path: String,
    srgb: bool,
    surface: Option<SurfaceId>,
    texture: RwLock<Weak<Texture>>,
}

impl TextureBinding {
    /// Bind a file-backed texture.
    pub fn file(path: impl Into<String>, srgb: bool) -> Self {
        Self {
            path: path.into(),
            srgb,
            surface: None,
            texture: RwLock::new(Weak::new()),
        }
    }

    /// Bind a render surface aliased by `path`.
    pub fn surface(path: impl Into<String>, srgb: bool, surface: SurfaceId) -> Self {
        Self {
            path: path.into(),
            srgb,
            surface: Some(surface),
            texture: RwLock::new(Weak::new()),
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn is_srgb(&self) -> bool {
        self.srgb
    }

    /// The surface this binding aliases, if it is a virtual texture.
    pub fn surface_id(&self) -> Option<SurfaceId> {
        self.surface
    }

    pub fn is_virtual(&self) -> bool {
        self.surface.is_some()
    }

    /// The bound texture, if the cache still holds it.
    pub fn texture(&self) -> Option<Arc<Texture>> {
        self.texture.read().upgrade()
    }

    pub fn set_texture(&self, texture: &Arc<Texture>) {
        *self.texture.write() = Arc::downgrade(texture);
    }

    pub fn clear(&self) {
        *self.texture.write() = Weak::new();
    }
}

/// Sampler prefixes recognised on texture names, checked in order.
pub const SAMPLER_PREFIXES: [(&str, SamplerState); 6] = [
    ("uniAnisotropicClamp_", SamplerState::anisotropic_clamp()),
    ("uniAnisotropicWrap_", SamplerState::anisotropic_wrap()),
    ("uniLinearClamp_", SamplerState::linear_clamp()),
    ("uniLinearWrap_", SamplerState::linear_wrap()),
    ("uniPointClamp_", SamplerState::point_clamp()),
    ("uniPointWrap_", SamplerState::point_wrap()),
];

/// Prefix marking a texture as sRGB encoded.
pub const SRGB_PREFIX: &str = "uniSRGB_";

/// A texture slot reflected from a program.
#[derive(Debug, Clone, PartialEq)]
pub struct TextureSlot {
    /// Name as declared in the shader, prefixes included.
    pub name: BindName,
    /// Name with sampler and colour-space prefixes removed.
    pub base_name: BindName,
    pub stage: ShaderStage,
    pub index: u32,
    pub sampler: SamplerState,
    pub srgb: bool,
}

impl TextureSlot {
    /// Derive sampler state and colour space from the declared name.
    ///
    /// `uniLinearClamp_uniSRGB_uniDiffuse` samples `uniDiffuse` as sRGB with a
    /// linear clamp sampler. Without a sampler prefix the slot uses linear wrap.
    pub fn parse(name: BindName, stage: ShaderStage, index: u32) -> Self {
        let mut rest = name.as_str();
        let mut sampler = SamplerState::default();
        for (prefix, state) in SAMPLER_PREFIXES {
            if let Some(stripped) = rest.strip_prefix(prefix) {
                rest = stripped;
                sampler = state;
                break;
            }
        }

        let srgb = match rest.strip_prefix(SRGB_PREFIX) {
            Some(stripped) => {
                rest = stripped;
                true
            }
            None => false,
        };

        Self {
            base_name: BindName::new(rest),
            name,
            stage,
            index,
            sampler,
            srgb,
        }
    }

    /// Whether a lookup by `name` refers to this slot.
    pub fn answers_to(&self, name: &BindName) -> bool {
        &self.base_name == name || &self.name == name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lilium_core::sampler::{AddressMode, FilterMode};

    #[test]
    fn plain_name_uses_linear_wrap() {
        let slot = TextureSlot::parse("uniDiffuse".into(), ShaderStage::Fragment, 0);
        assert_eq!(slot.base_name, "uniDiffuse");
        assert_eq!(slot.sampler, SamplerState::linear_wrap());
        assert!(!slot.srgb);
    }

    #[test]
    fn sampler_then_srgb_prefix() {
        let slot = TextureSlot::parse(
            "uniPointClamp_uniSRGB_uniAlbedo".into(),
            ShaderStage::Fragment,
            2,
        );
        assert_eq!(slot.base_name, "uniAlbedo");
        assert_eq!(slot.sampler.address_mode, AddressMode::ClampToEdge);
        assert_eq!(slot.sampler.mag_filter, FilterMode::Nearest);
        assert!(slot.srgb);
        assert!(slot.answers_to(&"uniAlbedo".into()));
        assert!(slot.answers_to(&"uniPointClamp_uniSRGB_uniAlbedo".into()));
    }

    #[test]
    fn anisotropic_prefix() {
        let slot = TextureSlot::parse("uniAnisotropicWrap_uniNormal".into(), ShaderStage::Fragment, 1);
        assert!(slot.sampler.is_anisotropic());
        assert_eq!(slot.sampler.address_mode, AddressMode::Repeat);
        assert_eq!(slot.base_name, "uniNormal");
    }

    #[test]
    fn weak_binding_expires() {
        let binding = TextureBinding::file("a.png", false);
        assert!(binding.texture().is_none());
        let texture = Arc::new(Texture::new("a.png", 4, 2, false, TextureHandle(7)));
        binding.set_texture(&texture);
        assert_eq!(binding.texture().unwrap().width(), 4);
        drop(texture);
        assert!(binding.texture().is_none());
    }
}
