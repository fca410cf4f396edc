//! # Lilium Effects
//!
//! Material parameter resolution and constant-buffer memoization.
//!
//! ## Overview
//!
//! This crate provides:
//! - [`Material`] and [`MaterialDatabase`] - named parameters and textures,
//!   with builtins for camera, lighting, time and friends
//! - [`parameters`] - typed parameter sources, `uni*_` name modifiers and the
//!   resolution protocol that binds shader field names to parameters
//! - [`EffectCompiler`] - the cache of compiled [`Effect`] permutations,
//!   including hot reload
//! - [`MaterialEffect`] - a material bound to an effect, evaluating its
//!   [`EffectConstantBuffer`]s once per variability tier advance
//! - [`backend`] - device and shader-compiler traits plus a dummy backend
//!
//! ## Example
//!
//! ```ignore
//! use lilium_effects::{EffectCompiler, EffectSystemConfig, VariabilitySeeds};
//!
//! let mut compiler = EffectCompiler::new(Box::new(shader_compiler), EffectSystemConfig::default());
//! let mut seeds = VariabilitySeeds::new();
//! let mut material_effect = compiler.create_material_effect(
//!     &mut device, &scene, &descriptor, &vertex_declaration, &material, &database,
//! )?;
//!
//! seeds.next_frame();
//! compiler.prepare(&mut material_effect, &mut device, &scene, &seeds)?;
//! material_effect.set(&mut device, compiler.render_settings())?;
//! ```

pub mod backend;
pub mod bind_name;
pub mod config;
pub mod constant;
pub mod constant_buffer;
pub mod database;
pub mod effect;
pub mod error;
pub mod material;
pub mod material_effect;
pub mod parameters;
pub mod scene;
pub mod shared_buffer;
pub mod texture;
pub mod variability;

// Re-export main types for convenience
pub use backend::{DeviceContext, RenderDevice, ShaderCompiler};
pub use bind_name::BindName;
pub use config::{EffectSystemConfig, RenderSettings, ResolutionOptions};
pub use constant::{ConstantBufferLayout, ConstantField, ConstantFieldType};
pub use constant_buffer::EffectConstantBuffer;
pub use database::MaterialDatabase;
pub use effect::{
    Effect, EffectCompiler, EffectDescriptor, EffectTags, ProgramReflection, ShaderStage,
    VertexDeclaration,
};
pub use error::{BackendError, EffectError, EffectResult, ResolutionError};
pub use material::{Material, MaterialDefinition};
pub use material_effect::{MaterialContext, MaterialEffect};
pub use parameters::{MaterialParameter, ParamRef, ParameterValue};
pub use scene::{FrameState, Scene};
pub use shared_buffer::{SharedConstantBuffer, SharedConstantBufferFactory};
pub use texture::{Texture, TextureBinding, TextureSlot};
pub use variability::{MaterialVariability, VariabilitySeed, VariabilitySeeds};

/// Effects library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Initialize the effect subsystem.
pub fn init() {
    lilium_core::init();
    log::info!("Lilium Effects v{} initialized", VERSION);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }

    #[test]
    fn test_builtin_database() {
        let database = MaterialDatabase::with_builtins();
        assert!(database.find_parameter(&"uniTime".into()).is_some());
        assert!(database.find_parameter(&"uniRandomFloat4".into()).is_some());
    }
}
