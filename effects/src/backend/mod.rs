//! Device and shader-compiler collaborators.
//!
//! The effect system never talks to a graphics API directly. It creates
//! programs and buffers through [`RenderDevice`], binds state through
//! [`DeviceContext`], and obtains bytecode plus reflection data from a
//! [`ShaderCompiler`]. The [`dummy`] module provides recording
//! implementations for tests and headless tools.

pub mod dummy;

use lilium_core::sampler::SamplerState;

use crate::bind_name::BindName;
use crate::effect::{
    BlendState, DepthStencilState, ProgramReflection, RasterizerState, ShaderStage,
};
use crate::error::BackendError;

/// Device handle of a linked shader program.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ProgramHandle(pub u64);

/// Device handle of a constant buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BufferHandle(pub u64);

/// Device handle of a texture or render surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureHandle(pub u64);

/// Creates and destroys device objects.
pub trait RenderDevice {
    fn create_program(
        &mut self,
        stage: ShaderStage,
        bytecode: &[u8],
    ) -> Result<ProgramHandle, BackendError>;

    fn destroy_program(&mut self, program: ProgramHandle);

    fn create_constant_buffer(
        &mut self,
        name: &BindName,
        size: u32,
    ) -> Result<BufferHandle, BackendError>;

    fn destroy_constant_buffer(&mut self, buffer: BufferHandle);
}

/// Records pipeline state and resource bindings for draws.
pub trait DeviceContext {
    fn set_program(&mut self, stage: ShaderStage, program: Option<ProgramHandle>);

    fn set_constant_buffer(&mut self, stage: ShaderStage, slot: u32, buffer: Option<BufferHandle>);

    fn update_constant_buffer(&mut self, buffer: BufferHandle, data: &[u8]);

    fn set_texture(&mut self, stage: ShaderStage, slot: u32, texture: Option<TextureHandle>);

    fn set_sampler_state(&mut self, stage: ShaderStage, slot: u32, sampler: &SamplerState);

    /// `None` disables blending.
    fn set_blend_state(&mut self, blend: Option<&BlendState>);

    fn set_depth_stencil_state(&mut self, state: &DepthStencilState);

    fn set_rasterizer_state(&mut self, state: &RasterizerState);

    /// Whether `texture` is currently bound as a render target.
    fn is_render_target_bound(&self, texture: TextureHandle) -> bool;
}

/// One program to compile.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ProgramRequest {
    pub stage: ShaderStage,
    pub file: String,
    pub entry_point: String,
    /// Preprocessor `(name, value)` defines: the descriptor's own, then one
    /// per active material tag with value `1`.
    pub defines: Vec<(String, String)>,
    /// Name of the vertex declaration the program is linked against.
    pub vertex_declaration: String,
}

/// Bytecode plus the reflection data needed to bind it.
#[derive(Debug, Clone, Default)]
pub struct CompiledProgram {
    pub bytecode: Vec<u8>,
    pub reflection: ProgramReflection,
}

/// Compiles shader programs and reflects their resource slots.
pub trait ShaderCompiler {
    fn compile_program(&self, request: &ProgramRequest) -> Result<CompiledProgram, BackendError>;
}
