//! Compiled stage programs and their reflected resource slots.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::backend::{ProgramHandle, RenderDevice};
use crate::bind_name::BindName;
use crate::constant::ConstantBufferLayout;

/// Shader stage in the graphics pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ShaderStage {
    Vertex,
    Fragment,
}

impl ShaderStage {
    pub fn flag(self) -> ShaderStageFlags {
        match self {
            Self::Vertex => ShaderStageFlags::VERTEX,
            Self::Fragment => ShaderStageFlags::FRAGMENT,
        }
    }
}

bitflags::bitflags! {
    /// Shader stages that bind a resource.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ShaderStageFlags: u32 {
        const VERTEX = 1 << 0;
        const FRAGMENT = 1 << 1;
    }
}

/// A constant buffer as reported by reflection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReflectedConstantBuffer {
    pub name: BindName,
    pub slot: u32,
    pub layout: Arc<ConstantBufferLayout>,
}

/// A texture slot as reported by reflection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReflectedTexture {
    pub name: BindName,
    pub slot: u32,
}

/// Resource slots of one compiled program.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProgramReflection {
    pub constant_buffers: Vec<ReflectedConstantBuffer>,
    pub textures: Vec<ReflectedTexture>,
}

impl ProgramReflection {
    pub fn with_constant_buffer(
        mut self,
        name: impl Into<BindName>,
        slot: u32,
        layout: ConstantBufferLayout,
    ) -> Self {
        self.constant_buffers.push(ReflectedConstantBuffer {
            name: name.into(),
            slot,
            layout: Arc::new(layout),
        });
        self
    }

    pub fn with_texture(mut self, name: impl Into<BindName>, slot: u32) -> Self {
        self.textures.push(ReflectedTexture {
            name: name.into(),
            slot,
        });
        self
    }
}

/// One linked stage of an effect.
#[derive(Debug)]
pub struct EffectProgram {
    stage: ShaderStage,
    handle: ProgramHandle,
    reflection: ProgramReflection,
}

impl EffectProgram {
    /// Take ownership of a device program and the slots it exposes.
    pub fn link_reflected_data(
        stage: ShaderStage,
        handle: ProgramHandle,
        reflection: ProgramReflection,
    ) -> Self {
        Self {
            stage,
            handle,
            reflection,
        }
    }

    pub fn stage(&self) -> ShaderStage {
        self.stage
    }

    pub fn handle(&self) -> ProgramHandle {
        self.handle
    }

    pub fn constant_buffers(&self) -> &[ReflectedConstantBuffer] {
        &self.reflection.constant_buffers
    }

    pub fn textures(&self) -> &[ReflectedTexture] {
        &self.reflection.textures
    }

    pub(crate) fn destroy(&self, device: &mut dyn RenderDevice) {
        device.destroy_program(self.handle);
    }
}
