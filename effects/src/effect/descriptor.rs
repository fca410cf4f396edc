//! Authored effect descriptions.
//!
//! An [`EffectDescriptor`] names the stage programs of an effect, the
//! vertex declarations it accepts, its permutation tags, fixed-function state
//! and default parameter values. Descriptors can be written in RON.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::bind_name::BindName;
use crate::error::{EffectError, EffectResult};
use crate::parameters::ParameterValue;

use super::program::ShaderStage;
use super::state::{BlendMode, DepthStencilState, RasterizerState};

/// One stage program of an effect.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProgramDescriptor {
    pub stage: ShaderStage,
    pub file: String,
    pub entry_point: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EffectDescriptor {
    pub name: String,
    pub programs: Vec<ProgramDescriptor>,
    /// Accepted vertex declarations by name. Empty accepts any.
    pub vertex_declarations: Vec<String>,
    /// Preprocessor defines passed to every program, ahead of tag defines.
    pub defines: Vec<(String, String)>,
    /// Material tags that select a program permutation.
    pub substitution_tags: Vec<BindName>,
    pub blend: BlendMode,
    pub depth_stencil: DepthStencilState,
    /// `None` uses the compiler's default rasterizer state.
    pub rasterizer: Option<RasterizerState>,
    pub default_parameters: HashMap<BindName, ParameterValue>,
    pub default_textures: HashMap<BindName, String>,
}

impl EffectDescriptor {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_program(
        mut self,
        stage: ShaderStage,
        file: impl Into<String>,
        entry_point: impl Into<String>,
    ) -> Self {
        self.programs.push(ProgramDescriptor {
            stage,
            file: file.into(),
            entry_point: entry_point.into(),
        });
        self
    }

    pub fn with_vertex_declaration(mut self, name: impl Into<String>) -> Self {
        self.vertex_declarations.push(name.into());
        self
    }

    pub fn with_define(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.defines.push((name.into(), value.into()));
        self
    }

    pub fn with_substitution_tag(mut self, tag: impl Into<BindName>) -> Self {
        self.substitution_tags.push(tag.into());
        self
    }

    pub fn with_blend(mut self, blend: BlendMode) -> Self {
        self.blend = blend;
        self
    }

    pub fn with_depth_stencil(mut self, depth_stencil: DepthStencilState) -> Self {
        self.depth_stencil = depth_stencil;
        self
    }

    pub fn with_rasterizer(mut self, rasterizer: RasterizerState) -> Self {
        self.rasterizer = Some(rasterizer);
        self
    }

    pub fn with_default_parameter(
        mut self,
        name: impl Into<BindName>,
        value: impl Into<ParameterValue>,
    ) -> Self {
        self.default_parameters.insert(name.into(), value.into());
        self
    }

    pub fn with_default_texture(mut self, name: impl Into<BindName>, path: impl Into<String>) -> Self {
        self.default_textures.insert(name.into(), path.into());
        self
    }

    pub fn default_parameter(&self, name: &BindName) -> Option<&ParameterValue> {
        self.default_parameters.get(name)
    }

    pub fn default_texture(&self, name: &BindName) -> Option<&str> {
        self.default_textures.get(name).map(String::as_str)
    }

    pub fn supports_vertex_declaration(&self, name: &str) -> bool {
        self.vertex_declarations.is_empty() || self.vertex_declarations.iter().any(|d| d == name)
    }

    pub fn from_ron(source: &str) -> EffectResult<Self> {
        ron::from_str(source).map_err(|e| EffectError::Config(e.to_string()))
    }
}

/// The vertex inputs a mesh provides, shared by pointer.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VertexDeclaration {
    name: String,
}

impl VertexDeclaration {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}
