//! Effects: compiled shader permutations and the cache that owns them.

mod compiler;
mod descriptor;
#[allow(clippy::module_inception)]
mod effect;
mod program;
mod state;

pub use compiler::{EffectCompiler, EffectKey};
pub use descriptor::{EffectDescriptor, ProgramDescriptor, VertexDeclaration};
pub use effect::{Effect, EffectTags, MAX_EFFECT_TAGS};
pub use program::{
    EffectProgram, ProgramReflection, ReflectedConstantBuffer, ReflectedTexture, ShaderStage,
    ShaderStageFlags,
};
pub use state::{
    BlendComponent, BlendFactor, BlendMode, BlendOperation, BlendState, CompareFunction, CullMode,
    DepthStencilState, FillMode, RasterizerState,
};
