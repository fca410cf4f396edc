use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::{RwLock, RwLockReadGuard};

use crate::backend::{DeviceContext, ProgramRequest, RenderDevice, ShaderCompiler};
use crate::bind_name::BindName;
use crate::config::RenderSettings;
use crate::error::{EffectError, EffectResult};
use crate::material::Material;

use super::descriptor::{EffectDescriptor, VertexDeclaration};
use super::program::EffectProgram;
use super::state::{BlendState, DepthStencilState, RasterizerState};

/// Maximum number of active material tags in one effect permutation.
pub const MAX_EFFECT_TAGS: usize = 8;

/// The ordered material tags selecting an effect permutation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct EffectTags {
    tags: Vec<BindName>,
}

impl EffectTags {
    pub fn none() -> Self {
        Self::default()
    }

    /// Collect tags for `effect`, failing beyond [`MAX_EFFECT_TAGS`].
    pub fn from_tags(effect: &str, tags: impl IntoIterator<Item = BindName>) -> EffectResult<Self> {
        let tags: Vec<BindName> = tags.into_iter().collect();
        if tags.len() > MAX_EFFECT_TAGS {
            return Err(EffectError::TooManyTags {
                effect: effect.to_owned(),
                count: tags.len(),
            });
        }
        Ok(Self { tags })
    }

    /// The descriptor's substitution tags that `material` enables, in descriptor order.
    pub fn active_for(descriptor: &EffectDescriptor, material: &Material) -> EffectResult<Self> {
        Self::from_tags(
            &descriptor.name,
            descriptor
                .substitution_tags
                .iter()
                .filter(|tag| material.has_tag(tag))
                .cloned(),
        )
    }

    pub fn as_slice(&self) -> &[BindName] {
        &self.tags
    }

    pub fn len(&self) -> usize {
        self.tags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }
}

/// A compiled effect permutation.
///
/// Everything but the programs is fixed at creation. Programs are replaced
/// wholesale on hot reload, which bumps [`generation`](Self::generation) so
/// material effects know to resolve again.
#[derive(Debug)]
pub struct Effect {
    descriptor: Arc<EffectDescriptor>,
    vertex_declaration: Arc<VertexDeclaration>,
    tags: EffectTags,
    blend: Option<BlendState>,
    depth_stencil: DepthStencilState,
    rasterizer: Option<RasterizerState>,
    programs: RwLock<Vec<EffectProgram>>,
    generation: AtomicU64,
}

impl Effect {
    pub(crate) fn create(
        device: &mut dyn RenderDevice,
        compiler: &dyn ShaderCompiler,
        descriptor: Arc<EffectDescriptor>,
        vertex_declaration: Arc<VertexDeclaration>,
        tags: EffectTags,
    ) -> EffectResult<Self> {
        if !descriptor.supports_vertex_declaration(vertex_declaration.name()) {
            return Err(EffectError::UnsupportedVertexDeclaration {
                effect: descriptor.name.clone(),
                declaration: vertex_declaration.name().to_owned(),
            });
        }
        if tags.len() > MAX_EFFECT_TAGS {
            return Err(EffectError::TooManyTags {
                effect: descriptor.name.clone(),
                count: tags.len(),
            });
        }

        let programs = compile_programs(device, compiler, &descriptor, &vertex_declaration, &tags)?;
        log::debug!(
            "Created effect `{}` ({} programs, tags {:?})",
            descriptor.name,
            programs.len(),
            tags.as_slice()
        );

        Ok(Self {
            blend: descriptor.blend.blend_state(),
            depth_stencil: descriptor.depth_stencil,
            rasterizer: descriptor.rasterizer,
            descriptor,
            vertex_declaration,
            tags,
            programs: RwLock::new(programs),
            generation: AtomicU64::new(0),
        })
    }

    /// Recompile every program. On failure the old programs stay in place.
    pub(crate) fn regenerate(
        &self,
        device: &mut dyn RenderDevice,
        compiler: &dyn ShaderCompiler,
    ) -> EffectResult<()> {
        let fresh = compile_programs(
            device,
            compiler,
            &self.descriptor,
            &self.vertex_declaration,
            &self.tags,
        )?;
        let stale = std::mem::replace(&mut *self.programs.write(), fresh);
        for program in &stale {
            program.destroy(device);
        }
        self.generation.fetch_add(1, Ordering::AcqRel);
        Ok(())
    }

    pub(crate) fn destroy(&self, device: &mut dyn RenderDevice) {
        for program in self.programs.write().drain(..) {
            program.destroy(device);
        }
    }

    /// Bind programs and fixed-function state.
    pub fn bind(&self, ctx: &mut dyn DeviceContext, settings: &RenderSettings) {
        for program in self.programs.read().iter() {
            ctx.set_program(program.stage(), Some(program.handle()));
        }
        ctx.set_blend_state(self.blend.as_ref());
        ctx.set_depth_stencil_state(&self.depth_stencil);
        ctx.set_rasterizer_state(&self.rasterizer_state(settings));
    }

    pub fn name(&self) -> &str {
        &self.descriptor.name
    }

    pub fn descriptor(&self) -> &Arc<EffectDescriptor> {
        &self.descriptor
    }

    pub fn vertex_declaration(&self) -> &Arc<VertexDeclaration> {
        &self.vertex_declaration
    }

    pub fn tags(&self) -> &EffectTags {
        &self.tags
    }

    pub fn blend_state(&self) -> Option<&BlendState> {
        self.blend.as_ref()
    }

    pub fn depth_stencil_state(&self) -> &DepthStencilState {
        &self.depth_stencil
    }

    /// The rasterizer state bound under `settings`.
    pub fn rasterizer_state(&self, settings: &RenderSettings) -> RasterizerState {
        let own = self.rasterizer.unwrap_or(settings.default_rasterizer);
        settings.effective_rasterizer(&own)
    }

    pub fn programs(&self) -> RwLockReadGuard<'_, Vec<EffectProgram>> {
        self.programs.read()
    }

    /// Number of completed hot reloads.
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }
}

fn compile_programs(
    device: &mut dyn RenderDevice,
    compiler: &dyn ShaderCompiler,
    descriptor: &EffectDescriptor,
    vertex_declaration: &VertexDeclaration,
    tags: &EffectTags,
) -> EffectResult<Vec<EffectProgram>> {
    lilium_core::profile_scope!("compile_programs");

    let defines: Vec<(String, String)> = descriptor
        .defines
        .iter()
        .cloned()
        .chain(tags.as_slice().iter().map(|tag| (tag.to_string(), "1".to_owned())))
        .collect();
    let mut programs = Vec::with_capacity(descriptor.programs.len());

    for program in &descriptor.programs {
        let request = ProgramRequest {
            stage: program.stage,
            file: program.file.clone(),
            entry_point: program.entry_point.clone(),
            defines: defines.clone(),
            vertex_declaration: vertex_declaration.name().to_owned(),
        };

        let linked = compiler
            .compile_program(&request)
            .and_then(|compiled| {
                device
                    .create_program(program.stage, &compiled.bytecode)
                    .map(|handle| {
                        EffectProgram::link_reflected_data(program.stage, handle, compiled.reflection)
                    })
            });

        match linked {
            Ok(linked) => programs.push(linked),
            Err(err) => {
                log::error!("Effect `{}`: {err}", descriptor.name);
                for created in &programs {
                    created.destroy(device);
                }
                return Err(err.into());
            }
        }
    }

    Ok(programs)
}

static_assertions::assert_impl_all!(Effect: Send, Sync);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::effect::{BlendMode, FillMode, ShaderStage};

    #[test]
    fn too_many_tags() {
        let tags = (0..9).map(|i| BindName::new(&format!("TAG{i}")));
        let err = EffectTags::from_tags("big", tags).unwrap_err();
        assert_eq!(
            err,
            EffectError::TooManyTags {
                effect: "big".into(),
                count: 9
            }
        );
    }

    #[test]
    fn active_tags_follow_descriptor_order() {
        let descriptor = EffectDescriptor::new("lit")
            .with_substitution_tag("SKINNED")
            .with_substitution_tag("ALPHA_TEST")
            .with_substitution_tag("FOG");
        let material = Material::new("m")
            .with_tag("FOG")
            .with_tag("UNRELATED")
            .with_tag("SKINNED");

        let tags = EffectTags::active_for(&descriptor, &material).unwrap();
        assert_eq!(
            tags.as_slice(),
            &[BindName::new("SKINNED"), BindName::new("FOG")]
        );
    }

    #[test]
    fn derived_state() {
        let descriptor = EffectDescriptor::new("glass")
            .with_program(ShaderStage::Fragment, "glass.hlsl", "ps")
            .with_blend(BlendMode::AlphaBlend);
        assert!(descriptor.blend.blend_state().is_some());

        let settings = RenderSettings {
            fill_mode_override: Some(FillMode::Wireframe),
            ..RenderSettings::default()
        };
        let own = settings.default_rasterizer;
        assert_eq!(settings.effective_rasterizer(&own).fill_mode, FillMode::Wireframe);
    }
}
