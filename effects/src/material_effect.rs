//! A material bound to one effect permutation.
//!
//! The lifecycle is strict: [`MaterialEffect::create`] resolves every texture
//! slot and constant-buffer field, [`MaterialEffect::prepare`] refreshes
//! textures and evaluates buffers for a frame, [`MaterialEffect::set`] binds
//! everything for a draw, and [`MaterialEffect::destroy`] releases surface
//! locks. Calling `set` before `prepare` is an error.
//!
//! When the effect was regenerated since the last resolution, `prepare`
//! resolves again against the new programs.

use std::sync::Arc;

use crate::backend::{DeviceContext, RenderDevice};
use crate::bind_name::BindName;
use crate::config::{EffectSystemConfig, RenderSettings};
use crate::constant_buffer::EffectConstantBuffer;
use crate::database::MaterialDatabase;
use crate::effect::Effect;
use crate::error::{EffectError, EffectResult};
use crate::material::Material;
use crate::parameters::{EvalContext, LocalBindings, ParamRef, ResolveContext, resolve_texture_path};
use crate::scene::Scene;
use crate::shared_buffer::SharedConstantBufferFactory;
use crate::texture::{TextureBinding, TextureSlot};
use crate::variability::VariabilitySeeds;

/// Collaborators borrowed for creating and preparing material effects.
pub struct MaterialContext<'a> {
    pub device: &'a mut dyn RenderDevice,
    pub scene: &'a dyn Scene,
    pub buffers: &'a mut SharedConstantBufferFactory,
    pub config: &'a EffectSystemConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Created,
    Prepared,
}

impl Phase {
    fn as_str(self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Prepared => "prepared",
        }
    }
}

#[derive(Debug)]
pub struct MaterialEffect {
    effect: Arc<Effect>,
    material: Arc<Material>,
    database: Arc<MaterialDatabase>,
    generation: u64,
    constant_buffers: Vec<EffectConstantBuffer>,
    textures: Vec<(TextureSlot, Arc<TextureBinding>)>,
    locals: LocalBindings,
    phase: Phase,
}

impl MaterialEffect {
    /// Resolve `material` against every slot the effect's programs reflect.
    ///
    /// Constant buffers with equal name and layout in several stages are
    /// merged into one. Any unresolved name fails the whole call.
    pub fn create(
        cx: &mut MaterialContext<'_>,
        effect: Arc<Effect>,
        material: Arc<Material>,
        database: Arc<MaterialDatabase>,
    ) -> EffectResult<Self> {
        let mut material_effect = Self {
            generation: effect.generation(),
            effect,
            material,
            database,
            constant_buffers: Vec::new(),
            textures: Vec::new(),
            locals: LocalBindings::new(),
            phase: Phase::Created,
        };
        material_effect.build(cx)?;
        log::debug!(
            "Created material effect `{}` / `{}` ({} constant buffers, {} textures)",
            material_effect.material.name(),
            material_effect.effect.name(),
            material_effect.constant_buffers.len(),
            material_effect.textures.len()
        );
        Ok(material_effect)
    }

    fn build(&mut self, cx: &mut MaterialContext<'_>) -> EffectResult<()> {
        self.release(cx.scene);
        let result = self.bind_slots(cx);
        if result.is_err() {
            self.release(cx.scene);
        }
        self.phase = Phase::Created;
        result
    }

    fn bind_slots(&mut self, cx: &mut MaterialContext<'_>) -> EffectResult<()> {
        let effect = self.effect.clone();
        let generation = effect.generation();
        let programs = effect.programs();

        for program in programs.iter() {
            for reflected in program.textures() {
                let slot = TextureSlot::parse(reflected.name.clone(), program.stage(), reflected.slot);
                let path =
                    resolve_texture_path(&self.material, &self.database, effect.descriptor(), &slot)
                        .map_err(|source| {
                            log::error!("Effect `{}`: {source}", effect.name());
                            EffectError::Texture {
                                effect: effect.name().to_owned(),
                                source,
                            }
                        })?;

                let binding = match cx.scene.try_unalias(&path) {
                    Some(surface) => {
                        cx.scene.lock_surface(surface);
                        TextureBinding::surface(path, slot.srgb, surface)
                    }
                    None => TextureBinding::file(path, slot.srgb),
                };
                self.textures.push((slot, Arc::new(binding)));
            }
        }

        for program in programs.iter() {
            for reflected in program.constant_buffers() {
                let shared =
                    cx.buffers
                        .get_or_create(&mut *cx.device, &reflected.name, &reflected.layout)?;
                match self
                    .constant_buffers
                    .iter_mut()
                    .find(|buffer| buffer.shares_with(&shared))
                {
                    Some(buffer) => buffer.add_binding(program.stage(), reflected.slot),
                    None => self.constant_buffers.push(EffectConstantBuffer::new(
                        shared,
                        program.stage(),
                        reflected.slot,
                    )),
                }
            }
        }

        let mut rcx = ResolveContext {
            material: &self.material,
            database: &self.database,
            descriptor: effect.descriptor(),
            locals: &mut self.locals,
            textures: &self.textures,
            options: &cx.config.resolution,
        };
        for buffer in &mut self.constant_buffers {
            buffer.prepare(&mut rcx).map_err(|source| {
                log::error!(
                    "Effect `{}`, constant buffer `{}`: {source}",
                    effect.name(),
                    buffer.name()
                );
                EffectError::Resolution {
                    effect: effect.name().to_owned(),
                    buffer: buffer.name().clone(),
                    source,
                }
            })?;
        }

        self.generation = generation;
        Ok(())
    }

    fn release(&mut self, scene: &dyn Scene) {
        for (_, binding) in self.textures.drain(..) {
            if let Some(surface) = binding.surface_id() {
                scene.unlock_surface(surface);
            }
        }
        self.constant_buffers.clear();
        self.locals.clear();
    }

    /// Refresh textures and evaluate every constant buffer for this frame.
    pub fn prepare(
        &mut self,
        cx: &mut MaterialContext<'_>,
        seeds: &VariabilitySeeds,
    ) -> EffectResult<()> {
        lilium_core::profile_scope!("MaterialEffect::prepare");

        if self.is_stale() {
            log::debug!(
                "Effect `{}` was regenerated, resolving `{}` again",
                self.effect.name(),
                self.material.name()
            );
            self.build(cx)?;
        }

        for (slot, binding) in &self.textures {
            let texture = match binding.surface_id() {
                Some(surface) => cx.scene.surface_texture(surface),
                None => Some(
                    cx.scene
                        .fetch_texture_2d_fallback(binding.path(), binding.is_srgb()),
                ),
            };
            match texture {
                Some(texture) => binding.set_texture(&texture),
                None => {
                    log::warn!(
                        "Texture `{}` ({}) has no backing surface",
                        slot.name,
                        binding.path()
                    );
                    binding.clear();
                }
            }
        }

        let ctx = EvalContext::new(seeds, cx.scene.frame());
        let debug_fill = cx.config.debug_fill_pattern;
        for buffer in &mut self.constant_buffers {
            buffer.eval(&ctx, debug_fill);
        }

        self.phase = Phase::Prepared;
        Ok(())
    }

    /// Bind programs, state, constant buffers and textures for a draw.
    ///
    /// Textures currently bound as render targets, and textures whose weak
    /// reference expired, are bound as `None`.
    pub fn set(&self, ctx: &mut dyn DeviceContext, settings: &RenderSettings) -> EffectResult<()> {
        if self.phase != Phase::Prepared {
            return Err(EffectError::Lifecycle {
                expected: Phase::Prepared.as_str(),
                found: self.phase.as_str(),
            });
        }
        if self.is_stale() {
            return Err(EffectError::Lifecycle {
                expected: Phase::Prepared.as_str(),
                found: "stale",
            });
        }

        self.effect.bind(ctx, settings);

        for buffer in &self.constant_buffers {
            buffer.set_data_if_needed(ctx);
            buffer.set(ctx);
        }

        for (slot, binding) in &self.textures {
            let handle = match binding.texture() {
                Some(texture) if ctx.is_render_target_bound(texture.handle()) => {
                    log::warn!(
                        "Texture `{}` is bound as a render target, unbinding it from slot {}",
                        slot.name,
                        slot.index
                    );
                    None
                }
                Some(texture) => Some(texture.handle()),
                None => {
                    log::warn!("Texture `{}` ({}) is no longer loaded", slot.name, binding.path());
                    None
                }
            };
            ctx.set_texture(slot.stage, slot.index, handle);
            ctx.set_sampler_state(slot.stage, slot.index, &slot.sampler);
        }

        Ok(())
    }

    /// Release surface locks and buffer references.
    pub fn destroy(mut self, scene: &dyn Scene) {
        self.release(scene);
    }

    fn is_stale(&self) -> bool {
        self.generation != self.effect.generation()
    }

    pub fn effect(&self) -> &Arc<Effect> {
        &self.effect
    }

    pub fn material(&self) -> &Arc<Material> {
        &self.material
    }

    pub fn constant_buffers(&self) -> &[EffectConstantBuffer] {
        &self.constant_buffers
    }

    pub fn find_constant_buffer(&self, name: &BindName) -> Option<&EffectConstantBuffer> {
        self.constant_buffers
            .iter()
            .find(|buffer| buffer.name() == name)
    }

    pub fn textures(&self) -> &[(TextureSlot, Arc<TextureBinding>)] {
        &self.textures
    }

    /// A parameter bound locally by resolution, such as a derived or defaulted one.
    pub fn local_parameter(&self, name: &BindName) -> Option<&ParamRef> {
        self.locals.get(name)
    }

    pub fn is_prepared(&self) -> bool {
        self.phase == Phase::Prepared && !self.is_stale()
    }
}
