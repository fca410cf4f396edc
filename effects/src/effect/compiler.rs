//! The effect cache.

use std::collections::HashMap;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use lilium_core::thread::ThreadAffinity;
use xxhash_rust::xxh3::Xxh3;

use crate::backend::{RenderDevice, ShaderCompiler};
use crate::config::{EffectSystemConfig, RenderSettings};
use crate::database::MaterialDatabase;
use crate::error::{EffectError, EffectResult};
use crate::material::Material;
use crate::material_effect::{MaterialContext, MaterialEffect};
use crate::scene::Scene;
use crate::shared_buffer::SharedConstantBufferFactory;
use crate::variability::VariabilitySeeds;

use super::descriptor::{EffectDescriptor, VertexDeclaration};
use super::effect::{Effect, EffectTags};

/// Cache key of an effect permutation.
///
/// Descriptor and vertex declaration are identified by `Arc` address, so equal
/// contents behind two different `Arc`s make two keys. The cached effect holds
/// both `Arc`s, so an address cannot be reused while its entry lives.
#[derive(Debug, Clone)]
pub struct EffectKey {
    descriptor: usize,
    vertex_declaration: usize,
    tags: EffectTags,
    hash: u64,
}

impl EffectKey {
    pub fn new(
        descriptor: &Arc<EffectDescriptor>,
        vertex_declaration: &Arc<VertexDeclaration>,
        tags: &EffectTags,
    ) -> Self {
        let descriptor = Arc::as_ptr(descriptor) as usize;
        let vertex_declaration = Arc::as_ptr(vertex_declaration) as usize;

        let mut hasher = Xxh3::new();
        hasher.update(&(descriptor as u64).to_le_bytes());
        hasher.update(&(vertex_declaration as u64).to_le_bytes());
        for tag in tags.as_slice() {
            hasher.update(&tag.hash_value().to_le_bytes());
        }

        Self {
            descriptor,
            vertex_declaration,
            tags: tags.clone(),
            hash: hasher.digest(),
        }
    }

    pub fn hash_value(&self) -> u64 {
        self.hash
    }
}

impl PartialEq for EffectKey {
    fn eq(&self, other: &Self) -> bool {
        // Tags last, they are the only non-trivial comparison.
        self.hash == other.hash
            && self.descriptor == other.descriptor
            && self.vertex_declaration == other.vertex_declaration
            && self.tags == other.tags
    }
}

impl Eq for EffectKey {}

impl Hash for EffectKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u64(self.hash);
    }
}

/// Creates, caches and hot-reloads effects.
///
/// The compiler also owns the shared constant-buffer factory and the render
/// settings every effect binds with. It must stay on the thread that created it.
pub struct EffectCompiler {
    shader_compiler: Box<dyn ShaderCompiler>,
    effects: HashMap<EffectKey, Arc<Effect>>,
    buffers: SharedConstantBufferFactory,
    config: EffectSystemConfig,
    affinity: ThreadAffinity,
}

impl EffectCompiler {
    pub fn new(shader_compiler: Box<dyn ShaderCompiler>, config: EffectSystemConfig) -> Self {
        Self {
            shader_compiler,
            effects: HashMap::new(),
            buffers: SharedConstantBufferFactory::new(),
            config,
            affinity: ThreadAffinity::current(),
        }
    }

    /// Return the cached permutation or compile it.
    pub fn get_or_create_effect(
        &mut self,
        device: &mut dyn RenderDevice,
        descriptor: &Arc<EffectDescriptor>,
        vertex_declaration: &Arc<VertexDeclaration>,
        tags: &EffectTags,
    ) -> EffectResult<Arc<Effect>> {
        self.affinity.check("EffectCompiler");
        let key = EffectKey::new(descriptor, vertex_declaration, tags);
        if let Some(effect) = self.effects.get(&key) {
            log::trace!("Effect cache hit for `{}`", descriptor.name);
            return Ok(effect.clone());
        }

        lilium_core::profile_scope!("EffectCompiler::compile");
        let effect = Arc::new(Effect::create(
            device,
            self.shader_compiler.as_ref(),
            descriptor.clone(),
            vertex_declaration.clone(),
            tags.clone(),
        )?);
        self.effects.insert(key, effect.clone());
        Ok(effect)
    }

    /// Pick the permutation `material` selects and bind the material to it.
    pub fn create_material_effect(
        &mut self,
        device: &mut dyn RenderDevice,
        scene: &dyn Scene,
        descriptor: &Arc<EffectDescriptor>,
        vertex_declaration: &Arc<VertexDeclaration>,
        material: &Arc<Material>,
        database: &Arc<MaterialDatabase>,
    ) -> EffectResult<MaterialEffect> {
        let tags = EffectTags::active_for(descriptor, material)?;
        let effect = self.get_or_create_effect(device, descriptor, vertex_declaration, &tags)?;
        let mut cx = self.material_context(device, scene);
        MaterialEffect::create(&mut cx, effect, material.clone(), database.clone())
    }

    /// Refresh textures and evaluate constant buffers of `material_effect`.
    pub fn prepare(
        &mut self,
        material_effect: &mut MaterialEffect,
        device: &mut dyn RenderDevice,
        scene: &dyn Scene,
        seeds: &VariabilitySeeds,
    ) -> EffectResult<()> {
        let mut cx = self.material_context(device, scene);
        material_effect.prepare(&mut cx, seeds)
    }

    /// Borrow what material effects need to create and prepare themselves.
    pub fn material_context<'a>(
        &'a mut self,
        device: &'a mut dyn RenderDevice,
        scene: &'a dyn Scene,
    ) -> MaterialContext<'a> {
        self.affinity.check("EffectCompiler");
        MaterialContext {
            device,
            scene,
            buffers: &mut self.buffers,
            config: &self.config,
        }
    }

    /// Recompile every cached effect, then invalidate every variability tier.
    ///
    /// Effects that fail to compile keep their previous programs. The first
    /// failure is returned after all effects were attempted.
    pub fn regenerate_effects(
        &mut self,
        device: &mut dyn RenderDevice,
        seeds: &mut VariabilitySeeds,
    ) -> EffectResult<usize> {
        self.affinity.check("EffectCompiler");
        lilium_core::profile_scope!("EffectCompiler::regenerate_effects");

        let mut first_error = None;
        let mut regenerated = 0;
        for effect in self.effects.values() {
            match effect.regenerate(device, self.shader_compiler.as_ref()) {
                Ok(()) => regenerated += 1,
                Err(err) => {
                    log::error!("Failed to regenerate effect `{}`: {err}", effect.name());
                    first_error.get_or_insert(err);
                }
            }
        }
        seeds.advance_all();
        log::info!(
            "Regenerated {regenerated} of {} effects",
            self.effects.len()
        );

        match first_error {
            Some(err) => Err(err),
            None => Ok(regenerated),
        }
    }

    /// Destroy effects referenced only by the cache. Returns how many went away.
    pub fn destroy_unused(&mut self, device: &mut dyn RenderDevice) -> usize {
        self.affinity.check("EffectCompiler");
        let before = self.effects.len();
        self.effects.retain(|_, effect| {
            let unused = Arc::strong_count(effect) == 1;
            if unused {
                effect.destroy(device);
            }
            !unused
        });
        self.buffers.collect_garbage(device);
        before - self.effects.len()
    }

    /// Destroy every effect. Fails if any is still referenced elsewhere.
    pub fn clear(&mut self, device: &mut dyn RenderDevice) -> EffectResult<()> {
        self.affinity.check("EffectCompiler");
        let in_use = self
            .effects
            .values()
            .filter(|effect| Arc::strong_count(effect) > 1)
            .count();
        if in_use > 0 {
            return Err(EffectError::EffectsStillInUse { count: in_use });
        }

        for (_, effect) in self.effects.drain() {
            effect.destroy(device);
        }
        self.buffers.collect_garbage(device);
        Ok(())
    }

    /// Tear down the cache and release remaining device buffers.
    pub fn shutdown(mut self, device: &mut dyn RenderDevice) -> EffectResult<()> {
        self.clear(device)?;
        debug_assert_eq!(
            self.buffers.live_count(),
            0,
            "shared constant buffers outlive the effect compiler"
        );
        Ok(())
    }

    pub fn effect_count(&self) -> usize {
        self.effects.len()
    }

    pub fn config(&self) -> &EffectSystemConfig {
        &self.config
    }

    pub fn render_settings(&self) -> &RenderSettings {
        &self.config.render
    }

    pub fn set_render_settings(&mut self, settings: RenderSettings) {
        self.config.render = settings;
    }

    pub fn buffers(&self) -> &SharedConstantBufferFactory {
        &self.buffers
    }
}
