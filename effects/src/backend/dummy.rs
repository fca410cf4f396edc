//! Dummy device, shader compiler and scene for testing and headless tools.
//!
//! None of these touch a GPU. The device records every call so tests can
//! assert on what a material effect bound and uploaded.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use lilium_core::sampler::SamplerState;
use parking_lot::Mutex;

use crate::bind_name::BindName;
use crate::effect::{
    BlendState, DepthStencilState, ProgramReflection, RasterizerState, ShaderStage,
};
use crate::error::BackendError;
use crate::scene::{FrameState, Scene};
use crate::texture::{SurfaceId, Texture};

use super::{
    BufferHandle, CompiledProgram, DeviceContext, ProgramHandle, ProgramRequest, RenderDevice,
    ShaderCompiler, TextureHandle,
};

/// One recorded device call.
#[derive(Debug, Clone, PartialEq)]
pub enum DeviceCommand {
    CreateProgram {
        stage: ShaderStage,
        program: ProgramHandle,
    },
    DestroyProgram(ProgramHandle),
    CreateConstantBuffer {
        name: BindName,
        size: u32,
        buffer: BufferHandle,
    },
    DestroyConstantBuffer(BufferHandle),
    SetProgram {
        stage: ShaderStage,
        program: Option<ProgramHandle>,
    },
    SetConstantBuffer {
        stage: ShaderStage,
        slot: u32,
        buffer: Option<BufferHandle>,
    },
    UpdateConstantBuffer {
        buffer: BufferHandle,
        data: Vec<u8>,
    },
    SetTexture {
        stage: ShaderStage,
        slot: u32,
        texture: Option<TextureHandle>,
    },
    SetSamplerState {
        stage: ShaderStage,
        slot: u32,
        sampler: SamplerState,
    },
    SetBlendState(Option<BlendState>),
    SetDepthStencilState(DepthStencilState),
    SetRasterizerState(RasterizerState),
}

/// Recording device and device context.
#[derive(Debug, Default)]
pub struct DummyDevice {
    next_handle: u64,
    commands: Vec<DeviceCommand>,
    programs: HashSet<ProgramHandle>,
    buffers: HashMap<BufferHandle, u32>,
    render_targets: HashSet<TextureHandle>,
}

impl DummyDevice {
    pub fn new() -> Self {
        Self::default()
    }

    fn allocate(&mut self) -> u64 {
        self.next_handle += 1;
        self.next_handle
    }

    pub fn commands(&self) -> &[DeviceCommand] {
        &self.commands
    }

    /// Drain the recorded commands.
    pub fn take_commands(&mut self) -> Vec<DeviceCommand> {
        std::mem::take(&mut self.commands)
    }

    pub fn live_program_count(&self) -> usize {
        self.programs.len()
    }

    pub fn live_buffer_count(&self) -> usize {
        self.buffers.len()
    }

    /// Number of recorded constant-buffer uploads.
    pub fn upload_count(&self) -> usize {
        self.commands
            .iter()
            .filter(|command| matches!(command, DeviceCommand::UpdateConstantBuffer { .. }))
            .count()
    }

    /// Bytes of the most recent upload to `buffer`.
    pub fn last_upload(&self, buffer: BufferHandle) -> Option<&[u8]> {
        self.commands.iter().rev().find_map(|command| match command {
            DeviceCommand::UpdateConstantBuffer { buffer: b, data } if *b == buffer => {
                Some(data.as_slice())
            }
            _ => None,
        })
    }

    /// The texture bound to `slot` of `stage` by the most recent bind.
    pub fn bound_texture(&self, stage: ShaderStage, slot: u32) -> Option<Option<TextureHandle>> {
        self.commands.iter().rev().find_map(|command| match command {
            DeviceCommand::SetTexture {
                stage: s,
                slot: i,
                texture,
            } if *s == stage && *i == slot => Some(*texture),
            _ => None,
        })
    }

    /// Simulate `texture` being bound as a render target.
    pub fn bind_render_target(&mut self, texture: TextureHandle) {
        self.render_targets.insert(texture);
    }

    pub fn unbind_render_targets(&mut self) {
        self.render_targets.clear();
    }
}

impl RenderDevice for DummyDevice {
    fn create_program(
        &mut self,
        stage: ShaderStage,
        bytecode: &[u8],
    ) -> Result<ProgramHandle, BackendError> {
        if bytecode.is_empty() {
            return Err(BackendError::ResourceCreationFailed(format!(
                "empty {stage:?} bytecode"
            )));
        }
        let program = ProgramHandle(self.allocate());
        log::trace!("DummyDevice: creating {stage:?} program {program:?}");
        self.programs.insert(program);
        self.commands
            .push(DeviceCommand::CreateProgram { stage, program });
        Ok(program)
    }

    fn destroy_program(&mut self, program: ProgramHandle) {
        let live = self.programs.remove(&program);
        debug_assert!(live, "DummyDevice: {program:?} destroyed twice");
        self.commands.push(DeviceCommand::DestroyProgram(program));
    }

    fn create_constant_buffer(
        &mut self,
        name: &BindName,
        size: u32,
    ) -> Result<BufferHandle, BackendError> {
        let buffer = BufferHandle(self.allocate());
        log::trace!("DummyDevice: creating constant buffer `{name}` ({size} bytes)");
        self.buffers.insert(buffer, size);
        self.commands.push(DeviceCommand::CreateConstantBuffer {
            name: name.clone(),
            size,
            buffer,
        });
        Ok(buffer)
    }

    fn destroy_constant_buffer(&mut self, buffer: BufferHandle) {
        let live = self.buffers.remove(&buffer).is_some();
        debug_assert!(live, "DummyDevice: {buffer:?} destroyed twice");
        self.commands
            .push(DeviceCommand::DestroyConstantBuffer(buffer));
    }
}

impl DeviceContext for DummyDevice {
    fn set_program(&mut self, stage: ShaderStage, program: Option<ProgramHandle>) {
        self.commands
            .push(DeviceCommand::SetProgram { stage, program });
    }

    fn set_constant_buffer(&mut self, stage: ShaderStage, slot: u32, buffer: Option<BufferHandle>) {
        self.commands.push(DeviceCommand::SetConstantBuffer {
            stage,
            slot,
            buffer,
        });
    }

    fn update_constant_buffer(&mut self, buffer: BufferHandle, data: &[u8]) {
        debug_assert_eq!(
            self.buffers.get(&buffer).copied(),
            Some(data.len() as u32),
            "DummyDevice: upload size mismatch for {buffer:?}"
        );
        self.commands.push(DeviceCommand::UpdateConstantBuffer {
            buffer,
            data: data.to_vec(),
        });
    }

    fn set_texture(&mut self, stage: ShaderStage, slot: u32, texture: Option<TextureHandle>) {
        self.commands.push(DeviceCommand::SetTexture {
            stage,
            slot,
            texture,
        });
    }

    fn set_sampler_state(&mut self, stage: ShaderStage, slot: u32, sampler: &SamplerState) {
        self.commands.push(DeviceCommand::SetSamplerState {
            stage,
            slot,
            sampler: *sampler,
        });
    }

    fn set_blend_state(&mut self, blend: Option<&BlendState>) {
        self.commands
            .push(DeviceCommand::SetBlendState(blend.copied()));
    }

    fn set_depth_stencil_state(&mut self, state: &DepthStencilState) {
        self.commands
            .push(DeviceCommand::SetDepthStencilState(*state));
    }

    fn set_rasterizer_state(&mut self, state: &RasterizerState) {
        self.commands
            .push(DeviceCommand::SetRasterizerState(*state));
    }

    fn is_render_target_bound(&self, texture: TextureHandle) -> bool {
        self.render_targets.contains(&texture)
    }
}

#[derive(Debug, Default)]
struct CompilerState {
    programs: HashMap<(String, String), ProgramReflection>,
    failing: HashSet<String>,
    requests: Vec<ProgramRequest>,
}

/// Shader compiler serving registered reflection data.
///
/// Clones share state, so a test can keep a handle after boxing one into an
/// [`EffectCompiler`](crate::effect::EffectCompiler) and break or fix files
/// between hot reloads.
#[derive(Debug, Clone, Default)]
pub struct DummyShaderCompiler {
    state: Arc<Mutex<CompilerState>>,
}

impl DummyShaderCompiler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `reflection` for `entry_point` in `file`.
    pub fn register(
        &self,
        file: impl Into<String>,
        entry_point: impl Into<String>,
        reflection: ProgramReflection,
    ) {
        self.state
            .lock()
            .programs
            .insert((file.into(), entry_point.into()), reflection);
    }

    /// Make every program in `file` fail to compile, or compile again.
    pub fn fail_file(&self, file: impl Into<String>, failing: bool) {
        let file = file.into();
        let mut state = self.state.lock();
        if failing {
            state.failing.insert(file);
        } else {
            state.failing.remove(&file);
        }
    }

    /// Every request seen so far.
    pub fn requests(&self) -> Vec<ProgramRequest> {
        self.state.lock().requests.clone()
    }

    pub fn compile_count(&self) -> usize {
        self.state.lock().requests.len()
    }
}

impl ShaderCompiler for DummyShaderCompiler {
    fn compile_program(&self, request: &ProgramRequest) -> Result<CompiledProgram, BackendError> {
        let mut state = self.state.lock();
        state.requests.push(request.clone());

        if state.failing.contains(&request.file) {
            return Err(BackendError::ShaderCompilationFailed {
                file: request.file.clone(),
                message: "syntax error".into(),
            });
        }

        let key = (request.file.clone(), request.entry_point.clone());
        let reflection = state.programs.get(&key).cloned().ok_or_else(|| {
            BackendError::ShaderCompilationFailed {
                file: request.file.clone(),
                message: format!("entry point `{}` not found", request.entry_point),
            }
        })?;

        let defines: Vec<String> = request
            .defines
            .iter()
            .map(|(name, value)| format!("{name}={value}"))
            .collect();
        let bytecode = format!("{}:{}:{}", request.file, request.entry_point, defines.join(","))
            .into_bytes();
        Ok(CompiledProgram {
            bytecode,
            reflection,
        })
    }
}

#[derive(Debug)]
struct DummySurface {
    texture: Arc<Texture>,
    locks: u32,
}

#[derive(Debug, Default)]
struct SceneTextures {
    next_handle: u64,
    files: HashMap<String, Arc<Texture>>,
}

impl SceneTextures {
    fn create(&mut self, path: &str, width: u32, height: u32, srgb: bool) -> Arc<Texture> {
        self.next_handle += 1;
        Arc::new(Texture::new(
            path,
            width,
            height,
            srgb,
            TextureHandle(self.next_handle),
        ))
    }
}

/// Texture cache and render-surface manager backed by hash maps.
///
/// The scene owns every texture it hands out, so bindings holding weak
/// references stay valid until [`clear_texture_cache`](Self::clear_texture_cache).
#[derive(Debug, Default)]
pub struct DummyScene {
    frame: FrameState,
    textures: Mutex<SceneTextures>,
    aliases: HashMap<String, SurfaceId>,
    surfaces: Mutex<HashMap<SurfaceId, DummySurface>>,
}

impl DummyScene {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn frame_mut(&mut self) -> &mut FrameState {
        &mut self.frame
    }

    /// Preload a texture file.
    pub fn add_texture(&mut self, path: &str, width: u32, height: u32) -> Arc<Texture> {
        let textures = self.textures.get_mut();
        let texture = textures.create(path, width, height, false);
        textures.files.insert(path.to_owned(), texture.clone());
        texture
    }

    /// Register a render surface reachable under `path`.
    pub fn add_surface(&mut self, path: &str, width: u32, height: u32) -> SurfaceId {
        let texture = self.textures.get_mut().create(path, width, height, false);
        let surfaces = self.surfaces.get_mut();
        let id = SurfaceId(surfaces.len() as u32 + 1);
        surfaces.insert(id, DummySurface { texture, locks: 0 });
        self.aliases.insert(path.to_owned(), id);
        id
    }

    /// Outstanding locks on `surface`.
    pub fn lock_count(&self, surface: SurfaceId) -> u32 {
        self.surfaces
            .lock()
            .get(&surface)
            .map_or(0, |surface| surface.locks)
    }

    /// Drop every cached file texture.
    pub fn clear_texture_cache(&self) {
        self.textures.lock().files.clear();
    }
}

impl Scene for DummyScene {
    fn frame(&self) -> &FrameState {
        &self.frame
    }

    fn fetch_texture_2d_fallback(&self, path: &str, srgb: bool) -> Arc<Texture> {
        let mut textures = self.textures.lock();
        if let Some(texture) = textures.files.get(path) {
            return texture.clone();
        }
        log::trace!("DummyScene: `{path}` not found, using a 1x1 fallback");
        let texture = textures.create(path, 1, 1, srgb);
        textures.files.insert(path.to_owned(), texture.clone());
        texture
    }

    fn try_unalias(&self, path: &str) -> Option<SurfaceId> {
        self.aliases.get(path).copied()
    }

    fn lock_surface(&self, surface: SurfaceId) {
        if let Some(surface) = self.surfaces.lock().get_mut(&surface) {
            surface.locks += 1;
        }
    }

    fn surface_texture(&self, surface: SurfaceId) -> Option<Arc<Texture>> {
        self.surfaces
            .lock()
            .get(&surface)
            .map(|surface| surface.texture.clone())
    }

    fn unlock_surface(&self, surface: SurfaceId) {
        if let Some(surface) = self.surfaces.lock().get_mut(&surface) {
            debug_assert!(surface.locks > 0, "DummyScene: unbalanced surface unlock");
            surface.locks = surface.locks.saturating_sub(1);
        }
    }
}
