//! Shared setup for the integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use lilium_core::math::Vec4;
use lilium_effects::backend::dummy::{DummyDevice, DummyScene, DummyShaderCompiler};
use lilium_effects::{
    ConstantBufferLayout, ConstantFieldType, EffectCompiler, EffectDescriptor, EffectResult,
    EffectSystemConfig, Material, MaterialDatabase, MaterialEffect, ProgramReflection,
    ShaderStage, VariabilitySeeds, VertexDeclaration,
};

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub fn per_frame_layout() -> ConstantBufferLayout {
    ConstantBufferLayout::packed([
        ("uniTime", ConstantFieldType::Float),
        ("uniDuDv_uniAlbedo", ConstantFieldType::Float2),
    ])
    .unwrap()
}

pub fn per_draw_layout() -> ConstantBufferLayout {
    ConstantBufferLayout::packed([("uniViewProjectionMatrix", ConstantFieldType::Float4x4)]).unwrap()
}

pub fn per_material_layout() -> ConstantBufferLayout {
    ConstantBufferLayout::packed([
        ("uniRcp_uniColor", ConstantFieldType::Float4),
        ("uniOptional_uniMissingFloat3", ConstantFieldType::Float3),
    ])
    .unwrap()
}

/// Register `unlit.hlsl` (vs + ps) and `shadow.hlsl` (ps) with `shaders`.
pub fn register_shaders(shaders: &DummyShaderCompiler) {
    shaders.register(
        "unlit.hlsl",
        "vs",
        ProgramReflection::default()
            .with_constant_buffer("PerFrame", 0, per_frame_layout())
            .with_constant_buffer("PerDraw", 1, per_draw_layout()),
    );
    shaders.register(
        "unlit.hlsl",
        "ps",
        ProgramReflection::default()
            .with_constant_buffer("PerFrame", 0, per_frame_layout())
            .with_constant_buffer("PerMaterial", 2, per_material_layout())
            .with_texture("uniLinearClamp_uniSRGB_uniAlbedo", 0),
    );
    shaders.register(
        "shadow.hlsl",
        "ps",
        ProgramReflection::default().with_texture("uniPointClamp_uniShadowMap", 3),
    );
}

pub fn unlit_descriptor() -> Arc<EffectDescriptor> {
    Arc::new(
        EffectDescriptor::new("unlit")
            .with_program(ShaderStage::Vertex, "unlit.hlsl", "vs")
            .with_program(ShaderStage::Fragment, "unlit.hlsl", "ps")
            .with_vertex_declaration("PosUv")
            .with_substitution_tag("FOG"),
    )
}

pub fn shadow_descriptor() -> Arc<EffectDescriptor> {
    Arc::new(EffectDescriptor::new("receiver").with_program(
        ShaderStage::Fragment,
        "shadow.hlsl",
        "ps",
    ))
}

pub fn red_material() -> Arc<Material> {
    Arc::new(
        Material::new("red")
            .with_value("uniColor", Vec4::new(1.0, 0.0, 0.0, 1.0))
            .with_texture("uniAlbedo", "albedo.png"),
    )
}

/// Device, scene, compiler and database wired together over the dummy backend.
pub struct Harness {
    pub device: DummyDevice,
    pub scene: DummyScene,
    pub shaders: DummyShaderCompiler,
    pub compiler: EffectCompiler,
    pub database: Arc<MaterialDatabase>,
    pub vertex_declaration: Arc<VertexDeclaration>,
    pub seeds: VariabilitySeeds,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_config(EffectSystemConfig::default())
    }

    pub fn with_config(config: EffectSystemConfig) -> Self {
        init_logging();
        let shaders = DummyShaderCompiler::new();
        register_shaders(&shaders);

        let mut scene = DummyScene::new();
        scene.add_texture("albedo.png", 256, 128);

        Self {
            device: DummyDevice::new(),
            scene,
            compiler: EffectCompiler::new(Box::new(shaders.clone()), config),
            shaders,
            database: Arc::new(MaterialDatabase::with_builtins()),
            vertex_declaration: Arc::new(VertexDeclaration::new("PosUv")),
            seeds: VariabilitySeeds::new(),
        }
    }

    pub fn create(
        &mut self,
        descriptor: &Arc<EffectDescriptor>,
        material: &Arc<Material>,
    ) -> EffectResult<MaterialEffect> {
        self.compiler.create_material_effect(
            &mut self.device,
            &self.scene,
            descriptor,
            &self.vertex_declaration,
            material,
            &self.database,
        )
    }

    pub fn prepare(&mut self, material_effect: &mut MaterialEffect) -> EffectResult<()> {
        self.compiler
            .prepare(material_effect, &mut self.device, &self.scene, &self.seeds)
    }

    pub fn set(&mut self, material_effect: &MaterialEffect) -> EffectResult<()> {
        let settings = *self.compiler.render_settings();
        material_effect.set(&mut self.device, &settings)
    }
}

/// Decode native-endian `f32`s.
pub fn floats(bytes: &[u8]) -> Vec<f32> {
    bytes
        .chunks_exact(4)
        .map(|chunk| f32::from_ne_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect()
}
