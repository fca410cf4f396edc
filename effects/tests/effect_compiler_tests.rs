//! Effect cache identity, hot reload and teardown.

mod common;

use std::sync::Arc;

use common::{Harness, red_material, unlit_descriptor};
use lilium_effects::{
    BackendError, BindName, EffectDescriptor, EffectError, EffectTags, Material,
    MaterialVariability, ShaderStage, VertexDeclaration,
};
use rstest::{fixture, rstest};

#[fixture]
fn harness() -> Harness {
    Harness::new()
}

#[rstest]
fn same_key_returns_same_effect(mut harness: Harness) {
    let descriptor = unlit_descriptor();
    let vdecl = harness.vertex_declaration.clone();
    let tags = EffectTags::none();

    let a = harness
        .compiler
        .get_or_create_effect(&mut harness.device, &descriptor, &vdecl, &tags)
        .unwrap();
    let b = harness
        .compiler
        .get_or_create_effect(&mut harness.device, &descriptor, &vdecl, &tags)
        .unwrap();
    assert!(Arc::ptr_eq(&a, &b));
    assert_eq!(harness.compiler.effect_count(), 1);
    assert_eq!(harness.shaders.compile_count(), 2);
}

#[rstest]
#[case::other_descriptor(true, false, false)]
#[case::other_vertex_declaration(false, true, false)]
#[case::other_tags(false, false, true)]
fn any_key_difference_compiles_again(
    mut harness: Harness,
    #[case] other_descriptor: bool,
    #[case] other_vdecl: bool,
    #[case] other_tags: bool,
) {
    let descriptor = Arc::new((*unlit_descriptor()).clone().with_vertex_declaration("PosUvColor"));
    let vdecl = harness.vertex_declaration.clone();
    let tags = EffectTags::none();
    let first = harness
        .compiler
        .get_or_create_effect(&mut harness.device, &descriptor, &vdecl, &tags)
        .unwrap();

    let descriptor = if other_descriptor {
        Arc::new(EffectDescriptor {
            name: "unlit_opaque".into(),
            ..(*descriptor).clone()
        })
    } else {
        descriptor
    };
    let vdecl = if other_vdecl {
        Arc::new(VertexDeclaration::new("PosUvColor"))
    } else {
        vdecl
    };
    let tags = if other_tags {
        EffectTags::from_tags("unlit", [BindName::new("FOG")]).unwrap()
    } else {
        tags
    };
    let second = harness
        .compiler
        .get_or_create_effect(&mut harness.device, &descriptor, &vdecl, &tags)
        .unwrap();

    assert!(!Arc::ptr_eq(&first, &second));
    assert_eq!(harness.compiler.effect_count(), 2);
}

#[rstest]
fn material_tags_become_defines(mut harness: Harness) {
    let descriptor = Arc::new((*unlit_descriptor()).clone().with_define("MAX_LIGHTS", "4"));
    let foggy = Arc::new(
        Material::new("foggy")
            .with_value("uniColor", lilium_core::math::Vec4::zeros())
            .with_texture("uniAlbedo", "albedo.png")
            .with_tag("FOG"),
    );
    let material_effect = harness.create(&descriptor, &foggy).unwrap();

    assert_eq!(material_effect.effect().tags().as_slice(), &[BindName::new("FOG")]);
    let expected = [
        ("MAX_LIGHTS".to_owned(), "4".to_owned()),
        ("FOG".to_owned(), "1".to_owned()),
    ];
    let requests = harness.shaders.requests();
    assert_eq!(requests.len(), 2);
    assert!(
        requests
            .iter()
            .all(|request| request.defines == expected && request.vertex_declaration == "PosUv")
    );
}

#[rstest]
fn undeclared_vertex_declaration_is_rejected(mut harness: Harness) {
    let descriptor = unlit_descriptor();
    let skinned = Arc::new(VertexDeclaration::new("Skinned"));
    let err = harness
        .compiler
        .get_or_create_effect(&mut harness.device, &descriptor, &skinned, &EffectTags::none())
        .unwrap_err();
    assert_eq!(
        err,
        EffectError::UnsupportedVertexDeclaration {
            effect: "unlit".into(),
            declaration: "Skinned".into(),
        }
    );
    assert_eq!(harness.compiler.effect_count(), 0);
}

#[rstest]
fn compile_failure_leaks_nothing(mut harness: Harness) {
    let broken = Arc::new(
        EffectDescriptor::new("broken")
            .with_program(ShaderStage::Vertex, "unlit.hlsl", "vs")
            .with_program(ShaderStage::Fragment, "unlit.hlsl", "missing_ps"),
    );
    let vdecl = harness.vertex_declaration.clone();
    let err = harness
        .compiler
        .get_or_create_effect(&mut harness.device, &broken, &vdecl, &EffectTags::none())
        .unwrap_err();
    assert!(matches!(
        err,
        EffectError::Backend(BackendError::ShaderCompilationFailed { .. })
    ));
    assert_eq!(harness.device.live_program_count(), 0);
}

#[rstest]
fn regeneration_forces_new_resolution(mut harness: Harness) {
    let descriptor = unlit_descriptor();
    let mut material_effect = harness.create(&descriptor, &red_material()).unwrap();
    harness.prepare(&mut material_effect).unwrap();
    harness.set(&material_effect).unwrap();

    let seed_before = harness.seeds.get(MaterialVariability::Once);
    let regenerated = harness
        .compiler
        .regenerate_effects(&mut harness.device, &mut harness.seeds)
        .unwrap();
    assert_eq!(regenerated, 1);
    assert_ne!(harness.seeds.get(MaterialVariability::Once), seed_before);
    assert_eq!(material_effect.effect().generation(), 1);
    assert_eq!(harness.device.live_program_count(), 2);

    assert!(!material_effect.is_prepared());
    assert!(matches!(
        harness.set(&material_effect),
        Err(EffectError::Lifecycle { found: "stale", .. })
    ));

    harness.prepare(&mut material_effect).unwrap();
    assert!(material_effect.is_prepared());
    harness.set(&material_effect).unwrap();
}

#[rstest]
fn failed_regeneration_keeps_old_programs(mut harness: Harness) {
    let descriptor = unlit_descriptor();
    let mut material_effect = harness.create(&descriptor, &red_material()).unwrap();
    harness.prepare(&mut material_effect).unwrap();

    harness.shaders.fail_file("unlit.hlsl", true);
    let err = harness
        .compiler
        .regenerate_effects(&mut harness.device, &mut harness.seeds)
        .unwrap_err();
    assert!(matches!(err, EffectError::Backend(_)));
    assert_eq!(material_effect.effect().generation(), 0);
    assert_eq!(harness.device.live_program_count(), 2);
    harness.set(&material_effect).unwrap();

    harness.shaders.fail_file("unlit.hlsl", false);
    harness
        .compiler
        .regenerate_effects(&mut harness.device, &mut harness.seeds)
        .unwrap();
    assert_eq!(material_effect.effect().generation(), 1);
}

#[rstest]
fn clear_refuses_while_effects_are_used(mut harness: Harness) {
    let descriptor = unlit_descriptor();
    let vdecl = harness.vertex_declaration.clone();
    let effect = harness
        .compiler
        .get_or_create_effect(&mut harness.device, &descriptor, &vdecl, &EffectTags::none())
        .unwrap();

    assert_eq!(
        harness.compiler.clear(&mut harness.device),
        Err(EffectError::EffectsStillInUse { count: 1 })
    );
    assert_eq!(harness.compiler.effect_count(), 1);

    drop(effect);
    harness.compiler.clear(&mut harness.device).unwrap();
    assert_eq!(harness.compiler.effect_count(), 0);
    assert_eq!(harness.device.live_program_count(), 0);
}

#[test]
fn shutdown_releases_everything() {
    let mut harness = Harness::new();
    let descriptor = unlit_descriptor();
    let material_effect = harness.create(&descriptor, &red_material()).unwrap();
    material_effect.destroy(&harness.scene);

    let Harness {
        mut device,
        compiler,
        ..
    } = harness;
    compiler.shutdown(&mut device).unwrap();
    assert_eq!(device.live_program_count(), 0);
    assert_eq!(device.live_buffer_count(), 0);
}
