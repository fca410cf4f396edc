//! Name resolution for constant-buffer fields.
//!
//! A field name is looked up in order:
//!
//! 1. the material's own parameters,
//! 2. parameters already bound locally by this material effect,
//! 3. the material database chain (builtins live here),
//! 4. default values declared by the effect descriptor,
//! 5. derivation through a [`Modifier`] prefix, recursing on the inner name.
//!
//! Defaults and derived parameters are bound back into the local table under
//! the full name, so the next field with the same name in any buffer of the
//! same material effect shares the parameter and its memo.

use std::collections::HashMap;
use std::sync::Arc;

use crate::bind_name::BindName;
use crate::config::ResolutionOptions;
use crate::constant::ConstantFieldType;
use crate::database::MaterialDatabase;
use crate::effect::EffectDescriptor;
use crate::error::ResolutionError;
use crate::material::Material;
use crate::texture::{TextureBinding, TextureSlot};

use super::{ConstantParameter, Modifier, ModifierParameter, ParamRef, TextureDimensionsParameter};

/// Parameters bound by one material effect during resolution.
pub type LocalBindings = HashMap<BindName, ParamRef>;

/// Scopes consulted while resolving names for one material effect.
pub struct ResolveContext<'a> {
    pub material: &'a Material,
    pub database: &'a MaterialDatabase,
    pub descriptor: &'a EffectDescriptor,
    pub locals: &'a mut LocalBindings,
    /// Texture slots already bound, searched by the `DuDv` modifiers.
    pub textures: &'a [(TextureSlot, Arc<TextureBinding>)],
    pub options: &'a ResolutionOptions,
}

/// Resolve `name` to a parameter producing `field_type`.
pub fn resolve(
    cx: &mut ResolveContext<'_>,
    name: &BindName,
    field_type: ConstantFieldType,
) -> Result<ParamRef, ResolutionError> {
    if let Some(param) = lookup(cx, name) {
        return check_type(name, param, field_type);
    }

    if let Some(value) = cx.descriptor.default_parameter(name) {
        let param: ParamRef = Arc::new(ConstantParameter::new(*value));
        let param = check_type(name, param, field_type)?;
        cx.locals.insert(name.clone(), param.clone());
        return Ok(param);
    }

    let Some((modifier, inner)) = Modifier::parse(name) else {
        return Err(ResolutionError::Missing { name: name.clone() });
    };

    let param = derive(cx, name, modifier, &inner, field_type)?;
    log::trace!("Derived `{name}` through {modifier:?}");
    cx.locals.insert(name.clone(), param.clone());
    Ok(param)
}

fn lookup(cx: &ResolveContext<'_>, name: &BindName) -> Option<ParamRef> {
    cx.material
        .parameter(name)
        .or_else(|| cx.locals.get(name).cloned())
        .or_else(|| cx.database.find_parameter(name))
}

fn check_type(
    name: &BindName,
    param: ParamRef,
    expected: ConstantFieldType,
) -> Result<ParamRef, ResolutionError> {
    let found = param.field_type();
    if found == expected {
        Ok(param)
    } else {
        Err(ResolutionError::FieldTypeMismatch {
            name: name.clone(),
            expected,
            found,
        })
    }
}

fn derive(
    cx: &mut ResolveContext<'_>,
    name: &BindName,
    modifier: Modifier,
    inner: &BindName,
    field_type: ConstantFieldType,
) -> Result<ParamRef, ResolutionError> {
    if !modifier.supports(field_type) {
        return Err(ResolutionError::UnsupportedModifier {
            name: name.clone(),
            modifier,
            field_type,
        });
    }

    if let Some(kind) = modifier.texture_dimensions() {
        let binding = cx
            .textures
            .iter()
            .find(|(slot, _)| slot.answers_to(inner))
            .map(|(_, binding)| binding.clone())
            .ok_or_else(|| ResolutionError::MissingTexture {
                name: inner.clone(),
            })?;
        return Ok(Arc::new(TextureDimensionsParameter::new(kind, binding)));
    }

    if modifier == Modifier::Optional {
        return match resolve(cx, inner, field_type) {
            Ok(param) => Ok(param),
            Err(err) if err.is_missing() && cx.options.allow_optional_fallback => {
                if cx.options.warn_on_optional_fallback {
                    log::warn!("`{name}`: {err}, using a default {field_type}");
                }
                Ok(Arc::new(ConstantParameter::default_for(field_type)))
            }
            Err(err) => Err(err),
        };
    }

    let source = resolve(cx, inner, field_type)?;
    Ok(Arc::new(ModifierParameter::new(modifier, source)))
}

/// Find the file path bound to a texture slot.
///
/// Material textures win over the database chain, which wins over descriptor
/// defaults. Each scope is searched by the base name, then by the full name.
pub fn resolve_texture_path(
    material: &Material,
    database: &MaterialDatabase,
    descriptor: &EffectDescriptor,
    slot: &TextureSlot,
) -> Result<String, ResolutionError> {
    let names = [&slot.base_name, &slot.name];
    names
        .iter()
        .find_map(|name| material.texture(name))
        .or_else(|| names.iter().find_map(|name| database.find_texture(name)))
        .or_else(|| names.iter().find_map(|name| descriptor.default_texture(name)))
        .map(str::to_owned)
        .ok_or_else(|| ResolutionError::MissingTexture {
            name: slot.base_name.clone(),
        })
}
