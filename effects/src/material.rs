//! Materials: per-object parameter and texture bindings.

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::bind_name::BindName;
use crate::error::{EffectError, EffectResult};
use crate::parameters::{ConstantParameter, ParamRef, ParameterValue};

/// Named parameters, texture paths and permutation tags of one material.
///
/// Materials are consulted first during resolution, so a material value
/// shadows any database or builtin parameter of the same name.
#[derive(Debug, Clone, Default)]
pub struct Material {
    name: String,
    parameters: HashMap<BindName, ParamRef>,
    textures: HashMap<BindName, String>,
    tags: Vec<BindName>,
}

impl Material {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Bind a shared parameter.
    pub fn with_parameter(mut self, name: impl Into<BindName>, parameter: ParamRef) -> Self {
        self.set_parameter(name, parameter);
        self
    }

    /// Bind a constant value.
    pub fn with_value(self, name: impl Into<BindName>, value: impl Into<ParameterValue>) -> Self {
        self.with_parameter(name, Arc::new(ConstantParameter::new(value)))
    }

    pub fn with_texture(mut self, name: impl Into<BindName>, path: impl Into<String>) -> Self {
        self.set_texture(name, path);
        self
    }

    /// Enable a permutation tag such as `SKINNED`.
    pub fn with_tag(mut self, tag: impl Into<BindName>) -> Self {
        let tag = tag.into();
        if !self.tags.contains(&tag) {
            self.tags.push(tag);
        }
        self
    }

    /// Bind a parameter, returning the one it replaces.
    ///
    /// Material effects already created keep the parameter they resolved.
    pub fn set_parameter(&mut self, name: impl Into<BindName>, parameter: ParamRef) -> Option<ParamRef> {
        self.parameters.insert(name.into(), parameter)
    }

    pub fn set_texture(&mut self, name: impl Into<BindName>, path: impl Into<String>) -> Option<String> {
        self.textures.insert(name.into(), path.into())
    }

    pub fn parameter(&self, name: &BindName) -> Option<ParamRef> {
        self.parameters.get(name).cloned()
    }

    pub fn texture(&self, name: &BindName) -> Option<&str> {
        self.textures.get(name).map(String::as_str)
    }

    pub fn has_tag(&self, tag: &BindName) -> bool {
        self.tags.contains(tag)
    }

    pub fn tags(&self) -> &[BindName] {
        &self.tags
    }

    pub fn parameter_count(&self) -> usize {
        self.parameters.len()
    }

    /// Parse a material authored as RON.
    ///
    /// ```ron
    /// (
    ///     name: "red_plastic",
    ///     values: { "uniGloss": Float(0.8), "uniLayers": UInt(2) },
    ///     textures: { "uniAlbedo": "textures/plastic.png" },
    ///     tags: ["ALPHA_TEST"],
    /// )
    /// ```
    pub fn from_ron(source: &str) -> EffectResult<Self> {
        let definition: MaterialDefinition =
            ron::from_str(source).map_err(|e| EffectError::Config(e.to_string()))?;
        Ok(definition.into())
    }
}

/// Serialized form of a [`Material`]. Every value becomes a constant.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MaterialDefinition {
    pub name: String,
    #[serde(default)]
    pub values: HashMap<BindName, ParameterValue>,
    #[serde(default)]
    pub textures: HashMap<BindName, String>,
    #[serde(default)]
    pub tags: Vec<BindName>,
}

impl From<MaterialDefinition> for Material {
    fn from(definition: MaterialDefinition) -> Self {
        let material = definition
            .values
            .into_iter()
            .fold(Material::new(definition.name), |material, (name, value)| {
                material.with_value(name, value)
            });
        let material = definition
            .textures
            .into_iter()
            .fold(material, |material, (name, path)| material.with_texture(name, path));
        definition
            .tags
            .into_iter()
            .fold(material, |material, tag| material.with_tag(tag))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lilium_core::math::Vec4;

    #[test]
    fn builder_binds_values_and_textures() {
        let material = Material::new("plastic")
            .with_value("uniColor", Vec4::new(1.0, 0.0, 0.0, 1.0))
            .with_texture("uniAlbedo", "plastic.png")
            .with_tag("SKINNED")
            .with_tag("SKINNED");

        assert_eq!(material.name(), "plastic");
        assert!(material.parameter(&"uniColor".into()).is_some());
        assert_eq!(material.texture(&"uniAlbedo".into()), Some("plastic.png"));
        assert_eq!(material.tags().len(), 1);
        assert!(material.has_tag(&"SKINNED".into()));
    }

    #[test]
    fn set_parameter_replaces() {
        let mut material = Material::new("m").with_value("uniScale", 1.0f32);
        let old = material.set_parameter("uniScale", Arc::new(ConstantParameter::new(2.0f32)));
        assert!(old.is_some());
        assert_eq!(material.parameter_count(), 1);
    }

    #[test]
    fn parses_ron() {
        let material = Material::from_ron(
            r#"(
                name: "red",
                values: { "uniGloss": Float(0.5), "uniTwoSided": Bool(true) },
                textures: { "uniAlbedo": "red.png" },
                tags: ["ALPHA_TEST"],
            )"#,
        )
        .unwrap();
        assert_eq!(material.name(), "red");
        assert_eq!(material.parameter_count(), 2);
        assert_eq!(material.texture(&"uniAlbedo".into()), Some("red.png"));
        assert!(material.has_tag(&"ALPHA_TEST".into()));
    }

    #[test]
    fn definition_survives_ron() {
        let mut definition = MaterialDefinition {
            name: "tinted".into(),
            ..MaterialDefinition::default()
        };
        definition
            .values
            .insert("uniTint".into(), Vec4::new(0.25, 0.5, 0.75, 1.0).into());
        let text = ron::to_string(&definition).unwrap();
        let parsed: MaterialDefinition = ron::from_str(&text).unwrap();
        assert_eq!(parsed, definition);
    }

    #[test]
    fn bad_ron_is_a_config_error() {
        assert!(matches!(
            Material::from_ron("(name: 3)"),
            Err(EffectError::Config(_))
        ));
    }
}
