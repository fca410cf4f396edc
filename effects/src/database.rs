//! Parent-linked tables of global parameters, textures and effect descriptors.
//!
//! Names not bound by a material are looked up in a [`MaterialDatabase`] and
//! then in its parents. The root database usually carries the builtins.
//!
//! `bind_*` refuses to replace a name already bound in the same database and
//! `bind_*_override` replaces it. Binding a name a parent holds is always
//! allowed and shadows the parent.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::Arc;

use lilium_core::thread::ThreadAffinity;

use crate::bind_name::BindName;
use crate::effect::EffectDescriptor;
use crate::error::{EffectError, EffectResult};
use crate::parameters::{ConstantParameter, ParamRef, ParameterValue, builtin};

#[derive(Debug)]
pub struct MaterialDatabase {
    parameters: HashMap<BindName, ParamRef>,
    textures: HashMap<BindName, String>,
    effects: HashMap<String, Arc<EffectDescriptor>>,
    parent: Option<Arc<MaterialDatabase>>,
    affinity: ThreadAffinity,
}

impl MaterialDatabase {
    /// An empty root database.
    pub fn new() -> Self {
        Self {
            parameters: HashMap::new(),
            textures: HashMap::new(),
            effects: HashMap::new(),
            parent: None,
            affinity: ThreadAffinity::current(),
        }
    }

    /// A root database holding every builtin parameter.
    pub fn with_builtins() -> Self {
        let mut database = Self::new();
        for (name, parameter) in builtin::create_all() {
            database.parameters.insert(name, parameter);
        }
        log::debug!("Registered {} builtin parameters", database.parameters.len());
        database
    }

    /// An empty database that falls back to `parent`.
    pub fn with_parent(parent: Arc<MaterialDatabase>) -> Self {
        Self {
            parent: Some(parent),
            ..Self::new()
        }
    }

    pub fn parent(&self) -> Option<&Arc<MaterialDatabase>> {
        self.parent.as_ref()
    }

    /// Bind a parameter unless this database already binds `name`.
    pub fn bind_parameter(&mut self, name: impl Into<BindName>, parameter: ParamRef) -> EffectResult<()> {
        self.affinity.check("MaterialDatabase");
        insert_new(&mut self.parameters, name.into(), parameter, BindName::to_string)
    }

    /// Bind a parameter, returning the one it replaces.
    pub fn bind_parameter_override(
        &mut self,
        name: impl Into<BindName>,
        parameter: ParamRef,
    ) -> Option<ParamRef> {
        self.affinity.check("MaterialDatabase");
        let name = name.into();
        let previous = self.parameters.insert(name.clone(), parameter);
        if previous.is_some() {
            log::debug!("Overrode parameter `{name}`");
        }
        previous
    }

    pub fn bind_value(&mut self, name: impl Into<BindName>, value: impl Into<ParameterValue>) -> EffectResult<()> {
        self.bind_parameter(name, Arc::new(ConstantParameter::new(value)))
    }

    pub fn bind_value_override(
        &mut self,
        name: impl Into<BindName>,
        value: impl Into<ParameterValue>,
    ) -> Option<ParamRef> {
        self.bind_parameter_override(name, Arc::new(ConstantParameter::new(value)))
    }

    /// Remove a parameter bound in this database. Parents are untouched.
    pub fn unbind_parameter(&mut self, name: &BindName) -> Option<ParamRef> {
        self.affinity.check("MaterialDatabase");
        self.parameters.remove(name)
    }

    pub fn bind_texture(&mut self, name: impl Into<BindName>, path: impl Into<String>) -> EffectResult<()> {
        self.affinity.check("MaterialDatabase");
        insert_new(&mut self.textures, name.into(), path.into(), BindName::to_string)
    }

    pub fn bind_texture_override(
        &mut self,
        name: impl Into<BindName>,
        path: impl Into<String>,
    ) -> Option<String> {
        self.affinity.check("MaterialDatabase");
        self.textures.insert(name.into(), path.into())
    }

    pub fn unbind_texture(&mut self, name: &BindName) -> Option<String> {
        self.affinity.check("MaterialDatabase");
        self.textures.remove(name)
    }

    /// Register a descriptor under `name` unless one is already registered here.
    pub fn bind_effect(&mut self, name: impl Into<String>, descriptor: Arc<EffectDescriptor>) -> EffectResult<()> {
        self.affinity.check("MaterialDatabase");
        insert_new(&mut self.effects, name.into(), descriptor, String::clone)
    }

    pub fn bind_effect_override(
        &mut self,
        name: impl Into<String>,
        descriptor: Arc<EffectDescriptor>,
    ) -> Option<Arc<EffectDescriptor>> {
        self.affinity.check("MaterialDatabase");
        self.effects.insert(name.into(), descriptor)
    }

    pub fn unbind_effect(&mut self, name: &str) -> Option<Arc<EffectDescriptor>> {
        self.affinity.check("MaterialDatabase");
        self.effects.remove(name)
    }

    /// Look up `name` here, then in each parent.
    pub fn find_parameter(&self, name: &BindName) -> Option<ParamRef> {
        self.parameters
            .get(name)
            .cloned()
            .or_else(|| self.parent.as_deref()?.find_parameter(name))
    }

    pub fn find_texture(&self, name: &BindName) -> Option<&str> {
        self.textures
            .get(name)
            .map(String::as_str)
            .or_else(|| self.parent.as_deref()?.find_texture(name))
    }

    pub fn find_effect(&self, name: &str) -> Option<Arc<EffectDescriptor>> {
        self.effects
            .get(name)
            .cloned()
            .or_else(|| self.parent.as_deref()?.find_effect(name))
    }

    /// Parameters bound directly in this database.
    pub fn len(&self) -> usize {
        self.parameters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parameters.is_empty()
    }
}

impl Default for MaterialDatabase {
    fn default() -> Self {
        Self::new()
    }
}

fn insert_new<K: Eq + Hash, V>(
    table: &mut HashMap<K, V>,
    key: K,
    value: V,
    describe: impl FnOnce(&K) -> String,
) -> EffectResult<()> {
    if table.contains_key(&key) {
        let name = describe(&key);
        log::warn!("`{name}` is already bound, use the override variant to replace it");
        return Err(EffectError::AlreadyBound { name });
    }
    table.insert(key, value);
    Ok(())
}
