//! Error types for parameter resolution and effect management.

use thiserror::Error;

use crate::bind_name::BindName;
use crate::constant::ConstantFieldType;
use crate::parameters::Modifier;

/// Why a constant-buffer field could not be bound to a parameter.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResolutionError {
    /// No material, database, descriptor or derived source matched the name.
    #[error("no parameter named `{name}`")]
    Missing { name: BindName },

    /// A source matched by name but holds a different field type.
    #[error("parameter `{name}` is {found}, the shader expects {expected}")]
    FieldTypeMismatch {
        name: BindName,
        expected: ConstantFieldType,
        found: ConstantFieldType,
    },

    /// The name carries a modifier prefix that cannot produce this field type.
    #[error("modifier {modifier:?} does not support {field_type} (`{name}`)")]
    UnsupportedModifier {
        name: BindName,
        modifier: Modifier,
        field_type: ConstantFieldType,
    },

    /// A texture referenced by name is bound nowhere.
    #[error("no texture named `{name}`")]
    MissingTexture { name: BindName },
}

impl ResolutionError {
    /// Whether the error means the name is absent, as opposed to misconfigured.
    pub fn is_missing(&self) -> bool {
        matches!(self, Self::Missing { .. } | Self::MissingTexture { .. })
    }
}

/// Errors surfaced by the device and shader-compiler collaborators.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BackendError {
    #[error("shader compilation failed for `{file}`: {message}")]
    ShaderCompilationFailed { file: String, message: String },
    #[error("resource creation failed: {0}")]
    ResourceCreationFailed(String),
    #[error("invalid handle: {0}")]
    InvalidHandle(String),
}

/// Top-level error of the effect and material system.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EffectError {
    /// A constant-buffer field could not be resolved.
    #[error("effect `{effect}`, constant buffer `{buffer}`: {source}")]
    Resolution {
        effect: String,
        buffer: BindName,
        #[source]
        source: ResolutionError,
    },

    /// A texture slot could not be resolved.
    #[error("effect `{effect}`: {source}")]
    Texture {
        effect: String,
        #[source]
        source: ResolutionError,
    },

    #[error(transparent)]
    Backend(#[from] BackendError),

    /// The vertex declaration is not one the descriptor declares.
    #[error("effect `{effect}` does not declare vertex declaration `{declaration}`")]
    UnsupportedVertexDeclaration { effect: String, declaration: String },

    /// More active material tags than an effect key can hold.
    #[error("effect `{effect}` has {count} active tags, at most {max} are supported", max = crate::effect::MAX_EFFECT_TAGS)]
    TooManyTags { effect: String, count: usize },

    /// A field does not fit the packed constant-field encoding.
    #[error("field `{name}` at byte offset {offset} does not fit a constant buffer layout")]
    LayoutOverflow { name: BindName, offset: u32 },

    /// A value of the wrong type was written into a parameter.
    #[error("expected a {expected} value, got {found}")]
    ValueTypeMismatch {
        expected: ConstantFieldType,
        found: ConstantFieldType,
    },

    /// Effects are still referenced outside the compiler cache.
    #[error("{count} effect(s) are still in use")]
    EffectsStillInUse { count: usize },

    /// A lifecycle method was called out of order.
    #[error("material effect is {found}, expected {expected}")]
    Lifecycle {
        expected: &'static str,
        found: &'static str,
    },

    /// A database already binds this name and the call did not ask to override.
    #[error("`{name}` is already bound")]
    AlreadyBound { name: String },

    /// A configuration or descriptor file could not be parsed.
    #[error("configuration error: {0}")]
    Config(String),
}

/// Result alias for the effect system.
pub type EffectResult<T> = Result<T, EffectError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolution_error_display() {
        let err = ResolutionError::Missing {
            name: BindName::new("uniColor"),
        };
        assert_eq!(err.to_string(), "no parameter named `uniColor`");
        assert!(err.is_missing());
    }

    #[test]
    fn effect_error_carries_diagnostic() {
        let err = EffectError::Resolution {
            effect: "unlit".into(),
            buffer: BindName::new("PerMaterial"),
            source: ResolutionError::FieldTypeMismatch {
                name: BindName::new("uniColor"),
                expected: ConstantFieldType::Float4,
                found: ConstantFieldType::Float3,
            },
        };
        let text = err.to_string();
        assert!(text.contains("unlit"));
        assert!(text.contains("PerMaterial"));
        assert!(text.contains("uniColor"));
    }

    #[test]
    fn backend_error_converts() {
        let err: EffectError = BackendError::ResourceCreationFailed("oom".into()).into();
        assert_eq!(err.to_string(), "resource creation failed: oom");
    }
}
