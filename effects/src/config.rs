//! Effect system configuration.
//!
//! Loaded from RON:
//!
//! ```ron
//! (
//!     render: (
//!         fill_mode_override: Some(Wireframe),
//!         default_rasterizer: (fill_mode: Solid, cull_mode: Back, depth_bias: 0),
//!     ),
//!     resolution: (warn_on_optional_fallback: true, allow_optional_fallback: true),
//!     debug_fill_pattern: false,
//! )
//! ```

use serde::{Deserialize, Serialize};

use crate::effect::{FillMode, RasterizerState};
use crate::error::{EffectError, EffectResult};

/// Render state owned by the effect compiler and applied when effects bind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderSettings {
    /// Forces every effect to this fill mode, e.g. for a wireframe view.
    pub fill_mode_override: Option<FillMode>,
    /// Rasterizer state for effects that do not declare one.
    pub default_rasterizer: RasterizerState,
}

impl RenderSettings {
    /// The rasterizer state to bind for an effect's own state.
    pub fn effective_rasterizer(&self, effect_state: &RasterizerState) -> RasterizerState {
        match self.fill_mode_override {
            Some(fill_mode) => RasterizerState {
                fill_mode,
                ..*effect_state
            },
            None => *effect_state,
        }
    }
}

/// How name resolution treats `uniOptional_` fallbacks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolutionOptions {
    /// Log a warning whenever a default value is substituted.
    pub warn_on_optional_fallback: bool,
    /// When false, a missing optional parameter is an error like any other.
    pub allow_optional_fallback: bool,
}

impl Default for ResolutionOptions {
    fn default() -> Self {
        Self {
            warn_on_optional_fallback: true,
            allow_optional_fallback: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EffectSystemConfig {
    pub render: RenderSettings,
    pub resolution: ResolutionOptions,
    /// Fill constant buffers with `0xDE` before evaluation so unwritten bytes stand out.
    pub debug_fill_pattern: bool,
}

impl Default for EffectSystemConfig {
    fn default() -> Self {
        Self {
            render: RenderSettings::default(),
            resolution: ResolutionOptions::default(),
            debug_fill_pattern: cfg!(debug_assertions),
        }
    }
}

impl EffectSystemConfig {
    pub fn from_ron(source: &str) -> EffectResult<Self> {
        ron::from_str(source).map_err(|e| EffectError::Config(e.to_string()))
    }

    pub fn to_ron(&self) -> EffectResult<String> {
        ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
            .map_err(|e| EffectError::Config(e.to_string()))
    }
}
