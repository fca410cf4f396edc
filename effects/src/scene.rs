//! Scene-side lookup services and per-frame state.

use lilium_core::math::{Mat4, Vec2, Vec3};

use std::sync::Arc;

use crate::texture::{SurfaceId, Texture};

/// Camera data for the current view.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraState {
    pub view: Mat4,
    pub projection: Mat4,
    pub position: Vec3,
    pub near: f32,
    pub far: f32,
}

impl Default for CameraState {
    fn default() -> Self {
        Self {
            view: Mat4::identity(),
            projection: Mat4::identity(),
            position: Vec3::zeros(),
            near: 0.1,
            far: 1000.0,
        }
    }
}

/// Global directional and ambient lighting.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LightingState {
    pub sun_direction: Vec3,
    pub sun_color: Vec3,
    pub ambient_color: Vec3,
}

impl Default for LightingState {
    fn default() -> Self {
        Self {
            sun_direction: Vec3::new(0.0, -1.0, 0.0),
            sun_color: Vec3::new(1.0, 1.0, 1.0),
            ambient_color: Vec3::new(0.1, 0.1, 0.1),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TimeState {
    /// Seconds since start.
    pub time: f32,
    pub delta_time: f32,
    pub frame_index: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct MouseState {
    /// Cursor position in pixels.
    pub position: Vec2,
    /// Bit `n` set while button `n` is held.
    pub buttons: u32,
}

/// Everything builtin parameters read for one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameState {
    pub camera: CameraState,
    pub lighting: LightingState,
    pub time: TimeState,
    pub mouse: MouseState,
    /// Viewport size in pixels.
    pub viewport: [u32; 2],
}

impl Default for FrameState {
    fn default() -> Self {
        Self {
            camera: CameraState::default(),
            lighting: LightingState::default(),
            time: TimeState::default(),
            mouse: MouseState::default(),
            viewport: [1, 1],
        }
    }
}

/// Texture cache and render-surface manager as seen by material effects.
pub trait Scene {
    /// State for the frame being prepared.
    fn frame(&self) -> &FrameState;

    /// Load a texture, falling back to a placeholder when `path` is missing.
    fn fetch_texture_2d_fallback(&self, path: &str, srgb: bool) -> Arc<Texture>;

    /// Resolve `path` to a render surface if it names one.
    fn try_unalias(&self, path: &str) -> Option<SurfaceId>;

    /// Keep a surface alive while a material samples it.
    fn lock_surface(&self, surface: SurfaceId);

    /// The texture currently backing a surface.
    fn surface_texture(&self, surface: SurfaceId) -> Option<Arc<Texture>>;

    fn unlock_surface(&self, surface: SurfaceId);
}
