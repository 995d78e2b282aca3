//! Scene camera state
//!
//! The camera is plain state on the scene; [`Scene::update_camera`] resolves
//! the focus entity, applies the debug offset, clamps against the bounds, and
//! pushes the resulting view to every surface that tracks the scene camera.

use crate::foundation::math::{Rect, Vec2};
use crate::scene::EntityId;

/// 2D scene camera
///
/// `x`/`y` are the camera's world position. When `focus` names a resident
/// entity the camera follows it; the debug offset is applied on top of the
/// stored position each frame without accumulating into it.
#[derive(Debug, Clone)]
pub struct Camera {
    /// Camera x position in world space
    pub x: f32,

    /// Camera y position in world space
    pub y: f32,

    /// Entity the camera follows, if any
    pub focus: Option<EntityId>,

    /// Rectangle the camera view is clamped into while `use_bounds` is set
    pub bounds: Option<Rect>,

    /// Whether bounds clamping is active
    pub use_bounds: bool,

    /// Extra offset applied to the pushed view (debug fly-around)
    pub debug_offset: Vec2,
}

impl Default for Camera {
    fn default() -> Self {
        Self::new()
    }
}

impl Camera {
    /// Create a camera at the origin with no focus and no bounds
    pub fn new() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            focus: None,
            bounds: None,
            use_bounds: false,
            debug_offset: Vec2::zeros(),
        }
    }

    /// Set and enable the camera bounds
    pub fn set_bounds(&mut self, bounds: Rect) {
        self.bounds = Some(bounds);
        self.use_bounds = true;
    }

    /// Disable bounds clamping, keeping the stored rectangle
    pub fn clear_bounds(&mut self) {
        self.use_bounds = false;
    }

    /// The view position for the current state: stored position plus debug
    /// offset, clamped to the bounds when enabled.
    pub fn view_position(&self) -> Vec2 {
        let raw = Vec2::new(self.x + self.debug_offset.x, self.y + self.debug_offset.y);
        match (self.use_bounds, self.bounds) {
            (true, Some(bounds)) => bounds.clamp_point(raw),
            _ => raw,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_view_position_without_bounds() {
        let mut camera = Camera::new();
        camera.x = 10.0;
        camera.y = -4.0;
        camera.debug_offset = Vec2::new(1.0, 1.0);

        assert_eq!(camera.view_position(), Vec2::new(11.0, -3.0));
    }

    #[test]
    fn test_view_position_clamps_to_bounds() {
        let mut camera = Camera::new();
        camera.x = 500.0;
        camera.y = -80.0;
        camera.set_bounds(Rect::new(0.0, 0.0, 320.0, 240.0));

        assert_eq!(camera.view_position(), Vec2::new(320.0, 0.0));
    }

    #[test]
    fn test_clear_bounds_stops_clamping() {
        let mut camera = Camera::new();
        camera.x = 500.0;
        camera.set_bounds(Rect::new(0.0, 0.0, 100.0, 100.0));
        camera.clear_bounds();

        assert_eq!(camera.view_position(), Vec2::new(500.0, 0.0));
    }
}
