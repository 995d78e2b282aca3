//! Render contracts and target management
//!
//! The core never draws pixels itself. Graphics submit primitives to an
//! abstract [`Surface`], and the [`RenderContext`] owns the registered
//! surfaces plus a target stack so render dispatch can redirect drawing to an
//! entity's declared targets and restore the previous target afterwards.
//! Concrete backends live outside this crate.

use slotmap::{new_key_type, SlotMap};

new_key_type! {
    /// Handle to a surface registered with a [`RenderContext`]
    pub struct SurfaceKey;
}

/// A primitive submission forwarded from a graphic to its target surface
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DrawCall {
    /// World-space x position of the submission
    pub x: f32,

    /// World-space y position of the submission
    pub y: f32,

    /// Identifier of the submitting graphic, for backends that batch by kind
    pub kind: &'static str,
}

/// Render target contract
///
/// Implemented by the rendering backend. The core only needs to point the
/// surface's view at a world position and forward primitive submissions.
pub trait Surface {
    /// Human-readable surface name, for logging
    fn name(&self) -> &str {
        "surface"
    }

    /// Point the surface's view at a world position
    fn set_view(&mut self, _x: f32, _y: f32) {}

    /// Record a primitive submission from a graphic
    fn submit(&mut self, call: DrawCall);
}

/// Drawable contract for visuals attached to entities and scenes
pub trait Graphic {
    /// Advance any time-based state (animation frames, scrolling, ...)
    fn update(&mut self, _dt: f32) {}

    /// Draw this graphic at the given world position onto a surface
    fn render(&self, x: f32, y: f32, surface: &mut dyn Surface);

    /// Whether the graphic renders relative to its owner's position
    ///
    /// Non-relative graphics are drawn at the origin regardless of where
    /// their owning entity sits (screen-fixed HUD elements, backdrops).
    fn relative(&self) -> bool {
        true
    }
}

struct SurfaceEntry {
    surface: Box<dyn Surface>,
    track_scene_camera: bool,
}

/// Owns registered render surfaces and the current target stack
///
/// Entities and scenes refer to surfaces by [`SurfaceKey`] rather than by
/// shared pointers; the single-threaded phase model makes the registry the
/// one owner of every target.
#[derive(Default)]
pub struct RenderContext {
    surfaces: SlotMap<SurfaceKey, SurfaceEntry>,
    default_target: Option<SurfaceKey>,
    target_stack: Vec<SurfaceKey>,
}

impl RenderContext {
    /// Create an empty render context
    pub fn new() -> Self {
        Self {
            surfaces: SlotMap::with_key(),
            default_target: None,
            target_stack: Vec::new(),
        }
    }

    /// Register a surface; the first registered surface becomes the default
    /// target. `track_scene_camera` opts the surface into scene camera view
    /// updates.
    pub fn register_surface(
        &mut self,
        surface: Box<dyn Surface>,
        track_scene_camera: bool,
    ) -> SurfaceKey {
        log::debug!("registering surface '{}'", surface.name());
        let key = self.surfaces.insert(SurfaceEntry {
            surface,
            track_scene_camera,
        });
        if self.default_target.is_none() {
            self.default_target = Some(key);
        }
        key
    }

    /// Unregister a surface, returning it to the caller
    ///
    /// Clears the default target and strips the key from the target stack if
    /// it referenced the removed surface.
    pub fn unregister_surface(&mut self, key: SurfaceKey) -> Option<Box<dyn Surface>> {
        let entry = self.surfaces.remove(key)?;
        if self.default_target == Some(key) {
            self.default_target = None;
        }
        self.target_stack.retain(|&k| k != key);
        Some(entry.surface)
    }

    /// Set the default render target
    pub fn set_default_target(&mut self, key: SurfaceKey) -> bool {
        if self.surfaces.contains_key(key) {
            self.default_target = Some(key);
            true
        } else {
            false
        }
    }

    /// Key of the default render target, if any
    pub fn default_target(&self) -> Option<SurfaceKey> {
        self.default_target
    }

    /// Number of registered surfaces
    pub fn surface_count(&self) -> usize {
        self.surfaces.len()
    }

    /// Access a registered surface
    pub fn surface_mut(&mut self, key: SurfaceKey) -> Option<&mut (dyn Surface + '_)> {
        Some(self.surfaces.get_mut(key)?.surface.as_mut())
    }

    /// Key of the current draw target: top of the target stack, falling back
    /// to the default target
    pub fn current_target_key(&self) -> Option<SurfaceKey> {
        self.target_stack.last().copied().or(self.default_target)
    }

    /// The current draw target surface
    pub fn current_target(&mut self) -> Option<&mut dyn Surface> {
        let key = self.current_target_key()?;
        self.surface_mut(key)
    }

    /// Redirect drawing to the given surface until the matching
    /// [`pop_target`](Self::pop_target); returns false for unknown keys.
    pub fn push_target(&mut self, key: SurfaceKey) -> bool {
        if self.surfaces.contains_key(key) {
            self.target_stack.push(key);
            true
        } else {
            log::debug!("push_target ignored: unknown surface key");
            false
        }
    }

    /// Restore the previous draw target
    pub fn pop_target(&mut self) -> Option<SurfaceKey> {
        self.target_stack.pop()
    }

    /// Push the scene camera view to every surface that opted into scene
    /// camera tracking, plus the default target.
    pub fn apply_scene_view(&mut self, x: f32, y: f32) {
        let default = self.default_target;
        for (key, entry) in &mut self.surfaces {
            if entry.track_scene_camera || Some(key) == default {
                entry.surface.set_view(x, y);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[derive(Default)]
    struct RecordingSurface {
        calls: Rc<RefCell<Vec<DrawCall>>>,
        view: Rc<RefCell<Option<(f32, f32)>>>,
    }

    impl RecordingSurface {
        fn with_probes(
            calls: Rc<RefCell<Vec<DrawCall>>>,
            view: Rc<RefCell<Option<(f32, f32)>>>,
        ) -> Self {
            Self { calls, view }
        }
    }

    impl Surface for RecordingSurface {
        fn set_view(&mut self, x: f32, y: f32) {
            *self.view.borrow_mut() = Some((x, y));
        }

        fn submit(&mut self, call: DrawCall) {
            self.calls.borrow_mut().push(call);
        }
    }

    #[test]
    fn test_first_surface_becomes_default() {
        let mut ctx = RenderContext::new();
        let first = ctx.register_surface(Box::new(RecordingSurface::default()), false);
        let _second = ctx.register_surface(Box::new(RecordingSurface::default()), false);

        assert_eq!(ctx.default_target(), Some(first));
        assert_eq!(ctx.current_target_key(), Some(first));
    }

    #[test]
    fn test_target_stack_push_pop() {
        let mut ctx = RenderContext::new();
        let first = ctx.register_surface(Box::new(RecordingSurface::default()), false);
        let second = ctx.register_surface(Box::new(RecordingSurface::default()), false);

        assert!(ctx.push_target(second));
        assert_eq!(ctx.current_target_key(), Some(second));

        ctx.pop_target();
        assert_eq!(ctx.current_target_key(), Some(first));
    }

    #[test]
    fn test_unregister_clears_stack_and_default() {
        let mut ctx = RenderContext::new();
        let key = ctx.register_surface(Box::new(RecordingSurface::default()), false);
        ctx.push_target(key);

        assert!(ctx.unregister_surface(key).is_some());
        assert_eq!(ctx.default_target(), None);
        assert_eq!(ctx.current_target_key(), None);
    }

    #[test]
    fn test_scene_view_reaches_tracking_and_default_surfaces() {
        let default_view = Rc::new(RefCell::new(None));
        let tracking_view = Rc::new(RefCell::new(None));
        let detached_view = Rc::new(RefCell::new(None));
        let calls = Rc::new(RefCell::new(Vec::new()));

        let mut ctx = RenderContext::new();
        ctx.register_surface(
            Box::new(RecordingSurface::with_probes(calls.clone(), default_view.clone())),
            false,
        );
        ctx.register_surface(
            Box::new(RecordingSurface::with_probes(calls.clone(), tracking_view.clone())),
            true,
        );
        ctx.register_surface(
            Box::new(RecordingSurface::with_probes(calls, detached_view.clone())),
            false,
        );

        ctx.apply_scene_view(32.0, -8.0);

        assert_eq!(*default_view.borrow(), Some((32.0, -8.0)));
        assert_eq!(*tracking_view.borrow(), Some((32.0, -8.0)));
        assert_eq!(*detached_view.borrow(), None);
    }

    #[test]
    fn test_submissions_reach_current_target() {
        let calls = Rc::new(RefCell::new(Vec::new()));
        let view = Rc::new(RefCell::new(None));

        let mut ctx = RenderContext::new();
        ctx.register_surface(
            Box::new(RecordingSurface::with_probes(calls.clone(), view)),
            false,
        );

        ctx.current_target().unwrap().submit(DrawCall {
            x: 4.0,
            y: 9.0,
            kind: "probe",
        });

        let recorded = calls.borrow();
        assert_eq!(recorded.len(), 1);
        assert_eq!(recorded[0].x, 4.0);
        assert_eq!(recorded[0].kind, "probe");
    }
}
