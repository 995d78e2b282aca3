//! Scene lifecycle hook trait

use crate::render::RenderContext;
use crate::scene::Scene;

/// Per-scene lifecycle and frame hooks
///
/// Installed on a scene with [`Scene::set_hooks`]; every method is a no-op by
/// default. The hook object is taken off the scene for the duration of each
/// call, so implementations get full mutable access to the scene without
/// aliasing it.
pub trait SceneHooks {
    /// The scene became the active scene
    fn begin(&mut self, _scene: &mut Scene) {}

    /// The scene was removed from the active stack
    fn end(&mut self, _scene: &mut Scene) {}

    /// Another scene was pushed above this one
    fn pause(&mut self, _scene: &mut Scene) {}

    /// The scene above this one was popped
    fn resume(&mut self, _scene: &mut Scene) {}

    /// Runs after the entity pass of the first update phase
    fn update_first(&mut self, _scene: &mut Scene, _dt: f32) {}

    /// Runs after the entity pass of the main update phase
    fn update(&mut self, _scene: &mut Scene, _dt: f32) {}

    /// Runs after the entity pass of the last update phase
    fn update_last(&mut self, _scene: &mut Scene, _dt: f32) {}

    /// Foreground render pass, after all entities have drawn
    fn render(&mut self, _scene: &mut Scene, _ctx: &mut RenderContext) {}
}
