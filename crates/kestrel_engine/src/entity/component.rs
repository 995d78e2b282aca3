//! Component contract and lifecycle hooks

use std::any::Any;

use crate::entity::Entity;
use crate::render::Surface;
use crate::scene::Scene;

/// Identifier of a component within its owning entity
///
/// Assigned from a per-entity monotonic counter and never reused within that
/// entity's lifetime, even across remove/re-add cycles of other components.
pub type ComponentId = i32;

/// A behavior unit owned by exactly one entity
///
/// All hooks are no-ops by default; implementations override the ones they
/// care about. Hooks receive the owning entity and the scene explicitly -
/// there is no global scene instance to reach for. Mutating calls made on
/// the scene from inside a hook only enqueue; they commit at the next
/// [`Scene::update_lists`](crate::scene::Scene::update_lists).
pub trait Component: Any {
    /// Called when the component is attached to its entity
    ///
    /// If the component was queued on a free entity, this fires during the
    /// entity's scene commit, after the entity has a live scene, so the
    /// component can immediately query or enqueue against it.
    fn added(&mut self, _entity: &mut Entity, _scene: &mut Scene) {}

    /// Called when the component is detached from its entity
    fn removed(&mut self, _entity: &mut Entity, _scene: &mut Scene) {}

    /// First update phase of the frame
    fn update_first(&mut self, _entity: &mut Entity, _scene: &mut Scene, _dt: f32) {}

    /// Main update phase of the frame
    fn update(&mut self, _entity: &mut Entity, _scene: &mut Scene, _dt: f32) {}

    /// Last update phase of the frame
    fn update_last(&mut self, _entity: &mut Entity, _scene: &mut Scene, _dt: f32) {}

    /// Draw to the current render target
    fn render(&self, _entity: &Entity, _surface: &mut dyn Surface) {}

    /// Called once when the owning entity's group is paused
    fn paused(&mut self, _entity: &mut Entity, _scene: &mut Scene) {}

    /// Called once when the owning entity's group is resumed
    fn resumed(&mut self, _entity: &mut Entity, _scene: &mut Scene) {}
}
