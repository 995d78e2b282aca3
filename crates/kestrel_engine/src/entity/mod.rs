//! Entity: a game object owning components, colliders, and graphics
//!
//! Entities are concrete data; behavior lives in the [`Component`]s attached
//! to them. Component adds and removes are deferred into per-entity queues
//! and committed at a single point, [`Entity::update_component_lists`], so a
//! component list is never restructured while a hook is iterating it.

mod component;

pub use component::{Component, ComponentId};

use std::any::Any;

use crate::physics::{Collider, ColliderId};
use crate::render::{Graphic, Surface, SurfaceKey};
use crate::scene::{EntityId, Scene, NO_ENTITY};

struct ComponentSlot {
    id: ComponentId,
    // Taken out of the slot while its own hook runs.
    component: Option<Box<dyn Component>>,
}

struct ColliderSlot {
    id: ColliderId,
    collider: Collider,
}

enum UpdatePhase {
    First,
    Main,
    Last,
}

/// A game object
///
/// Owns ordered collections of components, colliders, graphics, and render
/// target keys; carries its position, per-frame timer, and the three
/// scheduling keys (`layer` for render order, `order` for update order,
/// `group` for pause scheduling). An entity belongs to at most one scene at
/// a time; the scene reaches it through its [`EntityId`].
pub struct Entity {
    /// World-space x position
    pub x: f32,

    /// World-space y position
    pub y: f32,

    /// Seconds accumulated across update phases while resident
    pub timer: f32,

    /// Remaining lifetime in seconds; at zero the scene removes the entity.
    /// Zero or negative at creation means no lifetime limit.
    pub life_span: f32,

    /// Whether the entity renders at all
    pub visible: bool,

    /// Whether the entity participates in collider overlap queries
    pub collidable: bool,

    /// Whether the scene updates the entity during the update phases
    pub auto_update: bool,

    /// Whether the scene renders the entity during render dispatch
    pub auto_render: bool,

    /// Render bucket key; higher layers draw later, on top
    pub layer: i32,

    /// Update bucket key; lower orders update first
    pub order: i32,

    /// Pause group key
    pub group: i32,

    instance_id: EntityId,
    pub(crate) marked_for_add: bool,
    pub(crate) marked_for_removal: bool,
    pub(crate) updated_once: bool,
    pub(crate) life_span_expired: bool,

    // Bucket keys this entity is currently indexed under, maintained by the
    // scene; diffed against the live fields to detect reassignment.
    pub(crate) indexed_order: i32,
    pub(crate) indexed_layer: i32,

    components: Vec<ComponentSlot>,
    components_to_add: Vec<(ComponentId, Box<dyn Component>)>,
    components_to_remove: Vec<ComponentId>,
    next_component_id: ComponentId,
    components_locked: bool,

    colliders: Vec<ColliderSlot>,
    next_collider_id: ColliderId,
    pub(crate) colliders_dirty: bool,

    graphics: Vec<Box<dyn Graphic>>,
    surfaces: Vec<SurfaceKey>,
}

impl Default for Entity {
    fn default() -> Self {
        Self::new()
    }
}

impl Entity {
    /// Create a free entity at the origin
    pub fn new() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            timer: 0.0,
            life_span: 0.0,
            visible: true,
            collidable: true,
            auto_update: true,
            auto_render: true,
            layer: 0,
            order: 0,
            group: 0,
            instance_id: NO_ENTITY,
            marked_for_add: false,
            marked_for_removal: false,
            updated_once: false,
            life_span_expired: false,
            indexed_order: 0,
            indexed_layer: 0,
            components: Vec::new(),
            components_to_add: Vec::new(),
            components_to_remove: Vec::new(),
            next_component_id: 0,
            components_locked: false,
            colliders: Vec::new(),
            next_collider_id: 0,
            colliders_dirty: false,
            graphics: Vec::new(),
            surfaces: Vec::new(),
        }
    }

    /// Create a free entity at the given position
    pub fn at(x: f32, y: f32) -> Self {
        let mut entity = Self::new();
        entity.x = x;
        entity.y = y;
        entity
    }

    /// Scene-scoped id, [`NO_ENTITY`] while the entity is free
    pub fn instance_id(&self) -> EntityId {
        self.instance_id
    }

    pub(crate) fn set_instance_id(&mut self, id: EntityId) {
        self.instance_id = id;
    }

    /// Whether the entity is queued for insertion into a scene
    pub fn marked_for_add(&self) -> bool {
        self.marked_for_add
    }

    /// Whether the entity is queued for removal from its scene
    pub fn marked_for_removal(&self) -> bool {
        self.marked_for_removal
    }

    /// Whether the entity has completed at least one full update pass
    ///
    /// Render dispatch never draws an entity before its first update.
    pub fn updated_once(&self) -> bool {
        self.updated_once
    }

    // ------------------------------------------------------------------
    // Components
    // ------------------------------------------------------------------

    /// Queue a component for attachment and reserve its id
    ///
    /// The component attaches (and `added` fires) at the next
    /// [`update_component_lists`](Self::update_component_lists) commit. Ids
    /// are monotonic and never reused within this entity's lifetime.
    pub fn add_component(&mut self, component: Box<dyn Component>) -> ComponentId {
        let id = self.next_component_id;
        self.next_component_id += 1;
        self.components_to_add.push((id, component));
        id
    }

    /// Queue a component for detachment
    ///
    /// A component that is still pending-add is cancelled outright: it is
    /// dropped without ever attaching and `added` never fires. Returns false
    /// for ids that are neither pending nor attached.
    pub fn remove_component(&mut self, id: ComponentId) -> bool {
        if let Some(pos) = self
            .components_to_add
            .iter()
            .position(|(queued, _)| *queued == id)
        {
            self.components_to_add.remove(pos);
            return true;
        }

        if self.components.iter().any(|slot| slot.id == id) {
            if !self.components_to_remove.contains(&id) {
                self.components_to_remove.push(id);
            }
            return true;
        }

        log::debug!("remove_component: unknown component id {id}");
        false
    }

    /// Commit pending component removals, then pending adds
    ///
    /// The single commit point for the component list. Removals drain first
    /// (detach, fire `removed`), then adds (attach, fire `added`). Runs at
    /// the start of every update phase and twice during the owning entity's
    /// scene commit; re-entrant calls from hooks are ignored so an
    /// in-progress drain is never restructured.
    pub fn update_component_lists(&mut self, scene: &mut Scene) {
        if self.components_locked {
            return;
        }
        self.components_locked = true;

        while !self.components_to_remove.is_empty() || !self.components_to_add.is_empty() {
            let removals = std::mem::take(&mut self.components_to_remove);
            for id in removals {
                if let Some(pos) = self.components.iter().position(|slot| slot.id == id) {
                    let slot = self.components.remove(pos);
                    if let Some(mut component) = slot.component {
                        component.removed(self, scene);
                    }
                }
            }

            let adds = std::mem::take(&mut self.components_to_add);
            for (id, mut component) in adds {
                let index = self.components.len();
                self.components.push(ComponentSlot {
                    id,
                    component: None,
                });
                component.added(self, scene);
                self.components[index].component = Some(component);
            }
        }

        self.components_locked = false;
    }

    /// Number of attached components
    pub fn component_count(&self) -> usize {
        self.components.len()
    }

    /// Whether an attached or pending-add component has type `C`
    pub fn has_component<C: Component>(&self) -> bool {
        self.attached_components()
            .any(|c| (c as &dyn Any).is::<C>())
            || self
                .components_to_add
                .iter()
                .any(|(_, c)| (c.as_ref() as &dyn Any).is::<C>())
    }

    /// First attached or pending-add component of type `C`
    pub fn component<C: Component>(&self) -> Option<&C> {
        self.attached_components()
            .find_map(|c| (c as &dyn Any).downcast_ref::<C>())
            .or_else(|| {
                self.components_to_add
                    .iter()
                    .find_map(|(_, c)| (c.as_ref() as &dyn Any).downcast_ref::<C>())
            })
    }

    /// Mutable access to the first attached or pending-add component of type `C`
    pub fn component_mut<C: Component>(&mut self) -> Option<&mut C> {
        // Two passes keep the borrows disjoint.
        let in_slots = self
            .components
            .iter()
            .filter_map(|slot| slot.component.as_deref())
            .any(|c| (c as &dyn Any).is::<C>());

        if in_slots {
            return self
                .components
                .iter_mut()
                .filter_map(|slot| slot.component.as_deref_mut())
                .find_map(|c| (c as &mut dyn Any).downcast_mut::<C>());
        }

        self.components_to_add
            .iter_mut()
            .find_map(|(_, c)| (c.as_mut() as &mut dyn Any).downcast_mut::<C>())
    }

    /// Attached component by id
    pub fn component_by_id(&self, id: ComponentId) -> Option<&dyn Component> {
        self.components
            .iter()
            .find(|slot| slot.id == id)
            .and_then(|slot| slot.component.as_deref())
    }

    fn attached_components(&self) -> impl Iterator<Item = &dyn Component> {
        self.components
            .iter()
            .filter_map(|slot| slot.component.as_deref())
    }

    // ------------------------------------------------------------------
    // Colliders
    // ------------------------------------------------------------------

    /// Attach a collider and assign its id
    ///
    /// On a free entity the collider registers with the scene's tag index
    /// when the entity commits. On a resident entity the scene picks the
    /// change up when the entity is next handed back to it; prefer
    /// [`Scene::add_collider`](crate::scene::Scene::add_collider) there,
    /// which registers immediately.
    pub fn add_collider(&mut self, collider: Collider) -> ColliderId {
        let id = self.next_collider_id;
        self.next_collider_id += 1;
        self.colliders.push(ColliderSlot { id, collider });
        self.colliders_dirty = true;
        id
    }

    /// Detach a collider, returning it
    pub fn remove_collider(&mut self, id: ColliderId) -> Option<Collider> {
        let pos = self.colliders.iter().position(|slot| slot.id == id)?;
        self.colliders_dirty = true;
        Some(self.colliders.remove(pos).collider)
    }

    /// Attached collider by id
    pub fn collider(&self, id: ColliderId) -> Option<&Collider> {
        self.colliders
            .iter()
            .find(|slot| slot.id == id)
            .map(|slot| &slot.collider)
    }

    /// Iterate attached colliders with their ids
    pub fn colliders(&self) -> impl Iterator<Item = (ColliderId, &Collider)> {
        self.colliders.iter().map(|slot| (slot.id, &slot.collider))
    }

    /// Number of attached colliders
    pub fn collider_count(&self) -> usize {
        self.colliders.len()
    }

    // ------------------------------------------------------------------
    // Graphics and render targets
    // ------------------------------------------------------------------

    /// Attach a graphic; graphics draw in attachment order
    pub fn add_graphic(&mut self, graphic: Box<dyn Graphic>) {
        self.graphics.push(graphic);
    }

    /// Number of attached graphics
    pub fn graphic_count(&self) -> usize {
        self.graphics.len()
    }

    /// Drop all attached graphics
    pub fn clear_graphics(&mut self) {
        self.graphics.clear();
    }

    /// Declare a render target; when any are declared, render dispatch draws
    /// the entity once per target instead of to the current target.
    pub fn add_surface(&mut self, key: SurfaceKey) {
        if !self.surfaces.contains(&key) {
            self.surfaces.push(key);
        }
    }

    /// Remove a declared render target
    pub fn remove_surface(&mut self, key: SurfaceKey) -> bool {
        let before = self.surfaces.len();
        self.surfaces.retain(|&k| k != key);
        self.surfaces.len() != before
    }

    /// Declared render targets
    pub fn surfaces(&self) -> &[SurfaceKey] {
        &self.surfaces
    }

    // ------------------------------------------------------------------
    // Phase internals, driven by the scene
    // ------------------------------------------------------------------

    pub(crate) fn update_first_internal(&mut self, scene: &mut Scene, dt: f32) {
        self.update_component_lists(scene);
        self.dispatch_update(scene, dt, UpdatePhase::First);
    }

    pub(crate) fn update_internal(&mut self, scene: &mut Scene, dt: f32) {
        self.update_component_lists(scene);
        self.timer += dt;
        if self.life_span > 0.0 {
            self.life_span -= dt;
            if self.life_span <= 0.0 {
                self.life_span = 0.0;
                self.life_span_expired = true;
            }
        }
        self.dispatch_update(scene, dt, UpdatePhase::Main);
    }

    pub(crate) fn update_last_internal(&mut self, scene: &mut Scene, dt: f32) {
        self.update_component_lists(scene);
        self.dispatch_update(scene, dt, UpdatePhase::Last);
        for graphic in &mut self.graphics {
            graphic.update(dt);
        }
        self.updated_once = true;
    }

    pub(crate) fn render_internal(&self, surface: &mut dyn Surface) {
        for graphic in &self.graphics {
            if graphic.relative() {
                graphic.render(self.x, self.y, surface);
            } else {
                graphic.render(0.0, 0.0, surface);
            }
        }
        for component in self.attached_components() {
            component.render(self, surface);
        }
    }

    pub(crate) fn dispatch_paused(&mut self, scene: &mut Scene) {
        self.dispatch_transition(scene, true);
    }

    pub(crate) fn dispatch_resumed(&mut self, scene: &mut Scene) {
        self.dispatch_transition(scene, false);
    }

    /// Detach every attached component, firing `removed`; pending adds are
    /// dropped without ever attaching.
    pub(crate) fn detach_all_components(&mut self, scene: &mut Scene) {
        self.components_to_add.clear();
        self.components_to_remove.clear();
        let slots = std::mem::take(&mut self.components);
        for slot in slots {
            if let Some(mut component) = slot.component {
                component.removed(self, scene);
            }
        }
    }

    pub(crate) fn clear_colliders_dirty(&mut self) {
        self.colliders_dirty = false;
    }

    fn dispatch_update(&mut self, scene: &mut Scene, dt: f32, phase: UpdatePhase) {
        let was_locked = self.components_locked;
        self.components_locked = true;

        // Structural changes only enqueue while the list is locked, so the
        // slot count is stable across the loop.
        let count = self.components.len();
        for i in 0..count {
            if let Some(mut component) = self.components[i].component.take() {
                match phase {
                    UpdatePhase::First => component.update_first(self, scene, dt),
                    UpdatePhase::Main => component.update(self, scene, dt),
                    UpdatePhase::Last => component.update_last(self, scene, dt),
                }
                self.components[i].component = Some(component);
            }
        }

        self.components_locked = was_locked;
    }

    fn dispatch_transition(&mut self, scene: &mut Scene, pausing: bool) {
        let was_locked = self.components_locked;
        self.components_locked = true;

        let count = self.components.len();
        for i in 0..count {
            if let Some(mut component) = self.components[i].component.take() {
                if pausing {
                    component.paused(self, scene);
                } else {
                    component.resumed(self, scene);
                }
                self.components[i].component = Some(component);
            }
        }

        self.components_locked = was_locked;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::Scene;
    use std::cell::RefCell;
    use std::rc::Rc;

    type CallLog = Rc<RefCell<Vec<&'static str>>>;

    struct Probe {
        log: CallLog,
    }

    impl Component for Probe {
        fn added(&mut self, _entity: &mut Entity, _scene: &mut Scene) {
            self.log.borrow_mut().push("added");
        }

        fn removed(&mut self, _entity: &mut Entity, _scene: &mut Scene) {
            self.log.borrow_mut().push("removed");
        }

        fn update_first(&mut self, _entity: &mut Entity, _scene: &mut Scene, _dt: f32) {
            self.log.borrow_mut().push("update_first");
        }

        fn update(&mut self, _entity: &mut Entity, _scene: &mut Scene, _dt: f32) {
            self.log.borrow_mut().push("update");
        }

        fn update_last(&mut self, _entity: &mut Entity, _scene: &mut Scene, _dt: f32) {
            self.log.borrow_mut().push("update_last");
        }
    }

    fn probe(log: &CallLog) -> Box<Probe> {
        Box::new(Probe { log: log.clone() })
    }

    #[test]
    fn test_component_ids_are_monotonic_and_never_reused() {
        let mut scene = Scene::new();
        let mut entity = Entity::new();
        let log: CallLog = Rc::new(RefCell::new(Vec::new()));

        let first = entity.add_component(probe(&log));
        let second = entity.add_component(probe(&log));
        assert_eq!(first, 0);
        assert_eq!(second, 1);

        entity.update_component_lists(&mut scene);
        assert!(entity.remove_component(first));
        entity.update_component_lists(&mut scene);

        let third = entity.add_component(probe(&log));
        assert_eq!(third, 2);
    }

    #[test]
    fn test_pending_add_can_be_cancelled() {
        let mut scene = Scene::new();
        let mut entity = Entity::new();
        let log: CallLog = Rc::new(RefCell::new(Vec::new()));

        let id = entity.add_component(probe(&log));
        assert!(entity.remove_component(id));
        entity.update_component_lists(&mut scene);

        assert_eq!(entity.component_count(), 0);
        assert!(log.borrow().is_empty(), "neither added nor removed may fire");
    }

    #[test]
    fn test_commit_drains_removals_before_adds() {
        let mut scene = Scene::new();
        let mut entity = Entity::new();
        let log: CallLog = Rc::new(RefCell::new(Vec::new()));

        let first = entity.add_component(probe(&log));
        entity.update_component_lists(&mut scene);
        log.borrow_mut().clear();

        entity.remove_component(first);
        entity.add_component(probe(&log));
        entity.update_component_lists(&mut scene);

        assert_eq!(*log.borrow(), vec!["removed", "added"]);
        assert_eq!(entity.component_count(), 1);
    }

    #[test]
    fn test_update_phases_reach_components_in_order() {
        let mut scene = Scene::new();
        let mut entity = Entity::new();
        let log: CallLog = Rc::new(RefCell::new(Vec::new()));

        entity.add_component(probe(&log));
        entity.update_first_internal(&mut scene, 0.016);
        entity.update_internal(&mut scene, 0.016);
        entity.update_last_internal(&mut scene, 0.016);

        assert_eq!(
            *log.borrow(),
            vec!["added", "update_first", "update", "update_last"]
        );
        assert!(entity.updated_once());
    }

    #[test]
    fn test_timer_accumulates_and_life_span_expires() {
        let mut scene = Scene::new();
        let mut entity = Entity::new();
        entity.life_span = 0.03;

        entity.update_internal(&mut scene, 0.016);
        assert!(!entity.life_span_expired);

        entity.update_internal(&mut scene, 0.016);
        assert!(entity.life_span_expired);
        assert_eq!(entity.life_span, 0.0);

        approx::assert_relative_eq!(entity.timer, 0.032, max_relative = 1e-5);
    }

    #[test]
    fn test_component_downcast_accessors() {
        let mut scene = Scene::new();
        let mut entity = Entity::new();
        let log: CallLog = Rc::new(RefCell::new(Vec::new()));

        entity.add_component(probe(&log));
        assert!(entity.has_component::<Probe>(), "pending adds are visible");

        entity.update_component_lists(&mut scene);
        assert!(entity.has_component::<Probe>());
        assert!(entity.component::<Probe>().is_some());
        assert!(entity.component_mut::<Probe>().is_some());
    }

    #[test]
    fn test_removing_component_during_update_defers_to_next_commit() {
        struct SelfRemover {
            my_id: ComponentId,
            log: CallLog,
        }

        impl Component for SelfRemover {
            fn update(&mut self, entity: &mut Entity, _scene: &mut Scene, _dt: f32) {
                self.log.borrow_mut().push("update");
                entity.remove_component(self.my_id);
            }

            fn removed(&mut self, _entity: &mut Entity, _scene: &mut Scene) {
                self.log.borrow_mut().push("removed");
            }
        }

        let mut scene = Scene::new();
        let mut entity = Entity::new();
        let log: CallLog = Rc::new(RefCell::new(Vec::new()));

        // Id is assigned at enqueue, so the component can know itself.
        let id = entity.add_component(Box::new(SelfRemover {
            my_id: 0,
            log: log.clone(),
        }));
        assert_eq!(id, 0);

        entity.update_internal(&mut scene, 0.016);
        assert_eq!(entity.component_count(), 1, "removal is still pending");

        entity.update_internal(&mut scene, 0.016);
        assert_eq!(entity.component_count(), 0);
        assert_eq!(*log.borrow(), vec!["update", "removed"]);
    }
}
