//! Scene: entity residency, structural indices, and phased scheduling
//!
//! The scene owns every entity in a level and keeps three structural indices
//! over them: update order buckets, render layer buckets, and the collider
//! tag index. All structural mutation (adds, removes, reordering, pause
//! transitions) is deferred into pending queues and committed at a single
//! choke point, [`Scene::update_lists`], which runs at the head of every
//! phase and on scene-stack transitions. Iteration during a phase walks a
//! snapshot, so user code may freely enqueue structural changes from inside
//! any hook without invalidating the pass in flight.

mod camera;
mod hooks;

pub use camera::Camera;
pub use hooks::SceneHooks;

use std::collections::{BTreeMap, HashMap, HashSet};

use crate::entity::{Component, Entity};
use crate::foundation::math::Vec2;
use crate::physics::{Collider, ColliderId, ColliderRef};
use crate::render::{Graphic, RenderContext, SurfaceKey};

/// Scene-scoped entity id, assigned from a monotonic counter and never reused
pub type EntityId = i32;

/// Id value of an entity that is not in a scene
pub const NO_ENTITY: EntityId = -1;

enum HookEvent {
    Begin,
    End,
    Pause,
    Resume,
}

enum HookPhase {
    First,
    Main,
    Last,
}

/// The set of entities present in a level and the indices over them
///
/// Entities are stored in an arena keyed by [`EntityId`]; the `Option`
/// wrapper lets the scene hand an entity out to its own hooks (`&mut Entity`
/// together with `&mut Scene`) and put it back afterwards. Scene APIs called
/// re-entrantly from hooks only enqueue.
pub struct Scene {
    entities: HashMap<EntityId, Option<Entity>>,
    resident: HashSet<EntityId>,
    orders: BTreeMap<i32, Vec<EntityId>>,
    layers: BTreeMap<i32, Vec<EntityId>>,
    collider_index: HashMap<i32, Vec<ColliderRef>>,

    to_add: Vec<EntityId>,
    to_remove: Vec<EntityId>,
    to_remove_next_frame: Vec<EntityId>,
    order_changes: Vec<(EntityId, i32)>,
    layer_changes: Vec<(EntityId, i32)>,

    paused_groups: HashSet<i32>,
    groups_to_pause: Vec<i32>,
    groups_to_resume: Vec<i32>,

    next_entity_id: EntityId,
    committing: bool,
    dispatching: u32,

    hooks: Option<Box<dyn SceneHooks>>,
    graphics: Vec<Box<dyn Graphic>>,
    surfaces: Vec<SurfaceKey>,

    /// Scene camera state; pushed to surfaces by [`Scene::update_camera`]
    pub camera: Camera,
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}

impl Scene {
    /// Create an empty scene
    pub fn new() -> Self {
        Self {
            entities: HashMap::new(),
            resident: HashSet::new(),
            orders: BTreeMap::new(),
            layers: BTreeMap::new(),
            collider_index: HashMap::new(),
            to_add: Vec::new(),
            to_remove: Vec::new(),
            to_remove_next_frame: Vec::new(),
            order_changes: Vec::new(),
            layer_changes: Vec::new(),
            paused_groups: HashSet::new(),
            groups_to_pause: Vec::new(),
            groups_to_resume: Vec::new(),
            next_entity_id: 0,
            committing: false,
            dispatching: 0,
            hooks: None,
            graphics: Vec::new(),
            surfaces: Vec::new(),
            camera: Camera::new(),
        }
    }

    /// Install the scene's lifecycle hooks
    pub fn set_hooks(&mut self, hooks: Box<dyn SceneHooks>) {
        self.hooks = Some(hooks);
    }

    /// Attach a background graphic drawn before any entity
    pub fn add_graphic(&mut self, graphic: Box<dyn Graphic>) {
        self.graphics.push(graphic);
    }

    /// Declare a render target for the scene's own background graphics
    pub fn add_surface(&mut self, key: SurfaceKey) {
        if !self.surfaces.contains(&key) {
            self.surfaces.push(key);
        }
    }

    // ------------------------------------------------------------------
    // Entity add/remove
    // ------------------------------------------------------------------

    /// Queue an entity for insertion and assign its id
    ///
    /// The entity becomes resident (indexed, queryable, lifecycle-started) at
    /// the next [`update_lists`](Self::update_lists) commit.
    pub fn add(&mut self, mut entity: Entity) -> EntityId {
        let id = self.next_entity_id;
        self.next_entity_id += 1;
        entity.set_instance_id(id);
        entity.marked_for_add = true;
        entity.marked_for_removal = false;
        self.entities.insert(id, Some(entity));
        self.to_add.push(id);
        log::debug!("entity {id} queued for add");
        id
    }

    /// Add the entity only if no current entity carries a component of type `C`
    ///
    /// Returns `None` (and drops the entity) when a resident or pending
    /// entity already has one.
    pub fn add_unique_with<C: Component>(&mut self, entity: Entity) -> Option<EntityId> {
        let exists = self
            .entities
            .values()
            .any(|slot| slot.as_ref().is_some_and(Entity::has_component::<C>));
        if exists {
            log::debug!("add_unique_with: component already present, entity dropped");
            return None;
        }
        Some(self.add(entity))
    }

    /// Queue a resident entity for removal
    ///
    /// An entity that is still pending-add is stripped from the add queue and
    /// dropped without ever having been indexed; neither `added` nor
    /// `removed` fires for its components. Unknown ids and entities already
    /// pending removal are no-ops returning `false`.
    pub fn remove(&mut self, id: EntityId) -> bool {
        if !self.entities.contains_key(&id) {
            log::debug!("remove: entity {id} not in scene");
            return false;
        }
        if self.to_remove.contains(&id) {
            return false;
        }
        if let Some(pos) = self.to_add.iter().position(|&pending| pending == id) {
            self.to_add.remove(pos);
            self.entities.remove(&id);
            log::debug!("entity {id} stripped from add queue");
            return true;
        }
        if !self.resident.contains(&id) {
            return false;
        }
        if let Some(Some(entity)) = self.entities.get_mut(&id) {
            entity.marked_for_removal = true;
        }
        self.to_remove.push(id);
        true
    }

    /// Queue a removal that only becomes pending at the next commit
    ///
    /// The entity survives every phase of the current frame and is evicted
    /// one commit cycle later than [`remove`](Self::remove) would.
    pub fn remove_next_frame(&mut self, id: EntityId) -> bool {
        if !self.resident.contains(&id) || self.to_remove_next_frame.contains(&id) {
            return false;
        }
        self.to_remove_next_frame.push(id);
        true
    }

    // ------------------------------------------------------------------
    // The commit point
    // ------------------------------------------------------------------

    /// Commit all pending structural mutations
    ///
    /// Strict order: (1) drain the add queue, (2) apply queued order/layer
    /// reassignments, (3) drain the removal queue, (4) promote
    /// remove-next-frame requests to ordinary removals, (5) apply pause and
    /// resume group transitions. Runs at the head of every phase and on
    /// scene-stack transitions; calls made while a commit or an entity
    /// dispatch is in flight are ignored, which is what makes mid-iteration
    /// structural calls safe.
    pub fn update_lists(&mut self) {
        if self.committing || self.dispatching > 0 {
            return;
        }
        self.committing = true;

        // (1) adds; `added` hooks may enqueue further adds, drain until settled
        while !self.to_add.is_empty() {
            let batch = std::mem::take(&mut self.to_add);
            for id in batch {
                let Some(mut entity) = self.entities.get_mut(&id).and_then(Option::take) else {
                    continue;
                };
                entity.marked_for_add = false;
                entity.indexed_order = entity.order;
                entity.indexed_layer = entity.layer;
                self.orders.entry(entity.order).or_default().push(id);
                self.layers.entry(entity.layer).or_default().push(id);
                self.resident.insert(id);

                // Components attach with a live scene in hand; the second
                // resolution commits whatever their `added` hooks enqueued.
                entity.update_component_lists(self);
                entity.update_component_lists(self);

                entity.marked_for_removal = self.to_remove.contains(&id);
                if let Some(slot) = self.entities.get_mut(&id) {
                    *slot = Some(entity);
                }
                self.resync_colliders(id);
                log::debug!("entity {id} committed");
            }
        }

        // (2) order/layer reassignments
        let order_changes = std::mem::take(&mut self.order_changes);
        for (id, new_key) in order_changes {
            if !self.resident.contains(&id) {
                continue;
            }
            let Some(Some(entity)) = self.entities.get_mut(&id) else {
                continue;
            };
            let old_key = entity.indexed_order;
            if old_key == new_key {
                continue;
            }
            entity.indexed_order = new_key;
            bucket_remove(&mut self.orders, old_key, id);
            self.orders.entry(new_key).or_default().push(id);
        }
        let layer_changes = std::mem::take(&mut self.layer_changes);
        for (id, new_key) in layer_changes {
            if !self.resident.contains(&id) {
                continue;
            }
            let Some(Some(entity)) = self.entities.get_mut(&id) else {
                continue;
            };
            let old_key = entity.indexed_layer;
            if old_key == new_key {
                continue;
            }
            entity.indexed_layer = new_key;
            bucket_remove(&mut self.layers, old_key, id);
            self.layers.entry(new_key).or_default().push(id);
        }

        // (3) removals; `removed` hooks may enqueue further removals
        while !self.to_remove.is_empty() {
            let batch = std::mem::take(&mut self.to_remove);
            for id in batch {
                let Some(mut entity) = self.entities.get_mut(&id).and_then(Option::take) else {
                    continue;
                };
                bucket_remove(&mut self.orders, entity.indexed_order, id);
                bucket_remove(&mut self.layers, entity.indexed_layer, id);
                self.resident.remove(&id);
                self.unregister_colliders(id);
                entity.set_instance_id(NO_ENTITY);
                entity.marked_for_removal = false;
                entity.detach_all_components(self);
                self.entities.remove(&id);
                log::debug!("entity {id} evicted");
            }
        }

        // (4) promote remove-next-frame requests
        let deferred = std::mem::take(&mut self.to_remove_next_frame);
        for id in deferred {
            if self.resident.contains(&id) && !self.to_remove.contains(&id) {
                if let Some(Some(entity)) = self.entities.get_mut(&id) {
                    entity.marked_for_removal = true;
                }
                self.to_remove.push(id);
            }
        }

        // (5) pause/resume transitions, each applied exactly once
        let pauses = std::mem::take(&mut self.groups_to_pause);
        for group in pauses {
            if self.paused_groups.insert(group) {
                log::debug!("group {group} paused");
                self.fire_group_transition(group, true);
            }
        }
        let resumes = std::mem::take(&mut self.groups_to_resume);
        for group in resumes {
            if self.paused_groups.remove(&group) {
                log::debug!("group {group} resumed");
                self.fire_group_transition(group, false);
            }
        }

        self.committing = false;
    }

    // ------------------------------------------------------------------
    // Phased entry points
    // ------------------------------------------------------------------

    /// First update phase: commit, then run every schedulable entity
    pub fn update_first_internal(&mut self, dt: f32) {
        self.update_lists();
        let snapshot = self.update_order();
        self.dispatching += 1;
        for id in snapshot {
            if !self.should_update(id) {
                continue;
            }
            if let Some(mut entity) = self.take_entity(id) {
                entity.update_first_internal(self, dt);
                self.put_back(id, entity);
            }
        }
        self.dispatching -= 1;
        self.run_update_hook(dt, HookPhase::First);
    }

    /// Main update phase; also ticks entity timers and lifespans
    pub fn update_internal(&mut self, dt: f32) {
        self.update_lists();
        let snapshot = self.update_order();
        self.dispatching += 1;
        for id in snapshot {
            if !self.should_update(id) {
                continue;
            }
            if let Some(mut entity) = self.take_entity(id) {
                entity.update_internal(self, dt);
                let expired = entity.life_span_expired;
                self.put_back(id, entity);
                if expired {
                    self.remove(id);
                }
            }
        }
        self.dispatching -= 1;
        self.run_update_hook(dt, HookPhase::Main);
    }

    /// Last update phase; detects order/layer reassignments afterwards
    pub fn update_last_internal(&mut self, dt: f32) {
        self.update_lists();
        let snapshot = self.update_order();
        self.dispatching += 1;
        for id in &snapshot {
            if !self.should_update(*id) {
                continue;
            }
            if let Some(mut entity) = self.take_entity(*id) {
                entity.update_last_internal(self, dt);
                self.put_back(*id, entity);
            }
        }
        self.dispatching -= 1;
        for graphic in &mut self.graphics {
            graphic.update(dt);
        }
        self.run_update_hook(dt, HookPhase::Last);

        // Opportunistic reassignment detection: diff each entity's live keys
        // against the bucket keys it is indexed under.
        for id in snapshot {
            let Some(Some(entity)) = self.entities.get(&id) else {
                continue;
            };
            if entity.order != entity.indexed_order {
                self.order_changes.push((id, entity.order));
            }
            if entity.layer != entity.indexed_layer {
                self.layer_changes.push((id, entity.layer));
            }
        }
    }

    /// Render dispatch: scene background graphics, entities by layer, then
    /// the foreground hook
    ///
    /// Layer buckets are walked in ascending key order, so a higher `layer`
    /// draws later and therefore on top.
    pub fn render_internal(&mut self, ctx: &mut RenderContext) {
        self.update_lists();

        self.render_scene_graphics(ctx);

        let ids: Vec<EntityId> = self.layers.values().flatten().copied().collect();
        for id in ids {
            let Some(Some(entity)) = self.entities.get(&id) else {
                continue;
            };
            if !entity.auto_render || !entity.visible || !entity.updated_once {
                continue;
            }
            if entity.surfaces().is_empty() {
                if let Some(surface) = ctx.current_target() {
                    entity.render_internal(surface);
                }
            } else {
                for key in entity.surfaces().to_vec() {
                    if ctx.push_target(key) {
                        if let Some(surface) = ctx.current_target() {
                            entity.render_internal(surface);
                        }
                        ctx.pop_target();
                    }
                }
            }
        }

        if let Some(mut hooks) = self.hooks.take() {
            hooks.render(self, ctx);
            self.hooks = Some(hooks);
        }
    }

    /// Recompute the camera from its focus entity and push the view
    ///
    /// The view goes to every surface that opted into scene camera tracking,
    /// plus the default target.
    pub fn update_camera(&mut self, ctx: &mut RenderContext) {
        if let Some(focus) = self.camera.focus {
            if let Some(Some(entity)) = self.entities.get(&focus) {
                self.camera.x = entity.x;
                self.camera.y = entity.y;
            }
        }
        let view = self.camera.view_position();
        ctx.apply_scene_view(view.x, view.y);
    }

    // ------------------------------------------------------------------
    // Scene-stack transitions
    // ------------------------------------------------------------------

    /// The scene became the active scene
    pub fn begin_internal(&mut self) {
        self.update_lists();
        self.run_transition_hook(HookEvent::Begin);
    }

    /// The scene left the active stack
    pub fn end_internal(&mut self) {
        self.update_lists();
        self.run_transition_hook(HookEvent::End);
    }

    /// Another scene was pushed above this one
    pub fn pause_internal(&mut self) {
        self.update_lists();
        self.run_transition_hook(HookEvent::Pause);
    }

    /// The scene above was popped
    pub fn resume_internal(&mut self) {
        self.update_lists();
        self.run_transition_hook(HookEvent::Resume);
    }

    // ------------------------------------------------------------------
    // Pause groups
    // ------------------------------------------------------------------

    /// Request that a group stop updating
    ///
    /// Cancels a pending resume for the same group if one exists un-applied;
    /// otherwise the pause is applied at the next commit.
    pub fn pause_group(&mut self, group: i32) {
        if let Some(pos) = self.groups_to_resume.iter().position(|&g| g == group) {
            self.groups_to_resume.remove(pos);
            return;
        }
        if self.paused_groups.contains(&group) || self.groups_to_pause.contains(&group) {
            return;
        }
        self.groups_to_pause.push(group);
    }

    /// Request that a paused group resume updating
    pub fn resume_group(&mut self, group: i32) {
        if let Some(pos) = self.groups_to_pause.iter().position(|&g| g == group) {
            self.groups_to_pause.remove(pos);
            return;
        }
        if !self.paused_groups.contains(&group) || self.groups_to_resume.contains(&group) {
            return;
        }
        self.groups_to_resume.push(group);
    }

    /// Effective pause state, including requests not yet applied
    pub fn is_group_paused(&self, group: i32) -> bool {
        if self.groups_to_pause.contains(&group) {
            return true;
        }
        if self.groups_to_resume.contains(&group) {
            return false;
        }
        self.paused_groups.contains(&group)
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    /// Resolve a resident entity
    pub fn get(&self, id: EntityId) -> Option<&Entity> {
        if !self.resident.contains(&id) {
            return None;
        }
        self.entities.get(&id).and_then(Option::as_ref)
    }

    /// Mutable access to a resident entity
    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        if !self.resident.contains(&id) {
            return None;
        }
        self.entities.get_mut(&id).and_then(Option::as_mut)
    }

    /// Number of resident entities
    pub fn entity_count(&self) -> usize {
        self.resident.len()
    }

    /// Resident ids in update sequence: ascending order key, insertion order
    /// within a bucket
    pub fn update_order(&self) -> Vec<EntityId> {
        self.orders.values().flatten().copied().collect()
    }

    /// Resident ids in draw sequence: ascending layer key, insertion order
    /// within a bucket; later entries draw on top
    pub fn render_order(&self) -> Vec<EntityId> {
        self.layers.values().flatten().copied().collect()
    }

    /// Resident ids whose group matches
    pub fn entities_in_group(&self, group: i32) -> Vec<EntityId> {
        self.update_order()
            .into_iter()
            .filter(|&id| self.get(id).is_some_and(|e| e.group == group))
            .collect()
    }

    /// Resident ids in the given layer bucket
    pub fn entities_in_layer(&self, layer: i32) -> Vec<EntityId> {
        self.layers.get(&layer).cloned().unwrap_or_default()
    }

    /// First resident entity with a component of type `C`
    pub fn get_entity_with<C: Component>(&self) -> Option<EntityId> {
        self.update_order()
            .into_iter()
            .find(|&id| self.get(id).is_some_and(Entity::has_component::<C>))
    }

    /// Every resident entity with a component of type `C`
    pub fn get_entities_with<C: Component>(&self) -> Vec<EntityId> {
        self.update_order()
            .into_iter()
            .filter(|&id| self.get(id).is_some_and(Entity::has_component::<C>))
            .collect()
    }

    // ------------------------------------------------------------------
    // Layer bucket ordering helpers
    // ------------------------------------------------------------------

    /// Move an entity to the end of its layer bucket (drawn last, on top)
    pub fn bring_to_front(&mut self, id: EntityId) -> bool {
        self.reposition_in_layer(id, |bucket, pos| {
            let moved = bucket.remove(pos);
            bucket.push(moved);
        })
    }

    /// Move an entity to the start of its layer bucket (drawn first)
    pub fn send_to_back(&mut self, id: EntityId) -> bool {
        self.reposition_in_layer(id, |bucket, pos| {
            let moved = bucket.remove(pos);
            bucket.insert(0, moved);
        })
    }

    /// Swap an entity one step toward the top of its layer bucket
    pub fn bring_forward(&mut self, id: EntityId) -> bool {
        self.reposition_in_layer(id, |bucket, pos| {
            if pos + 1 < bucket.len() {
                bucket.swap(pos, pos + 1);
            }
        })
    }

    /// Swap an entity one step toward the back of its layer bucket
    pub fn send_backward(&mut self, id: EntityId) -> bool {
        self.reposition_in_layer(id, |bucket, pos| {
            if pos > 0 {
                bucket.swap(pos, pos - 1);
            }
        })
    }

    // ------------------------------------------------------------------
    // Colliders
    // ------------------------------------------------------------------

    /// Attach a collider to an entity, registering its tags immediately when
    /// the entity is resident
    pub fn add_collider(&mut self, id: EntityId, collider: Collider) -> Option<ColliderId> {
        let collider_id = match self.entities.get_mut(&id) {
            Some(Some(entity)) => entity.add_collider(collider),
            _ => {
                log::debug!("add_collider: entity {id} not available");
                return None;
            }
        };
        if self.resident.contains(&id) {
            self.resync_colliders(id);
        }
        Some(collider_id)
    }

    /// Detach a collider from an entity, unregistering its tags
    pub fn remove_collider(&mut self, id: EntityId, collider_id: ColliderId) -> bool {
        let removed = match self.entities.get_mut(&id) {
            Some(Some(entity)) => entity.remove_collider(collider_id).is_some(),
            _ => false,
        };
        if removed && self.resident.contains(&id) {
            self.resync_colliders(id);
        }
        removed
    }

    /// Snapshot of the colliders registered under a tag
    ///
    /// Returns a copy, never backing storage, so the caller may mutate the
    /// scene while iterating. Unknown tags yield an empty vec.
    pub fn colliders_with_tag(&self, tag: i32) -> Vec<ColliderRef> {
        self.collider_index.get(&tag).cloned().unwrap_or_default()
    }

    /// Resolve a collider handle
    pub fn collider(&self, reference: ColliderRef) -> Option<&Collider> {
        self.get(reference.entity)?.collider(reference.collider)
    }

    /// Test a collidable entity's colliders against a tag bucket
    ///
    /// Returns the first overlapping collider of another collidable entity.
    pub fn overlap_entity(&self, id: EntityId, tag: i32) -> Option<ColliderRef> {
        let entity = self.get(id)?;
        if !entity.collidable {
            return None;
        }
        let origin = Vec2::new(entity.x, entity.y);
        for (_, mine) in entity.colliders() {
            if let Some(hit) = self.overlap_shape(mine, origin, id, tag) {
                return Some(hit);
            }
        }
        None
    }

    /// Test one collider shape against a tag bucket
    ///
    /// `exclude` skips that entity's own colliders. Unlike
    /// [`overlap_entity`](Self::overlap_entity) this needs no resident
    /// lookup of the querying entity, so a component can call it for the
    /// entity it is currently running on.
    pub fn overlap_shape(
        &self,
        shape: &Collider,
        origin: Vec2,
        exclude: EntityId,
        tag: i32,
    ) -> Option<ColliderRef> {
        let bucket = self.collider_index.get(&tag)?;
        for reference in bucket {
            if reference.entity == exclude {
                continue;
            }
            let Some(other) = self.get(reference.entity) else {
                continue;
            };
            if !other.collidable {
                continue;
            }
            let Some(other_collider) = other.collider(reference.collider) else {
                continue;
            };
            if shape.overlaps(origin, other_collider, Vec2::new(other.x, other.y)) {
                return Some(*reference);
            }
        }
        None
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    fn take_entity(&mut self, id: EntityId) -> Option<Entity> {
        self.entities.get_mut(&id).and_then(Option::take)
    }

    fn put_back(&mut self, id: EntityId, mut entity: Entity) {
        entity.marked_for_removal = self.to_remove.contains(&id);
        let resync = entity.colliders_dirty && self.resident.contains(&id);
        if let Some(slot) = self.entities.get_mut(&id) {
            *slot = Some(entity);
        }
        if resync {
            self.resync_colliders(id);
        }
    }

    fn should_update(&self, id: EntityId) -> bool {
        match self.entities.get(&id) {
            Some(Some(entity)) => entity.auto_update && !self.paused_groups.contains(&entity.group),
            _ => false,
        }
    }

    fn fire_group_transition(&mut self, group: i32, pausing: bool) {
        for id in self.update_order() {
            let matches = matches!(self.entities.get(&id), Some(Some(e)) if e.group == group);
            if !matches {
                continue;
            }
            if let Some(mut entity) = self.take_entity(id) {
                if pausing {
                    entity.dispatch_paused(self);
                } else {
                    entity.dispatch_resumed(self);
                }
                self.put_back(id, entity);
            }
        }
    }

    fn run_update_hook(&mut self, dt: f32, phase: HookPhase) {
        if let Some(mut hooks) = self.hooks.take() {
            match phase {
                HookPhase::First => hooks.update_first(self, dt),
                HookPhase::Main => hooks.update(self, dt),
                HookPhase::Last => hooks.update_last(self, dt),
            }
            self.hooks = Some(hooks);
        }
    }

    fn run_transition_hook(&mut self, event: HookEvent) {
        if let Some(mut hooks) = self.hooks.take() {
            match event {
                HookEvent::Begin => hooks.begin(self),
                HookEvent::End => hooks.end(self),
                HookEvent::Pause => hooks.pause(self),
                HookEvent::Resume => hooks.resume(self),
            }
            self.hooks = Some(hooks);
        }
    }

    fn render_scene_graphics(&self, ctx: &mut RenderContext) {
        if self.graphics.is_empty() {
            return;
        }
        if self.surfaces.is_empty() {
            if let Some(surface) = ctx.current_target() {
                for graphic in &self.graphics {
                    graphic.render(0.0, 0.0, surface);
                }
            }
        } else {
            for key in self.surfaces.clone() {
                if ctx.push_target(key) {
                    if let Some(surface) = ctx.current_target() {
                        for graphic in &self.graphics {
                            graphic.render(0.0, 0.0, surface);
                        }
                    }
                    ctx.pop_target();
                }
            }
        }
    }

    fn reposition_in_layer(
        &mut self,
        id: EntityId,
        apply: impl FnOnce(&mut Vec<EntityId>, usize),
    ) -> bool {
        let Some(entity) = self.get(id) else {
            return false;
        };
        let key = entity.indexed_layer;
        let Some(bucket) = self.layers.get_mut(&key) else {
            return false;
        };
        let Some(pos) = bucket.iter().position(|&e| e == id) else {
            return false;
        };
        apply(bucket, pos);
        true
    }

    fn resync_colliders(&mut self, id: EntityId) {
        self.unregister_colliders(id);
        let refs: Vec<(ColliderId, Vec<i32>)> = match self.entities.get_mut(&id) {
            Some(Some(entity)) => {
                entity.clear_colliders_dirty();
                entity
                    .colliders()
                    .map(|(cid, c)| (cid, c.tags().to_vec()))
                    .collect()
            }
            _ => return,
        };
        for (collider_id, tags) in refs {
            for tag in tags {
                self.collider_index.entry(tag).or_default().push(ColliderRef {
                    entity: id,
                    collider: collider_id,
                });
            }
        }
    }

    fn unregister_colliders(&mut self, id: EntityId) {
        self.collider_index.retain(|_, bucket| {
            bucket.retain(|r| r.entity != id);
            !bucket.is_empty()
        });
    }
}

fn bucket_remove(buckets: &mut BTreeMap<i32, Vec<EntityId>>, key: i32, id: EntityId) {
    if let Some(bucket) = buckets.get_mut(&key) {
        bucket.retain(|&e| e != id);
        if bucket.is_empty() {
            buckets.remove(&key);
        }
    }
}
