//! Game driver: the scene stack and the per-frame phase sequence
//!
//! The windowing loop, input polling, and timestep policy live outside the
//! crate; the embedding host owns those and calls [`Game::update`] and
//! [`Game::render`] once per frame with its delta. The game owns the scene
//! stack and guarantees the fixed phase order the scenes rely on.

use thiserror::Error;

use crate::render::RenderContext;
use crate::scene::Scene;

/// Game driver errors
#[derive(Error, Debug)]
pub enum GameError {
    /// A frame was driven with no scene on the stack
    #[error("no active scene on the stack")]
    NoActiveScene,
}

enum SceneOp {
    Switch(Scene),
    Push(Scene),
    Pop,
}

/// Owns the scene stack and drives the active scene through its phases
///
/// Scene-stack changes are request-only; they apply between frames, at the
/// head of [`update`](Self::update), so a switch requested mid-frame never
/// tears down the scene that is still being iterated.
pub struct Game {
    scenes: Vec<Scene>,
    pending_ops: Vec<SceneOp>,
}

impl Default for Game {
    fn default() -> Self {
        Self::new()
    }
}

impl Game {
    /// Create a game with an empty scene stack
    pub fn new() -> Self {
        Self {
            scenes: Vec::new(),
            pending_ops: Vec::new(),
        }
    }

    /// Create a game with an initial scene queued
    pub fn with_first_scene(scene: Scene) -> Self {
        let mut game = Self::new();
        game.push_scene(scene);
        game
    }

    /// Request that the active scene be replaced
    pub fn switch_scene(&mut self, scene: Scene) {
        self.pending_ops.push(SceneOp::Switch(scene));
    }

    /// Request that a scene be pushed above the active one
    pub fn push_scene(&mut self, scene: Scene) {
        self.pending_ops.push(SceneOp::Push(scene));
    }

    /// Request that the active scene be popped
    pub fn pop_scene(&mut self) {
        self.pending_ops.push(SceneOp::Pop);
    }

    /// The active scene
    pub fn scene(&self) -> Option<&Scene> {
        self.scenes.last()
    }

    /// Mutable access to the active scene
    pub fn scene_mut(&mut self) -> Option<&mut Scene> {
        self.scenes.last_mut()
    }

    /// Number of scenes on the stack; queued requests are not counted until
    /// they apply
    pub fn scene_count(&self) -> usize {
        self.scenes.len()
    }

    /// Drive one frame of updates through the active scene
    ///
    /// Applies pending scene-stack changes first, then runs the fixed phase
    /// sequence: update-first, update, update-last.
    pub fn update(&mut self, dt: f32) -> Result<(), GameError> {
        self.apply_scene_ops();
        let scene = self.scenes.last_mut().ok_or(GameError::NoActiveScene)?;
        scene.update_first_internal(dt);
        scene.update_internal(dt);
        scene.update_last_internal(dt);
        Ok(())
    }

    /// Render the active scene: camera first, then render dispatch
    pub fn render(&mut self, ctx: &mut RenderContext) -> Result<(), GameError> {
        let scene = self.scenes.last_mut().ok_or(GameError::NoActiveScene)?;
        scene.update_camera(ctx);
        scene.render_internal(ctx);
        Ok(())
    }

    fn apply_scene_ops(&mut self) {
        for op in std::mem::take(&mut self.pending_ops) {
            match op {
                SceneOp::Switch(scene) => {
                    if let Some(mut old) = self.scenes.pop() {
                        old.end_internal();
                    }
                    log::info!("switching to new scene");
                    self.scenes.push(scene);
                    if let Some(new) = self.scenes.last_mut() {
                        new.begin_internal();
                    }
                }
                SceneOp::Push(scene) => {
                    if let Some(below) = self.scenes.last_mut() {
                        below.pause_internal();
                    }
                    log::info!("pushing scene (depth {})", self.scenes.len() + 1);
                    self.scenes.push(scene);
                    if let Some(new) = self.scenes.last_mut() {
                        new.begin_internal();
                    }
                }
                SceneOp::Pop => {
                    if let Some(mut old) = self.scenes.pop() {
                        old.end_internal();
                        log::info!("popped scene (depth {})", self.scenes.len());
                    }
                    if let Some(below) = self.scenes.last_mut() {
                        below.resume_internal();
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::SceneHooks;
    use std::cell::RefCell;
    use std::rc::Rc;

    type CallLog = Rc<RefCell<Vec<&'static str>>>;

    struct HookProbe {
        name: &'static str,
        log: CallLog,
    }

    impl SceneHooks for HookProbe {
        fn begin(&mut self, _scene: &mut Scene) {
            self.log.borrow_mut().push(self.name);
            self.log.borrow_mut().push("begin");
        }

        fn end(&mut self, _scene: &mut Scene) {
            self.log.borrow_mut().push(self.name);
            self.log.borrow_mut().push("end");
        }

        fn pause(&mut self, _scene: &mut Scene) {
            self.log.borrow_mut().push(self.name);
            self.log.borrow_mut().push("pause");
        }

        fn resume(&mut self, _scene: &mut Scene) {
            self.log.borrow_mut().push(self.name);
            self.log.borrow_mut().push("resume");
        }
    }

    fn probed_scene(name: &'static str, log: &CallLog) -> Scene {
        let mut scene = Scene::new();
        scene.set_hooks(Box::new(HookProbe {
            name,
            log: log.clone(),
        }));
        scene
    }

    #[test]
    fn test_update_without_scene_fails() {
        let mut game = Game::new();
        assert!(matches!(game.update(0.016), Err(GameError::NoActiveScene)));
    }

    #[test]
    fn test_push_pauses_below_and_pop_resumes() {
        let log: CallLog = Rc::new(RefCell::new(Vec::new()));
        let mut game = Game::with_first_scene(probed_scene("base", &log));
        game.update(0.016).unwrap();
        assert_eq!(*log.borrow(), vec!["base", "begin"]);
        log.borrow_mut().clear();

        game.push_scene(probed_scene("overlay", &log));
        game.update(0.016).unwrap();
        assert_eq!(
            *log.borrow(),
            vec!["base", "pause", "overlay", "begin"]
        );
        log.borrow_mut().clear();

        game.pop_scene();
        game.update(0.016).unwrap();
        assert_eq!(*log.borrow(), vec!["overlay", "end", "base", "resume"]);
    }

    #[test]
    fn test_switch_ends_old_scene() {
        let log: CallLog = Rc::new(RefCell::new(Vec::new()));
        let mut game = Game::with_first_scene(probed_scene("first", &log));
        game.update(0.016).unwrap();
        log.borrow_mut().clear();

        game.switch_scene(probed_scene("second", &log));
        game.update(0.016).unwrap();
        assert_eq!(*log.borrow(), vec!["first", "end", "second", "begin"]);
        assert_eq!(game.scene_count(), 1);
    }

    #[test]
    fn test_ops_are_deferred_to_the_next_update() {
        let mut game = Game::new();
        game.push_scene(Scene::new());
        assert_eq!(game.scene_count(), 0, "push applies at the next update");

        game.update(0.016).unwrap();
        assert_eq!(game.scene_count(), 1);
    }

    #[test]
    fn test_frame_drives_entities() {
        use crate::entity::Entity;

        let mut game = Game::with_first_scene(Scene::new());
        game.update(0.016).unwrap();

        let id = game.scene_mut().unwrap().add(Entity::new());
        game.update(0.016).unwrap();

        let scene = game.scene().unwrap();
        let entity = scene.get(id).expect("committed by the frame");
        assert!(entity.updated_once());
    }
}
