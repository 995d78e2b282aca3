//! # Kestrel Engine
//!
//! The object-lifecycle and update/render scheduling core of a 2D game
//! runtime.
//!
//! ## Features
//!
//! - **Deferred structural mutation**: entity adds, removes, and reorderings
//!   commit at one choke point, so hooks may mutate the scene mid-iteration
//! - **Phased scheduling**: a fixed update-first/update/update-last/render
//!   sequence with deterministic per-frame ordering
//! - **Structural indices**: update-order buckets, render-layer buckets, and
//!   a collider tag index kept consistent by the commit protocol
//! - **Pause groups**: pause and resume whole groups of entities together
//! - **Contract-only rendering**: graphics and surfaces are traits; bring
//!   your own backend
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use kestrel_engine::prelude::*;
//!
//! struct Mover;
//!
//! impl Component for Mover {
//!     fn update(&mut self, entity: &mut Entity, _scene: &mut Scene, dt: f32) {
//!         entity.x += 60.0 * dt;
//!     }
//! }
//!
//! fn main() -> Result<(), GameError> {
//!     let mut scene = Scene::new();
//!     let mut hero = Entity::at(16.0, 32.0);
//!     hero.add_component(Box::new(Mover));
//!     scene.add(hero);
//!
//!     let mut game = Game::with_first_scene(scene);
//!     let mut ctx = RenderContext::new();
//!     loop {
//!         game.update(1.0 / 60.0)?;
//!         game.render(&mut ctx)?;
//!     }
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names, clippy::too_many_arguments)]

pub mod config;
pub mod entity;
pub mod foundation;
pub mod physics;
pub mod render;
pub mod scene;

mod game;

pub use game::{Game, GameError};

/// Common imports for engine users
pub mod prelude {
    pub use crate::{
        config::{Config, ConfigError, GameConfig},
        entity::{Component, ComponentId, Entity},
        foundation::{
            math::{Rect, Vec2},
            time::{Stopwatch, Timer},
        },
        physics::{Collider, ColliderId, ColliderRef, ColliderShape},
        render::{DrawCall, Graphic, RenderContext, Surface, SurfaceKey},
        scene::{Camera, EntityId, Scene, SceneHooks, NO_ENTITY},
        Game, GameError,
    };
}
