//! Sandbox demo application
//!
//! Exercises the engine core end-to-end without a rendering backend: a
//! counting surface stands in for the GPU, a handful of components drive
//! entities around, and the fixed phase sequence runs for a few simulated
//! seconds while pause groups and collider queries do their thing.

use kestrel_engine::prelude::*;

/// Surface that counts submissions instead of drawing them
struct CountingSurface {
    label: &'static str,
    submissions: u64,
    view: (f32, f32),
}

impl CountingSurface {
    fn new(label: &'static str) -> Self {
        Self {
            label,
            submissions: 0,
            view: (0.0, 0.0),
        }
    }
}

impl Drop for CountingSurface {
    fn drop(&mut self) {
        log::info!(
            "surface '{}' recorded {} submissions, final view ({:.1}, {:.1})",
            self.label,
            self.submissions,
            self.view.0,
            self.view.1
        );
    }
}

impl Surface for CountingSurface {
    fn name(&self) -> &str {
        self.label
    }

    fn set_view(&mut self, x: f32, y: f32) {
        self.view = (x, y);
    }

    fn submit(&mut self, _call: DrawCall) {
        self.submissions += 1;
    }
}

/// Marker graphic submitting one draw call per frame
struct Sprite {
    kind: &'static str,
}

impl Graphic for Sprite {
    fn render(&self, x: f32, y: f32, surface: &mut dyn Surface) {
        surface.submit(DrawCall {
            x,
            y,
            kind: self.kind,
        });
    }
}

/// Drifts its entity along a velocity, bouncing off the arena edges
struct Drifter {
    vx: f32,
    vy: f32,
}

impl Component for Drifter {
    fn update(&mut self, entity: &mut Entity, _scene: &mut Scene, dt: f32) {
        entity.x += self.vx * dt;
        entity.y += self.vy * dt;

        if entity.x < 0.0 || entity.x > 320.0 {
            self.vx = -self.vx;
            entity.x = entity.x.clamp(0.0, 320.0);
        }
        if entity.y < 0.0 || entity.y > 240.0 {
            self.vy = -self.vy;
            entity.y = entity.y.clamp(0.0, 240.0);
        }
    }
}

/// Logs collider contacts against the "hazard" tag
struct ContactReporter {
    tag: i32,
    contacts: u32,
}

impl Component for ContactReporter {
    fn update(&mut self, entity: &mut Entity, scene: &mut Scene, _dt: f32) {
        let origin = Vec2::new(entity.x, entity.y);
        let id = entity.instance_id();
        let hit = entity
            .colliders()
            .find_map(|(_, collider)| scene.overlap_shape(collider, origin, id, self.tag));
        if let Some(hit) = hit {
            self.contacts += 1;
            log::debug!(
                "entity {id} touched collider {hit:?} ({} contacts so far)",
                self.contacts
            );
        }
    }
}

/// Spawns a short-lived spark entity every interval
struct SparkEmitter {
    interval: f32,
    since_last: f32,
}

impl Component for SparkEmitter {
    fn update(&mut self, entity: &mut Entity, scene: &mut Scene, dt: f32) {
        self.since_last += dt;
        if self.since_last < self.interval {
            return;
        }
        self.since_last = 0.0;

        let mut spark = Entity::at(entity.x, entity.y);
        spark.layer = 10;
        spark.life_span = 0.5;
        spark.add_graphic(Box::new(Sprite { kind: "spark" }));
        scene.add(spark);
    }
}

const TAG_HAZARD: i32 = 1;
const GROUP_ENEMIES: i32 = 2;

fn build_scene(ctx: &mut RenderContext) -> Scene {
    let mut scene = Scene::new();

    // Backdrop drawn before any entity.
    scene.add_graphic(Box::new(Sprite { kind: "backdrop" }));

    // The player: followed by the camera, collides against hazards.
    let mut player = Entity::at(160.0, 120.0);
    player.layer = 5;
    player.add_graphic(Box::new(Sprite { kind: "player" }));
    player.add_component(Box::new(Drifter { vx: 40.0, vy: 25.0 }));
    player.add_component(Box::new(ContactReporter {
        tag: TAG_HAZARD,
        contacts: 0,
    }));
    player.add_component(Box::new(SparkEmitter {
        interval: 0.75,
        since_last: 0.0,
    }));
    player.add_collider(Collider::rect(16.0, 16.0, &[3]));
    let player_id = scene.add(player);

    scene.camera.focus = Some(player_id);
    scene.camera.set_bounds(Rect::new(0.0, 0.0, 320.0, 240.0));

    // A few drifting hazards in their own pause group.
    for i in 0..4 {
        let mut hazard = Entity::at(40.0 + 60.0 * i as f32, 200.0);
        hazard.layer = 4;
        hazard.group = GROUP_ENEMIES;
        hazard.add_graphic(Box::new(Sprite { kind: "hazard" }));
        hazard.add_component(Box::new(Drifter {
            vx: -30.0 + 12.0 * i as f32,
            vy: 18.0,
        }));
        hazard.add_collider(Collider::circle(8.0, &[TAG_HAZARD]));
        scene.add(hazard);
    }

    // A HUD overlay routed to its own surface on the top layer.
    let hud_surface = ctx.register_surface(Box::new(CountingSurface::new("hud")), false);
    let mut hud = Entity::new();
    hud.layer = 100;
    hud.add_graphic(Box::new(Sprite { kind: "hud" }));
    hud.add_surface(hud_surface);
    scene.add(hud);

    scene
}

fn main() {
    env_logger::init();

    let config = GameConfig::load_from_file("sandbox.toml").unwrap_or_else(|err| {
        log::info!("using default config ({err})");
        GameConfig::default()
    });
    log::info!(
        "starting '{}' at {}x{}, {} fps",
        config.title,
        config.width,
        config.height,
        config.target_fps
    );

    let mut ctx = RenderContext::new();
    ctx.register_surface(Box::new(CountingSurface::new("screen")), true);

    let scene = build_scene(&mut ctx);
    let mut game = Game::with_first_scene(scene);

    let dt = 1.0 / config.target_fps;
    let total_frames = (config.target_fps * 5.0) as u32;

    for frame in 0..total_frames {
        // Pause the hazards for the middle second of the run.
        if frame == config.target_fps as u32 * 2 {
            if let Some(scene) = game.scene_mut() {
                scene.pause_group(GROUP_ENEMIES);
                log::info!("hazards paused");
            }
        }
        if frame == config.target_fps as u32 * 3 {
            if let Some(scene) = game.scene_mut() {
                scene.resume_group(GROUP_ENEMIES);
                log::info!("hazards resumed");
            }
        }

        if let Err(err) = game.update(dt) {
            log::error!("update failed: {err}");
            return;
        }
        if let Err(err) = game.render(&mut ctx) {
            log::error!("render failed: {err}");
            return;
        }
    }

    if let Some(scene) = game.scene() {
        log::info!(
            "done: {} entities resident after {} frames",
            scene.entity_count(),
            total_frames
        );
        println!(
            "sandbox finished: {} frames, {} entities resident, camera at ({:.1}, {:.1})",
            total_frames,
            scene.entity_count(),
            scene.camera.x,
            scene.camera.y
        );
    }
}
