//! Demo scene
//!
//! A player that turns in place and scans ahead with a raycast, a crate it
//! can bump into, and a system script that despawns the crate after a few
//! seconds.

use glam::Vec3;
use tether_asset::{AnimationClip, AudioClip};
use tether_core::{Entity, FrameTime, Space};
use tether_script::components::{Animation, ForceMode, PhysicsBody};
use tether_script::headless::HeadlessHost;
use tether_script::marshal::{encode_records, ContactPoint};
use tether_script::{Collision, Script, ScriptContext, ScriptResult, ScriptRuntime};

pub struct Scene {
    pub player: Entity,
    pub crate_entity: Entity,
    /// Contact buffer for a player/crate collision.
    pub impact: Vec<u8>,
}

pub fn build(runtime: &mut ScriptRuntime<HeadlessHost>) -> anyhow::Result<Scene> {
    let host = runtime.host_mut();
    host.register_asset::<AnimationClip>("anim/idle");
    host.register_audio_clip("sfx/thud", 0.4);

    let mut world = runtime.world();
    let player = world.create_entity("Player");
    world.set_name(player, "Hero")?;
    world.add_component::<PhysicsBody>(player)?;
    world.add_component::<Animation>(player)?;

    let crate_entity = world.create_entity("Crate");
    world
        .transform(crate_entity)
        .ok_or_else(|| anyhow::anyhow!("crate has no transform"))?
        .set_position(&mut world, Space::Global, Vec3::new(0.0, 0.0, -6.0))?;
    world.add_component::<PhysicsBody>(crate_entity)?;

    let host = runtime.host_mut();
    host.set_collider(player, 0.5, 0, false);
    host.set_collider(crate_entity, 1.0, 0, false);

    runtime.attach_script(player, PlayerController::default())?;
    runtime.spawn_system(Despawner {
        tag: "Crate",
        after_seconds: 1.5,
        elapsed: 0.0,
    });

    let impact = encode_records(&[ContactPoint {
        point: Vec3::new(0.0, 0.0, -5.0),
        normal: Vec3::Z,
        distance: 0.0,
        impulse: 4.0,
    }]);
    Ok(Scene {
        player,
        crate_entity,
        impact,
    })
}

#[derive(Default)]
struct PlayerController {
    seen: Option<Entity>,
}

impl Script for PlayerController {
    fn on_start(&mut self, ctx: &mut ScriptContext<'_>) -> ScriptResult {
        let Some(owner) = ctx.owner() else {
            return Ok(());
        };
        let mut world = ctx.world();
        let idle = world.assets().resolve_key::<AnimationClip>("anim/idle")?;
        if let Some(animation) = world.get_component::<Animation>(owner) {
            animation.blend(&mut world, idle, 0.25)?;
        }
        Ok(())
    }

    fn on_update(&mut self, ctx: &mut ScriptContext<'_>, time: FrameTime) -> ScriptResult {
        let Some(owner) = ctx.owner() else {
            return Ok(());
        };
        let options = ctx.raycast_options();
        let mut world = ctx.world();
        let transform = world.transform(owner).ok_or("player lost its transform")?;
        transform.rotate_by_euler(
            &mut world,
            Space::Global,
            Vec3::new(0.0, 90.0 * time.scaled_delta(), 0.0),
        )?;

        let forward = transform.forward(&world)?;
        let seen = world.raycast_from(owner, forward, &options)?.map(|hit| hit.entity);
        if seen != self.seen {
            match seen {
                Some(entity) => tracing::info!(entity = %entity, "player sees"),
                None => tracing::info!("player sees nothing"),
            }
            self.seen = seen;
        }
        Ok(())
    }

    fn on_collision_enter(
        &mut self,
        ctx: &mut ScriptContext<'_>,
        collision: &Collision,
    ) -> ScriptResult {
        let Some(owner) = ctx.owner() else {
            return Ok(());
        };
        let mut world = ctx.world();
        let thud = world.assets().resolve_key::<AudioClip>("sfx/thud")?;
        tracing::info!(
            with = %collision.entity,
            contacts = collision.contacts.len(),
            sound_seconds = thud.length(world.host()),
            "bump"
        );
        if let Some(body) = world.get_component::<PhysicsBody>(owner) {
            let push: Vec3 = collision.contacts.iter().map(|c| c.normal * c.impulse).sum();
            body.apply_force(&mut world, push, ForceMode::Impulse)?;
        }
        Ok(())
    }

    fn on_destroy(&mut self, ctx: &mut ScriptContext<'_>) -> ScriptResult {
        tracing::info!(script = ?ctx.script_id(), "player controller torn down");
        Ok(())
    }
}

/// Destroys the first entity tagged `tag` once `after_seconds` of game time
/// have passed.
struct Despawner {
    tag: &'static str,
    after_seconds: f32,
    elapsed: f32,
}

impl Script for Despawner {
    fn on_update(&mut self, ctx: &mut ScriptContext<'_>, time: FrameTime) -> ScriptResult {
        self.elapsed += time.scaled_delta();
        if self.elapsed < self.after_seconds {
            return Ok(());
        }
        let target = ctx.world().find_by_tag(self.tag);
        if let Some(entity) = target {
            tracing::info!(entity = %entity, tag = self.tag, "despawning");
            ctx.commands().destroy_entity(entity);
        }
        if let Some(id) = ctx.script_id() {
            ctx.commands().destroy_script(id);
        }
        Ok(())
    }
}
