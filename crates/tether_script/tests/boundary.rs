use std::cell::RefCell;
use std::rc::Rc;

use glam::Vec3;
use tether_asset::{AssetError, Material, Texture};
use tether_core::{Entity, FrameTime, Space};
use tether_script::components::{register_builtin, PhysicsBody, Transform};
use tether_script::headless::HeadlessHost;
use tether_script::marshal::{decode_records, encode_records, ContactPoint, RaycastHit};
use tether_script::{
    BoundaryError, Commands, Dispatcher, PayloadError, RuntimeSettings, Script, ScriptContext,
    ScriptResult, ScriptRuntime, World,
};

fn host() -> HeadlessHost {
    register_builtin().expect("builtin components register");
    HeadlessHost::new()
}

#[test]
fn destroyed_entity_stays_invalid_and_destroy_is_repeatable() {
    let mut host = host();
    let mut world = World::new(&mut host);
    let e = world.create_entity("Rock");

    assert!(world.destroy_entity(e));
    for _ in 0..3 {
        assert!(!world.destroy_entity(e));
        assert!(!world.is_valid(e));
    }
    // Later entities never bring the id back.
    let others: Vec<Entity> = (0..8).map(|_| world.create_entity("Rock")).collect();
    assert!(!others.contains(&e));
    assert!(!world.is_valid(e));
}

#[test]
fn proxy_validity_tracks_removal() {
    let mut host = host();
    let e = {
        let mut world = World::new(&mut host);
        let e = world.create_entity("Crate");
        world.add_component::<PhysicsBody>(e).unwrap();
        e
    };

    let mut world = World::new(&mut host);
    assert!(world.has_component::<PhysicsBody>(e));
    let body = world.get_component::<PhysicsBody>(e).unwrap();
    assert!(body.is_valid(&world));

    world.remove_component::<PhysicsBody>(e).unwrap();
    assert!(!body.is_valid(&world));
    let err = body
        .apply_force(&mut world, Vec3::Y, Default::default())
        .unwrap_err();
    assert!(matches!(err, BoundaryError::MissingComponent { .. }));
}

#[test]
fn proxy_validity_tracks_native_detach() {
    let mut host = host();
    let e = host_entity(&mut host, "Crate");
    let body = World::new(&mut host).add_component::<PhysicsBody>(e).unwrap();

    host.detach_external(e, body.component_type());
    let world = World::new(&mut host);
    assert!(!body.is_valid(&world));
    assert_eq!(world.get_component::<PhysicsBody>(e), None);
}

fn host_entity(host: &mut HeadlessHost, tag: &str) -> Entity {
    World::new(host).create_entity(tag)
}

#[test]
fn subscription_order_is_stable() {
    let mut host = host();
    let mut commands = Commands::new();
    let settings = RuntimeSettings::default();
    let dispatcher = Dispatcher::new();
    let log = Rc::new(RefCell::new(String::new()));

    let tokens: Vec<_> = ["A", "B", "C"]
        .into_iter()
        .map(|name| {
            let log = Rc::clone(&log);
            dispatcher.subscribe(move |_: &mut ScriptContext<'_>| {
                log.borrow_mut().push_str(name);
                Ok(())
            })
        })
        .collect();

    let frame = FrameTime::new(0.02, 1.0);
    dispatcher.dispatch_frame(&mut host, &mut commands, &settings, frame);
    assert_eq!(*log.borrow(), "ABC");

    dispatcher.unsubscribe(tokens[1]);
    dispatcher.unsubscribe(tokens[1]);
    log.borrow_mut().clear();
    dispatcher.dispatch_frame(&mut host, &mut commands, &settings, frame);
    assert_eq!(*log.borrow(), "AC");
}

#[test]
fn error_in_one_callback_does_not_skip_later_ones() {
    let mut host = host();
    let mut commands = Commands::new();
    let settings = RuntimeSettings::default();
    let dispatcher = Dispatcher::new();
    let ran = Rc::new(RefCell::new(false));

    dispatcher.subscribe(|ctx: &mut ScriptContext<'_>| {
        ctx.world().ensure_valid(Entity::NULL)?;
        Ok(())
    });
    {
        let ran = Rc::clone(&ran);
        dispatcher.subscribe(move |_: &mut ScriptContext<'_>| {
            *ran.borrow_mut() = true;
            Ok(())
        });
    }

    let report =
        dispatcher.dispatch_frame(&mut host, &mut commands, &settings, FrameTime::default());
    assert!(*ran.borrow());
    assert_eq!(report.failed, 1);
}

#[test]
fn contact_records_round_trip() {
    let contacts: Vec<ContactPoint> = (0..7)
        .map(|i| {
            let f = i as f32;
            ContactPoint {
                point: Vec3::new(f, -f, 2.0 * f),
                normal: Vec3::new(0.0, 2.0, 0.0),
                distance: -f,
                impulse: f * 1.5,
            }
        })
        .collect();
    let bytes = encode_records(&contacts);
    let decoded = decode_records::<ContactPoint>(&bytes).unwrap();
    assert_eq!(decoded.len(), contacts.len());
    assert_eq!(decoded, contacts);

    let err = decode_records::<RaycastHit>(&bytes[..bytes.len() - 4]).unwrap_err();
    assert_eq!(
        err,
        PayloadError::LengthMismatch {
            record: "RaycastHit",
            len: 7 * 32 - 4,
            record_size: 32,
        }
    );
}

#[test]
fn missing_asset_is_not_found() {
    let mut host = host();
    host.register_asset::<Texture>("textures/brick");
    let world = World::new(&mut host);

    let err = world
        .assets()
        .resolve_key::<Texture>("missing-key")
        .unwrap_err();
    assert!(matches!(err, AssetError::NotFound { kind: "Texture", .. }));

    // Right key under the wrong kind is a miss too.
    assert!(world.assets().resolve_key::<Material>("textures/brick").is_err());
}

#[test]
fn resolving_twice_yields_equal_handles() {
    let mut host = host();
    let uid = host.register_asset::<Texture>("textures/brick");
    let world = World::new(&mut host);

    let a = world.assets().resolve_key::<Texture>("textures/brick").unwrap();
    let b = world.assets().resolve_key::<Texture>("textures/brick").unwrap();
    let c = world.assets().resolve_uid::<Texture>(uid).unwrap();
    assert_eq!(a, b);
    assert_eq!(b, c);
    assert_eq!(a.uid(), uid);
}

#[test]
fn player_scenario() {
    let mut host = host();
    let mut world = World::new(&mut host);

    let player = world.create_entity("Player");
    let transform = world.add_component::<Transform>(player).unwrap();
    transform
        .set_position(&mut world, Space::Local, Vec3::new(1.0, 2.0, 3.0))
        .unwrap();

    let fetched = world.get_component::<Transform>(player).unwrap();
    assert_eq!(
        fetched.position(&world, Space::Local).unwrap(),
        Vec3::new(1.0, 2.0, 3.0)
    );
    assert_eq!(world.find_by_tag("Player"), Some(player));

    world.destroy_entity(player);
    assert_eq!(world.get_component::<Transform>(player), None);
    assert_eq!(world.transform(player), None);
}

struct Spawner {
    spawned: Rc<RefCell<Option<Entity>>>,
}

impl Script for Spawner {
    fn on_start(&mut self, ctx: &mut ScriptContext<'_>) -> ScriptResult {
        let mut world = ctx.world();
        let e = world.create_entity("Minion");
        world.add_component::<PhysicsBody>(e)?;
        *self.spawned.borrow_mut() = Some(e);
        ctx.commands().attach_script(e, Spinner);
        Ok(())
    }
}

struct Spinner;

impl Script for Spinner {
    fn on_update(&mut self, ctx: &mut ScriptContext<'_>, time: FrameTime) -> ScriptResult {
        let owner = ctx.owner().ok_or("spinner needs an owner")?;
        let mut world = ctx.world();
        let transform = world.transform(owner).ok_or("no transform")?;
        transform.rotate_by_euler(
            &mut world,
            Space::Local,
            Vec3::new(0.0, 180.0 * time.scaled_delta(), 0.0),
        )?;
        Ok(())
    }
}

#[test]
fn runtime_drives_spawned_entity_scripts() {
    let spawned = Rc::new(RefCell::new(None));
    let mut runtime = ScriptRuntime::new(HeadlessHost::new(), RuntimeSettings::default()).unwrap();
    runtime.spawn_system(Spawner {
        spawned: Rc::clone(&spawned),
    });

    runtime.play_begin();
    let minion = (*spawned.borrow()).expect("spawner ran");
    assert_eq!(runtime.scripts_of(minion).len(), 1);

    runtime.frame_update(0.5, 1.0);
    let world = runtime.world();
    let euler = world
        .transform(minion)
        .unwrap()
        .euler_angles(&world, Space::Local)
        .unwrap();
    assert!((euler.y - 90.0).abs() < 1e-3, "yaw was {}", euler.y);

    runtime.host_mut().despawn_external(minion);
    runtime.frame_update(0.5, 1.0);
    assert!(runtime.scripts_of(minion).is_empty());
}
