//! Identity and validity registry
//!
//! [`World`] is a thin view over the native host. It keeps no state of its
//! own: every liveness or presence question is forwarded, so destruction
//! that happens natively (a physics despawn, a scene unload) is seen on the
//! very next query.

use crate::components::Transform;
use crate::{BoundaryError, ComponentHandle, NativeHost};
use tether_asset::{AssetError, AssetHandle, AssetKey, AssetResolver, Prefab, SceneAsset};
use tether_core::{Component, ComponentType, Entity};

pub struct World<'h> {
    host: &'h mut dyn NativeHost,
}

impl<'h> World<'h> {
    pub fn new(host: &'h mut dyn NativeHost) -> Self {
        Self { host }
    }

    pub fn host(&self) -> &dyn NativeHost {
        &*self.host
    }

    pub fn host_mut(&mut self) -> &mut dyn NativeHost {
        &mut *self.host
    }

    // -- queries -----------------------------------------------------------

    /// Whether `entity` is live right now.
    pub fn is_valid(&self, entity: Entity) -> bool {
        !entity.is_null() && self.host.is_entity_valid(entity)
    }

    pub fn has_component<T: Component>(&self, entity: Entity) -> bool {
        self.has_component_type(entity, T::component_type())
    }

    /// False for invalid entities; the host is only asked about live ones.
    pub fn has_component_type(&self, entity: Entity, component: ComponentType) -> bool {
        self.is_valid(entity) && self.host.has_component(entity, component)
    }

    pub fn ensure_valid(&self, entity: Entity) -> Result<(), BoundaryError> {
        if self.is_valid(entity) {
            Ok(())
        } else {
            Err(BoundaryError::InvalidEntity { entity })
        }
    }

    // -- entities ----------------------------------------------------------

    /// Create an entity tagged `tag`. [`Entity::NULL`] when the host is out
    /// of entities.
    pub fn create_entity(&mut self, tag: &str) -> Entity {
        let entity = self.host.create_entity(tag);
        if entity.is_null() {
            tracing::warn!(tag, "host could not create an entity");
        } else {
            tracing::debug!(entity = %entity, tag, "created entity");
        }
        entity
    }

    pub fn instantiate(&mut self, prefab: AssetHandle<Prefab>) -> Result<Entity, BoundaryError> {
        match self.host.instantiate_prefab(prefab.uid()) {
            Some(entity) => {
                tracing::debug!(entity = %entity, prefab = %prefab.uid(), "instantiated prefab");
                Ok(entity)
            }
            None => Err(AssetError::NotFound {
                kind: prefab.kind(),
                key: AssetKey::Uid(prefab.uid()),
            }
            .into()),
        }
    }

    /// Destroy `entity`. Returns whether anything was destroyed.
    ///
    /// Destroying an entity that is already gone is a no-op.
    pub fn destroy_entity(&mut self, entity: Entity) -> bool {
        if !self.is_valid(entity) {
            tracing::trace!(entity = %entity, "destroy of invalid entity ignored");
            return false;
        }
        let destroyed = self.host.destroy_entity(entity);
        if destroyed {
            tracing::debug!(entity = %entity, "destroyed entity");
        }
        destroyed
    }

    /// Swap the current scene for `scene`.
    ///
    /// Entities of the outgoing scene are invalid afterwards. Scripts attached
    /// to them are destroyed by the runtime on its next tick.
    pub fn load_scene(&mut self, scene: AssetHandle<SceneAsset>) -> Result<(), BoundaryError> {
        if !self.host.load_scene(scene.uid()) {
            return Err(AssetError::NotFound {
                kind: scene.kind(),
                key: AssetKey::Uid(scene.uid()),
            }
            .into());
        }
        tracing::info!(scene = %scene.uid(), "scene loaded");
        Ok(())
    }

    pub fn find_by_tag(&self, tag: &str) -> Option<Entity> {
        self.host
            .find_entity_by_tag(tag)
            .filter(|&entity| self.is_valid(entity))
    }

    pub fn name(&self, entity: Entity) -> Result<String, BoundaryError> {
        self.ensure_valid(entity)?;
        Ok(self.host.entity_name(entity).unwrap_or_default())
    }

    pub fn set_name(&mut self, entity: Entity, name: &str) -> Result<(), BoundaryError> {
        self.ensure_valid(entity)?;
        self.host.set_entity_name(entity, name);
        Ok(())
    }

    pub fn tag(&self, entity: Entity) -> Result<String, BoundaryError> {
        self.ensure_valid(entity)?;
        Ok(self.host.entity_tag(entity).unwrap_or_default())
    }

    pub fn set_tag(&mut self, entity: Entity, tag: &str) -> Result<(), BoundaryError> {
        self.ensure_valid(entity)?;
        self.host.set_entity_tag(entity, tag);
        Ok(())
    }

    // -- components --------------------------------------------------------

    /// Attach a `T` to `entity`, or return the one already attached.
    pub fn add_component<T: Component>(
        &mut self,
        entity: Entity,
    ) -> Result<ComponentHandle<T>, BoundaryError> {
        self.ensure_valid(entity)?;
        let component = T::ensure_registered()?;
        if self.host.has_component(entity, component) {
            return Ok(ComponentHandle::new(entity));
        }
        if !self.host.add_component(entity, component) {
            return Err(BoundaryError::ComponentRejected { entity, component });
        }
        tracing::debug!(entity = %entity, component = %component, "added component");
        Ok(ComponentHandle::new(entity))
    }

    /// The `T` attached to `entity`. Absent when either is gone.
    pub fn get_component<T: Component>(&self, entity: Entity) -> Option<ComponentHandle<T>> {
        self.has_component::<T>(entity)
            .then(|| ComponentHandle::new(entity))
    }

    /// Detach the `T` of `entity`. Returns whether one was attached.
    pub fn remove_component<T: Component>(&mut self, entity: Entity) -> Result<bool, BoundaryError> {
        self.ensure_valid(entity)?;
        let component = T::component_type();
        if !self.host.has_component(entity, component) {
            return Ok(false);
        }
        let removed = self.host.remove_component(entity, component);
        if removed {
            tracing::debug!(entity = %entity, component = %component, "removed component");
        }
        Ok(removed)
    }

    /// Detach the component `handle` names from `entity`.
    ///
    /// Fails with [`BoundaryError::ForeignComponent`] when the handle belongs
    /// to a different entity.
    pub fn remove_component_instance<T: Component>(
        &mut self,
        entity: Entity,
        handle: ComponentHandle<T>,
    ) -> Result<bool, BoundaryError> {
        self.ensure_valid(entity)?;
        if handle.owner() != entity {
            return Err(BoundaryError::ForeignComponent {
                entity,
                owner: handle.owner(),
                component: handle.component_type(),
            });
        }
        self.remove_component::<T>(entity)
    }

    /// Direct transform lookup, answered by the host's transform presence
    /// call instead of a component-kind query.
    pub fn transform(&self, entity: Entity) -> Option<ComponentHandle<Transform>> {
        (self.is_valid(entity) && self.host.has_transform(entity))
            .then(|| ComponentHandle::new(entity))
    }

    // -- assets ------------------------------------------------------------

    pub fn assets(&self) -> AssetResolver<'_, dyn NativeHost + 'h> {
        AssetResolver::new(&*self.host)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::{
        register_builtin, Animation, AnimationCommand, Camera, Explosion, ForceMode, Model,
        PhysicsBody,
    };
    use crate::headless::{AppliedForce, HeadlessHost};
    use glam::{Vec2, Vec3};
    use tether_asset::{AnimationClip, Material};
    use tether_core::Space;

    fn host() -> HeadlessHost {
        register_builtin().unwrap();
        HeadlessHost::new()
    }

    #[test]
    fn null_entity_is_never_valid() {
        let mut host = host();
        let world = World::new(&mut host);
        assert!(!world.is_valid(Entity::NULL));
        assert!(matches!(
            world.ensure_valid(Entity::NULL),
            Err(BoundaryError::InvalidEntity { .. })
        ));
    }

    #[test]
    fn destroy_is_idempotent() {
        let mut host = host();
        let mut world = World::new(&mut host);
        let e = world.create_entity("Crate");
        assert!(world.destroy_entity(e));
        assert!(!world.is_valid(e));
        assert!(!world.destroy_entity(e));
        assert!(!world.is_valid(e));
    }

    #[test]
    fn every_entity_exposes_a_transform() {
        let mut host = host();
        let mut world = World::new(&mut host);
        let e = world.create_entity("Crate");
        let transform = world.transform(e).unwrap();
        assert!(transform.is_valid(&world));
        assert_eq!(world.get_component::<Model>(e), None);
    }

    #[test]
    fn add_returns_existing_component() {
        let mut host = host();
        let mut world = World::new(&mut host);
        let e = world.create_entity("Crate");
        let a = world.add_component::<PhysicsBody>(e).unwrap();
        let b = world.add_component::<PhysicsBody>(e).unwrap();
        assert_eq!(a, b);
        assert!(world.remove_component::<PhysicsBody>(e).unwrap());
        assert!(!world.remove_component::<PhysicsBody>(e).unwrap());
    }

    #[test]
    fn mutations_on_invalid_entity_fail() {
        let mut host = host();
        let mut world = World::new(&mut host);
        let e = world.create_entity("Crate");
        world.destroy_entity(e);

        let err = world.add_component::<Model>(e).unwrap_err();
        assert_eq!(err, BoundaryError::InvalidEntity { entity: e });
        assert!(world.remove_component::<Model>(e).is_err());
        assert!(world.set_name(e, "ghost").is_err());
        assert_eq!(world.get_component::<Transform>(e), None);
    }

    #[test]
    fn remove_by_instance_checks_owner() {
        let mut host = host();
        let mut world = World::new(&mut host);
        let a = world.create_entity("A");
        let b = world.create_entity("B");
        let body = world.add_component::<PhysicsBody>(a).unwrap();
        world.add_component::<PhysicsBody>(b).unwrap();

        let err = world.remove_component_instance(b, body).unwrap_err();
        assert!(matches!(err, BoundaryError::ForeignComponent { owner, .. } if owner == a));
        assert!(world.has_component::<PhysicsBody>(b));

        assert!(world.remove_component_instance(a, body).unwrap());
        assert!(!body.is_valid(&world));
    }

    #[test]
    fn name_and_tag_round_trip() {
        let mut host = host();
        let mut world = World::new(&mut host);
        let e = world.create_entity("Enemy");
        world.set_name(e, "Grunt").unwrap();
        assert_eq!(world.name(e).unwrap(), "Grunt");
        assert_eq!(world.find_by_tag("Enemy"), Some(e));
        world.set_tag(e, "Ally").unwrap();
        assert_eq!(world.tag(e).unwrap(), "Ally");
        assert_eq!(world.find_by_tag("Enemy"), None);
    }

    #[test]
    fn prefab_instantiation() {
        let mut host = host();
        let prefab = host.register_prefab("prefabs/crate", "Crate", &[PhysicsBody::component_type()]);
        let mut world = World::new(&mut host);

        let handle = world.assets().resolve_uid::<Prefab>(prefab).unwrap();
        let e = world.instantiate(handle).unwrap();
        assert_eq!(world.tag(e).unwrap(), "Crate");
        assert!(world.has_component::<PhysicsBody>(e));

        let transform = world.transform(e).unwrap();
        transform
            .set_position(&mut world, Space::Local, Vec3::X)
            .unwrap();
        assert_eq!(transform.position(&world, Space::Global).unwrap(), Vec3::X);
    }

    #[test]
    fn model_materials() {
        let mut host = host();
        let uid = host.register_asset::<Material>("materials/rust");
        let mut world = World::new(&mut host);
        let e = world.create_entity("Crate");
        let model = world.add_component::<Model>(e).unwrap();
        let material = world.assets().resolve_key::<Material>("materials/rust").unwrap();

        assert_eq!(model.material(&world, 0).unwrap(), None);
        model.set_material(&mut world, 0, Some(material)).unwrap();
        assert_eq!(model.material(&world, 0).unwrap().map(|m| m.uid()), Some(uid));
        model.set_material(&mut world, 0, None).unwrap();
        assert_eq!(model.material(&world, 0).unwrap(), None);

        assert!(model.enabled(&world).unwrap());
        model.set_enabled(&mut world, false).unwrap();
        assert!(!model.enabled(&world).unwrap());
    }

    #[test]
    fn refused_component_is_reported() {
        let mut host = host();
        host.refuse_component(Camera::component_type());
        let mut world = World::new(&mut host);
        let e = world.create_entity("Rig");

        let err = world.add_component::<Camera>(e).unwrap_err();
        assert_eq!(
            err,
            BoundaryError::ComponentRejected {
                entity: e,
                component: Camera::component_type(),
            }
        );
        assert!(!world.has_component::<Camera>(e));
    }

    #[test]
    fn transform_lookup_follows_native_detach() {
        let mut host = host();
        let e = host.create_entity("Crate");
        assert!(World::new(&mut host).transform(e).is_some());

        host.detach_external(e, Transform::component_type());
        let world = World::new(&mut host);
        assert_eq!(world.transform(e), None);
        assert_eq!(world.transform(Entity::NULL), None);
    }

    #[test]
    fn physics_calls_reach_the_host() {
        let mut host = host();
        let mut world = World::new(&mut host);
        let e = world.create_entity("Crate");
        let body = world.add_component::<PhysicsBody>(e).unwrap();

        body.apply_force(&mut world, Vec3::Y, ForceMode::Impulse)
            .unwrap();
        body.apply_torque(&mut world, Vec3::X, ForceMode::default())
            .unwrap();
        let explosion = Explosion {
            force: 10.0,
            position: Vec3::ZERO,
            radius: 2.0,
            upwards_modifier: 0.5,
            mode: ForceMode::VelocityChange,
        };
        body.apply_explosion_force(&mut world, explosion).unwrap();

        world.remove_component::<PhysicsBody>(e).unwrap();
        let err = body
            .apply_force(&mut world, Vec3::Y, ForceMode::Force)
            .unwrap_err();
        assert!(matches!(err, BoundaryError::MissingComponent { entity, .. } if entity == e));

        assert_eq!(
            host.applied_forces(),
            [
                AppliedForce::Force {
                    entity: e,
                    force: Vec3::Y,
                    mode: ForceMode::Impulse,
                },
                AppliedForce::Torque {
                    entity: e,
                    torque: Vec3::X,
                    mode: ForceMode::Force,
                },
                AppliedForce::Explosion {
                    entity: e,
                    explosion,
                },
            ]
        );
    }

    #[test]
    fn animation_commands_reach_the_host() {
        let mut host = host();
        let clip = host.register_asset::<AnimationClip>("anim/run");
        let mut world = World::new(&mut host);
        let e = world.create_entity("Runner");
        let animation = world.add_component::<Animation>(e).unwrap();
        let handle = world.assets().resolve_uid::<AnimationClip>(clip).unwrap();

        animation.blend(&mut world, handle, 0.25).unwrap();
        animation.pause(&mut world).unwrap();
        animation.resume(&mut world).unwrap();
        animation.stop(&mut world).unwrap();
        world.destroy_entity(e);
        let err = animation.play(&mut world).unwrap_err();
        assert_eq!(err, BoundaryError::InvalidEntity { entity: e });

        let sent: Vec<AnimationCommand> = host.animation_log().iter().map(|&(_, c)| c).collect();
        assert_eq!(
            sent,
            [
                AnimationCommand::Blend {
                    clip,
                    seconds: 0.25,
                },
                AnimationCommand::Pause,
                AnimationCommand::Resume,
                AnimationCommand::Stop,
            ]
        );
        assert!(host.animation_log().iter().all(|&(entity, _)| entity == e));
    }

    #[test]
    fn camera_rays_track_the_camera() {
        let mut host = host();
        let mut world = World::new(&mut host);
        let e = world.create_entity("Camera");
        let camera = world.add_component::<Camera>(e).unwrap();
        world
            .transform(e)
            .unwrap()
            .set_position(&mut world, Space::Global, Vec3::new(0.0, 2.0, 0.0))
            .unwrap();

        let ray = camera
            .viewport_to_ray(&world, Vec2::splat(0.5))
            .unwrap()
            .unwrap();
        assert_eq!(ray.origin, Vec3::new(0.0, 2.0, 0.0));
        assert!((ray.direction - Vec3::NEG_Z).length() < 1e-5);

        world.remove_component::<Camera>(e).unwrap();
        assert!(camera.viewport_to_ray(&world, Vec2::ZERO).is_err());
    }

    #[test]
    fn scene_load_invalidates_old_entities() {
        let mut host = host();
        let scene = host.register_scene("scenes/arena", &["Goal"]);
        let mut world = World::new(&mut host);
        let old = world.create_entity("Player");
        let handle = world.assets().resolve_uid::<SceneAsset>(scene).unwrap();

        world.load_scene(handle).unwrap();
        assert!(!world.is_valid(old));
        let goal = world.find_by_tag("Goal").unwrap();
        assert!(world.transform(goal).is_some());

        host.unregister_asset(scene);
        let mut world = World::new(&mut host);
        let err = world.load_scene(handle).unwrap_err();
        assert!(matches!(err, BoundaryError::Asset(AssetError::NotFound { .. })));
        assert!(world.is_valid(goal));
    }
}
