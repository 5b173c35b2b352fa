//! Native host interface
//!
//! Everything the script side needs from the native engine, as one trait.
//! A host that leaves any boundary call unbound does not compile, so there
//! is nothing to discover missing at runtime.
//!
//! Component data calls (`transform`, `apply_force`, ...) are only issued
//! after the caller has re-validated the owner and the attachment.

use crate::components::{AnimationCommand, Explosion, ForceMode, TransformData};
use crate::marshal::{Ray, RaycastHit};
use crate::physics::RaycastOptions;
use glam::{Vec2, Vec3};
use tether_asset::{AssetLookup, AssetUid};
use tether_core::{ComponentType, Entity, Space};

pub trait NativeHost: AssetLookup {
    // -- entities ----------------------------------------------------------

    fn is_entity_valid(&self, entity: Entity) -> bool;

    fn has_component(&self, entity: Entity, component: ComponentType) -> bool;

    /// [`Entity::NULL`] when the host can hand out no more entities.
    fn create_entity(&mut self, tag: &str) -> Entity;

    /// `None` when the prefab cannot be instantiated.
    fn instantiate_prefab(&mut self, prefab: AssetUid) -> Option<Entity>;

    /// Returns whether an entity was destroyed.
    fn destroy_entity(&mut self, entity: Entity) -> bool;

    fn find_entity_by_tag(&self, tag: &str) -> Option<Entity>;

    fn entity_name(&self, entity: Entity) -> Option<String>;

    fn set_entity_name(&mut self, entity: Entity, name: &str);

    fn entity_tag(&self, entity: Entity) -> Option<String>;

    fn set_entity_tag(&mut self, entity: Entity, tag: &str);

    /// Replace the current scene with the one stored under `scene`.
    ///
    /// Every entity of the outgoing scene stops being valid. Returns false,
    /// leaving the scene untouched, when `scene` cannot be loaded.
    fn load_scene(&mut self, scene: AssetUid) -> bool;

    // -- components --------------------------------------------------------

    /// Construct a component of the given kind. Returns whether it is now attached.
    fn add_component(&mut self, entity: Entity, component: ComponentType) -> bool;

    /// Returns whether a component was detached.
    fn remove_component(&mut self, entity: Entity, component: ComponentType) -> bool;

    // -- transform ---------------------------------------------------------

    /// Presence of the one transform an entity may carry.
    fn has_transform(&self, entity: Entity) -> bool;

    fn transform(&self, entity: Entity, space: Space) -> Option<TransformData>;

    fn set_transform(&mut self, entity: Entity, space: Space, value: TransformData);

    // -- physics -----------------------------------------------------------

    fn apply_force(&mut self, entity: Entity, force: Vec3, mode: ForceMode);

    fn apply_torque(&mut self, entity: Entity, torque: Vec3, mode: ForceMode);

    fn apply_explosion_force(&mut self, entity: Entity, explosion: &Explosion);

    fn raycast(&self, ray: &Ray, options: &RaycastOptions) -> Option<RaycastHit>;

    /// All hits, encoded as back-to-back [`RaycastHit`] records.
    fn raycast_all(&self, ray: &Ray, options: &RaycastOptions) -> Vec<u8>;

    // -- rendering ---------------------------------------------------------

    fn model_enabled(&self, entity: Entity) -> bool;

    fn set_model_enabled(&mut self, entity: Entity, enabled: bool);

    fn model_material(&self, entity: Entity, index: u32) -> Option<AssetUid>;

    fn set_model_material(&mut self, entity: Entity, index: u32, material: Option<AssetUid>);

    /// Viewport coordinates are normalised to `[0, 1]`.
    fn viewport_to_ray(&self, entity: Entity, viewport: Vec2) -> Option<Ray>;

    fn animation(&mut self, entity: Entity, command: AnimationCommand);
}
