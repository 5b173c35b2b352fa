//! In-memory native host
//!
//! A complete [`NativeHost`] with no engine behind it, for tools, tests and
//! the demo binary. Entity ids count up from 1 and are never reused; once
//! they run out, entity creation fails.
//! Entities form no hierarchy, so local and global transforms coincide.
//! Raycasts test sphere colliders only.

use crate::components::{
    AnimationCommand, Camera, Explosion, ForceMode, Model, Transform, TransformData,
};
use crate::host::NativeHost;
use crate::marshal::{encode_records, Ray, RaycastHit};
use crate::physics::RaycastOptions;
use glam::{Vec2, Vec3};
use std::cell::Cell;
use std::collections::{BTreeMap, HashMap, HashSet};
use tether_asset::{AssetKind, AssetLookup, AssetUid, AudioClip, Prefab, SceneAsset};
use tether_core::{Component, ComponentId, ComponentType, Entity, EntityId, Space};

/// Vertical field of view used for camera rays.
const CAMERA_FOV_Y_DEGREES: f32 = 60.0;

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct SphereCollider {
    pub radius: f32,
    pub layer: u32,
    pub sensor: bool,
}

/// A physics call the host received.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum AppliedForce {
    Force {
        entity: Entity,
        force: Vec3,
        mode: ForceMode,
    },
    Torque {
        entity: Entity,
        torque: Vec3,
        mode: ForceMode,
    },
    Explosion {
        entity: Entity,
        explosion: Explosion,
    },
}

#[derive(Debug)]
struct EntityRecord {
    name: String,
    tag: String,
    components: HashSet<ComponentId>,
    transform: TransformData,
    collider: Option<SphereCollider>,
    model_enabled: bool,
    materials: BTreeMap<u32, AssetUid>,
}

#[derive(Debug)]
struct AssetRecord {
    kind: &'static str,
    audio_length: f32,
}

#[derive(Debug)]
struct PrefabTemplate {
    tag: String,
    components: Vec<ComponentType>,
}

#[derive(Debug)]
pub struct HeadlessHost {
    /// `None` once every id has been handed out.
    next_id: Option<EntityId>,
    entities: BTreeMap<Entity, EntityRecord>,
    assets: HashMap<AssetUid, AssetRecord>,
    keys: HashMap<(&'static str, String), AssetUid>,
    prefabs: HashMap<AssetUid, PrefabTemplate>,
    scenes: HashMap<AssetUid, Vec<String>>,
    refused: HashSet<ComponentId>,
    forces: Vec<AppliedForce>,
    animations: Vec<(Entity, AnimationCommand)>,
    lookups: Cell<usize>,
}

impl HeadlessHost {
    pub fn new() -> Self {
        Self {
            next_id: Some(1),
            entities: BTreeMap::new(),
            assets: HashMap::new(),
            keys: HashMap::new(),
            prefabs: HashMap::new(),
            scenes: HashMap::new(),
            refused: HashSet::new(),
            forces: Vec::new(),
            animations: Vec::new(),
            lookups: Cell::new(0),
        }
    }

    // -- assets ------------------------------------------------------------

    /// Import an asset under `key` and return its fresh uid.
    pub fn register_asset<T: AssetKind>(&mut self, key: &str) -> AssetUid {
        self.import(T::NAME, key, 0.0)
    }

    pub fn register_audio_clip(&mut self, key: &str, seconds: f32) -> AssetUid {
        self.import(AudioClip::NAME, key, seconds)
    }

    /// A prefab that spawns one entity with `tag` and `components`.
    pub fn register_prefab(
        &mut self,
        key: &str,
        tag: &str,
        components: &[ComponentType],
    ) -> AssetUid {
        let uid = self.import(Prefab::NAME, key, 0.0);
        self.prefabs.insert(
            uid,
            PrefabTemplate {
                tag: tag.to_owned(),
                components: components.to_vec(),
            },
        );
        uid
    }

    /// A scene holding one plain entity per tag.
    pub fn register_scene(&mut self, key: &str, tags: &[&str]) -> AssetUid {
        let uid = self.import(SceneAsset::NAME, key, 0.0);
        self.scenes
            .insert(uid, tags.iter().map(|&t| t.to_owned()).collect());
        uid
    }

    /// Drop an asset, as an unload on the native side would.
    pub fn unregister_asset(&mut self, uid: AssetUid) -> bool {
        self.keys.retain(|_, v| *v != uid);
        self.prefabs.remove(&uid);
        self.scenes.remove(&uid);
        self.assets.remove(&uid).is_some()
    }

    /// Number of key or uid lookups answered so far.
    pub fn lookup_count(&self) -> usize {
        self.lookups.get()
    }

    fn import(&mut self, kind: &'static str, key: &str, audio_length: f32) -> AssetUid {
        let uid = AssetUid::new_random();
        self.assets.insert(uid, AssetRecord { kind, audio_length });
        self.keys.insert((kind, key.to_owned()), uid);
        uid
    }

    // -- native-side events ------------------------------------------------

    /// Destroy an entity without going through the script side.
    pub fn despawn_external(&mut self, entity: Entity) -> bool {
        self.entities.remove(&entity).is_some()
    }

    /// Detach a component without going through the script side.
    pub fn detach_external(&mut self, entity: Entity, component: ComponentType) -> bool {
        self.entities
            .get_mut(&entity)
            .is_some_and(|e| e.components.remove(&component.id))
    }

    /// Make `add_component` fail for this kind.
    pub fn refuse_component(&mut self, component: ComponentType) {
        self.refused.insert(component.id);
    }

    pub fn set_collider(&mut self, entity: Entity, radius: f32, layer: u32, sensor: bool) -> bool {
        match self.entities.get_mut(&entity) {
            Some(record) => {
                record.collider = Some(SphereCollider {
                    radius,
                    layer,
                    sensor,
                });
                true
            }
            None => false,
        }
    }

    // -- inspection --------------------------------------------------------

    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    pub fn applied_forces(&self) -> &[AppliedForce] {
        &self.forces
    }

    pub fn animation_log(&self) -> &[(Entity, AnimationCommand)] {
        &self.animations
    }

    fn spawn(&mut self, tag: &str) -> Option<Entity> {
        let id = self.next_id?;
        self.next_id = id.checked_add(1);
        let entity = Entity::from_raw(id);
        let mut components = HashSet::new();
        components.insert(Transform::ID);
        self.entities.insert(
            entity,
            EntityRecord {
                name: "Entity".to_owned(),
                tag: tag.to_owned(),
                components,
                transform: TransformData::default(),
                collider: None,
                model_enabled: true,
                materials: BTreeMap::new(),
            },
        );
        Some(entity)
    }

    fn ray_hits(&self, ray: &Ray, options: &RaycastOptions) -> Vec<RaycastHit> {
        let direction = ray.direction.normalize_or_zero();
        if direction == Vec3::ZERO {
            return Vec::new();
        }
        let mut hits: Vec<RaycastHit> = self
            .entities
            .iter()
            .filter_map(|(&entity, record)| {
                let collider = record.collider?;
                if collider.sensor && !options.query_sensors {
                    return None;
                }
                if !options.hits_layer(collider.layer) {
                    return None;
                }
                let center = record.transform.position;
                let radius = collider.radius * record.transform.scale.abs().max_element();
                let to_center = center - ray.origin;
                let radius_sq = radius * radius;
                // Colliders around the origin are not hit.
                if to_center.length_squared() <= radius_sq {
                    return None;
                }
                let along = to_center.dot(direction);
                let miss_sq = to_center.length_squared() - along * along;
                if along < 0.0 || miss_sq > radius_sq {
                    return None;
                }
                let distance = along - (radius_sq - miss_sq).sqrt();
                if distance > options.max_distance {
                    return None;
                }
                let point = ray.origin + direction * distance;
                Some(RaycastHit {
                    entity,
                    point,
                    normal: (point - center).normalize_or_zero(),
                    distance,
                })
            })
            .collect();
        hits.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        hits
    }
}

impl Default for HeadlessHost {
    fn default() -> Self {
        Self::new()
    }
}

impl AssetLookup for HeadlessHost {
    fn asset_by_key(&self, kind: &'static str, key: &str) -> Option<AssetUid> {
        self.lookups.set(self.lookups.get() + 1);
        self.keys.get(&(kind, key.to_owned())).copied()
    }

    fn asset_by_uid(&self, kind: &'static str, uid: AssetUid) -> Option<AssetUid> {
        self.lookups.set(self.lookups.get() + 1);
        self.assets
            .get(&uid)
            .filter(|asset| asset.kind == kind)
            .map(|_| uid)
    }

    fn audio_clip_length(&self, uid: AssetUid) -> f32 {
        self.assets
            .get(&uid)
            .filter(|asset| asset.kind == AudioClip::NAME)
            .map_or(0.0, |asset| asset.audio_length)
    }
}

impl NativeHost for HeadlessHost {
    fn is_entity_valid(&self, entity: Entity) -> bool {
        self.entities.contains_key(&entity)
    }

    fn has_component(&self, entity: Entity, component: ComponentType) -> bool {
        self.entities
            .get(&entity)
            .is_some_and(|e| e.components.contains(&component.id))
    }

    fn create_entity(&mut self, tag: &str) -> Entity {
        self.spawn(tag).unwrap_or(Entity::NULL)
    }

    fn instantiate_prefab(&mut self, prefab: AssetUid) -> Option<Entity> {
        let template = self.prefabs.get(&prefab)?;
        let (tag, components) = (template.tag.clone(), template.components.clone());
        let entity = self.spawn(&tag)?;
        if let Some(record) = self.entities.get_mut(&entity) {
            record.components.extend(components.iter().map(|c| c.id));
        }
        Some(entity)
    }

    fn destroy_entity(&mut self, entity: Entity) -> bool {
        self.entities.remove(&entity).is_some()
    }

    fn find_entity_by_tag(&self, tag: &str) -> Option<Entity> {
        self.entities
            .iter()
            .find(|(_, record)| record.tag == tag)
            .map(|(&entity, _)| entity)
    }

    fn entity_name(&self, entity: Entity) -> Option<String> {
        self.entities.get(&entity).map(|e| e.name.clone())
    }

    fn set_entity_name(&mut self, entity: Entity, name: &str) {
        if let Some(record) = self.entities.get_mut(&entity) {
            record.name = name.to_owned();
        }
    }

    fn entity_tag(&self, entity: Entity) -> Option<String> {
        self.entities.get(&entity).map(|e| e.tag.clone())
    }

    fn set_entity_tag(&mut self, entity: Entity, tag: &str) {
        if let Some(record) = self.entities.get_mut(&entity) {
            record.tag = tag.to_owned();
        }
    }

    fn load_scene(&mut self, scene: AssetUid) -> bool {
        let Some(tags) = self.scenes.get(&scene).cloned() else {
            return false;
        };
        self.entities.clear();
        for tag in &tags {
            if self.spawn(tag).is_none() {
                break;
            }
        }
        true
    }

    fn add_component(&mut self, entity: Entity, component: ComponentType) -> bool {
        if self.refused.contains(&component.id) {
            return false;
        }
        match self.entities.get_mut(&entity) {
            Some(record) => {
                record.components.insert(component.id);
                true
            }
            None => false,
        }
    }

    fn remove_component(&mut self, entity: Entity, component: ComponentType) -> bool {
        // Every entity keeps its transform.
        if component.id == Transform::ID {
            return false;
        }
        self.entities
            .get_mut(&entity)
            .is_some_and(|e| e.components.remove(&component.id))
    }

    fn has_transform(&self, entity: Entity) -> bool {
        self.has_component(entity, ComponentType::of::<Transform>())
    }

    fn transform(&self, entity: Entity, _space: Space) -> Option<TransformData> {
        self.entities
            .get(&entity)
            .filter(|e| e.components.contains(&Transform::ID))
            .map(|e| e.transform)
    }

    fn set_transform(&mut self, entity: Entity, _space: Space, value: TransformData) {
        if let Some(record) = self.entities.get_mut(&entity) {
            record.transform = value;
        }
    }

    fn apply_force(&mut self, entity: Entity, force: Vec3, mode: ForceMode) {
        self.forces.push(AppliedForce::Force {
            entity,
            force,
            mode,
        });
    }

    fn apply_torque(&mut self, entity: Entity, torque: Vec3, mode: ForceMode) {
        self.forces.push(AppliedForce::Torque {
            entity,
            torque,
            mode,
        });
    }

    fn apply_explosion_force(&mut self, entity: Entity, explosion: &Explosion) {
        self.forces.push(AppliedForce::Explosion {
            entity,
            explosion: *explosion,
        });
    }

    fn raycast(&self, ray: &Ray, options: &RaycastOptions) -> Option<RaycastHit> {
        self.ray_hits(ray, options).into_iter().next()
    }

    fn raycast_all(&self, ray: &Ray, options: &RaycastOptions) -> Vec<u8> {
        encode_records(&self.ray_hits(ray, options))
    }

    fn model_enabled(&self, entity: Entity) -> bool {
        self.entities
            .get(&entity)
            .is_some_and(|e| e.components.contains(&Model::ID) && e.model_enabled)
    }

    fn set_model_enabled(&mut self, entity: Entity, enabled: bool) {
        if let Some(record) = self.entities.get_mut(&entity) {
            record.model_enabled = enabled;
        }
    }

    fn model_material(&self, entity: Entity, index: u32) -> Option<AssetUid> {
        self.entities.get(&entity)?.materials.get(&index).copied()
    }

    fn set_model_material(&mut self, entity: Entity, index: u32, material: Option<AssetUid>) {
        let Some(record) = self.entities.get_mut(&entity) else {
            return;
        };
        match material {
            Some(uid) => {
                record.materials.insert(index, uid);
            }
            None => {
                record.materials.remove(&index);
            }
        }
    }

    fn viewport_to_ray(&self, entity: Entity, viewport: Vec2) -> Option<Ray> {
        let record = self.entities.get(&entity)?;
        if !record.components.contains(&Camera::ID) {
            return None;
        }
        let half = (CAMERA_FOV_Y_DEGREES.to_radians() * 0.5).tan();
        let offset = (viewport * 2.0 - Vec2::ONE) * half;
        let direction = (record.transform.rotation * offset.extend(-1.0)).normalize();
        Some(Ray::new(record.transform.position, direction))
    }

    fn animation(&mut self, entity: Entity, command: AnimationCommand) {
        self.animations.push((entity, command));
    }
}
