//! Physics queries

use crate::components::Transform;
use crate::marshal::{decode_records, Ray, RaycastHit};
use crate::{BoundaryError, World};
use glam::Vec3;
use tether_core::{Component, Entity, Space};

/// Filters for a raycast.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct RaycastOptions {
    pub max_distance: f32,
    /// Bit `n` set means layer `n` is hit. `-1` hits everything.
    pub layer_mask: i32,
    /// Whether sensor (trigger) colliders count as hits.
    pub query_sensors: bool,
}

impl RaycastOptions {
    pub fn with_max_distance(mut self, max_distance: f32) -> Self {
        self.max_distance = max_distance;
        self
    }

    pub fn with_layer_mask(mut self, layer_mask: i32) -> Self {
        self.layer_mask = layer_mask;
        self
    }

    pub fn hits_layer(&self, layer: u32) -> bool {
        layer < 32 && (self.layer_mask as u32) & (1 << layer) != 0
    }
}

impl Default for RaycastOptions {
    fn default() -> Self {
        Self {
            max_distance: f32::INFINITY,
            layer_mask: -1,
            query_sensors: false,
        }
    }
}

impl World<'_> {
    /// Closest hit along `ray`.
    pub fn raycast(&self, ray: &Ray, options: &RaycastOptions) -> Option<RaycastHit> {
        self.host().raycast(ray, options)
    }

    /// Every hit along `ray`, in the order the native side reports them.
    pub fn raycast_all(
        &self,
        ray: &Ray,
        options: &RaycastOptions,
    ) -> Result<Vec<RaycastHit>, BoundaryError> {
        let bytes = self.host().raycast_all(ray, options);
        decode_records(&bytes).map_err(|err| {
            tracing::warn!(error = %err, "malformed raycast payload");
            err.into()
        })
    }

    /// Cast from the world position of `entity`.
    pub fn raycast_from(
        &self,
        entity: Entity,
        direction: Vec3,
        options: &RaycastOptions,
    ) -> Result<Option<RaycastHit>, BoundaryError> {
        self.ensure_valid(entity)?;
        let transform = self
            .transform(entity)
            .ok_or(BoundaryError::MissingComponent {
                entity,
                component: Transform::component_type(),
            })?;
        let origin = transform.position(self, Space::Global)?;
        Ok(self.raycast(&Ray::new(origin, direction), options))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::register_builtin;
    use crate::headless::HeadlessHost;

    fn target(host: &mut HeadlessHost, tag: &str, position: Vec3, layer: u32) -> Entity {
        let mut world = World::new(&mut *host);
        let e = world.create_entity(tag);
        world
            .transform(e)
            .unwrap()
            .set_position(&mut world, Space::Global, position)
            .unwrap();
        host.set_collider(e, 0.5, layer, false);
        e
    }

    #[test]
    fn layer_mask_bits() {
        let opts = RaycastOptions::default().with_layer_mask(0b101);
        assert!(opts.hits_layer(0));
        assert!(!opts.hits_layer(1));
        assert!(opts.hits_layer(2));
        assert!(!opts.hits_layer(40));
        assert!(RaycastOptions::default().hits_layer(31));
    }

    #[test]
    fn raycast_finds_closest() {
        register_builtin().unwrap();
        let mut host = HeadlessHost::new();
        let near = target(&mut host, "Near", Vec3::new(0.0, 0.0, -5.0), 0);
        let far = target(&mut host, "Far", Vec3::new(0.0, 0.0, -10.0), 0);
        let world = World::new(&mut host);

        let ray = Ray::new(Vec3::ZERO, Vec3::NEG_Z);
        let hit = world.raycast(&ray, &RaycastOptions::default()).unwrap();
        assert_eq!(hit.entity, near);
        assert!((hit.distance - 4.5).abs() < 1e-4);
        assert!((hit.normal - Vec3::Z).length() < 1e-4);

        let all = world.raycast_all(&ray, &RaycastOptions::default()).unwrap();
        assert_eq!(all.iter().map(|h| h.entity).collect::<Vec<_>>(), [near, far]);

        let short = RaycastOptions::default().with_max_distance(3.0);
        assert_eq!(world.raycast(&ray, &short), None);
    }

    #[test]
    fn raycast_respects_layers() {
        register_builtin().unwrap();
        let mut host = HeadlessHost::new();
        target(&mut host, "Near", Vec3::new(0.0, 0.0, -5.0), 3);
        let far = target(&mut host, "Far", Vec3::new(0.0, 0.0, -10.0), 0);
        let world = World::new(&mut host);

        let ray = Ray::new(Vec3::ZERO, Vec3::NEG_Z);
        let opts = RaycastOptions::default().with_layer_mask(1);
        assert_eq!(world.raycast(&ray, &opts).map(|h| h.entity), Some(far));
    }

    #[test]
    fn raycast_from_uses_entity_position() {
        register_builtin().unwrap();
        let mut host = HeadlessHost::new();
        let shooter = target(&mut host, "Shooter", Vec3::new(0.0, 0.0, 0.0), 0);
        let wall = target(&mut host, "Wall", Vec3::new(4.0, 0.0, 0.0), 0);
        let mut world = World::new(&mut host);

        let hit = world
            .raycast_from(shooter, Vec3::X, &RaycastOptions::default())
            .unwrap();
        assert_eq!(hit.map(|h| h.entity), Some(wall));

        world.destroy_entity(shooter);
        let err = world
            .raycast_from(shooter, Vec3::X, &RaycastOptions::default())
            .unwrap_err();
        assert_eq!(err, BoundaryError::InvalidEntity { entity: shooter });
    }
}
