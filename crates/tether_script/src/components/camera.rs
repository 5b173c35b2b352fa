use crate::marshal::Ray;
use crate::{BoundaryError, ComponentHandle, World};
use glam::Vec2;
use tether_core::define_component;

pub struct Camera;
define_component!(Camera, 4, "Camera");

impl ComponentHandle<Camera> {
    /// Ray through a normalised viewport point (`[0, 1]` on both axes).
    pub fn viewport_to_ray(
        &self,
        world: &World<'_>,
        viewport: Vec2,
    ) -> Result<Option<Ray>, BoundaryError> {
        self.check(world)?;
        Ok(world.host().viewport_to_ray(self.owner(), viewport))
    }
}
