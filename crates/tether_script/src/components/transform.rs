use crate::{BoundaryError, ComponentHandle, World};
use glam::{Quat, Vec3};
use tether_core::math::{euler_degrees, look_rotation, quat_from_euler_degrees};
use tether_core::{define_component, Space};

/// Position, rotation and scale. Every entity carries at most one.
pub struct Transform;
define_component!(Transform, 1, "Transform");

/// Transform value in one space, as exchanged with the host.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct TransformData {
    pub position: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Default for TransformData {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
        }
    }
}

impl ComponentHandle<Transform> {
    pub fn get(&self, world: &World<'_>, space: Space) -> Result<TransformData, BoundaryError> {
        self.check(world)?;
        world
            .host()
            .transform(self.owner(), space)
            .ok_or(BoundaryError::MissingComponent {
                entity: self.owner(),
                component: self.component_type(),
            })
    }

    pub fn set(
        &self,
        world: &mut World<'_>,
        space: Space,
        value: TransformData,
    ) -> Result<(), BoundaryError> {
        self.check(world)?;
        world.host_mut().set_transform(self.owner(), space, value);
        Ok(())
    }

    fn modify(
        &self,
        world: &mut World<'_>,
        space: Space,
        f: impl FnOnce(&mut TransformData),
    ) -> Result<(), BoundaryError> {
        let mut value = self.get(world, space)?;
        f(&mut value);
        world.host_mut().set_transform(self.owner(), space, value);
        Ok(())
    }

    pub fn position(&self, world: &World<'_>, space: Space) -> Result<Vec3, BoundaryError> {
        Ok(self.get(world, space)?.position)
    }

    pub fn set_position(
        &self,
        world: &mut World<'_>,
        space: Space,
        position: Vec3,
    ) -> Result<(), BoundaryError> {
        self.modify(world, space, |t| t.position = position)
    }

    pub fn rotation(&self, world: &World<'_>, space: Space) -> Result<Quat, BoundaryError> {
        Ok(self.get(world, space)?.rotation)
    }

    pub fn set_rotation(
        &self,
        world: &mut World<'_>,
        space: Space,
        rotation: Quat,
    ) -> Result<(), BoundaryError> {
        self.modify(world, space, |t| t.rotation = rotation)
    }

    /// Rotation as Euler angles in degrees.
    pub fn euler_angles(&self, world: &World<'_>, space: Space) -> Result<Vec3, BoundaryError> {
        Ok(euler_degrees(self.rotation(world, space)?))
    }

    pub fn set_euler_angles(
        &self,
        world: &mut World<'_>,
        space: Space,
        degrees: Vec3,
    ) -> Result<(), BoundaryError> {
        self.set_rotation(world, space, quat_from_euler_degrees(degrees))
    }

    pub fn scale(&self, world: &World<'_>, space: Space) -> Result<Vec3, BoundaryError> {
        Ok(self.get(world, space)?.scale)
    }

    pub fn set_scale(
        &self,
        world: &mut World<'_>,
        space: Space,
        scale: Vec3,
    ) -> Result<(), BoundaryError> {
        self.modify(world, space, |t| t.scale = scale)
    }

    pub fn move_by(
        &self,
        world: &mut World<'_>,
        space: Space,
        amount: Vec3,
    ) -> Result<(), BoundaryError> {
        self.modify(world, space, |t| t.position += amount)
    }

    pub fn rotate_by(
        &self,
        world: &mut World<'_>,
        space: Space,
        amount: Quat,
    ) -> Result<(), BoundaryError> {
        self.modify(world, space, |t| t.rotation = (amount * t.rotation).normalize())
    }

    pub fn rotate_by_euler(
        &self,
        world: &mut World<'_>,
        space: Space,
        degrees: Vec3,
    ) -> Result<(), BoundaryError> {
        self.rotate_by(world, space, quat_from_euler_degrees(degrees))
    }

    /// Component-wise scale multiply.
    pub fn scale_by(
        &self,
        world: &mut World<'_>,
        space: Space,
        factor: Vec3,
    ) -> Result<(), BoundaryError> {
        self.modify(world, space, |t| t.scale *= factor)
    }

    /// Turn so that forward (-Z) faces `target`, in world space.
    ///
    /// Leaves the rotation untouched when the target coincides with the
    /// position or lies straight along `up`.
    pub fn look_at(
        &self,
        world: &mut World<'_>,
        target: Vec3,
        up: Vec3,
    ) -> Result<(), BoundaryError> {
        self.modify(world, Space::Global, |t| {
            if let Some(rotation) = look_rotation(target - t.position, up) {
                t.rotation = rotation;
            }
        })
    }

    /// World-space forward (-Z).
    pub fn forward(&self, world: &World<'_>) -> Result<Vec3, BoundaryError> {
        Ok(self.rotation(world, Space::Global)? * Vec3::NEG_Z)
    }
}
