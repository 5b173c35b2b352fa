use crate::{BoundaryError, ComponentHandle, World};
use glam::Vec3;
use tether_core::define_component;

/// Rigid body simulated by the native physics engine.
pub struct PhysicsBody;
define_component!(PhysicsBody, 2, "Physics");

/// How a force or torque is interpreted.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ForceMode {
    /// Continuous; scaled by step length and mass.
    #[default]
    Force = 0,
    /// Continuous; scaled by step length only.
    Acceleration = 1,
    /// Instant; scaled by mass only.
    Impulse = 2,
    /// Instant; applied as-is.
    VelocityChange = 3,
}

impl TryFrom<u8> for ForceMode {
    type Error = u8;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Force),
            1 => Ok(Self::Acceleration),
            2 => Ok(Self::Impulse),
            3 => Ok(Self::VelocityChange),
            other => Err(other),
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Explosion {
    pub force: f32,
    pub position: Vec3,
    pub radius: f32,
    /// Lifts the apparent explosion centre to throw bodies upward.
    pub upwards_modifier: f32,
    pub mode: ForceMode,
}

impl ComponentHandle<PhysicsBody> {
    pub fn apply_force(
        &self,
        world: &mut World<'_>,
        force: Vec3,
        mode: ForceMode,
    ) -> Result<(), BoundaryError> {
        self.check(world)?;
        world.host_mut().apply_force(self.owner(), force, mode);
        Ok(())
    }

    pub fn apply_torque(
        &self,
        world: &mut World<'_>,
        torque: Vec3,
        mode: ForceMode,
    ) -> Result<(), BoundaryError> {
        self.check(world)?;
        world.host_mut().apply_torque(self.owner(), torque, mode);
        Ok(())
    }

    pub fn apply_explosion_force(
        &self,
        world: &mut World<'_>,
        explosion: Explosion,
    ) -> Result<(), BoundaryError> {
        self.check(world)?;
        world
            .host_mut()
            .apply_explosion_force(self.owner(), &explosion);
        Ok(())
    }
}
