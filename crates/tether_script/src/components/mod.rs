//! Built-in component kinds and their typed proxy operations

mod animation;
mod camera;
mod model;
mod physics_body;
mod transform;

pub use animation::{Animation, AnimationCommand};
pub use camera::Camera;
pub use model::Model;
pub use physics_body::{Explosion, ForceMode, PhysicsBody};
pub use transform::{Transform, TransformData};

use tether_core::{Component, ComponentId, ComponentIdConflict};

/// Ids below this are reserved for built-in kinds.
pub const FIRST_USER_COMPONENT_ID: ComponentId = 1000;

/// Register every built-in kind with the global component table.
pub fn register_builtin() -> Result<(), ComponentIdConflict> {
    Transform::ensure_registered()?;
    PhysicsBody::ensure_registered()?;
    Model::ensure_registered()?;
    Camera::ensure_registered()?;
    Animation::ensure_registered()?;
    Ok(())
}
