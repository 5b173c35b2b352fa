//! Tether Core
//!
//! Value types shared by every crate on the script side of the boundary:
//! - Entity handles (liveness is always asked of the native side)
//! - Component type tags and the process-wide type registry
//! - Frame time-step data
//! - Math value types

pub mod component;
pub mod entity;
pub mod math;
pub mod time;

pub use glam;

pub use component::{Component, ComponentId, ComponentIdConflict, ComponentType};
pub use entity::{Entity, EntityId};
pub use math::Space;
pub use time::{FrameClock, FrameTime};

/// Engine version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_is_set() {
        assert!(!VERSION.is_empty());
    }
}
