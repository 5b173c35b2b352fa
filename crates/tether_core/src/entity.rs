//! Entity handle
//!
//! An entity is an opaque 32-bit id naming a slot in the native world.
//! The handle carries no validity bit: whether it is still alive is a
//! question for the native authority, asked again on every access.

use bytemuck::{Pod, Zeroable};
use std::fmt;

pub type EntityId = u32;

/// Entity handle. Two handles are equal when their ids are equal.
///
/// The layout is a bare `u32` so handles can be embedded in fixed-layout
/// records decoded from native buffers.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Pod, Zeroable)]
#[repr(transparent)]
pub struct Entity(EntityId);

impl Entity {
    /// Id `0` is reserved by the native side and never names a live entity.
    pub const NULL: Entity = Entity(0);

    pub const fn from_raw(id: EntityId) -> Self {
        Self(id)
    }

    pub const fn id(self) -> EntityId {
        self.0
    }

    pub const fn is_null(self) -> bool {
        self.0 == 0
    }

    /// Widen to 64 bits (script integers, save files)
    pub fn to_bits(self) -> u64 {
        u64::from(self.0)
    }

    /// Narrow from 64 bits. Values outside the id range are rejected.
    pub fn from_bits(bits: u64) -> Option<Self> {
        EntityId::try_from(bits).ok().map(Self)
    }
}

impl From<EntityId> for Entity {
    fn from(id: EntityId) -> Self {
        Self(id)
    }
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}
