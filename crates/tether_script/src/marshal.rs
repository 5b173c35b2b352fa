//! Boundary marshalling
//!
//! The native side hands over flat byte buffers holding back-to-back
//! fixed-size records. Field order and sizes are fixed by the `#[repr(C)]`
//! layouts below; byte order is the host's (both sides share a process).
//!
//! Decoding is all-or-nothing: a length that is not an exact multiple of the
//! record size is rejected. Field values are not checked.

use bytemuck::{Pod, Zeroable};
use glam::Vec3;
use std::mem::size_of;
use tether_core::Entity;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PayloadError {
    #[error("{record} payload of {len} bytes is not a multiple of the {record_size}-byte record size")]
    LengthMismatch {
        record: &'static str,
        len: usize,
        record_size: usize,
    },
}

/// A fixed-layout record that can cross the boundary.
pub trait Record: Pod {
    const NAME: &'static str;
}

/// Decode a buffer into records, preserving order and count.
pub fn decode_records<T: Record>(bytes: &[u8]) -> Result<Vec<T>, PayloadError> {
    let record_size = size_of::<T>();
    if record_size == 0 || bytes.len() % record_size != 0 {
        return Err(PayloadError::LengthMismatch {
            record: T::NAME,
            len: bytes.len(),
            record_size,
        });
    }
    // Native buffers carry no alignment guarantee.
    Ok(bytes
        .chunks_exact(record_size)
        .map(bytemuck::pod_read_unaligned::<T>)
        .collect())
}

/// Encode records in the layout [`decode_records`] expects.
pub fn encode_records<T: Record>(records: &[T]) -> Vec<u8> {
    bytemuck::cast_slice(records).to_vec()
}

/// One point of a collision manifold (32 bytes).
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
#[repr(C)]
pub struct ContactPoint {
    pub point: Vec3,
    pub normal: Vec3,
    pub distance: f32,
    pub impulse: f32,
}

impl Record for ContactPoint {
    const NAME: &'static str = "ContactPoint";
}

/// A raycast hit (32 bytes).
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
#[repr(C)]
pub struct RaycastHit {
    pub entity: Entity,
    pub point: Vec3,
    pub normal: Vec3,
    pub distance: f32,
}

impl Record for RaycastHit {
    const NAME: &'static str = "RaycastHit";
}

/// A ray (24 bytes).
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
#[repr(C)]
pub struct Ray {
    pub origin: Vec3,
    pub direction: Vec3,
}

impl Ray {
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        Self { origin, direction }
    }

    pub fn at(&self, distance: f32) -> Vec3 {
        self.origin + self.direction * distance
    }
}

impl Record for Ray {
    const NAME: &'static str = "Ray";
}

/// Collision with a peer entity, as delivered to script hooks.
#[derive(Debug, Clone, PartialEq)]
pub struct Collision {
    /// The other entity
    pub entity: Entity,
    pub contacts: Vec<ContactPoint>,
}

impl Collision {
    /// Decode the native contact buffer for a collision with `entity`.
    pub fn decode(entity: Entity, contacts: &[u8]) -> Result<Self, PayloadError> {
        Ok(Self {
            entity,
            contacts: decode_records(contacts)?,
        })
    }

    /// The same contact set seen from the other body: peer swapped to
    /// `entity`, normals reversed.
    pub fn mirrored(&self, entity: Entity) -> Self {
        Self {
            entity,
            contacts: self
                .contacts
                .iter()
                .map(|c| ContactPoint {
                    normal: -c.normal,
                    ..*c
                })
                .collect(),
        }
    }
}
