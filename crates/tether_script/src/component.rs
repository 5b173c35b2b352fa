//! Component proxies
//!
//! A proxy names a component by (owner entity, kind) and never caches
//! whether that pair still exists: every query goes back to the host.

use crate::{BoundaryError, World};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;
use tether_core::{Component, ComponentType, Entity};

/// Handle to the `T` component of one entity.
///
/// Ownership is fixed when the handle is made. The handle does not keep the
/// owner alive.
pub struct ComponentHandle<T: Component> {
    owner: Entity,
    _kind: PhantomData<fn() -> T>,
}

impl<T: Component> ComponentHandle<T> {
    pub(crate) fn new(owner: Entity) -> Self {
        Self {
            owner,
            _kind: PhantomData,
        }
    }

    #[inline]
    pub fn owner(&self) -> Entity {
        self.owner
    }

    #[inline]
    pub fn component_type(&self) -> ComponentType {
        T::component_type()
    }

    /// Owner is valid and still has a `T` attached. Recomputed on every call.
    pub fn is_valid(&self, world: &World<'_>) -> bool {
        world.has_component::<T>(self.owner)
    }

    /// Re-validate before touching component data.
    pub(crate) fn check(&self, world: &World<'_>) -> Result<(), BoundaryError> {
        world.ensure_valid(self.owner)?;
        if !world.has_component::<T>(self.owner) {
            return Err(BoundaryError::MissingComponent {
                entity: self.owner,
                component: T::component_type(),
            });
        }
        Ok(())
    }
}

impl<T: Component> Clone for ComponentHandle<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T: Component> Copy for ComponentHandle<T> {}

impl<T: Component> PartialEq for ComponentHandle<T> {
    fn eq(&self, other: &Self) -> bool {
        self.owner == other.owner
    }
}

impl<T: Component> Eq for ComponentHandle<T> {}

impl<T: Component> Hash for ComponentHandle<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        T::ID.hash(state);
        self.owner.hash(state);
    }
}

impl<T: Component> fmt::Debug for ComponentHandle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", T::NAME, self.owner)
    }
}
