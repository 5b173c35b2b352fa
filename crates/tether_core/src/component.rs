// component.rs - Component type tags
//
// Components cross the boundary as (owner entity, type tag). Tags are u32 ids,
// not Rust TypeIds, so native kinds and script-defined kinds share one id space.
// Component data itself lives on the native side.

use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::fmt;
use std::sync::{PoisonError, RwLock};
use thiserror::Error;

pub type ComponentId = u32;

/// Runtime type tag handed to the native side.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct ComponentType {
    pub id: ComponentId,
    pub name: &'static str,
}

impl ComponentType {
    pub const fn new(id: ComponentId, name: &'static str) -> Self {
        Self { id, name }
    }

    pub fn of<T: Component>() -> Self {
        Self::new(T::ID, T::NAME)
    }
}

impl fmt::Display for ComponentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// Two component kinds claimed the same id.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("component id {id} is claimed by both '{existing}' and '{requested}'")]
pub struct ComponentIdConflict {
    pub id: ComponentId,
    pub existing: &'static str,
    pub requested: &'static str,
}

/// Process-wide table of every component kind seen so far.
static REGISTRY: Lazy<RwLock<HashMap<ComponentId, ComponentType>>> =
    Lazy::new(|| RwLock::new(HashMap::new()));

/// Register a component kind.
///
/// Re-registering the same (id, name) pair is a no-op. A different name for
/// an id that is already taken is rejected.
pub fn register_component(ty: ComponentType) -> Result<(), ComponentIdConflict> {
    let mut map = REGISTRY.write().unwrap_or_else(PoisonError::into_inner);
    match map.get(&ty.id) {
        Some(prev) if prev.name != ty.name => Err(ComponentIdConflict {
            id: ty.id,
            existing: prev.name,
            requested: ty.name,
        }),
        Some(_) => Ok(()),
        None => {
            tracing::trace!(id = ty.id, name = ty.name, "registered component kind");
            map.insert(ty.id, ty);
            Ok(())
        }
    }
}

/// Look up a registered kind by id.
pub fn component_by_id(id: ComponentId) -> Option<ComponentType> {
    REGISTRY
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .get(&id)
        .copied()
}

/// A component kind the script side can name.
///
/// Implementors are markers: the data they describe is owned by the native
/// engine and reached through typed proxies.
pub trait Component: 'static {
    /// Globally unique component id.
    const ID: ComponentId;

    /// Human-readable name for diagnostics.
    const NAME: &'static str;

    fn component_type() -> ComponentType {
        ComponentType::new(Self::ID, Self::NAME)
    }

    /// Register this kind with the global table.
    fn ensure_registered() -> Result<ComponentType, ComponentIdConflict> {
        let ty = Self::component_type();
        register_component(ty)?;
        Ok(ty)
    }
}

/// Helper macro to implement the Component trait.
///
/// # Example
/// ```ignore
/// pub struct Health;
/// define_component!(Health, 1000, "Health");
/// ```
#[macro_export]
macro_rules! define_component {
    ($ty:ty, $id:expr, $name:expr) => {
        impl $crate::component::Component for $ty {
            const ID: $crate::component::ComponentId = $id;
            const NAME: &'static str = $name;
        }
    };
}
