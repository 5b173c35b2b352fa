use crate::{BoundaryError, ComponentHandle, World};
use tether_asset::{AssetHandle, Material};
use tether_core::define_component;

/// Renderable mesh with per-slot materials.
pub struct Model;
define_component!(Model, 3, "Model");

impl ComponentHandle<Model> {
    pub fn enabled(&self, world: &World<'_>) -> Result<bool, BoundaryError> {
        self.check(world)?;
        Ok(world.host().model_enabled(self.owner()))
    }

    pub fn set_enabled(&self, world: &mut World<'_>, enabled: bool) -> Result<(), BoundaryError> {
        self.check(world)?;
        world.host_mut().set_model_enabled(self.owner(), enabled);
        Ok(())
    }

    /// Material bound to slot `index`, if any.
    pub fn material(
        &self,
        world: &World<'_>,
        index: u32,
    ) -> Result<Option<AssetHandle<Material>>, BoundaryError> {
        self.check(world)?;
        Ok(world
            .host()
            .model_material(self.owner(), index)
            .and_then(AssetHandle::from_resolved))
    }

    /// Bind or clear (`None`) the material of slot `index`.
    pub fn set_material(
        &self,
        world: &mut World<'_>,
        index: u32,
        material: Option<AssetHandle<Material>>,
    ) -> Result<(), BoundaryError> {
        self.check(world)?;
        world
            .host_mut()
            .set_model_material(self.owner(), index, material.map(|m| m.uid()));
        Ok(())
    }
}
