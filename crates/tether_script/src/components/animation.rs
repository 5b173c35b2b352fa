use crate::{BoundaryError, ComponentHandle, World};
use tether_asset::{AnimationClip, AssetHandle, AssetUid};
use tether_core::define_component;

/// Clip player driven by the native animation system.
pub struct Animation;
define_component!(Animation, 5, "Animation");

#[derive(Debug, Copy, Clone, PartialEq)]
pub enum AnimationCommand {
    /// Cross-fade to `clip` over `seconds`.
    Blend { clip: AssetUid, seconds: f32 },
    Play,
    Pause,
    Resume,
    Stop,
}

impl ComponentHandle<Animation> {
    fn send(&self, world: &mut World<'_>, command: AnimationCommand) -> Result<(), BoundaryError> {
        self.check(world)?;
        world.host_mut().animation(self.owner(), command);
        Ok(())
    }

    pub fn blend(
        &self,
        world: &mut World<'_>,
        clip: AssetHandle<AnimationClip>,
        seconds: f32,
    ) -> Result<(), BoundaryError> {
        self.send(
            world,
            AnimationCommand::Blend {
                clip: clip.uid(),
                seconds,
            },
        )
    }

    pub fn play(&self, world: &mut World<'_>) -> Result<(), BoundaryError> {
        self.send(world, AnimationCommand::Play)
    }

    pub fn pause(&self, world: &mut World<'_>) -> Result<(), BoundaryError> {
        self.send(world, AnimationCommand::Pause)
    }

    pub fn resume(&self, world: &mut World<'_>) -> Result<(), BoundaryError> {
        self.send(world, AnimationCommand::Resume)
    }

    pub fn stop(&self, world: &mut World<'_>) -> Result<(), BoundaryError> {
        self.send(world, AnimationCommand::Stop)
    }
}
