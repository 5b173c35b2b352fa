//! Asset kinds the script side can reference

use crate::{AssetHandle, AssetLookup};

/// Marker for a kind of native asset.
pub trait AssetKind: 'static {
    /// Kind name the native asset manager dispatches on.
    const NAME: &'static str;
}

macro_rules! asset_kinds {
    ($($(#[$meta:meta])* $ty:ident => $name:literal),+ $(,)?) => {
        $(
            $(#[$meta])*
            #[derive(Debug, Copy, Clone, PartialEq, Eq)]
            pub enum $ty {}

            impl AssetKind for $ty {
                const NAME: &'static str = $name;
            }
        )+
    };
}

asset_kinds! {
    Texture => "Texture",
    Material => "Material",
    Mesh => "Mesh",
    AnimationClip => "AnimationClip",
    PhysicsMaterial => "PhysicsMaterial",
    AudioClip => "AudioClip",
    /// Instantiable entity template
    Prefab => "Prefab",
    SceneAsset => "Scene",
}

impl AssetHandle<AudioClip> {
    /// Clip length in seconds. Zero when the native side cannot load it.
    pub fn length<L: AssetLookup + ?Sized>(&self, lookup: &L) -> f32 {
        lookup.audio_clip_length(self.uid())
    }
}
