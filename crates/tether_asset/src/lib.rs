//! Tether Asset Handles
//!
//! Asset references on the script side are plain values wrapping the UID the
//! native asset manager assigned. The resource itself is owned and streamed
//! entirely by the native side; handles carry no ownership.

mod handle;
mod kind;
mod resolver;

pub use handle::{AssetHandle, AssetUid};
pub use kind::{
    AnimationClip, AssetKind, AudioClip, Material, Mesh, PhysicsMaterial, Prefab, SceneAsset,
    Texture,
};
pub use resolver::{AssetError, AssetKey, AssetLookup, AssetResolver};
