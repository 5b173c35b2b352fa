//! Key/uid resolution against the native asset manager

use crate::{AssetHandle, AssetKind, AssetUid};
use std::fmt;
use thiserror::Error;

/// What a lookup was asked for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssetKey {
    Key(String),
    Uid(AssetUid),
}

impl fmt::Display for AssetKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AssetKey::Key(key) => write!(f, "'{key}'"),
            AssetKey::Uid(uid) => write!(f, "uid {uid}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AssetError {
    #[error("no {kind} asset for {key}")]
    NotFound { kind: &'static str, key: AssetKey },
}

/// Native asset manager capability.
///
/// A miss is `None`, never a nil uid dressed up as an answer.
pub trait AssetLookup {
    fn asset_by_key(&self, kind: &'static str, key: &str) -> Option<AssetUid>;

    fn asset_by_uid(&self, kind: &'static str, uid: AssetUid) -> Option<AssetUid>;

    /// Length in seconds of an audio clip, zero if it cannot be loaded.
    fn audio_clip_length(&self, uid: AssetUid) -> f32;
}

/// Resolves keys and uids to typed handles.
///
/// Every call asks the native side; nothing is cached here, so a resolve
/// after the native side drops an asset reports the miss.
pub struct AssetResolver<'a, L: AssetLookup + ?Sized> {
    lookup: &'a L,
}

impl<'a, L: AssetLookup + ?Sized> AssetResolver<'a, L> {
    pub fn new(lookup: &'a L) -> Self {
        Self { lookup }
    }

    pub fn resolve_key<T: AssetKind>(&self, key: &str) -> Result<AssetHandle<T>, AssetError> {
        let uid = self
            .lookup
            .asset_by_key(T::NAME, key)
            .filter(|uid| !uid.is_nil());
        Self::wrap::<T>(uid, || AssetKey::Key(key.to_owned()))
    }

    pub fn resolve_uid<T: AssetKind>(&self, uid: AssetUid) -> Result<AssetHandle<T>, AssetError> {
        let found = if uid.is_nil() {
            None
        } else {
            self.lookup
                .asset_by_uid(T::NAME, uid)
                .filter(|uid| !uid.is_nil())
        };
        Self::wrap::<T>(found, || AssetKey::Uid(uid))
    }

    fn wrap<T: AssetKind>(
        uid: Option<AssetUid>,
        key: impl FnOnce() -> AssetKey,
    ) -> Result<AssetHandle<T>, AssetError> {
        match uid {
            Some(uid) => Ok(AssetHandle::new(uid)),
            None => {
                let key = key();
                tracing::debug!(kind = T::NAME, %key, "asset lookup missed");
                Err(AssetError::NotFound { kind: T::NAME, key })
            }
        }
    }
}
