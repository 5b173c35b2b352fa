use crate::AssetKind;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;
use uuid::Uuid;

/// Engine-assigned stable asset identity.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AssetUid(Uuid);

impl AssetUid {
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub const fn from_bytes(bytes: [u8; 16]) -> Self {
        Self(Uuid::from_bytes(bytes))
    }

    /// Fresh random uid (used by native-side stand-ins when importing).
    pub fn new_random() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }

    pub fn to_bytes(self) -> [u8; 16] {
        self.0.into_bytes()
    }

    /// The all-zero uid the native side uses for "no asset".
    pub fn is_nil(&self) -> bool {
        self.0.is_nil()
    }
}

impl fmt::Display for AssetUid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

/// Typed, value-semantics reference to a native asset.
///
/// Equal by uid: two handles resolved separately for the same asset are
/// interchangeable.
pub struct AssetHandle<T: AssetKind> {
    uid: AssetUid,
    _kind: PhantomData<fn() -> T>,
}

impl<T: AssetKind> AssetHandle<T> {
    pub(crate) fn new(uid: AssetUid) -> Self {
        Self {
            uid,
            _kind: PhantomData,
        }
    }

    /// Wrap a uid that is already known to name a `T`, e.g. one reported by
    /// a component query on the native side.
    ///
    /// Returns `None` for the nil uid.
    pub fn from_resolved(uid: AssetUid) -> Option<Self> {
        (!uid.is_nil()).then(|| Self::new(uid))
    }

    pub fn uid(&self) -> AssetUid {
        self.uid
    }

    pub fn kind(&self) -> &'static str {
        T::NAME
    }
}

// Manual impls: derives would put bounds on T.
impl<T: AssetKind> Clone for AssetHandle<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T: AssetKind> Copy for AssetHandle<T> {}

impl<T: AssetKind> PartialEq for AssetHandle<T> {
    fn eq(&self, other: &Self) -> bool {
        self.uid == other.uid
    }
}

impl<T: AssetKind> Eq for AssetHandle<T> {}

impl<T: AssetKind> Hash for AssetHandle<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.uid.hash(state);
    }
}

impl<T: AssetKind> fmt::Debug for AssetHandle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AssetHandle<{}>({})", T::NAME, self.uid)
    }
}
