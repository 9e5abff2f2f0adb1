//! Identity of persisted records.

/// A record with a stable surrogate id assigned by the store.
pub trait Entity {
    type Id: Copy + Eq + core::hash::Hash + core::fmt::Debug;

    fn id(&self) -> Self::Id;
}
