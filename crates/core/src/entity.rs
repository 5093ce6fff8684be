//! Entity trait: a persisted record with a stable identity.

/// Entity marker + minimal interface.
///
/// Implemented by every stored model so storage adapters can key records
/// uniformly.
pub trait Entity {
    /// Strongly-typed entity identifier.
    type Id: Copy + Eq + core::hash::Hash + core::fmt::Debug + Send + Sync;

    /// Returns the entity identifier.
    fn id(&self) -> Self::Id;
}
