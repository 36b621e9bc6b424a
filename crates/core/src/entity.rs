//! Entity trait: identity + continuity across state changes.

/// Entity whose identity is assigned by the backing store.
///
/// Entities built by a producer have no identity until they are persisted, so
/// `id()` is optional. Once assigned, the identifier never changes.
pub trait Entity {
    /// Strongly-typed entity identifier.
    type Id: Clone + Eq + core::hash::Hash + core::fmt::Debug;

    /// Returns the entity identifier, if the entity has been persisted.
    fn id(&self) -> Option<&Self::Id>;

    fn is_persisted(&self) -> bool {
        self.id().is_some()
    }
}
