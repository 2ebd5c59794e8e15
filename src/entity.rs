use std::fmt::Display;
use std::hash::Hash;

/// Contract for values that can live behind a self-revalidating reference.
///
/// A logical entity keeps one stable identity for its whole life, while the
/// concrete instance carrying it may be torn down and recreated by the
/// registry at any time. The identity is what survives; the instance is
/// disposable.
pub trait EternalEntity {
    /// Stable identity of the logical entity. Constant across teardown and
    /// recreation of the concrete instance.
    type Id: Clone + Eq + Hash + Display;

    /// Returns the stable identity of this instance.
    fn persist_id(&self) -> Self::Id;

    /// Reports whether this concrete instance is still usable.
    ///
    /// An instance that reports `false` is expected to stay invalid; the
    /// registry hands out fresh instances under the same identity instead of
    /// reviving old ones.
    fn is_valid(&self) -> bool;
}

impl<E: EternalEntity + ?Sized> EternalEntity for Box<E> {
    type Id = E::Id;

    fn persist_id(&self) -> Self::Id {
        (**self).persist_id()
    }

    fn is_valid(&self) -> bool {
        (**self).is_valid()
    }
}
