use crate::entity::EternalEntity;
use crate::error::{EternalError, Result};
use crate::registry::EntityRegistry;
use crate::stats::{CellCounters, ReferenceStats};
use std::any::Any;
use std::cell::RefCell;
use tracing::{Level, event};

/// Self-revalidating reference to an entity in an external registry.
///
/// Wraps one concrete instance together with the registry that can resolve
/// its stable identity. Every dispatched call first checks the current
/// instance's validity; a stale instance triggers exactly one registry
/// lookup under the stable identity. A hit replaces the slot wholesale with
/// the fresh instance, a miss keeps the stale one and the call proceeds
/// against it, letting the underlying operation fail on its own terms.
/// Refresh is lazy: nothing happens between calls.
///
/// # Equality
///
/// Comparisons with the reference on the left-hand side are identity based:
/// `reference == raw` holds exactly when both sides carry the same stable
/// identity, however stale either instance is. The reverse direction is
/// outside this crate's control: `raw == reference` only compiles if the
/// entity type provides such an impl, and `raw_a == raw_b` uses the entity's
/// own `PartialEq`, which usually compares structure rather than identity.
/// That asymmetry comes with wrapping a foreign type and is left as is.
/// [`equals_any`](Self::equals_any) covers comparisons against values whose
/// type is only known at runtime.
///
/// # Concurrency
///
/// The slot is a [`RefCell`], so the type is `!Sync` by construction. Use it
/// from a single thread, or reach for [`SyncEternalRef`](crate::SyncEternalRef)
/// when the reference must be shared.
///
/// # Examples
///
/// ```
/// use eternalref::{EternalEntity, EternalRef, InMemoryRegistry};
///
/// #[derive(Clone)]
/// struct Ghost {
///     name: String,
///     haunting: bool,
/// }
///
/// impl EternalEntity for Ghost {
///     type Id = String;
///
///     fn persist_id(&self) -> String {
///         self.name.clone()
///     }
///
///     fn is_valid(&self) -> bool {
///         self.haunting
///     }
/// }
///
/// let town = InMemoryRegistry::new();
/// let casper = Ghost { name: "casper".into(), haunting: true };
/// let reference = EternalRef::wrap(casper, &town);
///
/// assert!(reference.is_valid());
/// assert_eq!(reference.with(|ghost| ghost.name.clone()), "casper");
/// ```
pub struct EternalRef<E, R> {
    slot: RefCell<E>,
    registry: R,
    counters: CellCounters,
}

impl<E, R> EternalRef<E, R>
where
    E: EternalEntity,
    R: EntityRegistry<E>,
{
    /// Wraps an already-resolved instance.
    pub fn wrap(instance: E, registry: R) -> Self {
        Self {
            slot: RefCell::new(instance),
            registry,
            counters: CellCounters::new(),
        }
    }

    /// Builds a reference from a stored identity by resolving it through the
    /// registry. Fails with [`EternalError::NotFound`] when the registry has
    /// no live instance for `id`.
    pub fn resolve(id: &E::Id, registry: R) -> Result<Self> {
        match registry.lookup(id) {
            Some(instance) => Ok(Self::wrap(instance, registry)),
            None => Err(EternalError::NotFound(id.to_string())),
        }
    }

    /// Runs `op` against the current instance, revalidating first.
    ///
    /// `op` executes while the slot is borrowed: re-entering the same
    /// reference from inside it panics, and the closure must return owned
    /// data since borrows cannot outlive the slot.
    pub fn with<T, F>(&self, op: F) -> T
    where
        F: FnOnce(&E) -> T,
    {
        self.revalidate();
        self.counters.record_forwarded();
        op(&self.slot.borrow())
    }

    /// Runs a mutating `op` against the current instance, revalidating
    /// first. Same borrow rules as [`with`](Self::with).
    pub fn with_mut<T, F>(&self, op: F) -> T
    where
        F: FnOnce(&mut E) -> T,
    {
        self.revalidate();
        self.counters.record_forwarded();
        op(&mut self.slot.borrow_mut())
    }

    /// Identity comparison against a raw instance, revalidating first.
    pub fn same_entity(&self, other: &E) -> bool {
        self.revalidate();
        other.persist_id() == self.slot.borrow().persist_id()
    }

    /// Identity comparison against a value whose type is only known at
    /// runtime. Values that are not instances of the wrapped entity type
    /// compare unequal.
    pub fn equals_any(&self, other: &dyn Any) -> bool
    where
        E: 'static,
    {
        self.revalidate();
        match other.downcast_ref::<E>() {
            Some(entity) => entity.persist_id() == self.slot.borrow().persist_id(),
            None => false,
        }
    }

    /// Returns the stable identity. Identity never changes across refresh,
    /// so this reads the slot without revalidating.
    pub fn entity_id(&self) -> E::Id {
        self.slot.borrow().persist_id()
    }

    /// Reports validity of the instance the reference settles on after a
    /// revalidation pass.
    pub fn is_valid(&self) -> bool {
        self.with(|entity| entity.is_valid())
    }

    /// Returns a snapshot of this reference's diagnostics.
    pub fn stats(&self) -> ReferenceStats {
        self.counters.snapshot()
    }

    /// Returns the registry handle this reference resolves through.
    pub fn registry(&self) -> &R {
        &self.registry
    }

    /// Consumes the reference, yielding the current instance after a final
    /// revalidation pass.
    pub fn into_inner(self) -> E {
        self.revalidate();
        self.slot.into_inner()
    }

    /// Staleness check plus at most one registry lookup. The slot is not
    /// borrowed across the lookup, so registries may take their own locks.
    fn revalidate(&self) {
        if self.slot.borrow().is_valid() {
            return;
        }

        let id = self.slot.borrow().persist_id();
        match self.registry.lookup(&id) {
            Some(replacement) => {
                *self.slot.borrow_mut() = replacement;
                self.counters.record_adoption();
                event!(
                    Level::DEBUG,
                    entity_id = %id,
                    "eternal ref adopted replacement instance"
                );
            }
            None => {
                self.counters.record_miss();
                event!(
                    Level::DEBUG,
                    entity_id = %id,
                    "eternal ref refresh missed, keeping stale instance"
                );
            }
        }
    }
}

impl<E, R> PartialEq<E> for EternalRef<E, R>
where
    E: EternalEntity,
    R: EntityRegistry<E>,
{
    fn eq(&self, other: &E) -> bool {
        self.same_entity(other)
    }
}

impl<E, R, R2> PartialEq<EternalRef<E, R2>> for EternalRef<E, R>
where
    E: EternalEntity,
    R: EntityRegistry<E>,
    R2: EntityRegistry<E>,
{
    fn eq(&self, other: &EternalRef<E, R2>) -> bool {
        self.revalidate();
        other.revalidate();
        self.entity_id() == other.entity_id()
    }
}

impl<E, R> Eq for EternalRef<E, R>
where
    E: EternalEntity,
    R: EntityRegistry<E>,
{
}

impl<E, R> EternalEntity for EternalRef<E, R>
where
    E: EternalEntity,
    R: EntityRegistry<E>,
{
    type Id = E::Id;

    fn persist_id(&self) -> E::Id {
        self.entity_id()
    }

    fn is_valid(&self) -> bool {
        EternalRef::is_valid(self)
    }
}

impl<E, R> Clone for EternalRef<E, R>
where
    E: EternalEntity + Clone,
    R: EntityRegistry<E> + Clone,
{
    /// The clone holds its own copy of the current instance and starts with
    /// fresh diagnostics.
    fn clone(&self) -> Self {
        Self {
            slot: RefCell::new(self.slot.borrow().clone()),
            registry: self.registry.clone(),
            counters: CellCounters::new(),
        }
    }
}

impl<E, R> std::fmt::Debug for EternalRef<E, R>
where
    E: EternalEntity,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.slot.try_borrow() {
            Ok(slot) => f
                .debug_struct("EternalRef")
                .field("entity_id", &slot.persist_id().to_string())
                .field("is_valid", &slot.is_valid())
                .finish(),
            Err(_) => f
                .debug_struct("EternalRef")
                .field("slot", &"<borrowed>")
                .finish(),
        }
    }
}
