use crate::entity::EternalEntity;
use crate::error::{EternalError, Result};
use crate::registry::EntityRegistry;
use crate::stats::{AtomicCounters, ReferenceStats};
use std::any::Any;
use std::sync::{Mutex, MutexGuard};
use tracing::{Level, event};

/// Shareable counterpart of [`EternalRef`](crate::EternalRef).
///
/// Same revalidation contract, with the slot behind a [`Mutex`] that stays
/// held across the whole check, lookup, adopt and forward sequence, so
/// concurrent callers never observe a half-refreshed slot. The type is
/// `Sync` when `E: Send` and `R: Sync`.
///
/// The registry lookup runs while the slot lock is held: a registry that
/// re-enters the same reference from `lookup` will deadlock. A poisoned
/// slot still holds the last adopted instance, so dispatch recovers it and
/// the next revalidation pass rechecks its validity as usual.
pub struct SyncEternalRef<E, R> {
    slot: Mutex<E>,
    registry: R,
    counters: AtomicCounters,
}

impl<E, R> SyncEternalRef<E, R>
where
    E: EternalEntity,
    R: EntityRegistry<E>,
{
    /// Wraps an already-resolved instance.
    pub fn wrap(instance: E, registry: R) -> Self {
        Self {
            slot: Mutex::new(instance),
            registry,
            counters: AtomicCounters::new(),
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

    /// Runs `op` against the current instance, revalidating first. The slot
    /// lock is held for the duration of `op`.
    pub fn with<T, F>(&self, op: F) -> T
    where
        F: FnOnce(&E) -> T,
    {
        let mut slot = self.lock_slot();
        self.revalidate_slot(&mut slot);
        self.counters.record_forwarded();
        op(&slot)
    }

    /// Runs a mutating `op` against the current instance, revalidating
    /// first. The slot lock is held for the duration of `op`.
    pub fn with_mut<T, F>(&self, op: F) -> T
    where
        F: FnOnce(&mut E) -> T,
    {
        let mut slot = self.lock_slot();
        self.revalidate_slot(&mut slot);
        self.counters.record_forwarded();
        op(&mut slot)
    }

    /// Identity comparison against a raw instance, revalidating first.
    pub fn same_entity(&self, other: &E) -> bool {
        let mut slot = self.lock_slot();
        self.revalidate_slot(&mut slot);
        other.persist_id() == slot.persist_id()
    }

    /// Identity comparison against a value whose type is only known at
    /// runtime. Values that are not instances of the wrapped entity type
    /// compare unequal.
    pub fn equals_any(&self, other: &dyn Any) -> bool
    where
        E: 'static,
    {
        let mut slot = self.lock_slot();
        self.revalidate_slot(&mut slot);
        match other.downcast_ref::<E>() {
            Some(entity) => entity.persist_id() == slot.persist_id(),
            None => false,
        }
    }

    /// Returns the stable identity. Identity never changes across refresh,
    /// so this reads the slot without revalidating.
    pub fn entity_id(&self) -> E::Id {
        self.lock_slot().persist_id()
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
        {
            let mut slot = self.lock_slot();
            self.revalidate_slot(&mut slot);
        }
        self.slot.into_inner().unwrap_or_else(|e| e.into_inner())
    }

    fn lock_slot(&self) -> MutexGuard<'_, E> {
        // A poisoned slot still holds the last adopted instance.
        self.slot.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Staleness check plus at most one registry lookup, all under the
    /// caller's slot lock.
    fn revalidate_slot(&self, slot: &mut E) {
        if slot.is_valid() {
            return;
        }

        let id = slot.persist_id();
        match self.registry.lookup(&id) {
            Some(replacement) => {
                *slot = replacement;
                self.counters.record_adoption();
                event!(
                    Level::DEBUG,
                    entity_id = %id,
                    "sync eternal ref adopted replacement instance"
                );
            }
            None => {
                self.counters.record_miss();
                event!(
                    Level::DEBUG,
                    entity_id = %id,
                    "sync eternal ref refresh missed, keeping stale instance"
                );
            }
        }
    }
}

impl<E, R> PartialEq<E> for SyncEternalRef<E, R>
where
    E: EternalEntity,
    R: EntityRegistry<E>,
{
    fn eq(&self, other: &E) -> bool {
        self.same_entity(other)
    }
}

impl<E, R, R2> PartialEq<SyncEternalRef<E, R2>> for SyncEternalRef<E, R>
where
    E: EternalEntity,
    R: EntityRegistry<E>,
    R2: EntityRegistry<E>,
{
    fn eq(&self, other: &SyncEternalRef<E, R2>) -> bool {
        // Slots are revalidated one at a time; holding both locks at once
        // could deadlock against a reversed comparison.
        let own_id = {
            let mut slot = self.lock_slot();
            self.revalidate_slot(&mut slot);
            slot.persist_id()
        };
        let other_id = {
            let mut slot = other.lock_slot();
            other.revalidate_slot(&mut slot);
            slot.persist_id()
        };
        own_id == other_id
    }
}

impl<E, R> Eq for SyncEternalRef<E, R>
where
    E: EternalEntity,
    R: EntityRegistry<E>,
{
}

impl<E, R> EternalEntity for SyncEternalRef<E, R>
where
    E: EternalEntity,
    R: EntityRegistry<E>,
{
    type Id = E::Id;

    fn persist_id(&self) -> E::Id {
        self.entity_id()
    }

    fn is_valid(&self) -> bool {
        SyncEternalRef::is_valid(self)
    }
}

impl<E, R> Clone for SyncEternalRef<E, R>
where
    E: EternalEntity + Clone,
    R: EntityRegistry<E> + Clone,
{
    /// The clone holds its own copy of the current instance and starts with
    /// fresh diagnostics.
    fn clone(&self) -> Self {
        let instance = self.lock_slot().clone();
        Self {
            slot: Mutex::new(instance),
            registry: self.registry.clone(),
            counters: AtomicCounters::new(),
        }
    }
}

impl<E, R> std::fmt::Debug for SyncEternalRef<E, R>
where
    E: EternalEntity,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.slot.try_lock() {
            Ok(slot) => f
                .debug_struct("SyncEternalRef")
                .field("entity_id", &slot.persist_id().to_string())
                .field("is_valid", &slot.is_valid())
                .finish(),
            Err(_) => f
                .debug_struct("SyncEternalRef")
                .field("slot", &"<locked>")
                .finish(),
        }
    }
}
