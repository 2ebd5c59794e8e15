use crate::entity::EternalEntity;
use crate::error::Result;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

/// Identity-based lookup into the external store of live entities.
///
/// The registry is the authority on which concrete instance currently
/// carries a given identity. It is queried during revalidation and by
/// [`resolve`](crate::resolve); it is never written to by a reference.
pub trait EntityRegistry<E: EternalEntity> {
    /// Returns the live instance currently registered under `id`, or `None`
    /// when the registry knows no live instance for that identity.
    fn lookup(&self, id: &E::Id) -> Option<E>;
}

impl<E, R> EntityRegistry<E> for &R
where
    E: EternalEntity,
    R: EntityRegistry<E> + ?Sized,
{
    fn lookup(&self, id: &E::Id) -> Option<E> {
        (**self).lookup(id)
    }
}

impl<E, R> EntityRegistry<E> for Arc<R>
where
    E: EternalEntity,
    R: EntityRegistry<E> + ?Sized,
{
    fn lookup(&self, id: &E::Id) -> Option<E> {
        (**self).lookup(id)
    }
}

impl<E, R> EntityRegistry<E> for Box<R>
where
    E: EternalEntity,
    R: EntityRegistry<E> + ?Sized,
{
    fn lookup(&self, id: &E::Id) -> Option<E> {
        (**self).lookup(id)
    }
}

/// In-memory entity registry keyed by stable identity.
///
/// Useful as-is for tests and demos, and as a template for adapters over a
/// real entity store. Interior locking makes the handle shareable; wrap it
/// in an [`Arc`] to feed the same registry to several references.
pub struct InMemoryRegistry<E: EternalEntity> {
    entities: RwLock<HashMap<E::Id, E>>,
}

impl<E: EternalEntity> InMemoryRegistry<E> {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self {
            entities: RwLock::new(HashMap::new()),
        }
    }

    /// Registers `entity` under its own identity, returning the instance it
    /// replaced, if any.
    pub fn insert(&self, entity: E) -> Result<Option<E>> {
        let mut entities = self.entities.write()?;
        Ok(entities.insert(entity.persist_id(), entity))
    }

    /// Removes the instance registered under `id`.
    pub fn remove(&self, id: &E::Id) -> Result<Option<E>> {
        let mut entities = self.entities.write()?;
        Ok(entities.remove(id))
    }

    /// Drops every registered instance.
    pub fn clear(&self) -> Result<()> {
        let mut entities = self.entities.write()?;
        entities.clear();
        Ok(())
    }

    /// Returns the number of registered instances.
    pub fn len(&self) -> usize {
        let entities = self.entities.read().unwrap_or_else(|e| e.into_inner());
        entities.len()
    }

    /// Returns `true` when nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns `true` when an instance is registered under `id`.
    pub fn contains(&self, id: &E::Id) -> bool {
        let entities = self.entities.read().unwrap_or_else(|e| e.into_inner());
        entities.contains_key(id)
    }
}

impl<E: EternalEntity> Default for InMemoryRegistry<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: EternalEntity> std::fmt::Debug for InMemoryRegistry<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryRegistry")
            .field("entities", &self.len())
            .finish()
    }
}

impl<E: EternalEntity + Clone> EntityRegistry<E> for InMemoryRegistry<E> {
    fn lookup(&self, id: &E::Id) -> Option<E> {
        // A poisoned map is still readable; the last coherent state is served.
        let entities = self.entities.read().unwrap_or_else(|e| e.into_inner());
        entities.get(id).cloned()
    }
}

/// Adapter turning a lookup closure into an [`EntityRegistry`].
///
/// Handy for scripted lookup behavior in tests and for bridging registries
/// that only expose a function-style API.
#[derive(Clone)]
pub struct FnRegistry<F> {
    lookup_fn: F,
}

impl<F> FnRegistry<F> {
    /// Wraps `lookup_fn` as a registry.
    pub fn new(lookup_fn: F) -> Self {
        Self { lookup_fn }
    }
}

impl<E, F> EntityRegistry<E> for FnRegistry<F>
where
    E: EternalEntity,
    F: Fn(&E::Id) -> Option<E>,
{
    fn lookup(&self, id: &E::Id) -> Option<E> {
        (self.lookup_fn)(id)
    }
}
