// ============================================================================
// EternalRef Library
// ============================================================================

pub mod entity;
pub mod error;
pub mod prelude;
pub mod reference;
pub mod registry;
pub mod shared;
pub mod stats;
mod macros;

// Re-export main types for convenience
pub use entity::EternalEntity;
pub use error::{EternalError, Result};
pub use reference::EternalRef;
pub use registry::{EntityRegistry, FnRegistry, InMemoryRegistry};
pub use shared::SyncEternalRef;
pub use stats::ReferenceStats;

// ============================================================================
// High-level API
// ============================================================================

/// Wraps an already-resolved instance in a single-threaded revalidating
/// reference. Shorthand for [`EternalRef::wrap`].
///
/// # Examples
///
/// ```
/// use eternalref::{EternalEntity, InMemoryRegistry};
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
/// let reference = eternalref::wrap(
///     Ghost { name: "casper".into(), haunting: true },
///     &town,
/// );
///
/// assert_eq!(reference.entity_id(), "casper");
/// assert!(reference.with(|ghost| ghost.haunting));
/// ```
pub fn wrap<E, R>(instance: E, registry: R) -> EternalRef<E, R>
where
    E: EternalEntity,
    R: EntityRegistry<E>,
{
    EternalRef::wrap(instance, registry)
}

/// Resolves a stored identity through `registry` and wraps the result.
/// Shorthand for [`EternalRef::resolve`].
///
/// # Examples
///
/// ```
/// use eternalref::{EternalEntity, InMemoryRegistry};
///
/// # #[derive(Clone)]
/// # struct Ghost {
/// #     name: String,
/// #     haunting: bool,
/// # }
/// # impl EternalEntity for Ghost {
/// #     type Id = String;
/// #     fn persist_id(&self) -> String {
/// #         self.name.clone()
/// #     }
/// #     fn is_valid(&self) -> bool {
/// #         self.haunting
/// #     }
/// # }
/// # fn main() -> eternalref::Result<()> {
/// let town = InMemoryRegistry::new();
/// town.insert(Ghost { name: "casper".into(), haunting: true })?;
///
/// let reference = eternalref::resolve(&"casper".to_string(), &town)?;
/// assert!(reference.is_valid());
///
/// assert!(eternalref::resolve(&"nobody".to_string(), &town).is_err());
/// # Ok(())
/// # }
/// ```
pub fn resolve<E, R>(id: &E::Id, registry: R) -> Result<EternalRef<E, R>>
where
    E: EternalEntity,
    R: EntityRegistry<E>,
{
    EternalRef::resolve(id, registry)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Lantern {
        id: u32,
        lit: bool,
    }

    impl EternalEntity for Lantern {
        type Id = u32;

        fn persist_id(&self) -> u32 {
            self.id
        }

        fn is_valid(&self) -> bool {
            self.lit
        }
    }

    #[test]
    fn test_wrap_builds_a_working_reference() {
        let registry = InMemoryRegistry::new();
        let reference = wrap(Lantern { id: 9, lit: true }, &registry);

        assert_eq!(reference.entity_id(), 9);
        assert!(reference.is_valid());
    }

    #[test]
    fn test_resolve_requires_a_registered_identity() {
        let registry = InMemoryRegistry::new();
        registry.insert(Lantern { id: 9, lit: true }).unwrap();

        assert!(resolve(&9, &registry).is_ok());
        assert!(matches!(
            resolve::<Lantern, _>(&7, &registry),
            Err(EternalError::NotFound(_))
        ));
    }
}
