//! One-stop imports for the common surface.
//!
//! App code normally wants the entity and registry contracts, one of the two
//! reference types, and the forwarding macro.

pub use crate::{
    EntityRegistry, EternalEntity, EternalError, EternalRef, FnRegistry, InMemoryRegistry,
    ReferenceStats, Result, SyncEternalRef, eternal_forward, resolve, wrap,
};
