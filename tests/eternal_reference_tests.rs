use eternalref::{
    EntityRegistry, EternalEntity, EternalError, EternalRef, FnRegistry, InMemoryRegistry,
};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use uuid::Uuid;

#[derive(Debug, Clone)]
struct Mob {
    id: Uuid,
    generation: u32,
    health: i32,
    alive: Arc<AtomicBool>,
}

impl Mob {
    fn spawned(id: Uuid, generation: u32) -> Self {
        Self {
            id,
            generation,
            health: 20,
            alive: Arc::new(AtomicBool::new(true)),
        }
    }

    fn despawn(&self) {
        self.alive.store(false, Ordering::SeqCst);
    }

    fn strike(&mut self, damage: i32) -> Result<i32, String> {
        if !self.is_valid() {
            return Err(format!("mob {} is gone", self.id));
        }
        self.health -= damage;
        Ok(self.health)
    }
}

// Raw equality is structural: a respawned instance never equals its
// predecessor, even though both carry the same registry identity.
impl PartialEq for Mob {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id && self.generation == other.generation
    }
}

impl EternalEntity for Mob {
    type Id = Uuid;

    fn persist_id(&self) -> Uuid {
        self.id
    }

    fn is_valid(&self) -> bool {
        self.alive.load(Ordering::SeqCst)
    }
}

struct CountingRegistry {
    inner: InMemoryRegistry<Mob>,
    lookups: AtomicU64,
}

impl CountingRegistry {
    fn new() -> Self {
        Self {
            inner: InMemoryRegistry::new(),
            lookups: AtomicU64::new(0),
        }
    }

    fn lookups(&self) -> u64 {
        self.lookups.load(Ordering::SeqCst)
    }
}

impl EntityRegistry<Mob> for CountingRegistry {
    fn lookup(&self, id: &Uuid) -> Option<Mob> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        self.inner.lookup(id)
    }
}

#[test]
fn wrapped_reference_forwards_operations_while_instance_is_valid() {
    let registry = CountingRegistry::new();
    let mob = Mob::spawned(Uuid::new_v4(), 1);
    let reference = EternalRef::wrap(mob.clone(), &registry);

    assert_eq!(reference.with(|m| m.health), 20);
    assert_eq!(reference.with_mut(|m| m.strike(4)).unwrap(), 16);
    assert_eq!(registry.lookups(), 0);
}

#[test]
fn stale_instance_is_replaced_through_registry_lookup() {
    let registry = CountingRegistry::new();
    let id = Uuid::new_v4();

    let first_spawn = Mob::spawned(id, 1);
    let reference = EternalRef::wrap(first_spawn.clone(), &registry);
    first_spawn.despawn();

    let second_spawn = Mob::spawned(id, 2);
    registry.inner.insert(second_spawn.clone()).unwrap();

    assert_eq!(reference.with(|m| m.generation), 2);
    assert!(reference.same_entity(&second_spawn));
    assert_eq!(reference.stats().refresh_adoptions, 1);
}

#[test]
fn lookup_miss_keeps_forwarding_to_the_stale_instance() {
    let registry = CountingRegistry::new();
    let mob = Mob::spawned(Uuid::new_v4(), 1);
    let reference = EternalRef::wrap(mob.clone(), &registry);
    mob.despawn();

    assert_eq!(reference.with(|m| m.generation), 1);

    let failure = reference.with_mut(|m| m.strike(4)).unwrap_err();
    assert!(failure.contains("is gone"));

    let stats = reference.stats();
    assert_eq!(stats.refresh_adoptions, 0);
    assert_eq!(stats.refresh_misses, 2);
}

#[test]
fn exactly_one_lookup_happens_per_forwarded_call() {
    let registry = CountingRegistry::new();
    let id = Uuid::new_v4();
    let mob = Mob::spawned(id, 1);
    let reference = EternalRef::wrap(mob.clone(), &registry);
    mob.despawn();

    for _ in 0..3 {
        reference.with(|m| m.generation);
    }
    assert_eq!(registry.lookups(), 3);

    registry.inner.insert(Mob::spawned(id, 2)).unwrap();
    assert_eq!(reference.with(|m| m.generation), 2);
    assert_eq!(registry.lookups(), 4);

    reference.with(|m| m.health);
    reference.with(|m| m.health);
    assert_eq!(registry.lookups(), 4);

    let stats = reference.stats();
    assert_eq!(stats.forwarded_calls, 6);
    assert_eq!(stats.refresh_attempts(), 4);
}

#[test]
fn identity_comparison_follows_identity_not_structure() {
    let registry = InMemoryRegistry::new();
    let id = Uuid::new_v4();

    let first_spawn = Mob::spawned(id, 1);
    let second_spawn = Mob::spawned(id, 2);
    let stranger = Mob::spawned(Uuid::new_v4(), 1);

    let reference = EternalRef::wrap(first_spawn.clone(), &registry);

    assert!(reference == second_spawn);
    assert!(reference.same_entity(&second_spawn));
    assert!(reference != stranger);

    let other_reference = EternalRef::wrap(second_spawn.clone(), &registry);
    assert!(reference == other_reference);

    // The raw side keeps its own structural equality.
    assert_ne!(first_spawn, second_spawn);
}

#[test]
fn equals_any_accepts_only_the_wrapped_entity_type() {
    let registry = InMemoryRegistry::new();
    let id = Uuid::new_v4();
    let reference = EternalRef::wrap(Mob::spawned(id, 1), &registry);

    assert!(reference.equals_any(&Mob::spawned(id, 5)));
    assert!(!reference.equals_any(&Mob::spawned(Uuid::new_v4(), 1)));
    assert!(!reference.equals_any(&"not a mob"));
    assert!(!reference.equals_any(&42_u64));
}

#[test]
fn reference_follows_the_entity_across_respawns() {
    let registry = InMemoryRegistry::new();
    let e1 = Uuid::new_v4();

    let a = Mob::spawned(e1, 1);
    let reference = EternalRef::wrap(a.clone(), &registry);
    a.despawn();

    let b = Mob::spawned(e1, 2);
    registry.insert(b.clone()).unwrap();
    let c = Mob::spawned(Uuid::new_v4(), 2);

    assert_eq!(reference.with(|m| m.generation), 2);
    assert!(reference == b);
    assert!(reference != c);
}

#[test]
fn equality_check_revalidates_exactly_once() {
    let registry = CountingRegistry::new();
    let id = Uuid::new_v4();
    let mob = Mob::spawned(id, 1);
    let reference = EternalRef::wrap(mob.clone(), &registry);
    mob.despawn();
    registry.inner.insert(Mob::spawned(id, 2)).unwrap();

    assert!(reference.same_entity(&Mob::spawned(id, 9)));
    assert_eq!(registry.lookups(), 1);

    // The adopted instance is valid, so the next call needs no lookup.
    assert_eq!(reference.with(|m| m.generation), 2);
    assert_eq!(registry.lookups(), 1);
    assert_eq!(reference.stats().forwarded_calls, 1);
}

#[test]
fn resolve_builds_a_reference_from_a_stored_identity() {
    let registry = InMemoryRegistry::new();
    let id = Uuid::new_v4();
    registry.insert(Mob::spawned(id, 1)).unwrap();

    let reference = EternalRef::resolve(&id, &registry).unwrap();
    assert_eq!(reference.entity_id(), id);
    assert_eq!(reference.with(|m| m.generation), 1);

    let unknown = Uuid::new_v4();
    let err = EternalRef::resolve(&unknown, &registry).unwrap_err();
    assert!(matches!(err, EternalError::NotFound(_)));
    assert!(err.to_string().contains(&unknown.to_string()));
}

#[test]
fn stats_snapshot_reflects_the_reference_history() {
    let registry = CountingRegistry::new();
    let id = Uuid::new_v4();
    let mob = Mob::spawned(id, 1);
    let reference = EternalRef::wrap(mob.clone(), &registry);

    reference.with(|m| m.health);
    mob.despawn();
    reference.with(|m| m.health);
    registry.inner.insert(Mob::spawned(id, 2)).unwrap();
    reference.with(|m| m.health);

    let stats = reference.stats();
    assert_eq!(stats.forwarded_calls, 3);
    assert_eq!(stats.refresh_misses, 1);
    assert_eq!(stats.refresh_adoptions, 1);
    assert!(stats.created_at <= stats.last_refresh_at.unwrap());
    assert_eq!(
        stats.to_string(),
        "Reference Stats: 3 forwarded, 2 refreshes (1 adopted, 1 missed)"
    );
}

#[test]
fn into_inner_yields_the_freshest_instance() {
    let registry = InMemoryRegistry::new();
    let id = Uuid::new_v4();
    let mob = Mob::spawned(id, 1);
    let reference = EternalRef::wrap(mob.clone(), &registry);
    mob.despawn();
    registry.insert(Mob::spawned(id, 2)).unwrap();

    let instance = reference.into_inner();
    assert_eq!(instance.generation, 2);
    assert!(instance.is_valid());
}

trait Haunt: EternalEntity<Id = Uuid> {
    fn scare_level(&self) -> u32;
}

impl Haunt for Mob {
    fn scare_level(&self) -> u32 {
        self.generation * 10
    }
}

#[test]
fn boxed_trait_objects_can_sit_behind_a_reference() {
    let id = Uuid::new_v4();
    let registry = FnRegistry::new(move |looked_up: &Uuid| {
        if *looked_up == id {
            Some(Box::new(Mob::spawned(id, 2)) as Box<dyn Haunt>)
        } else {
            None
        }
    });

    let original = Mob::spawned(id, 1);
    let reference = EternalRef::wrap(Box::new(original.clone()) as Box<dyn Haunt>, registry);

    assert_eq!(reference.with(|h| h.scare_level()), 10);

    original.despawn();
    assert_eq!(reference.with(|h| h.scare_level()), 20);
    assert_eq!(reference.stats().refresh_adoptions, 1);
}
