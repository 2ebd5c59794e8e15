//! Ghost town walkthrough.
//!
//! A town registry spawns and despawns ghosts. A ghost instance that has been
//! despawned is useless on its own, but an `EternalRef` keeps answering: it
//! notices the stale instance and adopts whichever respawn the registry
//! currently holds under the same identity.
//!
//! Run with:
//!   cargo run --example ghost_town

use eternalref::{EternalEntity, EternalRef, InMemoryRegistry, eternal_forward};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use uuid::Uuid;

#[derive(Debug, Clone)]
struct Ghost {
    id: Uuid,
    incarnation: u32,
    mood: String,
    haunting: Arc<AtomicBool>,
}

impl Ghost {
    fn spawned(id: Uuid, incarnation: u32, mood: &str) -> Self {
        Self {
            id,
            incarnation,
            mood: mood.to_string(),
            haunting: Arc::new(AtomicBool::new(true)),
        }
    }

    fn banish(&self) {
        self.haunting.store(false, Ordering::SeqCst);
    }
}

impl EternalEntity for Ghost {
    type Id = Uuid;

    fn persist_id(&self) -> Uuid {
        self.id
    }

    fn is_valid(&self) -> bool {
        self.haunting.load(Ordering::SeqCst)
    }
}

trait Spook: EternalEntity {
    fn wail(&self) -> String;
    fn cheer_up(&mut self, mood: String) -> String;
}

impl Spook for Ghost {
    fn wail(&self) -> String {
        format!(
            "incarnation {} wails: oooo... (feeling {})",
            self.incarnation, self.mood
        )
    }

    fn cheer_up(&mut self, mood: String) -> String {
        std::mem::replace(&mut self.mood, mood)
    }
}

eternal_forward! {
    impl Spook {
        fn wail(&self) -> String;
        fn cheer_up(&mut self, mood: String) -> String;
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("=== Ghost Town ===\n");

    let town = InMemoryRegistry::new();
    let casper_id = Uuid::new_v4();

    println!("1) Spawn Casper and hand out a reference");
    let first_spawn = Ghost::spawned(casper_id, 1, "gloomy");
    town.insert(first_spawn.clone())?;
    let mut casper = EternalRef::wrap(first_spawn.clone(), &town);
    println!("   {}", casper.wail());

    println!("\n2) Banish the first incarnation; the reference keeps answering");
    first_spawn.banish();
    town.remove(&casper_id)?;
    println!("   {}", casper.wail());

    println!("\n3) Respawn under the same identity; the reference catches up");
    town.insert(Ghost::spawned(casper_id, 2, "cheerful"))?;
    println!("   {}", casper.wail());
    let previous_mood = casper.cheer_up("ecstatic".to_string());
    println!("   mood went from {previous_mood:?} to...");
    println!("   {}", casper.wail());

    println!("\n4) Identity comparison survives the respawn");
    let third_spawn = Ghost::spawned(casper_id, 3, "sleepy");
    let stranger = Ghost::spawned(Uuid::new_v4(), 1, "grumpy");
    println!("   casper == third spawn of the same ghost? {}", casper == third_spawn);
    println!("   casper == some stranger? {}", casper == stranger);

    println!("\n5) What the reference has been up to");
    let stats = casper.stats();
    println!("   {stats}");
    println!("   as JSON: {}", serde_json::to_string_pretty(&stats)?);

    Ok(())
}
