use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cell::Cell;
use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};

/// Point-in-time diagnostics for a single reference.
///
/// `forwarded_calls` counts operations handed to the underlying instance.
/// Identity comparisons are answered by the reference itself and are not
/// counted as forwarded, although they do run the staleness check and can
/// therefore contribute to `refresh_adoptions` and `refresh_misses`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReferenceStats {
    pub forwarded_calls: u64,
    pub refresh_adoptions: u64,
    pub refresh_misses: u64,
    pub created_at: DateTime<Utc>,
    pub last_refresh_at: Option<DateTime<Utc>>,
}

impl ReferenceStats {
    /// Total refresh attempts made against the registry (adoptions plus
    /// misses).
    pub fn refresh_attempts(&self) -> u64 {
        self.refresh_adoptions + self.refresh_misses
    }
}

impl std::fmt::Display for ReferenceStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Reference Stats: {} forwarded, {} refreshes ({} adopted, {} missed)",
            self.forwarded_calls,
            self.refresh_attempts(),
            self.refresh_adoptions,
            self.refresh_misses
        )
    }
}

/// Counters for the single-threaded reference.
pub(crate) struct CellCounters {
    forwarded: Cell<u64>,
    adoptions: Cell<u64>,
    misses: Cell<u64>,
    created_at: DateTime<Utc>,
    last_refresh: Cell<Option<DateTime<Utc>>>,
}

impl CellCounters {
    pub(crate) fn new() -> Self {
        Self {
            forwarded: Cell::new(0),
            adoptions: Cell::new(0),
            misses: Cell::new(0),
            created_at: Utc::now(),
            last_refresh: Cell::new(None),
        }
    }

    pub(crate) fn record_forwarded(&self) {
        self.forwarded.set(self.forwarded.get() + 1);
    }

    pub(crate) fn record_adoption(&self) {
        self.adoptions.set(self.adoptions.get() + 1);
        self.last_refresh.set(Some(Utc::now()));
    }

    pub(crate) fn record_miss(&self) {
        self.misses.set(self.misses.get() + 1);
        self.last_refresh.set(Some(Utc::now()));
    }

    pub(crate) fn snapshot(&self) -> ReferenceStats {
        ReferenceStats {
            forwarded_calls: self.forwarded.get(),
            refresh_adoptions: self.adoptions.get(),
            refresh_misses: self.misses.get(),
            created_at: self.created_at,
            last_refresh_at: self.last_refresh.get(),
        }
    }
}

/// Counters for the shared reference.
pub(crate) struct AtomicCounters {
    forwarded: AtomicU64,
    adoptions: AtomicU64,
    misses: AtomicU64,
    created_at: DateTime<Utc>,
    // Unix millis; 0 means no refresh has happened yet.
    last_refresh_ms: AtomicI64,
}

impl AtomicCounters {
    pub(crate) fn new() -> Self {
        Self {
            forwarded: AtomicU64::new(0),
            adoptions: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            created_at: Utc::now(),
            last_refresh_ms: AtomicI64::new(0),
        }
    }

    pub(crate) fn record_forwarded(&self) {
        self.forwarded.fetch_add(1, Ordering::SeqCst);
    }

    pub(crate) fn record_adoption(&self) {
        self.adoptions.fetch_add(1, Ordering::SeqCst);
        self.last_refresh_ms
            .store(Utc::now().timestamp_millis(), Ordering::SeqCst);
    }

    pub(crate) fn record_miss(&self) {
        self.misses.fetch_add(1, Ordering::SeqCst);
        self.last_refresh_ms
            .store(Utc::now().timestamp_millis(), Ordering::SeqCst);
    }

    pub(crate) fn snapshot(&self) -> ReferenceStats {
        let last_refresh_at = match self.last_refresh_ms.load(Ordering::SeqCst) {
            0 => None,
            ms => DateTime::from_timestamp_millis(ms),
        };

        ReferenceStats {
            forwarded_calls: self.forwarded.load(Ordering::SeqCst),
            refresh_adoptions: self.adoptions.load(Ordering::SeqCst),
            refresh_misses: self.misses.load(Ordering::SeqCst),
            created_at: self.created_at,
            last_refresh_at,
        }
    }
}
