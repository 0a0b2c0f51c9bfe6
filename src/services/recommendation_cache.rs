use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use std::time::Duration;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use tokio::time::Instant;
use uuid::Uuid;

use crate::models::recommendation::{RecommendationKind, RecommendationView};

pub type CacheKey = (Uuid, RecommendationKind);

struct CacheEntry {
    views: Vec<RecommendationView>,
    expires_at: Instant,
}

/// Process-wide TTL cache of resolved recommendation views.
///
/// Only ever a copy of persisted rows; an expired entry is never returned.
pub struct RecommendationCache {
    ttl: Duration,
    entries: RwLock<HashMap<CacheKey, CacheEntry>>,
}

impl RecommendationCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: RwLock::new(HashMap::new()),
        }
    }

    pub fn get(&self, user_id: Uuid, kind: RecommendationKind) -> Option<Vec<RecommendationView>> {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        entries
            .get(&(user_id, kind))
            .filter(|e| Instant::now() < e.expires_at)
            .map(|e| e.views.clone())
    }

    pub fn put(&self, user_id: Uuid, kind: RecommendationKind, views: Vec<RecommendationView>) {
        let entry = CacheEntry {
            views,
            expires_at: Instant::now() + self.ttl,
        };
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert((user_id, kind), entry);
    }

    pub fn invalidate(&self, user_id: Uuid, kind: RecommendationKind) {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&(user_id, kind));
    }

    /// Drops every expired entry and returns how many were removed.
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        let before = entries.len();
        entries.retain(|_, e| now < e.expires_at);
        before - entries.len()
    }

    pub fn len(&self) -> usize {
        self.entries.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

type LockRegistry = Arc<Mutex<HashMap<CacheKey, Arc<AsyncMutex<()>>>>>;

/// Per-(user, kind) generation locks. Unrelated keys never contend.
#[derive(Clone, Default)]
pub struct GenerationLocks {
    inflight: LockRegistry,
}

impl GenerationLocks {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn acquire(&self, user_id: Uuid, kind: RecommendationKind) -> GenerationGuard {
        let key = (user_id, kind);
        let lock = {
            let mut inflight = self.inflight.lock().unwrap_or_else(PoisonError::into_inner);
            release_idle(&mut inflight);
            Arc::clone(
                inflight
                    .entry(key)
                    .or_insert_with(|| Arc::new(AsyncMutex::new(()))),
            )
        };
        GenerationGuard {
            guard: Some(lock.lock_owned().await),
            registry: Arc::clone(&self.inflight),
        }
    }

    /// Registered keys. Idle ones are reclaimed on the next acquire or release.
    pub fn active(&self) -> usize {
        self.inflight.lock().unwrap_or_else(PoisonError::into_inner).len()
    }
}

/// Drops keys nobody holds or waits on. A waiter cancelled after the holder
/// released can leave such an entry behind.
fn release_idle(inflight: &mut HashMap<CacheKey, Arc<AsyncMutex<()>>>) {
    inflight.retain(|_, lock| Arc::strong_count(lock) > 1);
}

/// Held for the duration of one generation; releases on drop, including on error paths.
#[derive(Debug)]
pub struct GenerationGuard {
    guard: Option<OwnedMutexGuard<()>>,
    registry: LockRegistry,
}

impl Drop for GenerationGuard {
    fn drop(&mut self) {
        let Some(guard) = self.guard.take() else {
            return;
        };
        let mut inflight = self.registry.lock().unwrap_or_else(PoisonError::into_inner);
        drop(guard);
        release_idle(&mut inflight);
    }
}
