//! Shortcode cache.
//!
//! Shortcodes are looked up once per taxonomy variable, so rendering a plan
//! would hit the store hundreds of times without a cache. Each cache is an
//! ordinary value owned by its caller; two caches never share entries.
//!
//! Entries expire after the configured TTL. [`ShortcodeCache::invalidate_all`]
//! bumps a generation counter so that a load started before the
//! invalidation does not write its stale result back.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use mps_store::{PlanStore, Shortcode};

use crate::config::NamingConfig;

#[derive(Debug)]
struct Entry {
    shortcode: Option<Shortcode>,
    loaded_at: Instant,
}

#[derive(Debug, Default)]
struct CacheState {
    generation: u64,
    entries: HashMap<String, Entry>,
}

/// Read-through cache in front of [`PlanStore::get_shortcode`].
#[derive(Debug)]
pub struct ShortcodeCache {
    ttl: Duration,
    state: Mutex<CacheState>,
}

impl Default for ShortcodeCache {
    fn default() -> Self {
        Self::new(&NamingConfig::default())
    }
}

impl ShortcodeCache {
    pub fn new(config: &NamingConfig) -> Self {
        Self {
            ttl: config.ttl(),
            state: Mutex::new(CacheState::default()),
        }
    }

    // The map only ever holds fully written entries, so a poisoned lock is
    // still safe to read.
    fn lock(&self) -> MutexGuard<'_, CacheState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Return the cached shortcode for `id`, loading it from `store` when
    /// absent or expired. Missing shortcodes are cached as `None` too.
    pub async fn get_or_load<S: PlanStore>(
        &self,
        store: &S,
        id: &str,
    ) -> mps_store::Result<Option<Shortcode>> {
        let generation = {
            let state = self.lock();
            if let Some(entry) = state.entries.get(id)
                && entry.loaded_at.elapsed() < self.ttl
            {
                tracing::trace!(shortcode = id, "shortcode cache hit");
                return Ok(entry.shortcode.clone());
            }
            state.generation
        };

        let loaded = store.get_shortcode(id).await?;
        tracing::debug!(shortcode = id, found = loaded.is_some(), "loaded shortcode");

        let mut state = self.lock();
        if state.generation == generation && !self.ttl.is_zero() {
            state.entries.insert(
                id.to_string(),
                Entry {
                    shortcode: loaded.clone(),
                    loaded_at: Instant::now(),
                },
            );
        }
        Ok(loaded)
    }

    /// Drop one entry.
    pub fn invalidate(&self, id: &str) {
        self.lock().entries.remove(id);
    }

    /// Drop every entry and discard loads still in flight.
    pub fn invalidate_all(&self) {
        let mut state = self.lock();
        state.generation += 1;
        state.entries.clear();
    }

    /// Number of cached entries, expired ones included.
    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
