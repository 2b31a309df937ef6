//! The resource cache: every external dataset the runners need, retrieved
//! once per cache and handed out as independent copies.
//!
//! A cache starts uninitialized. The first [`ResourceCache::populate`] (or
//! the first [`ResourceCache::acquire`]) either loads a snapshot from disk or
//! invokes every registered hook, after which the cache is populated for the
//! rest of its life. A snapshot is written only after a complete population
//! from source.

use std::collections::BTreeMap;
use std::fs;
use std::ops::{Deref, DerefMut};
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::thread;
use std::time::Instant;

use camino::Utf8PathBuf;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, trace, warn};

use crate::domain::CacheKey;
use crate::error::DaedalusError;
use crate::snapshot;
use crate::table::Dataset;

/// Produces the value of one cache entry.
pub trait Hook: Send + Sync {
    fn retrieve(&self) -> Result<Dataset, DaedalusError>;
}

impl<F> Hook for F
where
    F: Fn() -> Result<Dataset, DaedalusError> + Send + Sync,
{
    fn retrieve(&self) -> Result<Dataset, DaedalusError> {
        self()
    }
}

/// Hooks in registration order, at most one per key.
#[derive(Default)]
pub struct HookRegistry {
    hooks: Vec<(CacheKey, Box<dyn Hook>)>,
}

impl HookRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `hook` for `key`. Registering a key again replaces its hook
    /// but keeps the original position.
    pub fn register<H: Hook + 'static>(&mut self, key: CacheKey, hook: H) -> &mut Self {
        match self.hooks.iter_mut().find(|(existing, _)| *existing == key) {
            Some(slot) => {
                warn!(key = %key, "replacing an already registered cache hook");
                slot.1 = Box::new(hook);
            }
            None => self.hooks.push((key, Box::new(hook))),
        }
        self
    }

    pub fn with<H: Hook + 'static>(mut self, key: CacheKey, hook: H) -> Self {
        self.register(key, hook);
        self
    }

    pub fn contains(&self, key: CacheKey) -> bool {
        self.hooks.iter().any(|(existing, _)| *existing == key)
    }

    pub fn keys(&self) -> Vec<CacheKey> {
        self.hooks.iter().map(|(key, _)| *key).collect()
    }

    pub fn len(&self) -> usize {
        self.hooks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hooks.is_empty()
    }
}

/// How hooks are invoked when the cache populates from source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", tag = "strategy")]
pub enum PopulateStrategy {
    #[default]
    Sequential,
    Parallel { workers: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheSource {
    Snapshot,
    Network,
}

enum State {
    Uninitialized,
    Populated {
        entries: BTreeMap<CacheKey, Result<Dataset, String>>,
        source: CacheSource,
    },
}

pub struct ResourceCache {
    hooks: HookRegistry,
    snapshot_path: Option<Utf8PathBuf>,
    strategy: PopulateStrategy,
    state: Mutex<State>,
    leases: AtomicUsize,
}

impl ResourceCache {
    pub fn new(hooks: HookRegistry) -> Self {
        Self {
            hooks,
            snapshot_path: None,
            strategy: PopulateStrategy::default(),
            state: Mutex::new(State::Uninitialized),
            leases: AtomicUsize::new(0),
        }
    }

    pub fn with_snapshot(mut self, path: Utf8PathBuf) -> Self {
        self.snapshot_path = Some(path);
        self
    }

    pub fn with_strategy(mut self, strategy: PopulateStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn keys(&self) -> Vec<CacheKey> {
        self.hooks.keys()
    }

    pub fn is_registered(&self, key: CacheKey) -> bool {
        self.hooks.contains(key)
    }

    pub fn is_populated(&self) -> bool {
        matches!(*self.lock_state(), State::Populated { .. })
    }

    /// Where the data came from, once populated.
    pub fn source(&self) -> Option<CacheSource> {
        match *self.lock_state() {
            State::Populated { source, .. } => Some(source),
            State::Uninitialized => None,
        }
    }

    /// Keys whose hook failed during population.
    pub fn failed_keys(&self) -> Vec<CacheKey> {
        match &*self.lock_state() {
            State::Populated { entries, .. } => entries
                .iter()
                .filter(|(_, entry)| entry.is_err())
                .map(|(key, _)| *key)
                .collect(),
            State::Uninitialized => Vec::new(),
        }
    }

    /// Number of acquired copies not yet released.
    pub fn outstanding_leases(&self) -> usize {
        self.leases.load(Ordering::SeqCst)
    }

    /// Deletes an existing snapshot so the next population goes to source.
    /// Returns whether a file was removed.
    pub fn invalidate_snapshot(&self) -> Result<bool, DaedalusError> {
        let Some(path) = &self.snapshot_path else {
            return Ok(false);
        };
        if !path.as_std_path().exists() {
            return Ok(false);
        }
        info!(path = %path, "removing cache snapshot");
        fs::remove_file(path.as_std_path())
            .map_err(|err| DaedalusError::Filesystem(err.to_string()))?;
        Ok(true)
    }

    /// Populates the cache if it is not populated yet.
    pub fn populate(&self) -> Result<(), DaedalusError> {
        let mut state = self.lock_state();
        self.populate_locked(&mut state)
    }

    /// Returns an independent copy of the entry for `key`, populating the
    /// cache first if needed.
    pub fn acquire(&self, key: CacheKey) -> Result<Acquired<'_>, DaedalusError> {
        if !self.hooks.contains(key) {
            return Err(DaedalusError::InvalidCacheKey(key.to_string()));
        }

        let mut state = self.lock_state();
        self.populate_locked(&mut state)?;

        let State::Populated { entries, .. } = &*state else {
            return Err(DaedalusError::InvalidCacheKey(key.to_string()));
        };
        match entries.get(&key) {
            Some(Ok(dataset)) => {
                self.leases.fetch_add(1, Ordering::SeqCst);
                trace!(key = %key, "acquired cache entry");
                Ok(Acquired {
                    cache: self,
                    key,
                    value: dataset.clone(),
                })
            }
            Some(Err(message)) => Err(DaedalusError::HookFailed {
                key: key.to_string(),
                message: message.clone(),
            }),
            None => Err(DaedalusError::InvalidCacheKey(key.to_string())),
        }
    }

    fn lock_state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn populate_locked(&self, state: &mut State) -> Result<(), DaedalusError> {
        if matches!(state, State::Populated { .. }) {
            return Ok(());
        }
        info!("populating resource cache");

        if let Some(path) = &self.snapshot_path {
            if path.as_std_path().exists() {
                let loaded = snapshot::read_snapshot(path, &self.hooks.keys())?;
                *state = State::Populated {
                    entries: loaded.into_iter().map(|(key, value)| (key, Ok(value))).collect(),
                    source: CacheSource::Snapshot,
                };
                debug!(path = %path, "loaded cache from snapshot");
                return Ok(());
            }
        }

        let started = Instant::now();
        let results = match self.strategy {
            PopulateStrategy::Sequential => self.retrieve_sequential(),
            PopulateStrategy::Parallel { workers } => self.retrieve_parallel(workers),
        };
        info!(
            elapsed_ms = started.elapsed().as_millis() as u64,
            "retrieved all cache hooks"
        );

        let mut entries = BTreeMap::new();
        for (key, result) in results {
            let entry = result.map_err(|err| {
                error!(key = %key, error = %err, "cache hook failed");
                err.to_string()
            });
            entries.insert(key, entry);
        }

        let failed = entries.values().filter(|entry| entry.is_err()).count();
        if let Some(path) = &self.snapshot_path {
            if failed == 0 {
                let complete = entries
                    .iter()
                    .filter_map(|(key, entry)| entry.as_ref().ok().map(|value| (*key, value.clone())))
                    .collect::<BTreeMap<_, _>>();
                info!(path = %path, "dumping downloaded data to snapshot");
                if let Err(err) = snapshot::write_snapshot(path, &complete) {
                    warn!(path = %path, error = %err, "failed to write cache snapshot");
                }
            } else {
                warn!(
                    failed,
                    "not writing cache snapshot: some hooks failed and would be missing from it"
                );
            }
        }

        *state = State::Populated {
            entries,
            source: CacheSource::Network,
        };
        Ok(())
    }

    fn retrieve_sequential(&self) -> Vec<(CacheKey, Result<Dataset, DaedalusError>)> {
        let total = self.hooks.len();
        self.hooks
            .hooks
            .iter()
            .enumerate()
            .map(|(i, (key, hook))| {
                info!("[ {} / {total} ] Retrieving hook: {key}...", i + 1);
                (*key, retrieve_guarded(*key, hook.as_ref()))
            })
            .collect()
    }

    fn retrieve_parallel(&self, workers: usize) -> Vec<(CacheKey, Result<Dataset, DaedalusError>)> {
        let hooks = &self.hooks.hooks;
        let total = hooks.len();
        let workers = workers.clamp(1, total.max(1));
        info!(workers, hooks = total, "retrieving cache hooks in parallel");

        let next = AtomicUsize::new(0);
        let slots = Mutex::new(
            (0..total)
                .map(|_| None)
                .collect::<Vec<Option<Result<Dataset, DaedalusError>>>>(),
        );

        thread::scope(|scope| {
            for _ in 0..workers {
                scope.spawn(|| {
                    loop {
                        let index = next.fetch_add(1, Ordering::SeqCst);
                        if index >= total {
                            break;
                        }
                        let (key, hook) = &hooks[index];
                        info!("[ {} / {total} ] Retrieving hook: {key}...", index + 1);
                        let result = retrieve_guarded(*key, hook.as_ref());
                        slots.lock().unwrap_or_else(PoisonError::into_inner)[index] = Some(result);
                    }
                });
            }
        });

        let slots = slots.into_inner().unwrap_or_else(PoisonError::into_inner);
        hooks
            .iter()
            .zip(slots)
            .map(|((key, _), slot)| {
                let result = slot.unwrap_or_else(|| {
                    Err(DaedalusError::HookFailed {
                        key: key.to_string(),
                        message: "hook was never run".to_string(),
                    })
                });
                (*key, result)
            })
            .collect()
    }
}

fn retrieve_guarded(key: CacheKey, hook: &dyn Hook) -> Result<Dataset, DaedalusError> {
    match catch_unwind(AssertUnwindSafe(|| hook.retrieve())) {
        Ok(result) => result,
        Err(payload) => Err(DaedalusError::HookFailed {
            key: key.to_string(),
            message: format!("hook panicked: {}", panic_message(payload.as_ref())),
        }),
    }
}

pub(crate) fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(text) = payload.downcast_ref::<&'static str>() {
        (*text).to_string()
    } else if let Some(text) = payload.downcast_ref::<String>() {
        text.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

/// A leased copy of one cache entry. Mutating it never affects the cache.
pub struct Acquired<'a> {
    cache: &'a ResourceCache,
    key: CacheKey,
    value: Dataset,
}

impl std::fmt::Debug for Acquired<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Acquired")
            .field("key", &self.key)
            .field("value", &self.value)
            .finish_non_exhaustive()
    }
}

impl Acquired<'_> {
    pub fn key(&self) -> CacheKey {
        self.key
    }

    pub fn into_inner(mut self) -> Dataset {
        std::mem::replace(&mut self.value, Dataset::Frames(BTreeMap::new()))
    }
}

impl Deref for Acquired<'_> {
    type Target = Dataset;

    fn deref(&self) -> &Dataset {
        &self.value
    }
}

impl DerefMut for Acquired<'_> {
    fn deref_mut(&mut self) -> &mut Dataset {
        &mut self.value
    }
}

impl Drop for Acquired<'_> {
    fn drop(&mut self) {
        self.cache.leases.fetch_sub(1, Ordering::SeqCst);
        trace!(key = %self.key, "released cache entry");
    }
}
