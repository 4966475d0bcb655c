use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

use delve_cache::ObjectPool;
use delve_geom::CubeCoord;
use delve_world::worldgen::PrecalcParams;
use delve_world::{LayerSet, NoiseGrid, WorldId};
use hashbrown::{HashMap, HashSet};

use crate::tasks::{TaskPool, TaskStats};

type GridKey = (WorldId, CubeCoord);

#[derive(Clone, Copy, Debug, Default)]
pub struct PrecalcStats {
    pub hits: u64,
    pub misses: u64,
    pub stale: u64,
    pub submitted: u64,
    pub duplicate: u64,
    pub abandoned: u64,
    pub evicted: u64,
    pub entries: usize,
    pub tasks: TaskStats,
}

struct Entry {
    grid: NoiseGrid,
    stored: Instant,
}

#[derive(Default)]
struct Shelf {
    entries: HashMap<GridKey, Entry>,
    order: VecDeque<GridKey>,
    pending: HashSet<GridKey>,
}

#[derive(Default)]
struct Counters {
    hits: AtomicU64,
    misses: AtomicU64,
    stale: AtomicU64,
    submitted: AtomicU64,
    duplicate: AtomicU64,
    abandoned: AtomicU64,
    evicted: AtomicU64,
}

struct Shared {
    shelf: Mutex<Shelf>,
    buffers: ObjectPool<Vec<f64>>,
    capacity: usize,
    ttl: Duration,
    counters: Counters,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, Shelf> {
        self.shelf.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn recycle(&self, grid: NoiseGrid) {
        self.buffers.put(grid.into_data());
    }

    /// Background half of a submit: compute the grid for a pending `key` and shelve it.
    fn fill(&self, key: GridKey, compute: impl FnOnce(Vec<f64>) -> NoiseGrid) {
        // taken or cleared while queued
        if !self.lock().pending.contains(&key) {
            self.counters.abandoned.fetch_add(1, Ordering::Relaxed);
            return;
        }
        let guard = PendingGuard { shared: self, key };
        let grid = compute(self.buffers.take());
        std::mem::forget(guard);

        let now = Instant::now();
        let mut shelf = self.lock();
        if shelf.pending.remove(&key) {
            shelf.entries.insert(key, Entry { grid, stored: now });
            shelf.order.push_back(key);
            self.evict(&mut shelf, now);
        } else {
            drop(shelf);
            self.counters.abandoned.fetch_add(1, Ordering::Relaxed);
            self.recycle(grid);
        }
    }

    /// Drop entries past their ttl or beyond capacity, oldest first.
    fn evict(&self, shelf: &mut Shelf, now: Instant) {
        while let Some(&key) = shelf.order.front() {
            let expired = shelf
                .entries
                .get(&key)
                .is_none_or(|e| now.saturating_duration_since(e.stored) > self.ttl);
            if !expired && shelf.order.len() <= self.capacity {
                break;
            }
            shelf.order.pop_front();
            if let Some(e) = shelf.entries.remove(&key) {
                self.counters.evicted.fetch_add(1, Ordering::Relaxed);
                self.recycle(e.grid);
            }
        }
    }
}

/// Clears a pending key if its job unwinds, so the cube can be submitted again.
struct PendingGuard<'a> {
    shared: &'a Shared,
    key: GridKey,
}

impl Drop for PendingGuard<'_> {
    fn drop(&mut self) {
        self.shared.lock().pending.remove(&self.key);
        self.shared.counters.abandoned.fetch_add(1, Ordering::Relaxed);
        log::warn!(target: "precalc", "grid job for {:?} panicked", self.key.1);
    }
}

/// Dense noise grids computed ahead of time on a background pool.
///
/// [`NoisePrecalc::take`] never waits for a worker: a grid that is missing,
/// expired or computed with other settings is recomputed on the caller.
pub struct NoisePrecalc {
    shared: Arc<Shared>,
    tasks: TaskPool,
}

impl NoisePrecalc {
    pub fn new(workers: usize, queue_capacity: usize, cache_capacity: usize, ttl: Duration) -> Self {
        Self {
            shared: Arc::new(Shared {
                shelf: Mutex::new(Shelf::default()),
                buffers: ObjectPool::with_default(cache_capacity.clamp(1, 256)),
                capacity: cache_capacity.max(1),
                ttl,
                counters: Counters::default(),
            }),
            tasks: TaskPool::new("delve-precalc", workers, queue_capacity),
        }
    }

    pub fn from_params(p: &PrecalcParams) -> Self {
        let workers = if p.enable { p.workers } else { 0 };
        Self::new(workers, p.queue_capacity, p.cache_capacity, p.ttl)
    }

    /// Ask for `cube`'s grid to be computed in the background. Best effort.
    pub fn submit(&self, layers: &Arc<LayerSet>, cube: CubeCoord) {
        let key = (layers.world(), cube);
        {
            let mut shelf = self.shared.lock();
            if shelf.pending.contains(&key) || shelf.entries.contains_key(&key) {
                self.shared.counters.duplicate.fetch_add(1, Ordering::Relaxed);
                return;
            }
            shelf.pending.insert(key);
        }
        self.shared.counters.submitted.fetch_add(1, Ordering::Relaxed);

        let shared = Arc::clone(&self.shared);
        let layers = Arc::clone(layers);
        let accepted = self
            .tasks
            .submit(move || shared.fill(key, |buf| layers.compute(cube, buf)));
        if !accepted {
            self.shared.lock().pending.remove(&key);
        }
    }

    /// Remove and return `cube`'s grid, computing it here if no usable one is cached.
    pub fn take(&self, layers: &LayerSet, cube: CubeCoord) -> NoiseGrid {
        let key = (layers.world(), cube);
        let now = Instant::now();
        let found = {
            let mut shelf = self.shared.lock();
            shelf.pending.remove(&key);
            let found = shelf.entries.remove(&key);
            shelf.order.retain(|k| *k != key);
            found
        };
        let c = &self.shared.counters;
        match found {
            Some(e)
                if now.saturating_duration_since(e.stored) <= self.shared.ttl
                    && e.grid.matches(layers, cube) =>
            {
                c.hits.fetch_add(1, Ordering::Relaxed);
                return e.grid;
            }
            Some(e) => {
                c.stale.fetch_add(1, Ordering::Relaxed);
                log::debug!(target: "precalc", "stale grid for {cube:?}, recomputing");
                self.shared.recycle(e.grid);
            }
            None => {}
        }
        c.misses.fetch_add(1, Ordering::Relaxed);
        layers.compute(cube, self.shared.buffers.take())
    }

    /// Hand a grid's buffer back for reuse.
    pub fn recycle(&self, grid: NoiseGrid) {
        self.shared.recycle(grid);
    }

    /// Forget every cached and pending grid of `world`.
    pub fn clear_world(&self, world: WorldId) {
        let mut shelf = self.shared.lock();
        let Shelf {
            entries,
            order,
            pending,
        } = &mut *shelf;
        pending.retain(|k| k.0 != world);
        order.retain(|k| k.0 != world);
        let dropped: Vec<_> = entries.extract_if(|k, _| k.0 == world).collect();
        drop(shelf);
        if !dropped.is_empty() {
            log::debug!(target: "precalc", "cleared {} grids of world {}", dropped.len(), world.0);
        }
        for (_, e) in dropped {
            self.shared.recycle(e.grid);
        }
    }

    /// Wait for queued background work. Returns false on timeout.
    pub fn wait_idle(&self, timeout: Duration) -> bool {
        self.tasks.wait_idle(timeout)
    }

    pub fn stats(&self) -> PrecalcStats {
        let c = &self.shared.counters;
        PrecalcStats {
            hits: c.hits.load(Ordering::Relaxed),
            misses: c.misses.load(Ordering::Relaxed),
            stale: c.stale.load(Ordering::Relaxed),
            submitted: c.submitted.load(Ordering::Relaxed),
            duplicate: c.duplicate.load(Ordering::Relaxed),
            abandoned: c.abandoned.load(Ordering::Relaxed),
            evicted: c.evicted.load(Ordering::Relaxed),
            entries: self.shared.lock().entries.len(),
            tasks: self.tasks.stats(),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::panic::{self, AssertUnwindSafe};

    use delve_world::{NoiseLayer, WorldSeed};

    use super::*;

    const WAIT: Duration = Duration::from_secs(10);

    fn layers(seed: u64) -> Arc<LayerSet> {
        let layer = NoiseLayer {
            name: "density".into(),
            salt: 0,
            frequency: 0.02,
            octaves: 2,
            span: 8,
        };
        Arc::new(LayerSet::from_layers(WorldId(1), WorldSeed(seed), &[layer]))
    }

    #[test]
    fn submitted_grid_is_taken_once() {
        let p = NoisePrecalc::new(1, 8, 8, Duration::from_secs(60));
        let set = layers(1);
        let cube = CubeCoord::new(2, 0, -1);
        p.submit(&set, cube);
        p.submit(&set, cube);
        assert!(p.wait_idle(WAIT));

        let grid = p.take(&set, cube);
        assert_eq!(grid.data(), set.compute(cube, Vec::new()).data());
        p.recycle(grid);
        p.take(&set, cube);
        let s = p.stats();
        assert_eq!((s.hits, s.misses, s.duplicate), (1, 1, 1));
    }

    #[test]
    fn grid_from_old_seed_counts_as_stale() {
        let p = NoisePrecalc::new(1, 8, 8, Duration::from_secs(60));
        let cube = CubeCoord::new(0, 0, 0);
        p.submit(&layers(1), cube);
        assert!(p.wait_idle(WAIT));

        let fresh = layers(2);
        let grid = p.take(&fresh, cube);
        assert!(grid.matches(&fresh, cube));
        let s = p.stats();
        assert_eq!((s.stale, s.misses, s.hits), (1, 1, 0));
    }

    #[test]
    fn capacity_evicts_oldest() {
        let p = NoisePrecalc::new(1, 16, 2, Duration::from_secs(60));
        let set = layers(3);
        for x in 0..4 {
            p.submit(&set, CubeCoord::new(x, 0, 0));
        }
        assert!(p.wait_idle(WAIT));
        let s = p.stats();
        assert_eq!(s.entries, 2);
        assert_eq!(s.evicted, 2);
    }

    #[test]
    fn clear_world_forgets_grids() {
        let p = NoisePrecalc::new(1, 8, 8, Duration::from_secs(60));
        let set = layers(4);
        p.submit(&set, CubeCoord::new(0, 0, 0));
        assert!(p.wait_idle(WAIT));
        p.clear_world(WorldId(1));
        assert_eq!(p.stats().entries, 0);
        p.take(&set, CubeCoord::new(0, 0, 0));
        assert_eq!(p.stats().hits, 0);
    }

    #[test]
    fn panicked_job_does_not_block_resubmit() {
        let p = NoisePrecalc::new(1, 8, 8, Duration::from_secs(60));
        let set = layers(5);
        let cube = CubeCoord::new(1, 1, 1);
        let key = (set.world(), cube);
        p.shared.lock().pending.insert(key);

        let failed = panic::catch_unwind(AssertUnwindSafe(|| {
            p.shared.fill(key, |_| panic!("noise layer blew up"))
        }));
        assert!(failed.is_err());
        assert!(!p.shared.lock().pending.contains(&key));
        assert_eq!(p.stats().abandoned, 1);

        p.submit(&set, cube);
        assert!(p.wait_idle(WAIT));
        p.take(&set, cube);
        let s = p.stats();
        assert_eq!((s.submitted, s.duplicate, s.hits), (1, 0, 1));
    }
}
