//! Object pools, slot arenas and the tiered expiring cache used by feature generation.
#![forbid(unsafe_code)]

mod arena;
mod pool;
mod tiered;

pub use arena::{ArenaStats, SlotArena, SlotHandle};
pub use pool::{ObjectPool, PoolStats, Pooled};
pub use tiered::{DEFAULT_TIERS, TieredCache, TieredCacheStats};

/// Resets a value to its empty state while keeping its allocations.
pub trait Recycle {
    fn recycle(&mut self);
}

impl<T> Recycle for Vec<T> {
    #[inline]
    fn recycle(&mut self) {
        self.clear();
    }
}

impl<K, V, S> Recycle for hashbrown::HashMap<K, V, S> {
    #[inline]
    fn recycle(&mut self) {
        self.clear();
    }
}

impl<K, V, S> Recycle for std::collections::HashMap<K, V, S> {
    #[inline]
    fn recycle(&mut self) {
        self.clear();
    }
}
