use std::hash::Hash;
use std::time::{Duration, Instant};

use hashbrown::HashMap;
use hashbrown::hash_map::Entry;

/// Expiry windows used when a cache is built without explicit tiers.
pub const DEFAULT_TIERS: [Duration; 3] = [
    Duration::from_secs(10),
    Duration::from_secs(25),
    Duration::from_secs(100),
];

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TieredCacheStats {
    pub hits: u64,
    pub misses: u64,
    pub promotions: u64,
    pub expiries: u64,
    pub clears: u64,
    pub entries: usize,
}

impl TieredCacheStats {
    pub fn merge(&mut self, o: &Self) {
        self.hits += o.hits;
        self.misses += o.misses;
        self.promotions += o.promotions;
        self.expiries += o.expiries;
        self.clears += o.clears;
        self.entries += o.entries;
    }
}

struct Cached<V> {
    value: V,
    tier: u8,
    deadline: Instant,
    touched: bool,
}

/// Memoizing map whose entries live in one of several expiry tiers.
///
/// New entries start in the youngest tier. When a tier's window runs out an entry
/// read since it was placed there moves up to the next, longer tier (or renews the
/// last one); an entry left unread is evicted and handed to the release callback.
/// [`TieredCache::clear`] drops everything without releasing.
///
/// Not synchronised; wrap it if it has to be shared.
pub struct TieredCache<K, V> {
    entries: HashMap<K, Cached<V>>,
    tiers: Box<[Duration]>,
    next_sweep: Option<Instant>,
    stats: TieredCacheStats,
}

impl<K: Eq + Hash, V> Default for TieredCache<K, V> {
    fn default() -> Self {
        Self::new(&DEFAULT_TIERS)
    }
}

impl<K: Eq + Hash, V> TieredCache<K, V> {
    /// Builds a cache with the given windows, youngest first. An empty slice
    /// falls back to [`DEFAULT_TIERS`].
    pub fn new(tiers: &[Duration]) -> Self {
        let tiers: Box<[Duration]> = if tiers.is_empty() {
            DEFAULT_TIERS.into()
        } else {
            tiers.into()
        };
        Self {
            entries: HashMap::new(),
            tiers,
            next_sweep: None,
            stats: TieredCacheStats::default(),
        }
    }

    pub fn get_or_insert_with(&mut self, key: K, now: Instant, make: impl FnOnce(&K) -> V) -> &V {
        match self.entries.entry(key) {
            Entry::Occupied(o) => {
                self.stats.hits += 1;
                let e = o.into_mut();
                e.touched = true;
                &e.value
            }
            Entry::Vacant(v) => {
                self.stats.misses += 1;
                let value = make(v.key());
                let deadline = now + self.tiers[0];
                &v.insert(Cached {
                    value,
                    tier: 0,
                    deadline,
                    touched: false,
                })
                .value
            }
        }
    }

    /// Looks up without inserting, promoting or counting.
    #[inline]
    pub fn peek(&self, key: &K) -> Option<&V> {
        self.entries.get(key).map(|e| &e.value)
    }

    #[inline]
    pub fn tier_of(&self, key: &K) -> Option<usize> {
        self.entries.get(key).map(|e| e.tier as usize)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Promotes or evicts every entry whose window ended at or before `now`.
    /// Returns the number evicted.
    pub fn expire(&mut self, now: Instant, mut release: impl FnMut(K, V)) -> usize {
        let tiers = &self.tiers;
        let promotions = &mut self.stats.promotions;
        let last = tiers.len() - 1;
        let mut evicted = 0;
        for (k, e) in self.entries.extract_if(|_, e| {
            if e.deadline > now {
                return false;
            }
            if !e.touched {
                return true;
            }
            let next = (e.tier as usize + 1).min(last);
            if next != e.tier as usize {
                *promotions += 1;
            }
            e.tier = next as u8;
            e.deadline = now + tiers[next];
            e.touched = false;
            false
        }) {
            release(k, e.value);
            evicted += 1;
        }
        self.stats.expiries += evicted as u64;
        self.next_sweep = Some(now + self.tiers[0] / 2);
        evicted
    }

    /// [`TieredCache::expire`], rate-limited to one sweep per half of the youngest window.
    pub fn maybe_expire(&mut self, now: Instant, release: impl FnMut(K, V)) -> usize {
        match self.next_sweep {
            Some(at) if now < at => 0,
            _ => self.expire(now, release),
        }
    }

    /// Drops every entry without invoking any release callback.
    pub fn clear(&mut self) {
        if !self.entries.is_empty() {
            log::debug!(target: "cache", "tiered cache cleared ({} entries)", self.entries.len());
        }
        self.entries.clear();
        self.next_sweep = None;
        self.stats.clears += 1;
    }

    pub fn stats(&self) -> TieredCacheStats {
        TieredCacheStats {
            entries: self.entries.len(),
            ..self.stats
        }
    }
}
