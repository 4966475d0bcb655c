use std::ops::{Deref, DerefMut};
use std::sync::atomic::{AtomicU64, Ordering};

use crossbeam_channel::{Receiver, Sender, bounded};

use crate::Recycle;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PoolStats {
    pub created: u64,
    pub reused: u64,
    pub discarded: u64,
    pub idle: usize,
}

impl PoolStats {
    pub fn merge(&mut self, o: &Self) {
        self.created += o.created;
        self.reused += o.reused;
        self.discarded += o.discarded;
        self.idle += o.idle;
    }
}

/// Bounded free-list of reusable scratch objects.
///
/// Objects handed out are owned by the borrower until returned; the pool keeps at
/// most `capacity` idle objects and drops the rest on return.
pub struct ObjectPool<T, F = fn() -> T> {
    free_tx: Sender<T>,
    free_rx: Receiver<T>,
    make: F,
    created: AtomicU64,
    reused: AtomicU64,
    discarded: AtomicU64,
}

impl<T, F> ObjectPool<T, F>
where
    T: Recycle,
    F: Fn() -> T,
{
    pub fn new(capacity: usize, make: F) -> Self {
        let (free_tx, free_rx) = bounded(capacity.max(1));
        Self {
            free_tx,
            free_rx,
            make,
            created: AtomicU64::new(0),
            reused: AtomicU64::new(0),
            discarded: AtomicU64::new(0),
        }
    }

    /// Borrow an object for the lifetime of the guard.
    pub fn acquire(&self) -> Pooled<'_, T, F> {
        Pooled {
            value: Some(self.take()),
            pool: self,
        }
    }

    /// Take an object out of the pool, creating one if none is idle. Pair with
    /// [`ObjectPool::put`] when the object outlives a scope.
    pub fn take(&self) -> T {
        match self.free_rx.try_recv() {
            Ok(v) => {
                self.reused.fetch_add(1, Ordering::Relaxed);
                v
            }
            Err(_) => {
                self.created.fetch_add(1, Ordering::Relaxed);
                (self.make)()
            }
        }
    }

    /// Return an object. It is recycled first; if the pool is full it is dropped.
    pub fn put(&self, mut value: T) {
        value.recycle();
        if self.free_tx.try_send(value).is_err() {
            self.discarded.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn stats(&self) -> PoolStats {
        PoolStats {
            created: self.created.load(Ordering::Relaxed),
            reused: self.reused.load(Ordering::Relaxed),
            discarded: self.discarded.load(Ordering::Relaxed),
            idle: self.free_rx.len(),
        }
    }
}

impl<T: Recycle + Default> ObjectPool<T> {
    pub fn with_default(capacity: usize) -> Self {
        Self::new(capacity, T::default as fn() -> T)
    }
}

pub struct Pooled<'pool, T: Recycle, F: Fn() -> T> {
    value: Option<T>,
    pool: &'pool ObjectPool<T, F>,
}

impl<T: Recycle, F: Fn() -> T> Pooled<'_, T, F> {
    /// Keep the object instead of returning it to the pool.
    pub fn detach(mut self) -> Option<T> {
        self.value.take()
    }
}

impl<T: Recycle, F: Fn() -> T> Deref for Pooled<'_, T, F> {
    type Target = T;

    fn deref(&self) -> &T {
        self.value.as_ref().expect("pooled value already detached")
    }
}

impl<T: Recycle, F: Fn() -> T> DerefMut for Pooled<'_, T, F> {
    fn deref_mut(&mut self) -> &mut T {
        self.value.as_mut().expect("pooled value already detached")
    }
}

impl<T: Recycle, F: Fn() -> T> Drop for Pooled<'_, T, F> {
    fn drop(&mut self) {
        if let Some(v) = self.value.take() {
            self.pool.put(v);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn returned_objects_are_cleared_and_reused() {
        let pool = ObjectPool::<Vec<u32>>::with_default(2);
        {
            let mut v = pool.acquire();
            v.extend([1, 2, 3]);
        }
        let v = pool.acquire();
        assert!(v.is_empty());
        assert!(v.capacity() >= 3);
        let s = pool.stats();
        assert_eq!((s.created, s.reused), (1, 1));
    }

    #[test]
    fn overflow_is_dropped() {
        let pool = ObjectPool::<Vec<u8>>::with_default(1);
        let a = pool.take();
        let b = pool.take();
        pool.put(a);
        pool.put(b);
        let s = pool.stats();
        assert_eq!(s.idle, 1);
        assert_eq!(s.discarded, 1);
    }

    #[test]
    fn detached_value_is_not_returned() {
        let pool = ObjectPool::new(4, || Vec::<u8>::with_capacity(16));
        let kept = pool.acquire().detach();
        assert!(kept.is_some());
        assert_eq!(pool.stats().idle, 0);
    }
}
