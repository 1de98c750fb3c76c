//! In-memory tile store for the current session. Nothing is written to disk.

use std::num::NonZeroUsize;

use client_core::tiles::TileId;
use lru::LruCache;

/// Decoded tile pixels, produced on the backend and uploaded on the UI thread.
pub struct TileImage {
    pub width: usize,
    pub height: usize,
    pub rgba: Vec<u8>,
}

enum TileSlot<T> {
    Pending,
    Ready(T),
    Failed,
}

pub enum TileLookup<'a, T> {
    Ready(&'a T),
    /// Requested earlier, still in flight.
    Pending,
    /// Failed once; not requested again while it stays cached.
    Failed,
    /// Not known yet. The tile is now marked pending and the caller must
    /// request it.
    Requested,
}

/// Tile slots keyed by [`TileId`]. Pending, ready and failed slots all count
/// towards `capacity`; the least recently drawn slot goes first.
pub struct TileCache<T> {
    inner: LruCache<TileId, TileSlot<T>>,
}

impl<T> TileCache<T> {
    pub fn new(capacity: usize) -> Self {
        let cap = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            inner: LruCache::new(cap),
        }
    }

    pub fn lookup(&mut self, tile: TileId) -> TileLookup<'_, T> {
        if !self.inner.contains(&tile) {
            self.store(tile, TileSlot::Pending);
            return TileLookup::Requested;
        }
        match self.inner.get(&tile) {
            Some(TileSlot::Ready(value)) => TileLookup::Ready(value),
            Some(TileSlot::Failed) => TileLookup::Failed,
            Some(TileSlot::Pending) | None => TileLookup::Pending,
        }
    }

    pub fn insert(&mut self, tile: TileId, value: T) {
        self.store(tile, TileSlot::Ready(value));
    }

    pub fn mark_failed(&mut self, tile: TileId) {
        self.store(tile, TileSlot::Failed);
    }

    /// Drops a pending slot whose request never left the UI, so the next
    /// lookup reports [`TileLookup::Requested`] again.
    pub fn forget_pending(&mut self, tile: TileId) {
        if matches!(self.inner.peek(&tile), Some(TileSlot::Pending)) {
            self.inner.pop(&tile);
        }
    }

    pub fn pending_count(&self) -> usize {
        self.inner
            .iter()
            .filter(|(_, slot)| matches!(slot, TileSlot::Pending))
            .count()
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    fn store(&mut self, tile: TileId, slot: TileSlot<T>) {
        if let Some((evicted, _)) = self.inner.push(tile, slot) {
            if evicted != tile {
                tracing::trace!(tile = %evicted, "evicted tile slot");
            }
        }
    }
}
