//! Shared path cache.
//!
//! Entries are write-once within a generation: the first writer wins and a
//! second write with a different value is reported as a [`CacheWriteConflict`].
//! The whole cache is dropped at generation boundaries (a new in-game day, a
//! world edit) through [`PathCache::invalidate_all`].

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;

use crate::constraint::AccessConstraint;
use crate::error::CacheWriteConflict;
use crate::location::LocationId;
use crate::path::Path;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub start: LocationId,
    pub end: LocationId,
    pub constraint: AccessConstraint,
}

impl CacheKey {
    pub fn new(start: LocationId, end: LocationId, constraint: AccessConstraint) -> Self {
        Self {
            start,
            end,
            constraint,
        }
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({} -> {}, {:?})", self.start, self.end, self.constraint)
    }
}

/// `Some(path)` for a known route, `None` for a confirmed unreachable pair.
pub type CacheEntry = Option<Path>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PutOutcome {
    Inserted,
    /// The key already held an identical value.
    Unchanged,
}

/// Point-in-time counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub entries: usize,
    pub hits: u64,
    pub misses: u64,
    pub writes: u64,
    pub conflicts: u64,
    pub generation: u64,
}

/// Concurrent `(start, end, constraint) -> route` store.
#[derive(Debug, Default)]
pub struct PathCache {
    entries: DashMap<CacheKey, CacheEntry>,
    generation: AtomicU64,
    hits: AtomicU64,
    misses: AtomicU64,
    writes: AtomicU64,
    conflicts: AtomicU64,
}

impl PathCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// `None` if never computed, `Some(None)` if known unreachable.
    pub fn get(&self, key: &CacheKey) -> Option<CacheEntry> {
        match self.entries.get(key) {
            Some(entry) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                Some(entry.value().clone())
            }
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }

    pub fn put(&self, key: CacheKey, entry: CacheEntry) -> Result<PutOutcome, CacheWriteConflict> {
        match self.entries.entry(key) {
            Entry::Occupied(occupied) => {
                if *occupied.get() == entry {
                    return Ok(PutOutcome::Unchanged);
                }
                self.conflicts.fetch_add(1, Ordering::Relaxed);
                Err(CacheWriteConflict {
                    key: occupied.key().clone(),
                    existing: occupied.get().clone(),
                    attempted: entry,
                    generation: self.generation(),
                })
            }
            Entry::Vacant(vacant) => {
                vacant.insert(entry);
                self.writes.fetch_add(1, Ordering::Relaxed);
                Ok(PutOutcome::Inserted)
            }
        }
    }

    /// Insert only when `key` is vacant. An occupied key is left alone and is
    /// never reported as a conflict. Returns whether the entry was inserted.
    pub fn put_if_absent(&self, key: CacheKey, entry: CacheEntry) -> bool {
        match self.entries.entry(key) {
            Entry::Occupied(_) => false,
            Entry::Vacant(vacant) => {
                vacant.insert(entry);
                self.writes.fetch_add(1, Ordering::Relaxed);
                true
            }
        }
    }

    /// Drop every entry and start a new generation. Returns the number of
    /// entries removed.
    pub fn invalidate_all(&self) -> usize {
        let dropped = self.entries.len();
        self.entries.clear();
        self.generation.fetch_add(1, Ordering::AcqRel);
        dropped
    }

    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            entries: self.entries.len(),
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            writes: self.writes.load(Ordering::Relaxed),
            conflicts: self.conflicts.load(Ordering::Relaxed),
            generation: self.generation(),
        }
    }
}
