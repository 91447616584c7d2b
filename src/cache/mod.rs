//! Kernel row cache
//!
//! Stores prefixes of Q-matrix rows for up to `l` logical indices under a byte budget.
//! Rows are evicted least-recently-used, always as whole rows. The cache never computes
//! kernel values itself: [`KernelCache::get_data`] reports how much of a row is already
//! present and the caller fills in the rest.

use lru::LruCache;
use std::mem::size_of;

/// Storage type for cached Q-matrix entries
pub type Qfloat = f32;

/// Bookkeeping bytes charged per logical row against the budget
const ROW_HEADER_BYTES: usize = 32;

/// LRU cache of variable-length kernel rows
pub struct KernelCache {
    rows: LruCache<usize, Vec<Qfloat>>,
    l: usize,
    /// Budget in Qfloats
    capacity: usize,
    used: usize,
    hits: u64,
    misses: u64,
}

impl KernelCache {
    /// Create a cache for `l` logical rows with a budget of `cache_bytes`
    ///
    /// The budget never drops below two full rows.
    pub fn new(l: usize, cache_bytes: usize) -> Self {
        let capacity = (cache_bytes.saturating_sub(l * ROW_HEADER_BYTES) / size_of::<Qfloat>())
            .max(2 * l);
        Self {
            rows: LruCache::unbounded(),
            l,
            capacity,
            used: 0,
            hits: 0,
            misses: 0,
        }
    }

    /// Fetch row `index` with room for at least `len` entries
    ///
    /// Returns the row buffer and the number of leading entries that are already valid.
    /// The caller must fill `[filled, len)` before the next call. The row becomes the
    /// most recently used one.
    pub fn get_data(&mut self, index: usize, len: usize) -> (&mut [Qfloat], usize) {
        debug_assert!(index < self.l);

        let mut row = self.rows.pop(&index).unwrap_or_default();
        let filled = row.len();

        if len > filled {
            let more = len - filled;
            while self.used + more > self.capacity {
                match self.rows.pop_lru() {
                    Some((_, evicted)) => self.used -= evicted.len(),
                    None => break,
                }
            }
            row.resize(len, 0.0);
            self.used += more;
            self.misses += 1;
        } else {
            self.hits += 1;
        }

        self.rows.push(index, row);
        let row = self.rows.get_or_insert_mut(index, Vec::new);
        (row.as_mut_slice(), filled.min(len))
    }

    /// Exchange the identities of logical rows `i` and `j`
    ///
    /// Row buffers trade places and, inside every cached row, columns `i` and `j` are
    /// swapped as well. A row long enough to hold the smaller index but not the larger
    /// one cannot be kept consistent and is dropped.
    pub fn swap_index(&mut self, i: usize, j: usize) {
        if i == j {
            return;
        }

        let row_i = self.rows.pop(&i);
        let row_j = self.rows.pop(&j);
        if let Some(row) = row_j {
            self.rows.push(i, row);
        }
        if let Some(row) = row_i {
            self.rows.push(j, row);
        }

        let (lo, hi) = if i < j { (i, j) } else { (j, i) };
        let mut stale = Vec::new();
        for (&key, row) in self.rows.iter_mut() {
            if row.len() > lo {
                if row.len() > hi {
                    row.swap(lo, hi);
                } else {
                    stale.push(key);
                }
            }
        }

        for key in stale {
            if let Some(row) = self.rows.pop(&key) {
                self.used -= row.len();
            }
        }
    }

    /// Get cache hit rate
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }

    /// Get cache statistics
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits,
            misses: self.misses,
            capacity: self.capacity,
            size: self.used,
            rows: self.rows.len(),
        }
    }
}

/// Cache statistics; `capacity` and `size` are counted in Qfloats
#[derive(Debug, Clone)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub capacity: usize,
    pub size: usize,
    pub rows: usize,
}
