// src/runtime/write_cache.rs
//
// Bounded mutation buffer fronting a persistent array.
//
// Persistent-array mutation pays a path copy per element; a run of
// sequential or page-local writes does not have to. The cache fronts the
// last, possibly-partial 16-aligned page of the array with a slot buffer
// and an override bitmap, and folds the page into the array only when an
// append crosses a page boundary or the caller asks for the array back.
// At every commit boundary the result is observationally identical to
// applying the same operations directly to the array.

use crate::errors::RuntimeError;
use crate::runtime::persistent::PersistentArray;
use crate::runtime::value::RtValue;

/// Slots per page; the override bitmap is one bit per slot.
pub const PAGE: usize = 16;

/// Write buffer over the final page of a [`PersistentArray`].
///
/// Single-owner: the cache is not `Clone`, and the arrays it wraps or
/// produces stay fully persistent. The fronted page always equals
/// `len() / PAGE` - the cache is biased toward sequential append, and a
/// `set` far from the append page pays a commit (see [`Self::set`]).
pub struct WriteCache {
    base: PersistentArray,
    page: usize,
    len: usize,
    slots: [RtValue; PAGE],
    overrides: u16,
}

impl WriteCache {
    /// Wrap an existing array. The buffer starts empty; reads pass
    /// through until a slot is overridden.
    pub fn new(base: PersistentArray) -> Self {
        let len = base.len();
        Self {
            page: len / PAGE,
            len,
            base,
            slots: std::array::from_fn(|_| RtValue::default()),
            overrides: 0,
        }
    }

    /// Logical size of the combined array-plus-buffer sequence.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    fn overridden(&self, slot: usize) -> bool {
        self.overrides & (1 << slot) != 0
    }

    /// Read one element, preferring an overridden buffer slot over the
    /// wrapped array.
    pub fn load_element(&self, index: usize) -> Result<RtValue, RuntimeError> {
        if index >= self.len {
            return Err(RuntimeError::OutOfRange {
                index,
                len: self.len,
            });
        }
        if index / PAGE == self.page && self.overridden(index % PAGE) {
            return Ok(self.slots[index % PAGE].clone());
        }
        // Outside the fronted page, or in it but never overridden; every
        // such element predates the cache, so the array covers it.
        self.base.get(index)
    }

    /// Append one element. O(1) while the append stays inside the
    /// fronted page; crossing a page boundary commits the buffered page
    /// and rebases onto the new final page first.
    pub fn push_back(&mut self, value: RtValue) {
        let index = self.len;
        if index / PAGE != self.page {
            self.rebase();
            debug_assert_eq!(index / PAGE, self.page);
        }
        let slot = index % PAGE;
        self.slots[slot] = value;
        self.overrides |= 1 << slot;
        self.len += 1;
    }

    /// Replace the element at `index`. Writes inside the fronted page go
    /// to the buffer; a write to any other page commits the buffered page
    /// and falls through to the underlying array's own `set`. That keeps
    /// the append page the only cached page - random far writes pay a
    /// commit per call, which is the documented cost of the
    /// sequential-append bias.
    pub fn set(&mut self, index: usize, value: RtValue) -> Result<(), RuntimeError> {
        if index >= self.len {
            return Err(RuntimeError::OutOfRange {
                index,
                len: self.len,
            });
        }
        if index / PAGE == self.page {
            let slot = index % PAGE;
            self.slots[slot] = value;
            self.overrides |= 1 << slot;
            return Ok(());
        }
        let committed = self.commit();
        self.base = committed.set(index, value)?;
        self.page = self.len / PAGE;
        self.overrides = 0;
        Ok(())
    }

    /// Fold the buffered page into the wrapped array and return the
    /// result. With no overridden slots this returns the wrapped array
    /// unchanged. Overridden slots are applied in ascending order:
    /// `set` below the array's current length, `push_back` at or beyond
    /// it. This is the only point where buffered writes become visible
    /// outside the cache.
    pub fn commit(&self) -> PersistentArray {
        if self.overrides == 0 {
            return self.base.clone();
        }
        tracing::trace!(page = self.page, overrides = self.overrides, "committing page");
        let mut array = self.base.clone();
        for slot in 0..PAGE {
            if !self.overridden(slot) {
                continue;
            }
            let index = self.page * PAGE + slot;
            array = if index < array.len() {
                array
                    .set(index, self.slots[slot].clone())
                    .expect("override slot below array length")
            } else {
                array.push_back(self.slots[slot].clone())
            };
        }
        array
    }

    /// Commit, then front the new final page.
    fn rebase(&mut self) {
        tracing::trace!(from_page = self.page, "rebasing cache");
        self.base = self.commit();
        self.page = self.len / PAGE;
        self.overrides = 0;
    }
}

impl From<PersistentArray> for WriteCache {
    fn from(base: PersistentArray) -> Self {
        Self::new(base)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn int_at(cache: &WriteCache, index: usize) -> i64 {
        cache.load_element(index).unwrap().int_payload()
    }

    #[test]
    fn sixteen_appends_stay_buffered() {
        let base = PersistentArray::empty();
        let mut cache = WriteCache::new(base.clone());
        for i in 0..16 {
            cache.push_back(RtValue::from_int(i));
        }
        assert_eq!(cache.len(), 16);
        for i in 0..16 {
            assert_eq!(int_at(&cache, i as usize), i as i64);
        }
        // No eager commit: the wrapped array is untouched.
        assert_eq!(base.len(), 0);
    }

    #[test]
    fn seventeenth_append_crosses_the_page_boundary() {
        let mut cache = WriteCache::new(PersistentArray::empty());
        for i in 0..17 {
            cache.push_back(RtValue::from_int(i));
        }
        assert_eq!(cache.len(), 17);
        for i in 0..17 {
            assert_eq!(int_at(&cache, i as usize), i as i64);
        }
        let array = cache.commit();
        assert_eq!(array.len(), 17);
        for i in 0..17 {
            assert_eq!(array.get(i).unwrap().int_payload(), i as i64);
        }
    }

    #[test]
    fn commit_without_overrides_returns_the_base() {
        let base: PersistentArray = (0..5).map(RtValue::from_int).collect();
        let cache = WriteCache::new(base.clone());
        let committed = cache.commit();
        assert_eq!(committed.len(), base.len());
    }

    #[test]
    fn set_inside_the_fronted_page_is_buffered() {
        let base: PersistentArray = (0..20).map(RtValue::from_int).collect();
        let mut cache = WriteCache::new(base.clone());
        // len 20 fronts page 1 (indices 16..31).
        cache.set(18, RtValue::from_int(-18)).unwrap();
        assert_eq!(int_at(&cache, 18), -18);
        assert_eq!(base.get(18).unwrap().int_payload(), 18);
        let committed = cache.commit();
        assert_eq!(committed.get(18).unwrap().int_payload(), -18);
        assert_eq!(committed.len(), 20);
    }

    #[test]
    fn far_page_set_commits_and_falls_through() {
        let base: PersistentArray = (0..40).map(RtValue::from_int).collect();
        let mut cache = WriteCache::new(base);
        cache.push_back(RtValue::from_int(40));
        cache.set(3, RtValue::from_int(-3)).unwrap();
        assert_eq!(int_at(&cache, 3), -3);
        assert_eq!(int_at(&cache, 40), 40);
        assert_eq!(cache.len(), 41);
        // Appends keep working after the fallback.
        cache.push_back(RtValue::from_int(41));
        let committed = cache.commit();
        assert_eq!(committed.len(), 42);
        assert_eq!(committed.get(3).unwrap().int_payload(), -3);
        assert_eq!(committed.get(41).unwrap().int_payload(), 41);
    }

    #[test]
    fn set_at_len_is_out_of_range() {
        let mut cache = WriteCache::new(PersistentArray::empty());
        cache.push_back(RtValue::from_int(0));
        assert!(matches!(
            cache.set(1, RtValue::from_int(1)),
            Err(RuntimeError::OutOfRange { index: 1, len: 1 })
        ));
        assert!(matches!(
            cache.load_element(1),
            Err(RuntimeError::OutOfRange { index: 1, len: 1 })
        ));
    }

    #[test]
    fn cache_matches_direct_array_operations() {
        // The cache must be a pure performance layer: the same operation
        // sequence applied directly to the array yields the same result.
        let base: PersistentArray = (0..10).map(RtValue::from_int).collect();
        let mut cache = WriteCache::new(base.clone());
        let mut direct = base;
        let ops: [(usize, i64); 7] = [
            (5, -5),
            (9, -9),
            (10, 100),
            (11, 110),
            (0, -100),
            (12, 120),
            (11, -11),
        ];
        for (index, v) in ops {
            if index < direct.len() {
                cache.set(index, RtValue::from_int(v)).unwrap();
                direct = direct.set(index, RtValue::from_int(v)).unwrap();
            } else {
                cache.push_back(RtValue::from_int(v));
                direct = direct.push_back(RtValue::from_int(v));
            }
        }
        let committed = cache.commit();
        assert_eq!(committed.len(), direct.len());
        for i in 0..direct.len() {
            assert_eq!(
                committed.get(i).unwrap().int_payload(),
                direct.get(i).unwrap().int_payload(),
                "index {}",
                i
            );
        }
    }

    #[test]
    fn partial_page_wrap_starts_mid_page() {
        // Wrapping an array whose length is not 16-aligned fronts the
        // partial final page.
        let base: PersistentArray = (0..21).map(RtValue::from_int).collect();
        let mut cache = WriteCache::new(base.clone());
        cache.push_back(RtValue::from_int(21));
        assert_eq!(cache.len(), 22);
        assert_eq!(int_at(&cache, 21), 21);
        assert_eq!(int_at(&cache, 20), 20);
        assert_eq!(base.len(), 21);
        let committed = cache.commit();
        assert_eq!(committed.len(), 22);
        assert_eq!(committed.get(21).unwrap().int_payload(), 21);
    }
}
