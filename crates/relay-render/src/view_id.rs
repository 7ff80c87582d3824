//! Allocation of secondary view ids.
//!
//! Ids up to and including the reserved floor belong to the main view and to
//! ids the host reserves for its own passes; they are never handed out here.

use crate::backend::ViewId;
use crate::error::{RenderError, Result};

/// Pool of view ids for secondary viewports.
///
/// Freed ids are reused most-recently-freed first, keeping the active id
/// range small; never-issued ids come from a counter that stops at `max`.
#[derive(Debug, Clone)]
pub struct ViewIdAllocator {
    free: Vec<ViewId>,
    next: u32,
    max: u16,
}

impl ViewIdAllocator {
    /// Allocator issuing ids in `first ..= max`. With `first > max` the
    /// range is empty and every allocation reports exhaustion.
    pub fn new(first: u16, max: u16) -> Self {
        Self {
            free: Vec::new(),
            next: u32::from(first),
            max,
        }
    }

    /// Returns a free-listed id if any, otherwise the next never-issued one.
    pub fn allocate(&mut self) -> Result<ViewId> {
        if let Some(id) = self.free.pop() {
            log::trace!("reusing {id}");
            return Ok(id);
        }
        let Ok(raw) = u16::try_from(self.next) else {
            return Err(self.exhausted());
        };
        if raw > self.max {
            return Err(self.exhausted());
        }
        let id = ViewId(raw);
        self.next += 1;
        log::trace!("issued {id}");
        Ok(id)
    }

    fn exhausted(&self) -> RenderError {
        RenderError::ViewIdsExhausted {
            max: ViewId(self.max),
        }
    }

    /// Returns `id` to the pool.
    ///
    /// Ids above `max` and ids already in the free list are ignored, so a
    /// double free is harmless. Freeing an id still owned by a live viewport
    /// is a caller bug this type cannot detect.
    pub fn free(&mut self, id: ViewId) {
        if id.0 > self.max || self.free.contains(&id) {
            return;
        }
        self.free.push(id);
    }

    /// Number of ids currently sitting in the free list.
    #[inline]
    pub fn free_len(&self) -> usize {
        self.free.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::collections::BTreeSet;

    #[test]
    fn counter_starts_at_first_id() {
        let mut ids = ViewIdAllocator::new(100, 255);
        assert_eq!(ids.allocate().unwrap(), ViewId(100));
        assert_eq!(ids.allocate().unwrap(), ViewId(101));
    }

    #[test]
    fn freed_id_is_reused_before_growth() {
        let mut ids = ViewIdAllocator::new(100, 255);
        let a = ids.allocate().unwrap();
        let _b = ids.allocate().unwrap();
        ids.free(a);
        assert_eq!(ids.allocate().unwrap(), ViewId(100));
        assert_eq!(ids.allocate().unwrap(), ViewId(102));
    }

    #[test]
    fn most_recently_freed_comes_back_first() {
        let mut ids = ViewIdAllocator::new(100, 255);
        let a = ids.allocate().unwrap();
        let b = ids.allocate().unwrap();
        ids.free(a);
        ids.free(b);
        assert_eq!(ids.allocate().unwrap(), b);
        assert_eq!(ids.allocate().unwrap(), a);
    }

    #[test]
    fn double_free_is_a_no_op() {
        let mut ids = ViewIdAllocator::new(100, 255);
        let a = ids.allocate().unwrap();
        ids.free(a);
        ids.free(a);
        assert_eq!(ids.free_len(), 1);
        assert_eq!(ids.allocate().unwrap(), a);
        assert_ne!(ids.allocate().unwrap(), a);
    }

    #[test]
    fn freeing_above_max_is_ignored() {
        let mut ids = ViewIdAllocator::new(100, 255);
        ids.free(ViewId(300));
        assert_eq!(ids.free_len(), 0);
        assert_eq!(ids.allocate().unwrap(), ViewId(100));
    }

    #[test]
    fn exhaustion_fails_fast() {
        let mut ids = ViewIdAllocator::new(254, 255);
        assert_eq!(ids.allocate().unwrap(), ViewId(254));
        assert_eq!(ids.allocate().unwrap(), ViewId(255));
        assert!(matches!(
            ids.allocate(),
            Err(RenderError::ViewIdsExhausted { max: ViewId(255) })
        ));
        ids.free(ViewId(254));
        assert_eq!(ids.allocate().unwrap(), ViewId(254));
    }

    #[test]
    fn inverted_range_issues_nothing() {
        let mut ids = ViewIdAllocator::new(300, 255);
        assert!(matches!(
            ids.allocate(),
            Err(RenderError::ViewIdsExhausted { max: ViewId(255) })
        ));
        assert!(ids.allocate().is_err());
    }

    #[test]
    fn full_u16_range_does_not_wrap() {
        let mut ids = ViewIdAllocator::new(u16::MAX, u16::MAX);
        assert_eq!(ids.allocate().unwrap(), ViewId(u16::MAX));
        assert!(ids.allocate().is_err());
    }

    #[test]
    fn no_id_is_issued_twice_while_live() {
        let mut ids = ViewIdAllocator::new(100, 255);
        let mut live = BTreeSet::new();
        // Deterministic interleaving of allocations and frees.
        for step in 0..400u32 {
            if step % 3 == 2 && !live.is_empty() {
                let victim = *live.iter().nth((step as usize * 7) % live.len()).unwrap();
                live.remove(&victim);
                ids.free(victim);
            } else if let Ok(id) = ids.allocate() {
                assert!(live.insert(id), "{id} handed out while still live");
            }
        }
    }
}
