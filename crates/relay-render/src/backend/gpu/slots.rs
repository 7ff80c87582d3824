use crate::backend::HandleAlloc;

/// Resource table indexed by 16-bit handles.
pub(super) struct Slots<T> {
    alloc: HandleAlloc,
    items: Vec<Option<T>>,
}

impl<T> Default for Slots<T> {
    fn default() -> Self {
        Self {
            alloc: HandleAlloc::default(),
            items: Vec::new(),
        }
    }
}

impl<T> Slots<T> {
    /// Stores `item`, returning its index, or `None` when the table is full.
    pub fn insert(&mut self, item: T) -> Option<u16> {
        let idx = self.alloc.alloc()?;
        let i = usize::from(idx);
        if self.items.len() <= i {
            self.items.resize_with(i + 1, || None);
        }
        self.items[i] = Some(item);
        Some(idx)
    }

    pub fn get(&self, idx: u16) -> Option<&T> {
        self.items.get(usize::from(idx))?.as_ref()
    }

    pub fn remove(&mut self, idx: u16) -> Option<T> {
        let item = self.items.get_mut(usize::from(idx))?.take()?;
        self.alloc.release(idx);
        Some(item)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn removed_index_is_reused() {
        let mut slots = Slots::default();
        assert_eq!(slots.insert("a"), Some(0));
        assert_eq!(slots.insert("b"), Some(1));
        assert_eq!(slots.remove(0), Some("a"));
        assert_eq!(slots.get(0), None);
        assert_eq!(slots.insert("c"), Some(0));
        assert_eq!(slots.get(0), Some(&"c"));
    }

    #[test]
    fn double_remove_is_ignored() {
        let mut slots = Slots::default();
        let idx = slots.insert(1).unwrap();
        assert_eq!(slots.remove(idx), Some(1));
        assert_eq!(slots.remove(idx), None);
        assert_eq!(slots.remove(99), None);
    }
}
