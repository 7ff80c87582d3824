use super::{TransientIndexBuffer, TransientVertexBuffer, VertexLayout};

/// Bytes per transient index.
const INDEX_SIZE: usize = std::mem::size_of::<u16>();

/// Bump allocator over a fixed-capacity CPU staging area, reset every frame.
#[derive(Debug, Clone)]
pub(crate) struct TransientPool {
    data: Vec<u8>,
    used: usize,
}

impl TransientPool {
    pub(crate) fn new(capacity: usize) -> Self {
        Self {
            data: vec![0; capacity],
            used: 0,
        }
    }

    #[inline]
    pub(crate) fn capacity(&self) -> usize {
        self.data.len()
    }

    /// Bytes handed out this frame.
    #[inline]
    pub(crate) fn used(&self) -> &[u8] {
        &self.data[..self.used]
    }

    /// Used bytes rounded up to a multiple of `align`, for uploads with a
    /// size granularity. Capacity must itself be a multiple of `align`.
    pub(crate) fn used_padded(&self, align: usize) -> &[u8] {
        let len = self.used.div_ceil(align) * align;
        &self.data[..len.min(self.data.len())]
    }

    /// How many of `num` elements of `stride` bytes still fit. Regions are
    /// stride-aligned, so alignment padding counts against the space.
    pub(crate) fn avail(&self, num: u32, stride: usize) -> u32 {
        let stride = stride.max(1);
        let offset = self.used.div_ceil(stride) * stride;
        let free = self.data.len().saturating_sub(offset) / stride;
        num.min(u32::try_from(free).unwrap_or(u32::MAX))
    }

    /// Reserves `num` elements; returns the byte offset and length.
    pub(crate) fn alloc(&mut self, num: u32, stride: usize) -> Option<(usize, usize)> {
        let stride = stride.max(1);
        if self.avail(num, stride) < num {
            return None;
        }
        let offset = self.used.div_ceil(stride) * stride;
        let size = num as usize * stride;
        self.used = offset + size;
        Some((offset, size))
    }

    pub(crate) fn alloc_vertices(&mut self, num: u32, layout: &VertexLayout) -> Option<TransientVertexBuffer> {
        let stride = usize::from(layout.stride().max(1));
        let (offset, size) = self.alloc(num, stride)?;
        Some(TransientVertexBuffer {
            offset: u32::try_from(offset).ok()?,
            size: u32::try_from(size).ok()?,
            start_vertex: u32::try_from(offset / stride).ok()?,
            stride: layout.stride(),
        })
    }

    pub(crate) fn avail_indices(&self, num: u32) -> u32 {
        self.avail(num, INDEX_SIZE)
    }

    pub(crate) fn alloc_indices(&mut self, num: u32) -> Option<TransientIndexBuffer> {
        let (offset, size) = self.alloc(num, INDEX_SIZE)?;
        Some(TransientIndexBuffer {
            offset: u32::try_from(offset).ok()?,
            size: u32::try_from(size).ok()?,
            start_index: u32::try_from(offset / INDEX_SIZE).ok()?,
        })
    }

    pub(crate) fn region_mut(&mut self, offset: u32, size: u32) -> &mut [u8] {
        let start = offset as usize;
        &mut self.data[start..start + size as usize]
    }

    pub(crate) fn reset(&mut self) {
        self.used = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alignment_padding_counts_against_space() {
        let mut pool = TransientPool::new(64);
        assert_eq!(pool.alloc(3, 2), Some((0, 6)));
        // Next 20-byte element starts at 20, leaving room for two.
        assert_eq!(pool.avail(5, 20), 2);
        assert_eq!(pool.alloc(2, 20), Some((20, 40)));
        assert_eq!(pool.avail(1, 20), 0);
    }

    #[test]
    fn reset_returns_full_capacity() {
        let mut pool = TransientPool::new(40);
        assert!(pool.alloc(2, 20).is_some());
        assert!(pool.alloc(1, 20).is_none());
        pool.reset();
        assert_eq!(pool.avail(2, 20), 2);
        assert!(pool.used().is_empty());
    }

    #[test]
    fn padded_view_rounds_up_within_capacity() {
        let mut pool = TransientPool::new(16);
        pool.alloc(3, 2);
        assert_eq!(pool.used().len(), 6);
        assert_eq!(pool.used_padded(4).len(), 8);
    }
}
