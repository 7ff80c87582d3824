/// Sentinel index shared by every handle type.
pub const INVALID_HANDLE: u16 = u16::MAX;

macro_rules! define_handle {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd)]
        pub struct $name(pub u16);

        impl $name {
            pub const INVALID: Self = Self(INVALID_HANDLE);

            #[inline]
            pub const fn is_valid(self) -> bool {
                self.0 != INVALID_HANDLE
            }

            #[inline]
            pub const fn index(self) -> u16 {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::INVALID
            }
        }
    };
}

define_handle!(
    /// Linked shader program.
    ProgramHandle
);
define_handle!(
    /// 2D texture.
    TextureHandle
);
define_handle!(
    /// Named shader uniform (the font sampler slot).
    UniformHandle
);
define_handle!(
    /// Render target bound to a native window.
    FrameBufferHandle
);

/// Render-target slot. Views execute in ascending id order every frame.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct ViewId(pub u16);

impl ViewId {
    #[inline]
    pub const fn get(self) -> u16 {
        self.0
    }
}

impl std::fmt::Display for ViewId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "view#{}", self.0)
    }
}

/// Free-list handle allocator used by backends for their resource tables.
///
/// Indices are recycled most-recently-freed first; `INVALID_HANDLE` is never
/// issued.
#[derive(Debug, Default)]
pub(crate) struct HandleAlloc {
    free: Vec<u16>,
    next: u16,
}

impl HandleAlloc {
    pub(crate) fn alloc(&mut self) -> Option<u16> {
        if let Some(idx) = self.free.pop() {
            return Some(idx);
        }
        if self.next == INVALID_HANDLE {
            return None;
        }
        let idx = self.next;
        self.next += 1;
        Some(idx)
    }

    pub(crate) fn release(&mut self, idx: u16) {
        debug_assert!(idx < self.next, "released handle {idx} was never allocated");
        if !self.free.contains(&idx) {
            self.free.push(idx);
        }
    }
}
