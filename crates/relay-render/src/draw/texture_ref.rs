use crate::backend::{SamplerMode, TextureHandle};

/// Texture reference carried by draw commands.
///
/// Stable 32-bit layout shared with GUI-side code that embeds raw images:
///
/// | bits   | meaning                                   |
/// |--------|-------------------------------------------|
/// | 31     | opaque: draw without alpha blending       |
/// | 30     | point sampling instead of linear          |
/// | 0..=29 | backend texture handle                    |
///
/// The two flags are independent. Backend handles are 16-bit, so bits 16..=29
/// must be zero.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq, Hash)]
pub struct TextureRef(pub u32);

impl TextureRef {
    pub const OPAQUE: u32 = 1 << 31;
    pub const POINT_SAMPLER: u32 = 1 << 30;
    pub const FLAGS: u32 = Self::OPAQUE | Self::POINT_SAMPLER;
    pub const HANDLE_MASK: u32 = !Self::FLAGS;
    const UNUSED_BITS: u32 = Self::HANDLE_MASK & !(u16::MAX as u32);

    /// Reference to `texture` with both flags clear.
    #[inline]
    pub const fn from_handle(texture: TextureHandle) -> Self {
        Self(texture.0 as u32)
    }

    #[inline]
    pub const fn opaque(self) -> Self {
        Self(self.0 | Self::OPAQUE)
    }

    #[inline]
    pub const fn point_sampled(self) -> Self {
        Self(self.0 | Self::POINT_SAMPLER)
    }

    #[inline]
    pub const fn raw(self) -> u32 {
        self.0
    }

    /// Splits the reference into the handle and the per-draw flags.
    ///
    /// # Panics
    /// Panics (debug only) if any of bits 16..=29 is set.
    #[inline]
    pub fn decode(self) -> DecodedTexture {
        debug_assert!(
            self.0 & Self::UNUSED_BITS == 0,
            "texture reference {:#010x} sets bits outside the 16-bit handle",
            self.0
        );
        DecodedTexture {
            handle: TextureHandle((self.0 & Self::HANDLE_MASK) as u16),
            alpha_blend: self.0 & Self::OPAQUE == 0,
            sampler: if self.0 & Self::POINT_SAMPLER != 0 {
                SamplerMode::Point
            } else {
                SamplerMode::Default
            },
        }
    }
}

/// Result of [`TextureRef::decode`].
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct DecodedTexture {
    pub handle: TextureHandle,
    pub alpha_blend: bool,
    pub sampler: SamplerMode,
}
