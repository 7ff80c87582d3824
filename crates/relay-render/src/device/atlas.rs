use crate::draw::TextureRef;

/// Borrowed RGBA8 pixels of a font atlas.
#[derive(Debug, Copy, Clone)]
pub struct AtlasPixels<'a> {
    pub data: &'a [u8],
    pub width: u16,
    pub height: u16,
}

/// GUI-side font atlas.
///
/// Rasterization happens on the GUI side; the renderer uploads the pixels
/// and publishes the resulting texture through [`set_texture_id`], which
/// draw commands then reference.
///
/// [`set_texture_id`]: FontAtlas::set_texture_id
pub trait FontAtlas {
    /// Returns the atlas as tightly packed RGBA8 rows.
    fn rgba32_pixels(&mut self) -> AtlasPixels<'_>;

    fn texture_id(&self) -> Option<TextureRef>;

    fn set_texture_id(&mut self, id: Option<TextureRef>);
}

/// Owned RGBA8 atlas.
#[derive(Debug, Clone)]
pub struct RgbaAtlas {
    pixels: Vec<u8>,
    width: u16,
    height: u16,
    texture_id: Option<TextureRef>,
}

impl RgbaAtlas {
    /// Wraps `pixels`, which must hold `width * height * 4` bytes.
    ///
    /// Returns `None` if the length does not match.
    pub fn new(width: u16, height: u16, pixels: Vec<u8>) -> Option<Self> {
        if pixels.len() != usize::from(width) * usize::from(height) * 4 {
            return None;
        }
        Some(Self {
            pixels,
            width,
            height,
            texture_id: None,
        })
    }

    /// 1x1 opaque white atlas; enough for untextured GUI geometry.
    pub fn white() -> Self {
        Self {
            pixels: vec![0xff; 4],
            width: 1,
            height: 1,
            texture_id: None,
        }
    }

    /// Expands an 8-bit coverage bitmap to white RGBA with coverage in alpha.
    pub fn from_alpha8(width: u16, height: u16, coverage: &[u8]) -> Option<Self> {
        if coverage.len() != usize::from(width) * usize::from(height) {
            return None;
        }
        let pixels = coverage.iter().flat_map(|&a| [0xff, 0xff, 0xff, a]).collect();
        Self::new(width, height, pixels)
    }
}

impl FontAtlas for RgbaAtlas {
    fn rgba32_pixels(&mut self) -> AtlasPixels<'_> {
        AtlasPixels {
            data: &self.pixels,
            width: self.width,
            height: self.height,
        }
    }

    fn texture_id(&self) -> Option<TextureRef> {
        self.texture_id
    }

    fn set_texture_id(&mut self, id: Option<TextureRef>) {
        self.texture_id = id;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn size_mismatch_is_rejected() {
        assert!(RgbaAtlas::new(2, 2, vec![0; 15]).is_none());
        assert!(RgbaAtlas::from_alpha8(2, 2, &[0; 3]).is_none());
    }

    #[test]
    fn alpha8_expands_to_white_rgba() {
        let mut atlas = RgbaAtlas::from_alpha8(2, 1, &[0x10, 0x80]).unwrap();
        assert_eq!(atlas.rgba32_pixels().data, &[0xff, 0xff, 0xff, 0x10, 0xff, 0xff, 0xff, 0x80]);
    }
}
