use std::collections::HashMap;

use anyhow::{anyhow, Result};
use relay_render::coords::Vec2;
use relay_render::device::RgbaAtlas;

pub const ATLAS_SIZE: u16 = 512;

const GLYPH_PADDING: u32 = 1;

/// The top-left 2x2 block is solid so untextured quads can sample uv (0, 0).
const WHITE_BLOCK: u32 = 2;

/// Placement of one rasterized glyph.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Glyph {
    pub uv_min: [f32; 2],
    pub uv_max: [f32; 2],
    pub size: Vec2,
    /// Offset of the bitmap's top-left corner from the pen on the baseline.
    pub bearing: Vec2,
    pub advance: f32,
}

/// Row-based packer over a square atlas.
#[derive(Debug)]
struct ShelfPacker {
    size: u32,
    cursor_x: u32,
    cursor_y: u32,
    row_height: u32,
}

impl ShelfPacker {
    fn new(size: u32) -> Self {
        Self {
            size,
            cursor_x: WHITE_BLOCK + GLYPH_PADDING,
            cursor_y: 0,
            row_height: WHITE_BLOCK,
        }
    }

    fn place(&mut self, w: u32, h: u32) -> Option<(u32, u32)> {
        if self.cursor_x + w + GLYPH_PADDING > self.size {
            self.cursor_y += self.row_height + GLYPH_PADDING;
            self.cursor_x = 0;
            self.row_height = 0;
        }
        if w > self.size || self.cursor_y + h > self.size {
            return None;
        }

        let pos = (self.cursor_x, self.cursor_y);
        self.cursor_x += w + GLYPH_PADDING;
        self.row_height = self.row_height.max(h);
        Some(pos)
    }
}

/// Pre-rasterized printable ASCII plus the renderer-facing RGBA atlas.
pub struct GlyphAtlas {
    atlas: RgbaAtlas,
    glyphs: HashMap<char, Glyph>,
    ascent: f32,
    line_height: f32,
}

impl GlyphAtlas {
    /// Atlas without glyphs; text draws nothing.
    pub fn white() -> Self {
        Self {
            atlas: RgbaAtlas::white(),
            glyphs: HashMap::new(),
            ascent: 0.0,
            line_height: 0.0,
        }
    }

    pub fn from_font(bytes: &[u8], px: f32) -> Result<Self> {
        let font = fontdue::Font::from_bytes(bytes, fontdue::FontSettings::default())
            .map_err(|e| anyhow!("font load error: {e}"))?;

        let size = u32::from(ATLAS_SIZE);
        let mut coverage = vec![0u8; (size * size) as usize];
        fill(&mut coverage, size, 0, 0, WHITE_BLOCK, WHITE_BLOCK);

        let mut packer = ShelfPacker::new(size);
        let mut glyphs = HashMap::new();

        for c in (' '..='~').filter(|c| !c.is_control()) {
            let (metrics, bitmap) = font.rasterize(c, px);
            let (w, h) = (metrics.width as u32, metrics.height as u32);

            let (uv_min, uv_max) = if w == 0 || h == 0 {
                ([0.0; 2], [0.0; 2])
            } else {
                let Some((gx, gy)) = packer.place(w, h) else {
                    log::warn!("glyph atlas is full ({ATLAS_SIZE}x{ATLAS_SIZE}); '{c}' and later glyphs dropped");
                    break;
                };
                blit(&mut coverage, size, gx, gy, w, &bitmap);
                let s = size as f32;
                (
                    [gx as f32 / s, gy as f32 / s],
                    [(gx + w) as f32 / s, (gy + h) as f32 / s],
                )
            };

            glyphs.insert(
                c,
                Glyph {
                    uv_min,
                    uv_max,
                    size: Vec2::new(w as f32, h as f32),
                    bearing: Vec2::new(metrics.xmin as f32, -(metrics.ymin as f32 + h as f32)),
                    advance: metrics.advance_width,
                },
            );
        }

        let (ascent, line_height) = font
            .horizontal_line_metrics(px)
            .map_or((px, px * 1.2), |m| (m.ascent, m.new_line_size));

        let atlas = RgbaAtlas::from_alpha8(ATLAS_SIZE, ATLAS_SIZE, &coverage)
            .ok_or_else(|| anyhow!("glyph atlas size mismatch"))?;

        log::info!("glyph atlas: {} glyphs at {px}px", glyphs.len());
        Ok(Self {
            atlas,
            glyphs,
            ascent,
            line_height,
        })
    }

    #[inline]
    pub fn atlas_mut(&mut self) -> &mut RgbaAtlas {
        &mut self.atlas
    }

    #[inline]
    pub fn atlas(&self) -> &RgbaAtlas {
        &self.atlas
    }

    #[inline]
    pub fn glyph(&self, c: char) -> Option<&Glyph> {
        self.glyphs.get(&c)
    }

    #[inline]
    pub fn ascent(&self) -> f32 {
        self.ascent
    }

    #[inline]
    pub fn line_height(&self) -> f32 {
        self.line_height
    }
}

fn fill(buf: &mut [u8], stride: u32, x: u32, y: u32, w: u32, h: u32) {
    for row in y..y + h {
        let start = (row * stride + x) as usize;
        buf[start..start + w as usize].fill(0xff);
    }
}

fn blit(buf: &mut [u8], stride: u32, x: u32, y: u32, w: u32, bitmap: &[u8]) {
    for (row, src) in bitmap.chunks_exact(w as usize).enumerate() {
        let start = ((y + row as u32) * stride + x) as usize;
        buf[start..start + w as usize].copy_from_slice(src);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_glyph_sits_right_of_white_block() {
        let mut packer = ShelfPacker::new(64);
        assert_eq!(packer.place(4, 4), Some((WHITE_BLOCK + GLYPH_PADDING, 0)));
        assert_eq!(packer.place(4, 4), Some((WHITE_BLOCK + GLYPH_PADDING + 5, 0)));
    }

    #[test]
    fn wraps_to_next_shelf() {
        let mut packer = ShelfPacker::new(16);
        assert_eq!(packer.place(8, 5), Some((3, 0)));
        // 12 + 8 + 1 > 16
        assert_eq!(packer.place(8, 3), Some((0, 6)));
        assert_eq!(packer.place(4, 2), Some((9, 6)));
    }

    #[test]
    fn full_atlas_rejects() {
        let mut packer = ShelfPacker::new(8);
        // wraps to y = 3, then 3 + 6 > 8
        assert!(packer.place(6, 6).is_none());
        let mut packer = ShelfPacker::new(8);
        assert!(packer.place(9, 1).is_none());
    }

    #[test]
    fn blit_writes_rows_at_stride() {
        let mut buf = vec![0u8; 16];
        blit(&mut buf, 4, 1, 1, 2, &[1, 2, 3, 4]);
        assert_eq!(buf, [0, 0, 0, 0, 0, 1, 2, 0, 0, 3, 4, 0, 0, 0, 0, 0]);
    }

    #[test]
    fn white_atlas_has_no_glyphs() {
        let atlas = GlyphAtlas::white();
        assert!(atlas.glyph('a').is_none());
        assert_eq!(atlas.line_height(), 0.0);
    }
}
