use bytemuck::{Pod, Zeroable};

use crate::backend::{Attrib, AttribType, VertexLayout};

/// Index type of draw lists (16-bit, the GUI library default).
pub type DrawIdx = u16;

/// One GUI vertex.
///
/// Layout (20 bytes), copied verbatim into transient buffers:
///
///  offset  0  pos  [f32; 2]  screen-space logical pixels
///  offset  8  uv   [f32; 2]
///  offset 16  col  u32       packed `0xAABBGGRR` (R in the lowest byte)
#[repr(C)]
#[derive(Debug, Copy, Clone, Default, PartialEq, Pod, Zeroable)]
pub struct DrawVert {
    pub pos: [f32; 2],
    pub uv: [f32; 2],
    pub col: u32,
}

impl DrawVert {
    #[inline]
    pub const fn new(pos: [f32; 2], uv: [f32; 2], col: u32) -> Self {
        Self { pos, uv, col }
    }

    /// Vertex layout matching this struct: 2D position, 2D texcoord,
    /// 4x8-bit normalized color.
    pub fn layout() -> VertexLayout {
        VertexLayout::builder()
            .add(Attrib::Position, 2, AttribType::Float, false)
            .add(Attrib::TexCoord0, 2, AttribType::Float, false)
            .add(Attrib::Color0, 4, AttribType::Uint8, true)
            .build()
    }
}

/// Packs 8-bit channels into the vertex color format.
#[inline]
pub const fn pack_color(r: u8, g: u8, b: u8, a: u8) -> u32 {
    (a as u32) << 24 | (b as u32) << 16 | (g as u32) << 8 | r as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout_matches_struct_size() {
        assert_eq!(usize::from(DrawVert::layout().stride()), std::mem::size_of::<DrawVert>());
        assert_eq!(std::mem::size_of::<DrawVert>(), 20);
    }

    #[test]
    fn color_offsets_follow_struct() {
        let layout = DrawVert::layout();
        let offsets: Vec<u16> = layout.attributes().iter().map(|a| a.offset).collect();
        assert_eq!(offsets, vec![0, 8, 16]);
    }

    #[test]
    fn pack_color_puts_red_in_low_byte() {
        assert_eq!(pack_color(0x11, 0x22, 0x33, 0x44), 0x4433_2211);
    }
}
