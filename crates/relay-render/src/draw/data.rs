use crate::coords::Vec2;

use super::DrawList;

/// Everything the GUI layer produced for one render target this frame.
#[derive(Debug, Clone, Default)]
pub struct DrawData {
    /// Top-left of the rendered area in draw-list space. `(0, 0)` for the
    /// main viewport, the window position for secondary ones.
    pub display_pos: Vec2,
    /// Size of the rendered area in logical pixels.
    pub display_size: Vec2,
    /// Logical-to-framebuffer pixel ratio per axis, `(2, 2)` on most HiDPI
    /// displays.
    pub framebuffer_scale: Vec2,
    /// Lists in back-to-front order.
    pub lists: Vec<DrawList>,
}

impl DrawData {
    pub fn new(display_pos: Vec2, display_size: Vec2, framebuffer_scale: Vec2) -> Self {
        Self {
            display_pos,
            display_size,
            framebuffer_scale,
            lists: Vec::new(),
        }
    }

    /// Framebuffer size in pixels.
    #[inline]
    pub fn framebuffer_size(&self) -> Vec2 {
        self.display_size.scale(self.framebuffer_scale)
    }

    /// Whether there is a surface to draw into.
    #[inline]
    pub fn has_area(&self) -> bool {
        self.display_size.x > 0.0 && self.display_size.y > 0.0
    }

    pub fn total_vtx_count(&self) -> usize {
        self.lists.iter().map(|l| l.vertices().len()).sum()
    }

    pub fn total_idx_count(&self) -> usize {
        self.lists.iter().map(|l| l.indices().len()).sum()
    }
}
