use crate::coords::{ClipRect, Vec2};

use super::{DrawCallback, DrawCmd, DrawIdx, DrawSpan, DrawVert, TextureRef};

/// Clip rect used when nothing has been pushed.
const NO_CLIP: ClipRect = ClipRect::new(-8192.0, -8192.0, 8192.0, 8192.0);

/// Largest vertex count addressable by one span with 16-bit indices.
const MAX_SPAN_VERTICES: usize = DrawIdx::MAX as usize + 1;

/// One layout pass's geometry: vertices, indices and the command stream
/// that carves the index buffer into drawable spans.
///
/// Producers either fill a list through the recording helpers below or hand
/// over finished buffers with [`DrawList::from_raw`].
///
/// # Recording
///
/// Consecutive primitives sharing the current clip rect and texture extend
/// the last span. When a span would address more than 65536 vertices a new
/// span starts with `vtx_offset` at the current vertex count.
///
/// ```
/// use relay_render::coords::{ClipRect, Vec2};
/// use relay_render::draw::{pack_color, DrawList};
///
/// let mut list = DrawList::new();
/// list.push_clip_rect(ClipRect::new(0.0, 0.0, 100.0, 100.0), false);
/// list.add_rect_filled(Vec2::new(10.0, 10.0), Vec2::new(50.0, 30.0), pack_color(255, 0, 0, 255));
/// list.pop_clip_rect();
/// assert_eq!(list.commands().len(), 1);
/// assert_eq!(list.indices().len(), 6);
/// ```
#[derive(Debug, Clone, Default)]
pub struct DrawList {
    vertices: Vec<DrawVert>,
    indices: Vec<DrawIdx>,
    commands: Vec<DrawCmd>,

    clip_stack: Vec<ClipRect>,
    texture_stack: Vec<TextureRef>,
}

impl DrawList {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Wraps buffers produced elsewhere.
    pub fn from_raw(vertices: Vec<DrawVert>, indices: Vec<DrawIdx>, commands: Vec<DrawCmd>) -> Self {
        Self {
            vertices,
            indices,
            commands,
            ..Self::default()
        }
    }

    /// Clears geometry, commands and both stacks. Keeps allocated capacity.
    pub fn clear(&mut self) {
        self.vertices.clear();
        self.indices.clear();
        self.commands.clear();
        self.clip_stack.clear();
        self.texture_stack.clear();
    }

    #[inline]
    pub fn vertices(&self) -> &[DrawVert] {
        &self.vertices
    }

    #[inline]
    pub fn indices(&self) -> &[DrawIdx] {
        &self.indices
    }

    #[inline]
    pub fn commands(&self) -> &[DrawCmd] {
        &self.commands
    }

    #[inline]
    pub fn current_clip_rect(&self) -> ClipRect {
        self.clip_stack.last().copied().unwrap_or(NO_CLIP)
    }

    #[inline]
    pub fn current_texture(&self) -> TextureRef {
        self.texture_stack.last().copied().unwrap_or_default()
    }

    /// Scopes following primitives to `rect`, optionally intersected with the
    /// current clip. Calls must be balanced with [`pop_clip_rect`](Self::pop_clip_rect).
    pub fn push_clip_rect(&mut self, rect: ClipRect, intersect_with_current: bool) {
        let effective = if intersect_with_current {
            self.current_clip_rect().intersect(rect)
        } else {
            rect
        };
        self.clip_stack.push(effective);
    }

    /// # Panics
    /// Panics (debug only) if called without a matching `push_clip_rect`.
    pub fn pop_clip_rect(&mut self) {
        debug_assert!(!self.clip_stack.is_empty(), "pop_clip_rect without matching push");
        self.clip_stack.pop();
    }

    pub fn push_texture(&mut self, texture: TextureRef) {
        self.texture_stack.push(texture);
    }

    /// # Panics
    /// Panics (debug only) if called without a matching `push_texture`.
    pub fn pop_texture(&mut self) {
        debug_assert!(!self.texture_stack.is_empty(), "pop_texture without matching push");
        self.texture_stack.pop();
    }

    /// Solid quad using the current texture's white texel at uv (0, 0).
    pub fn add_rect_filled(&mut self, min: Vec2, max: Vec2, col: u32) {
        self.prim_quad(min, max, [0.0, 0.0], [0.0, 0.0], col);
    }

    /// Textured quad drawn with `texture`, independent of the texture stack.
    pub fn add_image(
        &mut self,
        texture: TextureRef,
        min: Vec2,
        max: Vec2,
        uv_min: [f32; 2],
        uv_max: [f32; 2],
        col: u32,
    ) {
        self.push_texture(texture);
        self.prim_quad(min, max, uv_min, uv_max, col);
        self.pop_texture();
    }

    /// Appends a user callback. Following primitives start a new span.
    pub fn add_callback<F>(&mut self, user_data: usize, func: F)
    where
        F: Fn(&DrawList, &DrawCallback) + 'static,
    {
        let clip = self.current_clip_rect();
        self.commands
            .push(DrawCmd::Callback(DrawCallback::new(clip, user_data, func)));
    }

    fn prim_quad(&mut self, min: Vec2, max: Vec2, uv_min: [f32; 2], uv_max: [f32; 2], col: u32) {
        let vtx_offset = self.span_for_primitive(4, 6);
        let base = (self.vertices.len() - vtx_offset as usize) as DrawIdx;

        self.vertices.extend_from_slice(&[
            DrawVert::new([min.x, min.y], [uv_min[0], uv_min[1]], col),
            DrawVert::new([max.x, min.y], [uv_max[0], uv_min[1]], col),
            DrawVert::new([max.x, max.y], [uv_max[0], uv_max[1]], col),
            DrawVert::new([min.x, max.y], [uv_min[0], uv_max[1]], col),
        ]);
        self.indices
            .extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
    }

    /// Ensures the last command is a span that can take `vtx_count` vertices
    /// with the current clip and texture, grows it by `idx_count` and returns
    /// its `vtx_offset`.
    fn span_for_primitive(&mut self, vtx_count: usize, idx_count: u32) -> u32 {
        let clip_rect = self.current_clip_rect();
        let texture = self.current_texture();
        let vertices = self.vertices.len();

        if let Some(DrawCmd::Draw(span)) = self.commands.last_mut() {
            let fits = vertices + vtx_count - span.vtx_offset as usize <= MAX_SPAN_VERTICES;
            if span.clip_rect == clip_rect && span.texture == texture && fits {
                span.elem_count += idx_count;
                return span.vtx_offset;
            }
        }

        // Reuse the base of the previous span unless 16-bit indices would overflow.
        let prev_offset = self
            .commands
            .iter()
            .rev()
            .find_map(|c| match c {
                DrawCmd::Draw(span) => Some(span.vtx_offset),
                DrawCmd::Callback(_) => None,
            })
            .unwrap_or(0);
        let vtx_offset = if vertices + vtx_count - prev_offset as usize > MAX_SPAN_VERTICES {
            vertices as u32
        } else {
            prev_offset
        };

        self.commands.push(DrawCmd::Draw(DrawSpan {
            clip_rect,
            elem_count: idx_count,
            texture,
            idx_offset: self.indices.len() as u32,
            vtx_offset,
        }));
        vtx_offset
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spans(list: &DrawList) -> Vec<DrawSpan> {
        list.commands()
            .iter()
            .filter_map(|c| match c {
                DrawCmd::Draw(s) => Some(*s),
                DrawCmd::Callback(_) => None,
            })
            .collect()
    }

    // ── merging ───────────────────────────────────────────────────────────

    #[test]
    fn same_clip_and_texture_merge_into_one_span() {
        let mut list = DrawList::new();
        list.add_rect_filled(Vec2::new(0.0, 0.0), Vec2::new(1.0, 1.0), 0xffff_ffff);
        list.add_rect_filled(Vec2::new(2.0, 2.0), Vec2::new(3.0, 3.0), 0xffff_ffff);
        let s = spans(&list);
        assert_eq!(s.len(), 1);
        assert_eq!(s[0].elem_count, 12);
        assert_eq!(list.indices()[6..], [4, 5, 6, 4, 6, 7]);
    }

    #[test]
    fn clip_change_starts_new_span() {
        let mut list = DrawList::new();
        list.add_rect_filled(Vec2::new(0.0, 0.0), Vec2::new(1.0, 1.0), 0xffff_ffff);
        list.push_clip_rect(ClipRect::new(0.0, 0.0, 10.0, 10.0), true);
        list.add_rect_filled(Vec2::new(2.0, 2.0), Vec2::new(3.0, 3.0), 0xffff_ffff);
        list.pop_clip_rect();
        let s = spans(&list);
        assert_eq!(s.len(), 2);
        assert_eq!(s[1].idx_offset, 6);
        assert_eq!(s[1].clip_rect, ClipRect::new(0.0, 0.0, 10.0, 10.0));
    }

    #[test]
    fn image_uses_its_own_texture() {
        let mut list = DrawList::new();
        let tex = TextureRef(9).point_sampled();
        list.add_image(tex, Vec2::zero(), Vec2::new(4.0, 4.0), [0.0, 0.0], [1.0, 1.0], 0xffff_ffff);
        assert_eq!(spans(&list)[0].texture, tex);
        assert_eq!(list.current_texture(), TextureRef::default());
    }

    #[test]
    fn callback_breaks_span_merging() {
        let mut list = DrawList::new();
        list.add_rect_filled(Vec2::zero(), Vec2::new(1.0, 1.0), 0xffff_ffff);
        list.add_callback(7, |_, _| {});
        list.add_rect_filled(Vec2::zero(), Vec2::new(1.0, 1.0), 0xffff_ffff);
        assert_eq!(list.commands().len(), 3);
        assert_eq!(list.commands()[1].elem_count(), 0);
    }

    // ── 16-bit index overflow ─────────────────────────────────────────────

    #[test]
    fn vertex_overflow_moves_vtx_offset() {
        let mut list = DrawList::new();
        // 16384 quads fill exactly 65536 vertices.
        for _ in 0..16384 {
            list.add_rect_filled(Vec2::zero(), Vec2::new(1.0, 1.0), 0xffff_ffff);
        }
        assert_eq!(spans(&list).len(), 1);
        list.add_rect_filled(Vec2::zero(), Vec2::new(1.0, 1.0), 0xffff_ffff);
        let s = spans(&list);
        assert_eq!(s.len(), 2);
        assert_eq!(s[1].vtx_offset, 65536);
        assert_eq!(&list.indices()[list.indices().len() - 6..], &[0, 1, 2, 0, 2, 3]);
    }
}
