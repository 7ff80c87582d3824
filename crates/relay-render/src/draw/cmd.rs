use std::fmt;
use std::rc::Rc;

use crate::coords::ClipRect;

use super::{DrawList, TextureRef};

/// Signature of a user draw callback.
pub type DrawCallbackFn = dyn Fn(&DrawList, &DrawCallback);

/// Escape hatch for custom rendering inside a draw list.
///
/// The translator invokes it in place, at its position in the command stream,
/// and submits nothing for it.
#[derive(Clone)]
pub struct DrawCallback {
    func: Rc<DrawCallbackFn>,
    /// Clip rect active when the callback was recorded.
    pub clip_rect: ClipRect,
    /// Opaque value for the callback's own use.
    pub user_data: usize,
}

impl DrawCallback {
    pub fn new<F>(clip_rect: ClipRect, user_data: usize, func: F) -> Self
    where
        F: Fn(&DrawList, &DrawCallback) + 'static,
    {
        Self {
            func: Rc::new(func),
            clip_rect,
            user_data,
        }
    }

    #[inline]
    pub fn invoke(&self, list: &DrawList) {
        (self.func)(list, self);
    }
}

impl fmt::Debug for DrawCallback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DrawCallback")
            .field("clip_rect", &self.clip_rect)
            .field("user_data", &self.user_data)
            .finish_non_exhaustive()
    }
}

/// A drawable span of a draw list's index buffer.
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct DrawSpan {
    /// Clip rect in draw-list (screen) space.
    pub clip_rect: ClipRect,
    /// Number of indices (three per triangle).
    pub elem_count: u32,
    pub texture: TextureRef,
    /// First index of the span as recorded by the producer.
    pub idx_offset: u32,
    /// Vertex the span's indices are relative to.
    pub vtx_offset: u32,
}

/// One entry of a draw list's command stream.
#[derive(Debug, Clone)]
pub enum DrawCmd {
    Draw(DrawSpan),
    Callback(DrawCallback),
}

impl DrawCmd {
    /// Indices consumed by the command; zero for callbacks.
    #[inline]
    pub fn elem_count(&self) -> u32 {
        match self {
            DrawCmd::Draw(span) => span.elem_count,
            DrawCmd::Callback(_) => 0,
        }
    }
}
