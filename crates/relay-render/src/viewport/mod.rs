//! Secondary viewport windows and their render targets.
//!
//! The host reports window events through the four lifecycle callbacks on
//! [`ViewportManager`]; each window that reaches
//! [`ViewportState::FrameBufferReady`] owns one view id and one frame buffer
//! until it is destroyed.

mod manager;
mod resolver;

use std::fmt;

use bitflags::bitflags;

use crate::coords::Vec2;
use crate::draw::DrawData;

pub use manager::{ViewportManager, ViewportRecord, ViewportState};
pub use resolver::{Headless, NativeHandleResolver, PassThrough};

/// Host-assigned identity of a viewport window.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct ViewportId(pub u64);

impl fmt::Display for ViewportId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "viewport#{}", self.0)
    }
}

bitflags! {
    #[derive(Debug, Copy, Clone, Default, Eq, PartialEq, Hash)]
    pub struct ViewportFlags: u32 {
        /// The host clears the target itself.
        const NO_RENDERER_CLEAR = 1 << 0;
    }
}

/// What the host knows about a viewport window at callback time.
#[derive(Debug, Clone, Copy)]
pub struct Viewport<'a> {
    pub id: ViewportId,
    /// Opaque platform token, `None` until the platform window exists.
    pub platform_handle: Option<u64>,
    /// Size in logical pixels.
    pub size: Vec2,
    pub dpi_scale: f32,
    pub flags: ViewportFlags,
    /// Draw data for this frame; only read by the render callback.
    pub draw_data: Option<&'a DrawData>,
}

impl<'a> Viewport<'a> {
    pub fn new(id: ViewportId, platform_handle: Option<u64>, size: Vec2, dpi_scale: f32) -> Self {
        Self {
            id,
            platform_handle,
            size,
            dpi_scale,
            flags: ViewportFlags::empty(),
            draw_data: None,
        }
    }

    pub fn with_flags(mut self, flags: ViewportFlags) -> Self {
        self.flags = flags;
        self
    }

    pub fn with_draw_data(mut self, draw_data: &'a DrawData) -> Self {
        self.draw_data = Some(draw_data);
        self
    }

    /// Render-target size: logical size times DPI scale, truncated and
    /// saturated to `u16`.
    pub fn pixel_size(&self) -> (u16, u16) {
        let s = self.size * self.dpi_scale;
        (s.x as u16, s.y as u16)
    }
}
