use bitflags::bitflags;

bitflags! {
    /// Fixed-function state for one drawcall.
    #[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
    pub struct RenderState: u32 {
        const WRITE_RGB   = 1 << 0;
        const WRITE_A     = 1 << 1;
        const MSAA        = 1 << 2;
        /// Blend as `src * src_alpha + dst * (1 - src_alpha)`.
        const BLEND_ALPHA = 1 << 3;
    }
}

impl RenderState {
    /// Color write + MSAA, no blending.
    pub const BASE: Self = Self::WRITE_RGB.union(Self::WRITE_A).union(Self::MSAA);

    #[inline]
    pub fn blends(self) -> bool {
        self.contains(Self::BLEND_ALPHA)
    }
}

bitflags! {
    /// Which attachments a view clears before its first drawcall.
    #[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
    pub struct ClearFlags: u8 {
        const COLOR = 1 << 0;
        const DEPTH = 1 << 1;
    }
}

/// Texture sampling mode for a drawcall.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq, Hash)]
pub enum SamplerMode {
    /// Linear filtering (the target's default).
    #[default]
    Default,
    /// Nearest-neighbor filtering.
    Point,
}

/// Ordering of drawcalls inside a view.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq, Hash)]
pub enum ViewMode {
    /// Backend may sort drawcalls.
    #[default]
    Default,
    /// Drawcalls execute in submission order.
    Sequential,
}

/// Pixel-space scissor rectangle.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq, Hash)]
pub struct ScissorRect {
    pub x: u16,
    pub y: u16,
    pub width: u16,
    pub height: u16,
}

impl ScissorRect {
    #[inline]
    pub const fn new(x: u16, y: u16, width: u16, height: u16) -> Self {
        Self { x, y, width, height }
    }
}

/// Per-view clear parameters. `rgba` is `0xRRGGBBAA`.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ViewClear {
    pub flags: ClearFlags,
    pub rgba: u32,
    pub depth: f32,
    pub stencil: u8,
}

impl ViewClear {
    /// Unpacks `rgba` into normalized channels.
    pub fn color_f64(&self) -> [f64; 4] {
        let [r, g, b, a] = self.rgba.to_be_bytes();
        [r, g, b, a].map(|c| f64::from(c) / 255.0)
    }
}

/// Facts about the backend that affect how projections are built.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct Caps {
    /// Clip-space depth is `[-1, 1]` when true, `[0, 1]` otherwise.
    pub homogeneous_depth: bool,
    /// Largest valid view id.
    pub max_view_id: u16,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clear_color_unpacks_rgba_order() {
        let clear = ViewClear {
            flags: ClearFlags::COLOR,
            rgba: 0xff00_80ff,
            depth: 1.0,
            stencil: 0,
        };
        let [r, g, b, a] = clear.color_f64();
        assert_eq!(r, 1.0);
        assert_eq!(g, 0.0);
        assert!((b - 128.0 / 255.0).abs() < 1e-9);
        assert_eq!(a, 1.0);
    }

    #[test]
    fn base_state_does_not_blend() {
        assert!(!RenderState::BASE.blends());
        assert!((RenderState::BASE | RenderState::BLEND_ALPHA).blends());
    }
}
