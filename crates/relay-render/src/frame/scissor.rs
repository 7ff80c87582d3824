use crate::backend::ScissorRect;
use crate::coords::{ClipRect, Vec2};

/// Largest scissor extent the backend accepts per axis.
pub const MAX_SCISSOR_EXTENT: f32 = 65535.0;

/// Scissor for a clip rect that survived culling.
///
/// The origin is clamped to zero and truncated to whole logical pixels, the
/// extent capped at [`MAX_SCISSOR_EXTENT`], and the result scaled per axis
/// into framebuffer pixels.
pub fn scissor_for(clip: ClipRect, display_pos: Vec2, scale: Vec2) -> ScissorRect {
    let min = clip.min - display_pos;
    let max = clip.max - display_pos;

    let x = min.x.max(0.0).trunc();
    let y = min.y.max(0.0).trunc();
    let width = (max.x - x).min(MAX_SCISSOR_EXTENT);
    let height = (max.y - y).min(MAX_SCISSOR_EXTENT);

    // Float-to-int `as` saturates: negatives and NaN become 0.
    ScissorRect::new(
        (x * scale.x) as u16,
        (y * scale.y) as u16,
        (width * scale.x) as u16,
        (height * scale.y) as u16,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unit_scale_passes_rect_through() {
        let s = scissor_for(ClipRect::new(10.0, 20.0, 110.0, 70.0), Vec2::zero(), Vec2::splat(1.0));
        assert_eq!(s, ScissorRect::new(10, 20, 100, 50));
    }

    #[test]
    fn negative_origin_is_clamped() {
        let s = scissor_for(ClipRect::new(-30.0, -5.0, 50.0, 40.0), Vec2::zero(), Vec2::splat(1.0));
        assert_eq!(s, ScissorRect::new(0, 0, 50, 40));
    }

    #[test]
    fn display_origin_is_subtracted() {
        let s = scissor_for(
            ClipRect::new(1010.0, 520.0, 1110.0, 570.0),
            Vec2::new(1000.0, 500.0),
            Vec2::splat(1.0),
        );
        assert_eq!(s, ScissorRect::new(10, 20, 100, 50));
    }

    #[test]
    fn each_axis_uses_its_own_scale() {
        let s = scissor_for(ClipRect::new(10.0, 20.0, 110.0, 70.0), Vec2::zero(), Vec2::new(2.0, 3.0));
        assert_eq!(s, ScissorRect::new(20, 60, 200, 150));
    }

    #[test]
    fn huge_extent_is_capped() {
        let s = scissor_for(ClipRect::new(0.0, 0.0, 1.0e9, 1.0e9), Vec2::zero(), Vec2::splat(1.0));
        assert_eq!(s, ScissorRect::new(0, 0, 65535, 65535));
    }
}
