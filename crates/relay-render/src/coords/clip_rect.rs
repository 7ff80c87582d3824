use super::Vec2;

/// Axis-aligned clip rectangle stored as two corners (`min` top-left,
/// `max` bottom-right), the form GUI producers emit per draw command.
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct ClipRect {
    pub min: Vec2,
    pub max: Vec2,
}

impl ClipRect {
    #[inline]
    pub const fn new(x1: f32, y1: f32, x2: f32, y2: f32) -> Self {
        Self {
            min: Vec2::new(x1, y1),
            max: Vec2::new(x2, y2),
        }
    }

    #[inline]
    pub const fn from_corners(min: Vec2, max: Vec2) -> Self {
        Self { min, max }
    }

    #[inline]
    pub fn width(self) -> f32 {
        self.max.x - self.min.x
    }

    #[inline]
    pub fn height(self) -> f32 {
        self.max.y - self.min.y
    }

    #[inline]
    pub fn is_empty(self) -> bool {
        self.width() <= 0.0 || self.height() <= 0.0
    }

    /// Maps the rect from draw-list space into framebuffer pixel space.
    ///
    /// Each corner has `display_pos` subtracted and is then scaled per axis.
    #[inline]
    pub fn project(self, display_pos: Vec2, scale: Vec2) -> ClipRect {
        ClipRect {
            min: (self.min - display_pos).scale(scale),
            max: (self.max - display_pos).scale(scale),
        }
    }

    /// Whether a projected rect overlaps a framebuffer of `fb_size` pixels.
    ///
    /// A rect whose left/top lie at or past the far edge, or whose right/bottom
    /// are negative, is entirely off-surface.
    #[inline]
    pub fn overlaps_framebuffer(self, fb_size: Vec2) -> bool {
        self.min.x < fb_size.x && self.min.y < fb_size.y && self.max.x >= 0.0 && self.max.y >= 0.0
    }

    /// Intersection of two rects. Disjoint inputs yield an empty rect at the
    /// overlap corner rather than `None` so nested clips keep culling.
    #[inline]
    pub fn intersect(self, other: ClipRect) -> ClipRect {
        let min = Vec2::new(self.min.x.max(other.min.x), self.min.y.max(other.min.y));
        let max = Vec2::new(self.max.x.min(other.max.x), self.max.y.min(other.max.y));
        ClipRect {
            min,
            max: Vec2::new(max.x.max(min.x), max.y.max(min.y)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn c(x1: f32, y1: f32, x2: f32, y2: f32) -> ClipRect {
        ClipRect::new(x1, y1, x2, y2)
    }

    // ── project ───────────────────────────────────────────────────────────

    #[test]
    fn project_identity_scale_and_origin() {
        let r = c(10.0, 20.0, 30.0, 40.0);
        assert_eq!(r.project(Vec2::zero(), Vec2::splat(1.0)), r);
    }

    #[test]
    fn project_subtracts_origin_then_scales_per_axis() {
        let r = c(110.0, 220.0, 130.0, 240.0);
        let p = r.project(Vec2::new(100.0, 200.0), Vec2::new(2.0, 3.0));
        assert_eq!(p, c(20.0, 60.0, 60.0, 120.0));
    }

    // ── overlaps_framebuffer ──────────────────────────────────────────────

    #[test]
    fn rect_left_of_surface_is_culled() {
        let fb = Vec2::new(800.0, 600.0);
        assert!(!c(-50.0, 10.0, -5.0, 100.0).overlaps_framebuffer(fb));
    }

    #[test]
    fn rect_starting_at_far_edge_is_culled() {
        let fb = Vec2::new(800.0, 600.0);
        assert!(!c(800.0, 0.0, 900.0, 10.0).overlaps_framebuffer(fb));
        assert!(!c(0.0, 600.0, 10.0, 700.0).overlaps_framebuffer(fb));
    }

    #[test]
    fn rect_touching_origin_is_kept() {
        let fb = Vec2::new(800.0, 600.0);
        // max == 0 is still considered on-surface; the scissor ends up zero-width.
        assert!(c(-10.0, -10.0, 0.0, 0.0).overlaps_framebuffer(fb));
    }

    #[test]
    fn partially_visible_rect_is_kept() {
        let fb = Vec2::new(800.0, 600.0);
        assert!(c(-20.0, 500.0, 20.0, 900.0).overlaps_framebuffer(fb));
    }

    // ── intersect ─────────────────────────────────────────────────────────

    #[test]
    fn intersect_overlapping() {
        let i = c(0.0, 0.0, 10.0, 10.0).intersect(c(5.0, 5.0, 15.0, 15.0));
        assert_eq!(i, c(5.0, 5.0, 10.0, 10.0));
    }

    #[test]
    fn intersect_disjoint_is_empty() {
        let i = c(0.0, 0.0, 5.0, 5.0).intersect(c(20.0, 20.0, 25.0, 25.0));
        assert!(i.is_empty());
    }
}
