//! Coordinate types shared by the draw-data model and the translator.
//!
//! Draw-list space:
//! - logical pixels, origin top-left, +X right, +Y down
//! - `DrawData::display_pos` is the top-left of the area being rendered
//!
//! Framebuffer space is draw-list space minus the display origin, multiplied
//! per axis by `DrawData::framebuffer_scale`.

mod clip_rect;
mod vec2;

pub use clip_rect::ClipRect;
pub use vec2::Vec2;
