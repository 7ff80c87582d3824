//! Long-lived GPU objects shared by every view: shader program, vertex
//! layout, font sampler uniform and the font atlas texture.

mod atlas;
mod objects;

pub use atlas::{AtlasPixels, FontAtlas, RgbaAtlas};
pub use objects::{DeviceObjects, UI_SHADER};
