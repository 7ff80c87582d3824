//! Draw-data model consumed by the frame translator.
//!
//! Read-only to the renderer: the GUI layer produces a [`DrawData`] per
//! render target each frame and discards it afterwards.

mod cmd;
mod data;
mod list;
mod texture_ref;
mod vertex;

pub use cmd::{DrawCallback, DrawCallbackFn, DrawCmd, DrawSpan};
pub use data::DrawData;
pub use list::DrawList;
pub use texture_ref::{DecodedTexture, TextureRef};
pub use vertex::{pack_color, DrawIdx, DrawVert};
