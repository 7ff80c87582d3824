//! Draw-data translation: one [`DrawData`](crate::draw::DrawData) into one
//! backend view.

mod projection;
mod scissor;
mod translate;

pub use projection::ortho;
pub use scissor::{scissor_for, MAX_SCISSOR_EXTENT};
pub use translate::{render_draw_data, FrameStats, ViewSetup};
