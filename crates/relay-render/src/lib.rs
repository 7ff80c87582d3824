//! relay-render: immediate-mode GUI draw data on a retained-mode, view-based
//! graphics backend.
//!
//! The crate owns:
//! - the per-frame translator from [`draw::DrawData`] to backend drawcalls
//! - the long-lived device objects (program, sampler, font texture)
//! - render targets and view ids for secondary viewport windows
//!
//! Everything hangs off a [`RenderContext`]; there is no global state.

pub mod backend;
pub mod config;
pub mod coords;
pub mod device;
pub mod draw;
pub mod error;
pub mod frame;
pub mod logging;
pub mod view_id;
pub mod viewport;

mod context;

pub use config::RendererConfig;
pub use context::{BackendCapabilities, BackendInfo, RenderContext, RENDERER_NAME};
pub use error::{RenderError, Result};
