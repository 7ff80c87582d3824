use thiserror::Error;

use crate::backend::{BackendError, ViewId};

/// Errors produced by the renderer core.
///
/// The lifecycle entry points never return these to the host; they are
/// logged and reflected in readiness / viewport state instead.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("no view ids left (last issuable id is {max})")]
    ViewIdsExhausted { max: ViewId },

    #[error("viewport {0} has no native window handle yet")]
    MissingNativeHandle(crate::viewport::ViewportId),

    #[error(transparent)]
    Backend(#[from] BackendError),
}

pub type Result<T, E = RenderError> = std::result::Result<T, E>;
